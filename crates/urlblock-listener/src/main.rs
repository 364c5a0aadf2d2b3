//! urlblock-listener CLI entrypoint

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use urlblock_listener::{
    BlockedUrlReport, ConfigOverrides, ConfigSource, ListenerConfig, ListenerServer, ReporterClient,
};
use urlblock_logging::ListenerSubscriberBuilder;

const DEFAULT_ENDPOINT: &str = "http://localhost:3000/";

#[derive(Parser)]
#[command(name = "urlblock-listener", version, about = "Records blocked-URL reports from browser extensions")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Human-readable log output instead of JSON lines
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the listener (default)
    Serve(ServeArgs),
    /// Check that a listener answers /ping correctly
    Ping(EndpointArgs),
    /// Send one blocked-URL report
    Report {
        #[command(flatten)]
        endpoint: EndpointArgs,
        /// The blocked navigation target
        #[arg(long)]
        url: String,
        /// Browser tab the navigation happened in
        #[arg(long)]
        tab_id: Option<i64>,
        /// Frame within the tab (0 is the top-level frame)
        #[arg(long)]
        frame_id: Option<i64>,
    },
    /// Show stored reports
    List {
        #[command(flatten)]
        endpoint: EndpointArgs,
        /// Only the newest report
        #[arg(long)]
        latest: bool,
    },
    /// Clear stored reports
    Cleanup(EndpointArgs),
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Config file (default: ./listener.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Interface to bind
    #[arg(long)]
    bind: Option<IpAddr>,
    /// Port to listen on (0 picks a free port)
    #[arg(short, long)]
    port: Option<u16>,
    /// Number of reports to retain
    #[arg(long)]
    max_requests: Option<usize>,
}

#[derive(Args)]
struct EndpointArgs {
    /// Listener report endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let init_client_logging = || {
        ListenerSubscriberBuilder::new()
            .with_level(cli.log_level.clone().unwrap_or_else(|| "warn".to_string()))
            .with_pretty(cli.pretty)
            .init()
    };

    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args, cli.log_level.clone(), cli.pretty).await,
        Command::Ping(args) => {
            init_client_logging()?;
            ping(args).await
        }
        Command::Report {
            endpoint,
            url,
            tab_id,
            frame_id,
        } => {
            init_client_logging()?;
            let mut report = BlockedUrlReport::new(url);
            if let Some(tab_id) = tab_id {
                report = report.with_tab_id(tab_id);
            }
            if let Some(frame_id) = frame_id {
                report = report.with_frame_id(frame_id);
            }
            let client = ReporterClient::new(&endpoint.endpoint)?;
            print_json(&client.report(&report).await?)
        }
        Command::List { endpoint, latest } => {
            init_client_logging()?;
            let client = ReporterClient::new(&endpoint.endpoint)?;
            if latest {
                print_json(&client.latest().await?)
            } else {
                print_json(&client.list().await?)
            }
        }
        Command::Cleanup(args) => {
            init_client_logging()?;
            let client = ReporterClient::new(&args.endpoint)?;
            print_json(&client.cleanup().await?)
        }
    }
}

async fn serve(args: ServeArgs, log_level: Option<String>, pretty: bool) -> Result<()> {
    let (config, source) = ListenerConfig::load(args.config.as_deref())?;
    let config = config.apply(&ConfigOverrides {
        bind: args.bind,
        port: args.port,
        max_requests: args.max_requests,
    })?;

    let mut logging = ListenerSubscriberBuilder::new()
        .with_config(config.logging.clone())
        .with_pretty(pretty || config.logging.console.pretty);
    if let Some(level) = log_level {
        logging = logging.with_level(level);
    }
    let _guard = logging.init()?;

    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "loaded configuration"),
        ConfigSource::Defaults { looked_for } => warn!(
            path = %looked_for.display(),
            port = config.port,
            max_requests = config.max_requests.get(),
            "config file not found, using defaults"
        ),
    }

    let server = ListenerServer::new(config);
    server
        .bind()
        .await
        .context("failed to start listener")?
        .serve()
        .await?;
    Ok(())
}

async fn ping(args: EndpointArgs) -> Result<()> {
    let client = ReporterClient::new(&args.endpoint)?;
    match client.ping().await {
        Ok(ping) => print_json(&ping),
        Err(e) => bail!("ping {} failed: {}", client.ping_url(), e),
    }
}
