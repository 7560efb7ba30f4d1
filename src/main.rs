//! Topic-to-TCP bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    BRIDGE                        │
//!   bus (stdin JSON)   │  ┌──────────┐   ┌────────────┐   ┌───────────┐   │
//!   ───────────────────┼─▶│ inbound  │──▶│ dispatcher │──▶│  routing  │   │
//!                      │  │  reader  │   │ (per msg)  │   │   table   │   │
//!                      │  └──────────┘   └─────┬──────┘   └───────────┘   │
//!                      │                       ▼                          │
//!                      │                ┌────────────┐    ┌──────────┐    │
//!                      │                │  exchange  │◀──▶│ framing  │    │     Backend
//!                      │                │   worker   │◀───┼──────────┼────┼──── TCP service
//!                      │                └─────┬──────┘    └──────────┘    │
//!   bus (stdout JSON)  │                ┌─────▼──────┐                    │
//!   ◀──────────────────┼────────────────│  publish   │                    │
//!                      │                └────────────┘                    │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use topic_proxy::config::{self, BridgeConfig};
use topic_proxy::lifecycle;
use topic_proxy::observability::logging;
use topic_proxy::routing::RouteTable;

#[derive(Parser)]
#[command(name = "topic-proxy")]
#[command(about = "Bridge pub/sub request topics to backend TCP services", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the log level (RUST_LOG still wins)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the port used for unrouted topics
    #[arg(long)]
    default_port: Option<u16>,

    /// Add or replace a route, e.g. `--route svc-a=3001`
    #[arg(short, long = "route", value_parser = parse_route)]
    routes: Vec<(String, u16)>,

    /// Validate the configuration, print the route table, and exit
    #[arg(long)]
    check: bool,
}

fn parse_route(raw: &str) -> Result<(String, u16), String> {
    let (topic, port) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TOPIC=PORT, got '{raw}'"))?;
    let port = port
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("invalid port in '{raw}': {e}"))?;
    Ok((topic.trim().to_string(), port))
}

fn build_config(cli: &Cli) -> Result<BridgeConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::read_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(port) = cli.default_port {
        config.backend.default_port = port;
    }
    config.routes.extend(cli.routes.iter().cloned());
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    if cli.check {
        let table = RouteTable::from_config(&config);
        let mut topics: Vec<_> = table.topics().collect();
        topics.sort_unstable();
        for topic in topics {
            println!("{topic} -> {}:{}", config.backend.host, table.resolve(topic));
        }
        println!("* -> {}:{}", config.backend.host, table.default_port());
        return Ok(());
    }

    logging::init(
        &config.observability.log_level,
        config.observability.log_format,
    )?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend_host = %config.backend.host,
        routes = config.routes.len(),
        default_port = config.backend.default_port,
        deadline_ms = config.timeouts.deadline_ms,
        "topic-proxy starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(lifecycle::run_stdio(&config));
    // A blocked stdin read must not keep the process alive after the drain.
    runtime.shutdown_timeout(Duration::from_millis(500));

    let dispatched = result?;
    tracing::info!(dispatched, "Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_flags() {
        assert_eq!(parse_route("svc-a=3001"), Ok(("svc-a".to_string(), 3001)));
        assert_eq!(parse_route(" x = 80 "), Ok(("x".to_string(), 80)));
        assert!(parse_route("svc-a").is_err());
        assert!(parse_route("svc-a=99999").is_err());
    }

    #[test]
    fn cli_overrides_apply() {
        let cli = Cli::parse_from([
            "topic-proxy",
            "--default-port",
            "4000",
            "--route",
            "svc-a=3001",
            "-r",
            "svc-b=3002",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.backend.default_port, 4000);
        assert_eq!(config.routes.get("svc-a"), Some(&3001));
        assert_eq!(config.routes.get("svc-b"), Some(&3002));
    }

    #[test]
    fn override_repairs_invalid_file() {
        let path = std::env::temp_dir().join(format!("topic-proxy-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[backend]\ndefault_port = 0\n").unwrap();
        let file = path.to_string_lossy().into_owned();

        let without = build_config(&Cli::parse_from(["topic-proxy", "--config", file.as_str()]));
        let with = build_config(&Cli::parse_from([
            "topic-proxy",
            "--config",
            file.as_str(),
            "--default-port",
            "4000",
        ]));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(without, Err(config::ConfigError::Validation(_))));
        assert_eq!(with.unwrap().backend.default_port, 4000);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let cli = Cli::parse_from(["topic-proxy", "--route", "svc-a=0"]);
        assert!(build_config(&cli).is_err());
    }
}
