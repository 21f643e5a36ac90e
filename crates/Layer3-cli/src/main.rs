//! Dispatch CLI - Main entry point

mod tcp;

use clap::{Parser, ValueEnum};
use dispatch_balancer::{CallContext, Dispatcher};
use dispatch_foundation::{DispatchConfig, StrategyConfig};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dispatch - send one request to a pool of line-based TCP backends
#[derive(Parser, Debug)]
#[command(name = "dispatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend instance as host:port (repeatable, replaces the config list)
    #[arg(short, long = "instance")]
    instances: Vec<String>,

    /// Endpoint selection strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Seed for the random strategy
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum attempts, including the first
    #[arg(short, long)]
    attempts: Option<u32>,

    /// Budget for the whole call in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Request line to send
    request: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum StrategyArg {
    RoundRobin,
    Random,
}

/// File config (if any) with command-line flags layered on top
fn resolve_config(args: &Args) -> anyhow::Result<DispatchConfig> {
    let mut config = match &args.config {
        Some(path) => DispatchConfig::load(path)?,
        None => DispatchConfig::default(),
    };

    config.merge(DispatchConfig::new().instances(args.instances.iter().cloned()));

    // Flags always win, even when they repeat a default value
    if let Some(attempts) = args.attempts {
        config.retry.max_attempts = attempts;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.retry.timeout_ms = timeout_ms;
    }

    config.strategy = match (args.strategy, config.strategy) {
        (Some(StrategyArg::RoundRobin), _) => StrategyConfig::RoundRobin,
        (Some(StrategyArg::Random), StrategyConfig::Random { seed }) => StrategyConfig::Random {
            seed: args.seed.or(seed),
        },
        (Some(StrategyArg::Random), StrategyConfig::RoundRobin) => {
            StrategyConfig::Random { seed: args.seed }
        }
        (None, StrategyConfig::Random { seed }) => StrategyConfig::Random {
            seed: args.seed.or(seed),
        },
        (None, StrategyConfig::RoundRobin) => {
            if args.seed.is_some() {
                warn!("--seed ignored by the round robin strategy");
            }
            StrategyConfig::RoundRobin
        }
    };

    config.validate()?;
    Ok(config)
}

/// One-line summary of why a dispatched call failed
fn failure_hint(err: &dispatch_foundation::Error) -> &'static str {
    if err.is_terminal() {
        "call budget ran out before any backend answered"
    } else if err.is_retryable() {
        "every attempt failed"
    } else {
        "call failed"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let config = resolve_config(&args)?;
    if config.instances.is_empty() {
        anyhow::bail!("no instances configured (use --instance or a config file)");
    }
    debug!(?config, "Resolved configuration");

    let dispatcher = Dispatcher::from_config(&config, tcp::tcp_factory)?;
    if dispatcher.publisher().len() < config.instances.len() {
        warn!(
            live = dispatcher.publisher().len(),
            configured = config.instances.len(),
            "Some instances could not be resolved"
        );
    }

    // Ctrl-C cancels the in-flight call
    let ctx = CallContext::background();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling call");
            interrupt.cancel();
        }
    });

    let response = match dispatcher.call(&ctx, args.request.clone()).await {
        Ok(response) => response,
        Err(e) => {
            let err = dispatch_foundation::Error::from(e);
            let hint = failure_hint(&err);
            return Err(anyhow::Error::new(err).context(hint));
        }
    };
    println!("{}", response);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dispatch").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_only() {
        let args = parse(&["-i", "a:1", "-i", "b:2", "--strategy", "random", "--seed", "9", "ping"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.instances, vec!["a:1", "b:2"]);
        assert_eq!(config.strategy, StrategyConfig::Random { seed: Some(9) });
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(args.request, "ping");
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            instances = ["file:1"]

            [strategy]
            kind = "random"
            seed = 5

            [retry]
            max_attempts = 7
            timeout_ms = 250
            "#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "--attempts", "3", "req"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.instances, vec!["file:1"]);
        assert_eq!(config.strategy, StrategyConfig::Random { seed: Some(5) });
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.timeout_ms, 250);

        let args = parse(&["--config", path, "--strategy", "round-robin", "-i", "cli:2", "req"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.instances, vec!["cli:2"]);
        assert_eq!(config.strategy, StrategyConfig::RoundRobin);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = parse(&["-i", "a:1", "--timeout-ms", "0", "req"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_failure_hint() {
        use dispatch_foundation::Error;

        assert_eq!(failure_hint(&Error::DeadlineExceeded), "call budget ran out before any backend answered");
        assert_eq!(failure_hint(&Error::Cancelled), "call budget ran out before any backend answered");
        assert_eq!(failure_hint(&Error::NoEndpoints), "every attempt failed");
        assert_eq!(failure_hint(&Error::Endpoint("refused".into())), "every attempt failed");
        assert_eq!(failure_hint(&Error::Internal("panicked".into())), "call failed");
    }
}
