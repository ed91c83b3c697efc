use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use windowguard::config::WindowGuardConfig;
use windowguard::ratelimit::{AdmissionStore, MemoryStore, RedisStore, SlidingWindowLimiter};

/// Fire concurrent requests for several users through the sliding window limiter.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Use an in-process store instead of Redis
    #[arg(long)]
    in_memory: bool,

    /// Requests fired per user
    #[arg(long, default_value_t = 8)]
    requests: u32,

    /// Pause between requests of one user, in milliseconds
    #[arg(long, default_value_t = 150)]
    interval_ms: u64,

    /// User and limit as `name=limit`; may be repeated
    #[arg(long = "user", value_parser = parse_user)]
    users: Vec<(String, i64)>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn parse_user(s: &str) -> Result<(String, i64), String> {
    let (name, limit) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=limit, got '{}'", s))?;
    let limit = limit
        .parse()
        .map_err(|e| format!("invalid limit '{}': {}", limit, e))?;
    Ok((name.to_string(), limit))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init();
    }

    info!("Starting WindowGuard demo");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = WindowGuardConfig::load(args.config.as_deref())?;
    info!(
        window_ms = config.limiter.window_ms,
        namespace = %config.limiter.namespace,
        "Configuration loaded"
    );

    let users = if args.users.is_empty() {
        vec![
            ("userA".to_string(), 5),
            ("userB".to_string(), 10),
            ("userC".to_string(), 3),
        ]
    } else {
        args.users.clone()
    };

    if args.in_memory {
        let store = MemoryStore::new();
        let limiter = SlidingWindowLimiter::with_config(Arc::new(store), &config.limiter);
        run_demo(limiter, users, &args).await;
    } else {
        let store = RedisStore::connect(&config.redis).await?;
        let limiter = SlidingWindowLimiter::with_config(Arc::new(store), &config.limiter);
        run_demo(limiter, users, &args).await;

        println!("\nDemo finished. Check Redis keys with:");
        println!(
            "  redis-cli ZRANGE {}:<id> 0 -1 WITHSCORES",
            config.limiter.namespace
        );
    }

    Ok(())
}

/// Spawn one task per user, each firing its requests at a fixed pace.
async fn run_demo<S: AdmissionStore + 'static>(
    limiter: SlidingWindowLimiter<S>,
    users: Vec<(String, i64)>,
    args: &Args,
) {
    let requests = args.requests;
    let interval = Duration::from_millis(args.interval_ms);

    let handles: Vec<_> = users
        .into_iter()
        .map(|(user, limit)| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                for i in 1..=requests {
                    match limiter.decide(&user, limit).await {
                        Ok(true) => println!("[{}] Request {}: allowed", user, i),
                        Ok(false) => println!("[{}] Request {}: rate limited", user, i),
                        Err(e) => {
                            println!("[{}] Request {}: rejected ({})", user, i, e);
                            break;
                        }
                    }
                    tokio::time::sleep(interval).await;
                }
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            error!(error = %e, "Demo task failed");
        }
    }
}
