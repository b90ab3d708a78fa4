use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

use ipintel::output::terminal;
use ipintel::{CheckType, Config, IpIntelClient, RateLimiter};

/// ipintel: look up proxy/VPN likelihood scores from getipintel.net.
///
/// Queries are throttled to the service's limit of 15 per minute.
#[derive(Parser)]
#[command(name = "ipintel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more IP addresses
    Score {
        /// IP addresses to check
        #[arg(required = true)]
        ips: Vec<String>,

        /// Use the dynamic (list + machine learning) check
        #[arg(long)]
        dynamic: bool,

        /// Query over https
        #[arg(long)]
        tls: bool,

        /// Max seconds to wait for a query slot (0 = wait as long as needed)
        #[arg(long)]
        max_wait: Option<f64>,
    },

    /// Print the request URL for an IP without sending it
    Url {
        /// IP address to build the URL for
        ip: String,
    },

    /// Show the rate limit this client enforces
    Limits,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ipintel=info")),
        )
        .init();

    let cli = Cli::parse();

    // One bucket for the whole process
    let limiter = RateLimiter::getipintel();

    match cli.command {
        Commands::Score {
            ips,
            dynamic,
            tls,
            max_wait,
        } => {
            let mut config = Config::load()?;
            if dynamic {
                config.check = CheckType::Dynamic;
            }
            if tls {
                config.use_tls = true;
            }
            if let Some(secs) = max_wait {
                config.max_wait = Duration::try_from_secs_f64(secs)
                    .map_err(|e| anyhow::anyhow!("Invalid --max-wait {secs}: {e}"))?;
            }
            config.require_contact()?;

            let client = build_client(&config, limiter)?;
            info!(
                count = ips.len(),
                check = %config.check,
                "Scoring IP addresses"
            );

            // A bar for a single lookup is just noise
            let pb = if ips.len() > 1 {
                ProgressBar::new(ips.len() as u64)
            } else {
                ProgressBar::hidden()
            };
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Scoring [{bar:30}] {pos}/{len} ({eta})")
                    .unwrap(),
            );

            let mut results = Vec::with_capacity(ips.len());
            for ip in &ips {
                results.push((ip.clone(), client.score(ip).await));
                pb.inc(1);
            }
            pb.finish_and_clear();

            terminal::display_scores(&results, config.check);
        }

        Commands::Url { ip } => {
            let config = Config::load()?;
            config.require_contact()?;
            let client = build_client(&config, limiter)?;
            println!("{}", client.check_url(&ip));
        }

        Commands::Limits => {
            terminal::display_limits(
                limiter.capacity(),
                limiter.refill_interval().as_secs(),
                limiter.refill_quantum(),
                limiter.available().await,
            );
        }
    }

    Ok(())
}

fn build_client(config: &Config, limiter: RateLimiter) -> Result<IpIntelClient> {
    let client = IpIntelClient::new(config.client_config(), limiter)?;
    Ok(match &config.base_url {
        Some(url) => client.with_base_url(url),
        None => client,
    })
}
