use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::cookie::Jar;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fa_scraper::config::Config;
use fa_scraper::cookies::load_cookie_file;
use fa_scraper::{Scraper, Throttle};

#[derive(Parser)]
#[command(
    name = "fa-scraper",
    about = "Rate-limited scraper for FurAffinity posts, favorites and galleries",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a single post as JSON.
    Post {
        /// Post id.
        id: u64,
    },

    /// Print a user's favorites as JSON.
    Favorites {
        /// Username whose favorites to list.
        user: String,

        /// Resume after this favorite id.
        #[arg(long, conflicts_with = "all")]
        after: Option<u64>,

        /// Follow pagination to the last page.
        #[arg(long)]
        all: bool,
    },

    /// Print the post ids on a page of a user's gallery as JSON.
    Gallery {
        /// Username whose gallery to list.
        user: String,

        /// Gallery page, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.base_url,
        throttle_secs = config.throttle.as_secs_f64(),
        "Configuration loaded"
    );

    let jar = match config.cookies_file_path.as_deref() {
        Some(path) => {
            let jar = load_cookie_file(path).context("Failed to load cookies")?;
            info!(path = %path.display(), "Session cookies loaded");
            jar
        }
        None => {
            warn!("No cookies configured - only publicly visible content can be scraped");
            Arc::new(Jar::default())
        }
    };

    let throttle = Arc::new(Throttle::new(config.throttle));
    let scraper =
        Scraper::new(&config, throttle, jar).context("Failed to create HTTP client")?;

    match cli.command {
        Commands::Post { id } => {
            let post = scraper
                .get_post(id)
                .await
                .with_context(|| format!("Failed to fetch post {id}"))?;
            print_json(&post)
        }
        Commands::Favorites { user, after, all } => {
            if all {
                let favorites = scraper
                    .get_all_favorites(&user)
                    .await
                    .with_context(|| format!("Failed to fetch favorites of {user}"))?;
                print_json(&favorites)
            } else {
                let page = scraper
                    .get_favorites(&user, after)
                    .await
                    .with_context(|| format!("Failed to fetch favorites of {user}"))?;
                print_json(&page)
            }
        }
        Commands::Gallery { user, page } => {
            let ids = scraper
                .get_gallery(&user, page)
                .await
                .with_context(|| format!("Failed to fetch gallery page {page} of {user}"))?;
            print_json(&ids)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fa_scraper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries the scraped JSON.
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
