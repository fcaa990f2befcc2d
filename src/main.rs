use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use tripfeed::config::{Config, MAX_RADIUS_METERS};
use tripfeed::feed::{spawn_feed, FeedCommand, FeedController, FeedHandle, FeedOptions, FeedSnapshot};
use tripfeed::location::FixedLocation;
use tripfeed::provider::TourApiClient;
use tripfeed::site::{ContentType, Coordinate, QueryAnchor, SiteSummary};
use tripfeed::util::{display_width, truncate_to_width};

/// Column width reserved for titles in listing output.
const TITLE_WIDTH: usize = 36;

/// Get the config directory path (~/.config/tripfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("tripfeed"))
}

#[derive(Parser, Debug)]
#[command(name = "tripfeed", about = "Browse tourist sites from the tourism open API")]
struct Args {
    /// Config file (defaults to ~/.config/tripfeed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sites around a position, nearest first
    Nearby {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search radius in meters (defaults to the configured radius)
        #[arg(long)]
        radius: Option<u32>,

        /// Category name or numeric content type id
        #[arg(long)]
        category: Option<ContentType>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100))]
        pages: u32,
    },
    /// Sites matching a keyword, or every site of a category
    Search {
        /// Search keyword
        #[arg(long)]
        keyword: Option<String>,

        /// Category name or numeric content type id
        #[arg(long)]
        category: Option<ContentType>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100))]
        pages: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so that listings on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();
    tracing::debug!(?config, "Configuration ready");

    let client = TourApiClient::new(&config).context("Failed to set up tourism API client")?;
    let mut options = FeedOptions::from_config(&config);

    let (mut feed, pages) = match args.command {
        Command::Nearby {
            lat,
            lon,
            radius,
            category,
            pages,
        } => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                anyhow::bail!("Coordinates out of range: {}, {}", lat, lon);
            }
            if let Some(radius) = radius {
                if radius == 0 || radius > MAX_RADIUS_METERS {
                    anyhow::bail!("Radius must be between 1 and {} meters", MAX_RADIUS_METERS);
                }
                options.location_radius_meters = radius;
            }
            options.location_category = category;

            // The position arrives the same way a device fix would
            let (controller, events) = FeedController::new(Arc::new(client), options);
            let location = FixedLocation::new(Coordinate::new(lat, lon));
            (spawn_feed(controller, events, location), pages)
        }
        Command::Search {
            keyword,
            category,
            pages,
        } => {
            let anchor = QueryAnchor::keyword(keyword.unwrap_or_default()).with_category(category);
            let (controller, events) = FeedController::new(Arc::new(client), options);
            let feed = spawn_feed(controller, events, FixedLocation::unavailable());
            feed.send(FeedCommand::SetAnchor(anchor))
                .await
                .context("Feed stopped before the search started")?;
            (feed, pages)
        }
    };

    let result = print_pages(&mut feed, pages).await;
    feed.shutdown().await;
    result
}

/// Print up to `pages` pages, asking the feed for more after each one.
async fn print_pages(feed: &mut FeedHandle, pages: u32) -> Result<()> {
    let mut snapshot = next_settled(feed, 0).await?;
    if let Some(anchor) = &snapshot.anchor {
        eprintln!("{}: {} sites", anchor, snapshot.total_count);
    }

    let mut printed = 0;
    let mut loaded = 1;
    loop {
        for (index, site) in snapshot.items.iter().enumerate().skip(printed) {
            println!("{}", format_row(index + 1, site));
        }
        printed = snapshot.items.len();

        if let Some(error) = &snapshot.last_error {
            return Err(anyhow::Error::new(error.clone()));
        }
        if loaded >= pages || !snapshot.can_load_more {
            break;
        }

        let before = snapshot.generation;
        feed.send(FeedCommand::NearEnd(printed.saturating_sub(1)))
            .await
            .context("Feed stopped while loading more")?;
        snapshot = next_settled(feed, before).await?;
        loaded += 1;
    }

    if snapshot.items.is_empty() {
        eprintln!("No sites found");
    }
    Ok(())
}

/// Wait for the first settled snapshot from a fetch newer than `after`.
async fn next_settled(feed: &mut FeedHandle, after: u64) -> Result<FeedSnapshot> {
    feed.wait_for(|s| s.generation > after && s.is_settled())
        .await
        .context("Feed stopped unexpectedly")
}

fn format_row(number: usize, site: &SiteSummary) -> String {
    let title = truncate_to_width(&site.title, TITLE_WIDTH);
    let padding = TITLE_WIDTH.saturating_sub(display_width(&title));
    let distance = match site.distance_meters {
        Some(m) if m >= 1000.0 => format!("{:>7.1}km", m / 1000.0),
        Some(m) => format!("{:>7.0}m ", m),
        None => " ".repeat(9),
    };
    format!(
        "{:>4}. {}{}  {}  {}",
        number,
        title,
        " ".repeat(padding),
        distance,
        site.address
    )
}
