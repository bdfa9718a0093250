use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use reviewlens::config::Config;
use reviewlens::db::models::NewApp;
use reviewlens::db::Database;
use reviewlens::output::terminal;
use reviewlens::topics::{chart, perform_topic_modeling_with, Review};

/// reviewlens: adjective topic modeling for app store reviews.
///
/// Imports reviews into a local store, groups them into latent topics by
/// the adjectives they use, and charts the result.
#[derive(Parser)]
#[command(name = "reviewlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import reviews for an app from a .json or .csv file
    Import {
        /// Store identifier of the app (e.g. com.example.app)
        app_id: String,

        /// Review file to load
        file: PathBuf,

        /// Display name for the app (defaults to the file's app_name, then the app id)
        #[arg(long)]
        name: Option<String>,

        /// Replace the app's existing reviews instead of appending
        #[arg(long)]
        replace: bool,
    },

    /// List stored apps
    Apps,

    /// Show an app and its reviews
    Show {
        app_id: String,

        /// Number of reviews to print (default: 20)
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Run topic modeling over an app's reviews
    Topics {
        app_id: String,

        /// Number of topics to fit (default: REVIEWLENS_TOPICS or 5)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        topics: Option<u32>,

        /// Top words listed per topic (default: REVIEWLENS_TOP_WORDS or 10)
        #[arg(long)]
        top_words: Option<u32>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Write the chart PNG to this path when one was rendered
        #[arg(long)]
        chart_out: Option<PathBuf>,
    },

    /// Delete an app and its reviews
    Delete { app_id: String },

    /// Show system status (DB stats, lexicon and chart font)
    Status,

    /// Start the HTTP API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 8080)
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Address to bind to (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reviewlens=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing reviewlens database...");
            let db = init_database(&config)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: reviewlens import <app_id> <reviews.json|reviews.csv>");
        }

        Commands::Import {
            app_id,
            file,
            name,
            replace,
        } => {
            let batch = reviewlens::ingest::load_reviews(&file)?;
            let db = init_database(&config)?;

            let existing = db.get_app(&app_id).await?;
            let app_name = name
                .or(batch.app_name)
                .or_else(|| existing.as_ref().map(|a| a.app_name.clone()))
                .unwrap_or_else(|| app_id.clone());
            let download_count = batch
                .download_count
                .or_else(|| existing.as_ref().map(|a| a.download_count))
                .unwrap_or(0);

            db.upsert_app(&NewApp {
                app_id: app_id.clone(),
                app_name: app_name.clone(),
                download_count,
            })
            .await?;
            let inserted = db.insert_reviews(&app_id, &batch.reviews, replace).await?;
            info!(app_id = %app_id, inserted, replace, "Imported reviews");

            println!(
                "Imported {} reviews for {} ({})",
                inserted.to_string().bold(),
                app_name,
                app_id
            );
        }

        Commands::Apps => {
            let db = open_database(&config)?;
            let apps = db.list_apps().await?;
            terminal::display_app_list(&apps);
        }

        Commands::Show { app_id, limit } => {
            let db = open_database(&config)?;
            let app = require_app(&db, &app_id).await?;
            let reviews = db.get_reviews(&app_id, Some(limit)).await?;
            terminal::display_app_detail(&app, &reviews);
        }

        Commands::Topics {
            app_id,
            topics,
            top_words,
            json,
            chart_out,
        } => {
            let db = open_database(&config)?;
            let app = require_app(&db, &app_id).await?;
            let reviews: Vec<Review> = db
                .get_reviews(&app_id, None)
                .await?
                .iter()
                .map(Review::from)
                .collect();

            let options = config.topic_options(
                topics.map(|t| t as usize),
                top_words.map(|n| n as usize),
            );
            info!(app_id = %app_id, reviews = reviews.len(), "Running topic modeling");
            let result = tokio::task::spawn_blocking(move || {
                perform_topic_modeling_with(&options, &reviews)
            })
            .await
            .context("Topic modeling task failed")?
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                terminal::display_topic_report(&app.app_name, &result);
            }

            if let Some(path) = chart_out {
                match result.chart.as_deref().and_then(chart::decode_data_uri) {
                    Some(png) => {
                        std::fs::write(&path, png)
                            .with_context(|| format!("Failed to write chart to {}", path.display()))?;
                        eprintln!("Chart written to {}", path.display());
                    }
                    None => eprintln!("{}", "No chart was rendered; nothing written.".yellow()),
                }
            }
        }

        Commands::Delete { app_id } => {
            let db = open_database(&config)?;
            if db.delete_app(&app_id).await? {
                println!("Deleted {app_id} and its reviews");
            } else {
                anyhow::bail!("App {app_id} not found");
            }
        }

        Commands::Status => {
            let db = open_database(&config).ok();
            reviewlens::status::show(db.as_ref(), &config).await?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let db = init_database(&config)?;
            reviewlens::web::run_server(config, db, port, &bind).await?;
        }
    }

    Ok(())
}

/// Open an existing database, or bail with a hint to run `init`.
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    #[cfg(feature = "sqlite")]
    {
        reviewlens::db::open_sqlite(&config.db_path)
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        anyhow::bail!(
            "reviewlens was built without a database backend.\n\
             Rebuild with: cargo build --features sqlite"
        )
    }
}

/// Initialize the database (create if needed).
fn init_database(config: &Config) -> Result<Arc<dyn Database>> {
    #[cfg(feature = "sqlite")]
    {
        reviewlens::db::initialize_sqlite(&config.db_path)
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        anyhow::bail!(
            "reviewlens was built without a database backend.\n\
             Rebuild with: cargo build --features sqlite"
        )
    }
}

/// Load an app from the store, or bail with a helpful message.
async fn require_app(
    db: &Arc<dyn Database>,
    app_id: &str,
) -> Result<reviewlens::db::models::AppInfo> {
    db.get_app(app_id).await?.with_context(|| {
        format!("App {app_id} not found. Run `reviewlens apps` to list stored apps.")
    })
}
