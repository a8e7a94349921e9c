use chrono::Utc;
use clap::{Parser, Subcommand};
use simple_blog::config;
use simple_blog::output;
use simple_blog::search::SearchIndex;
use simple_blog::storage::FileStorage;
use simple_blog::subscribe::SubscriptionStore;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Admin tools for a small bilingual blog page")]
#[command(long_about = "\
Admin tools for a small bilingual blog page

The page keeps its state client-side: a fixed article catalog for search,
fruit-tree links for the portfolio widget, and an email subscriber list in
local storage. These commands work on the same data from the terminal.

Files:

  site/
  └── config.toml              # Articles, fruit links, element ids, timings
  .simple-blog/
  └── storage.json             # Local storage: the subscriber list lives here

Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = "site", global = true)]
    config: PathBuf,

    /// Local storage file
    #[arg(long, default_value = ".simple-blog/storage.json", global = true)]
    storage: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the article catalog
    Search {
        /// Keyword, matched case-insensitively
        query: String,
    },
    /// Add an email address to the subscriber list
    Subscribe { email: String },
    /// List subscribers
    Subscribers,
    /// Write the subscriber list to subscribers-YYYY-MM-DD.json
    Export {
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// List fruit-tree links
    Fruits,
    /// Validate config.toml without changing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Search { query } => {
            let site_config = config::load_config(&cli.config)?;
            let index = SearchIndex::new(site_config.articles);
            output::print_search(&index, &query);
        }
        Command::Subscribe { email } => {
            let site_config = config::load_config(&cli.config)?;
            let mut store = open_store(&cli.storage, &site_config);
            let outcome = store.subscribe(&email, Utc::now())?;
            println!("{}", outcome.message());
        }
        Command::Subscribers => {
            let site_config = config::load_config(&cli.config)?;
            let store = open_store(&cli.storage, &site_config);
            output::print_subscribers(&store.subscribers());
        }
        Command::Export { out } => {
            let site_config = config::load_config(&cli.config)?;
            let store = open_store(&cli.storage, &site_config);
            let count = store.subscribers().len();
            let export = store.export(Utc::now().date_naive())?;
            std::fs::create_dir_all(&out)?;
            let path = out.join(&export.filename);
            std::fs::write(&path, &export.contents)?;
            println!("{}", output::format_export(&export, count, &path));
        }
        Command::Fruits => {
            let site_config = config::load_config(&cli.config)?;
            output::print_fruits(&site_config.fruits);
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.join("config.toml").display());
            let site_config = config::load_config(&cli.config)?;
            output::print_config_summary(&site_config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn open_store(path: &std::path::Path, site_config: &config::SiteConfig) -> SubscriptionStore<FileStorage> {
    SubscriptionStore::new(
        FileStorage::new(path),
        site_config.subscribe.storage_key.clone(),
    )
}
