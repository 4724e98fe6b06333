mod fetch;
mod filter;
mod notify;
mod parser;
mod store;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use filter::{Posting, Schema};
use notify::{DiscordWebhook, Sink};
use store::NotifiedStore;

const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/SimplifyJobs/Summer2026-Internships/dev/README.md";
const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK_URL";

#[derive(Parser)]
#[command(name = "intern_notify", about = "New-internship notifier for the SimplifyJobs README")]
struct Cli {
    /// Raw source document URL
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    url: String,
    /// Path of the notified-set store
    #[arg(long, default_value = "notified.json")]
    store: PathBuf,
    /// Target country (literal substring match on the location column)
    #[arg(long, default_value = "Canada")]
    country: String,
    /// Job category; also drives the section heading search
    #[arg(long, default_value = "Software Engineering")]
    category: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, filter, and send one webhook per newly-seen posting
    Run,
    /// Run the pipeline and print qualifying postings without sending or saving
    Preview,
    /// Show the persisted notified-set
    Notified {
        /// Max keys to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let store = NotifiedStore::new(&cli.store);

    match cli.command {
        Commands::Run => {
            let endpoint = std::env::var(WEBHOOK_ENV)
                .map_err(|_| anyhow!("set the {WEBHOOK_ENV} environment variable"))?;
            let sink = DiscordWebhook::new(endpoint)?;
            run(&cli, &store, &sink).await
        }
        Commands::Preview => preview(&cli, &store).await,
        Commands::Notified { limit } => {
            let notified = store.load();
            let mut keys: Vec<&String> = notified.iter().collect();
            keys.sort();
            println!("{} notified keys in {}", keys.len(), cli.store.display());
            for key in keys.iter().take(limit) {
                println!("  {key}");
            }
            if keys.len() > limit {
                println!("  ... and {} more", keys.len() - limit);
            }
            Ok(())
        }
    }
}

fn section_keywords(category: &str) -> [String; 2] {
    [format!("{category} Internship Roles"), category.to_string()]
}

/// Fetch + parse + filter. None means the soft "no table rows" outcome.
async fn collect_postings(cli: &Cli, notified: &HashSet<String>) -> Result<Option<Vec<Posting>>> {
    println!("Fetching {} ...", cli.url);
    let document = fetch::fetch_document(&cli.url).await?;

    let keywords = section_keywords(&cli.category);
    let keyword_refs: Vec<&str> = keywords.iter().map(String::as_str).collect();
    let rows = parser::parse_document(&document, &keyword_refs)?;
    if rows.is_empty() {
        println!("No table rows found.");
        return Ok(None);
    }

    let schema = Schema::detect(&rows[0]);
    let postings = filter::qualify(&rows, &schema, &cli.country, notified);
    info!("{} of {} rows qualify", postings.len(), rows.len());
    Ok(Some(postings))
}

async fn run(cli: &Cli, store: &NotifiedStore, sink: &impl Sink) -> Result<()> {
    let mut notified = store.load();
    let Some(postings) = collect_postings(cli, &notified).await? else {
        return Ok(());
    };

    let stats =
        notify::dispatch(&postings, &mut notified, store, sink, &cli.country, &cli.category)
            .await?;
    if stats.sent > 0 {
        println!("Saved {} new notified items.", stats.sent);
    } else {
        println!("No new {} postings to notify.", cli.country);
    }
    Ok(())
}

async fn preview(cli: &Cli, store: &NotifiedStore) -> Result<()> {
    let notified = store.load();
    let Some(postings) = collect_postings(cli, &notified).await? else {
        return Ok(());
    };
    if postings.is_empty() {
        println!("No new {} postings.", cli.country);
        return Ok(());
    }

    println!(
        "{:>3} | {:<24} | {:<28} | {:<20} | {:<6} | Link",
        "#", "Company", "Role", "Location", "Age"
    );
    println!("{}", "-".repeat(100));
    for (i, p) in postings.iter().enumerate() {
        println!(
            "{:>3} | {:<24} | {:<28} | {:<20} | {:<6} | {}",
            i + 1,
            truncate(&p.company, 24),
            truncate(&p.role, 28),
            truncate(&p.location, 20),
            truncate(&p.age, 6),
            p.link.as_deref().unwrap_or("-"),
        );
    }
    println!("\n{} postings would be notified", postings.len());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
