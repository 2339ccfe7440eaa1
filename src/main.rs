use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use flashcard_review::audio::player_from_config;
use flashcard_review::catalog::{export_catalog, load_catalog};
use flashcard_review::config::{Backend, Config};
use flashcard_review::store::open_store;
use flashcard_review::{ItemId, ReviewSession, ReviewableItem, Score};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashcards", about = "Spaced-repetition flashcard review", version)]
struct Cli {
    /// Config file (default: <config dir>/flashcards/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog of items to review, overrides the config file
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Review as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Progress store, overrides the config file
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List items due for review
    Due,

    /// Record a recall score (0 = blackout, 5 = perfect) for an item
    Review { id: String, score: Score },

    /// Show the review history of an item
    History { id: String },

    /// Speak the answer of an item
    Speak { id: String },

    /// Show review statistics
    Stats,

    /// Write the catalog with the current schedule of every item
    Export { path: PathBuf },
}

fn print_item(item: &ReviewableItem) {
    println!(
        "{:>6}  {} = {}  (next {}, every {}d, rep {}, EF {:.2})",
        item.id,
        item.term,
        item.meaning,
        item.next_review,
        item.interval,
        item.repetition,
        item.easiness_factor
    );
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(catalog) = cli.catalog {
        config.catalog = Some(catalog);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    let catalog_path = config
        .catalog
        .clone()
        .context("No catalog given, pass --catalog or set `catalog` in the config file")?;
    let items = load_catalog(&catalog_path, today)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    let store = open_store(&config).context("Failed to open progress store")?;
    let audio = player_from_config(&config.audio);
    let mut session = ReviewSession::start(items, store, audio, today)
        .with_speak_version(config.audio.speak_version.clone());

    match cli.command {
        Command::Due => {
            let due = session.due_items();
            println!("{} item(s) due on {}", due.len(), today);
            for item in due {
                print_item(item);
            }
        }
        Command::Review { id, score } => {
            let item = session.apply_score_to(&ItemId::new(id), score)?;
            println!("Score {} recorded.", score);
            print_item(item);
        }
        Command::History { id } => {
            let id = ItemId::new(id);
            let record = session
                .history(&id)
                .with_context(|| format!("Unknown item: {}", id))?;
            let scores: Vec<String> = record.performance.iter().map(|s| s.to_string()).collect();
            match record.last_reviewed {
                Some(date) => println!("{}: last reviewed {}", id, date),
                None => println!("{}: never reviewed", id),
            }
            println!("Scores: [{}]", scores.join(", "));
        }
        Command::Speak { id } => {
            session.play_answer_of(&ItemId::new(id))?;
        }
        Command::Stats => {
            let stats = session.stats();
            println!("Items:    {}", stats.total);
            println!("Reviewed: {}", stats.reviewed);
            println!("Due:      {}", stats.due);
            println!("Passed:   {}", stats.passed);
            println!("Failed:   {}", stats.failed);
        }
        Command::Export { path } => {
            export_catalog(session.items(), &path)
                .with_context(|| format!("Failed to export catalog to {}", path.display()))?;
            println!("Exported {} items to {}", session.items().len(), path.display());
        }
    }

    Ok(())
}
