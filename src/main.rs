use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use flashcard_scheduler::clock::{Clock, FixedClock, UtcClock};
use flashcard_scheduler::config::Config;
use flashcard_scheduler::database::SqliteStore;
use flashcard_scheduler::export::{export_set_to_path, import_set_file};
use flashcard_scheduler::{Grade, Scheduler, StudySession};

#[derive(Parser, Debug)]
#[command(name = "flashcards")]
#[command(version)]
#[command(about = "Spaced-repetition scheduling for flashcard sets")]
#[command(propagate_version = true)]
struct Args {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Treat this day (YYYY-MM-DD) as today instead of the current UTC date
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Print results of sets, due, review and progress as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a flashcard set from a JSON file
    Import {
        file: PathBuf,
        #[arg(long)]
        owner: String,
    },

    /// Export a flashcard set to a JSON file
    Export {
        #[arg(long)]
        set: i64,
        file: PathBuf,
    },

    /// List flashcard sets
    Sets,

    /// List cards of a set due for review
    Due {
        #[arg(long)]
        user: String,
        #[arg(long)]
        set: i64,
    },

    /// Grade one card: again, hard, good or easy
    Review {
        #[arg(long)]
        user: String,
        #[arg(long)]
        card: i64,
        #[arg(long)]
        grade: String,
    },

    /// Show review progress on a set
    Progress {
        #[arg(long)]
        user: String,
        #[arg(long)]
        set: i64,
    },

    /// Study the due cards of a set interactively
    Study {
        #[arg(long)]
        user: String,
        #[arg(long)]
        set: i64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        config.database_path = database;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    let today = args.today.unwrap_or_else(|| UtcClock.today());
    let scheduler = Scheduler::new(store, FixedClock(today));

    match args.command {
        Commands::Import { file, owner } => {
            let document = import_set_file(&file)?;
            let set = scheduler.store().import_set(&owner, &document)?;
            println!(
                "Imported '{}' as set {} ({} cards)",
                set.title,
                set.id,
                document.flashcards.len()
            );
        }
        Commands::Export { set, file } => {
            let document = scheduler.store().set_document(set)?;
            export_set_to_path(&document, &file)?;
            println!("Exported set {} to {}", set, file.display());
        }
        Commands::Sets => {
            let sets = scheduler.store().list_sets()?;
            if args.json {
                return print_json(&sets);
            }
            for set in sets {
                println!("{:>4}  {}  (owner {})", set.id, set.title, set.owner_id);
            }
        }
        Commands::Due { user, set } => {
            let due = scheduler.list_due_cards(&user, set, today)?;
            if args.json {
                return print_json(&due);
            }
            println!("{} cards due on {}", due.len(), today);
            for card in due {
                println!("{:>6}  {}", card.id, card.front);
            }
        }
        Commands::Review { user, card, grade } => {
            let outcome = scheduler.submit_review(&user, card, grade.as_str())?;
            if args.json {
                return print_json(&outcome);
            }
            println!(
                "Card {}: next review on {} (interval {} days, repetitions {}, easiness {:.2})",
                outcome.card_id,
                outcome.next_review_date,
                outcome.interval,
                outcome.repetitions,
                outcome.easiness_factor
            );
        }
        Commands::Progress { user, set } => {
            let progress = scheduler.set_progress(&user, set, today)?;
            if args.json {
                return print_json(&progress);
            }
            println!(
                "{} cards: {} new, {} due, {} scheduled later",
                progress.total, progress.new, progress.due, progress.scheduled
            );
        }
        Commands::Study { user, set } => {
            let session = StudySession::start(&scheduler, &user, set, config.max_reviews_per_card)?;
            run_study(&scheduler, session)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_study(scheduler: &Scheduler<SqliteStore, FixedClock>, mut session: StudySession) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    if session.is_completed() {
        println!("Nothing due. Come back later!");
        return Ok(());
    }

    let mut round = 0;
    while let Some(card) = session.current_card().cloned() {
        if session.round_number != round {
            round = session.round_number;
            println!("\n{}", session.phase_message());
        }

        println!("\n[{} left] {}", session.remaining_count(), card.front);
        print!("Press Enter to reveal... ");
        stdout.flush()?;
        if lines.next().transpose()?.is_none() {
            return Ok(());
        }
        println!("{}", card.back);

        let grade = loop {
            print!("Grade (again/hard/good/easy): ");
            stdout.flush()?;
            let Some(line) = lines.next().transpose()? else {
                return Ok(());
            };
            match line.parse::<Grade>() {
                Ok(grade) => break grade,
                Err(err) => println!("{}", err),
            }
        };

        if let Some(outcome) = session.grade_current(scheduler, grade)? {
            println!("Next review on {}", outcome.next_review_date);
        }
    }

    println!("\nSession complete: {} reviews.", session.total_reviews());
    Ok(())
}
