use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use neuronote_core::scheduler::{ScheduleRequest, Scheduler};
use neuronote_core::{Config, Database};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Plan study blocks from a JSON request file
    Plan {
        /// Path to a JSON file with {"notes": [...], "calendar": [...]}
        #[arg(long)]
        input: PathBuf,
        /// User the blocks belong to
        #[arg(long)]
        user: String,
        /// Persist the planned blocks
        #[arg(long)]
        save: bool,
        /// Fix the reference time (RFC 3339) instead of the current instant
        #[arg(long)]
        at: Option<String>,
    },
    /// List stored study blocks
    List {
        #[arg(long)]
        user: String,
        /// Include blocks that already started
        #[arg(long)]
        all: bool,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScheduleAction::Plan {
            input,
            user,
            save,
            at,
        } => {
            let raw = std::fs::read_to_string(&input)?;
            let request: ScheduleRequest = serde_json::from_str(&raw)?;
            request.validate()?;

            let now = match at {
                Some(at) => DateTime::parse_from_rfc3339(&at)?.with_timezone(&Utc),
                None => Utc::now(),
            };

            let config = Config::load_or_default();
            let scheduler = Scheduler::with_config(config.scheduler_config());
            let blocks = scheduler.solve_at(&request.notes, &request.calendar, &user, now)?;

            if save {
                let mut db = Database::open()?;
                let records = db.save_study_blocks(&blocks)?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            }
        }
        ScheduleAction::List { user, all } => {
            let db = Database::open()?;
            let blocks = if all {
                db.blocks_for_user(&user)?
            } else {
                db.upcoming_blocks(&user, Utc::now())?
            };
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        }
    }
    Ok(())
}
