mod config;
pub mod database;

pub use config::{AuthConfig, Config, MlConfig, ScheduleConfig};
pub use database::{Database, NoteRecord, QuizCardRecord, StudyBlockRecord};

use std::path::PathBuf;

/// Returns `~/.config/neuronote[-dev]/` based on NEURONOTE_ENV.
///
/// Set NEURONOTE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("NEURONOTE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("neuronote-dev")
    } else {
        base_dir.join("neuronote")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
