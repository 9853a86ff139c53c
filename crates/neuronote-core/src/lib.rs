//! # NeuroNote Core Library
//!
//! This library provides the core business logic for the NeuroNote study
//! backend. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any HTTP-facing layer being
//! a thin shell over the same core library.
//!
//! ## Architecture
//!
//! - **Scheduler**: A pure greedy study-block scheduler that ranks notes by
//!   urgency and scores calendar slots with a forgetting-curve retention
//!   model
//! - **Storage**: SQLite persistence for notes, quiz cards, study blocks,
//!   and auth sessions, plus TOML-based configuration
//! - **Auth**: HMAC-signed session tokens carrying a verified user id
//! - **ML client**: Async client for the external note-extraction service
//!
//! ## Key Components
//!
//! - [`Scheduler`]: Greedy slot allocator
//! - [`Database`]: Note and study-block persistence
//! - [`Config`]: Application configuration management
//! - [`TokenSigner`]: Session token issuing and verification
//! - [`MlClient`]: ML pipeline access

pub mod auth;
pub mod error;
pub mod ml;
pub mod scheduler;
pub mod storage;

pub use auth::{SessionClaims, TokenSigner};
pub use error::{
    AuthError, ConfigError, CoreError, DatabaseError, MlError, SchedulerError, ValidationError,
};
pub use ml::{MlClient, OcrBlock};
pub use scheduler::{
    CalendarSlot, Note, ScheduleRequest, Scheduler, SchedulerConfig, StudyBlock,
};
pub use storage::{Config, Database, NoteRecord, QuizCardRecord, StudyBlockRecord};
