//! Study-block scheduler.
//!
//! This module turns notes with due dates and a user's calendar
//! availability into discrete study sessions:
//! - Discretizes raw availability into 30-minute slots
//! - Ranks notes by weight x urgency
//! - Scores candidate slots with a forgetting-curve retention model
//! - Greedily assigns the best slots per note, with a per-note session cap
//!   and slot exclusivity across the run
//!
//! The scheduler is a pure function of its inputs: no storage or network
//! access, no state kept between runs. The reference time is captured once
//! per run, so concurrent runs need no coordination as long as each gets
//! its own inputs. It is a greedy heuristic, not an exact optimizer.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod priority;
mod retention;
mod slots;

pub use priority::{priority, rank_notes, urgency};
pub use retention::{retention, MEMORY_STRENGTH};

use crate::error::{SchedulerError, ValidationError};
use slots::SlotArena;

/// A note queued for spaced-repetition study.
///
/// Immutable for the duration of one scheduling run. The weight is a
/// caller-supplied importance multiplier with no fixed upper bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub due_date: DateTime<Utc>,
    pub weight: f64,
}

/// A raw interval of the user's calendar.
///
/// Half-open `[start, end)`. Intervals may be of arbitrary length; they are
/// decomposed into fixed-length slots before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub busy: bool,
}

/// One scheduled study session binding a note to a time interval.
///
/// The scheduler does not assign a block id; the persistence layer mints
/// one when the block is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyBlock {
    pub user_id: String,
    pub note_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StudyBlock {
    /// Get total duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A full scheduling request as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub notes: Vec<Note>,
    pub calendar: Vec<CalendarSlot>,
}

impl ScheduleRequest {
    /// Caller-side input validation.
    ///
    /// The scheduler accepts any input; rejecting empty or malformed
    /// requests happens at the caller layer before a run is started.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.notes.is_empty() {
            return Err(ValidationError::EmptyCollection("notes".to_string()));
        }
        if self.calendar.is_empty() {
            return Err(ValidationError::EmptyCollection("calendar".to_string()));
        }
        for note in &self.notes {
            if note.weight <= 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("notes[{}].weight", note.id),
                    message: "weight must be positive".to_string(),
                });
            }
        }
        for slot in &self.calendar {
            if slot.end < slot.start {
                return Err(ValidationError::InvalidTimeRange {
                    start: slot.start,
                    end: slot.end,
                });
            }
        }
        Ok(())
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Canonical slot length (minutes)
    pub slot_minutes: i64,
    /// Maximum study sessions per note in one run
    pub max_blocks_per_note: usize,
    /// Strength of memory for the retention curve
    pub memory_strength: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            max_blocks_per_note: 3,
            memory_strength: MEMORY_STRENGTH,
        }
    }
}

/// Greedy study-block scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Generate a study schedule, capturing "now" once for the whole run.
    ///
    /// # Arguments
    /// * `notes` - Notes to schedule, each with a due date and weight
    /// * `calendar` - Raw availability intervals to place sessions into
    /// * `user_id` - Copied verbatim onto every produced block
    ///
    /// # Errors
    /// Returns [`SchedulerError::NoAvailability`] when discretization yields
    /// zero slots. Every other degenerate input (no notes, all slots busy,
    /// all notes past due) succeeds with a possibly empty result.
    pub fn solve(
        &self,
        notes: &[Note],
        calendar: &[CalendarSlot],
        user_id: &str,
    ) -> Result<Vec<StudyBlock>, SchedulerError> {
        self.solve_at(notes, calendar, user_id, Utc::now())
    }

    /// Generate a study schedule against a fixed reference time.
    ///
    /// Identical inputs with an identical `now` produce an identical result.
    pub fn solve_at(
        &self,
        notes: &[Note],
        calendar: &[CalendarSlot],
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudyBlock>, SchedulerError> {
        // 1. Discretize the calendar into fixed-length slots
        let mut arena =
            SlotArena::from_calendar(calendar, Duration::minutes(self.config.slot_minutes));
        if arena.is_empty() {
            return Err(SchedulerError::NoAvailability);
        }

        debug!(
            notes = notes.len(),
            slots = arena.len(),
            "starting scheduling run"
        );

        // 2. Rank notes by weight x urgency
        let ranked = rank_notes(notes, now);

        // 3. Allocate slots in rank order; once a note is processed its
        //    allocation is final (no backtracking across notes)
        let mut blocks = Vec::new();
        let mut sessions: HashMap<&str, usize> = HashMap::new();

        for note in ranked {
            let given = sessions.get(note.id.as_str()).copied().unwrap_or(0);
            // Guards duplicate ids in the ranked list; one entry per id
            // never reaches the cap before its own pass.
            if given >= self.config.max_blocks_per_note {
                continue;
            }

            let wanted = self.config.max_blocks_per_note - given;
            for index in self.best_slots(note, &arena, wanted) {
                let slot = arena.get(index);
                blocks.push(StudyBlock {
                    user_id: user_id.to_string(),
                    note_id: note.id.clone(),
                    start: slot.start,
                    end: slot.end,
                });
                arena.consume(index);
                *sessions.entry(note.id.as_str()).or_insert(0) += 1;
            }
        }

        debug!(blocks = blocks.len(), "scheduling run complete");
        Ok(blocks)
    }

    /// Pick up to `wanted` free, unconsumed slots for a note, best first.
    ///
    /// A slot ending at or after the note's due date is disqualified:
    /// reviewing after the deadline has no modeled value. Surviving slots
    /// are scored by projected retention at the due date scaled by the
    /// note's weight; equal scores fall back to the earliest start so a run
    /// is reproducible.
    fn best_slots(&self, note: &Note, arena: &SlotArena, wanted: usize) -> Vec<usize> {
        if wanted == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = Vec::new();
        for (index, slot) in arena.available() {
            let time_before_due = note.due_date - slot.end;
            if time_before_due <= Duration::zero() {
                continue;
            }
            let score =
                retention(time_before_due, self.config.memory_strength) * note.weight;
            scored.push((index, score));
        }

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| arena.get(a.0).start.cmp(&arena.get(b.0).start))
                .then_with(|| a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(wanted)
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
