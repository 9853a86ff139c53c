//! Note priority ranking.
//!
//! Urgency is the inverse of the time remaining until a note's due date;
//! priority is the note's weight scaled by urgency. Higher-priority notes
//! get first pick of the available slots.

use chrono::{DateTime, Utc};

use super::Note;

/// Urgency of a note at `now`: 1 / (days_until_due + 1).
///
/// days_until_due is fractional and may be negative for overdue notes; the
/// +1 offset keeps the value finite when the due date is imminent or has
/// just passed.
pub fn urgency(note: &Note, now: DateTime<Utc>) -> f64 {
    let days_until_due = (note.due_date - now).num_seconds() as f64 / 86_400.0;
    1.0 / (days_until_due + 1.0)
}

/// Priority score used to order notes: weight x urgency.
pub fn priority(note: &Note, now: DateTime<Utc>) -> f64 {
    note.weight * urgency(note, now)
}

/// Notes sorted by priority, highest first.
///
/// Equal priorities keep their input order (stable sort); the order between
/// ties is not part of the contract.
pub fn rank_notes<'a>(notes: &'a [Note], now: DateTime<Utc>) -> Vec<&'a Note> {
    let mut ranked: Vec<(&Note, f64)> = notes
        .iter()
        .map(|note| (note, priority(note, now)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(note, _)| note).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_note(id: &str, due_in_hours: i64, weight: f64, now: DateTime<Utc>) -> Note {
        Note {
            id: id.to_string(),
            due_date: now + Duration::hours(due_in_hours),
            weight,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    #[test]
    fn closer_due_date_ranks_first() {
        let now = fixed_now();
        let notes = vec![
            make_note("later", 48, 1.0, now),
            make_note("sooner", 24, 1.0, now),
        ];

        let ranked = rank_notes(&notes, now);
        assert_eq!(ranked[0].id, "sooner");
        assert_eq!(ranked[1].id, "later");
    }

    #[test]
    fn weight_scales_priority() {
        let now = fixed_now();
        let notes = vec![
            make_note("light", 24, 0.5, now),
            make_note("heavy", 24, 2.0, now),
        ];

        let ranked = rank_notes(&notes, now);
        assert_eq!(ranked[0].id, "heavy");
    }

    #[test]
    fn imminent_due_date_stays_finite() {
        let now = fixed_now();
        let due_now = make_note("due-now", 0, 1.0, now);
        assert!(priority(&due_now, now).is_finite());
        assert_eq!(priority(&due_now, now), 1.0);
    }

    #[test]
    fn overdue_note_still_ranks() {
        let now = fixed_now();
        // Half a day overdue: urgency = 1 / (-0.5 + 1) = 2.
        let overdue = make_note("overdue", -12, 1.0, now);
        assert!((priority(&overdue, now) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order() {
        let now = fixed_now();
        let notes = vec![
            make_note("first", 24, 1.0, now),
            make_note("second", 24, 1.0, now),
        ];

        let ranked = rank_notes(&notes, now);
        assert_eq!(ranked[0].id, "first");
        assert_eq!(ranked[1].id, "second");
    }
}
