//! End-to-end scheduler scenarios and property-based invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use neuronote_core::scheduler::{CalendarSlot, Note, Scheduler};
use neuronote_core::SchedulerError;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()
}

fn note(id: &str, due_in_hours: i64, weight: f64) -> Note {
    Note {
        id: id.to_string(),
        due_date: base() + Duration::hours(due_in_hours),
        weight,
    }
}

fn slot(start_min: i64, end_min: i64, busy: bool) -> CalendarSlot {
    CalendarSlot {
        start: base() + Duration::minutes(start_min),
        end: base() + Duration::minutes(end_min),
        busy,
    }
}

/// Calendar: 2h free, 1h busy, 2h free. Notes: n1 due in 24h (weight 1.0),
/// n2 due in 48h (weight 0.8).
#[test]
fn two_note_day_scenario() {
    let scheduler = Scheduler::new();
    let notes = vec![note("n1", 24, 1.0), note("n2", 48, 0.8)];
    let calendar = vec![
        slot(0, 120, false),
        slot(120, 180, true),
        slot(180, 300, false),
    ];

    let blocks = scheduler
        .solve_at(&notes, &calendar, "test-user", base())
        .unwrap();

    // 8 free 30-minute slots, 6 sessions demanded: both notes fill their cap.
    assert_eq!(blocks.len(), 6);

    let busy_start = base() + Duration::minutes(120);
    let busy_end = base() + Duration::minutes(180);
    for block in &blocks {
        assert_eq!(block.user_id, "test-user");
        assert_eq!(block.duration_minutes(), 30);
        assert!(block.start >= base());
        assert!(block.end <= base() + Duration::minutes(300));
        // Nothing lands in the busy hour.
        assert!(
            block.end <= busy_start || block.start >= busy_end,
            "block {:?} overlaps the busy interval",
            block
        );
    }

    // n1 outranks n2 and is serviced first.
    let n1_count = blocks.iter().filter(|b| b.note_id == "n1").count();
    let n2_count = blocks.iter().filter(|b| b.note_id == "n2").count();
    assert_eq!(n1_count, 3);
    assert_eq!(n2_count, 3);
    assert!(blocks[..3].iter().all(|b| b.note_id == "n1"));

    // No slot was handed to more than one block.
    let mut starts: Vec<_> = blocks.iter().map(|b| b.start).collect();
    starts.sort();
    starts.dedup();
    assert_eq!(starts.len(), blocks.len());
}

#[test]
fn all_busy_and_empty_calendars_are_distinguished() {
    let scheduler = Scheduler::new();
    let notes = vec![note("n1", 24, 1.0)];

    // Slots exist but are all busy: success, zero blocks.
    let blocks = scheduler
        .solve_at(&notes, &[slot(0, 120, true)], "test-user", base())
        .unwrap();
    assert!(blocks.is_empty());

    // Discretization itself is empty: NoAvailability.
    let err = scheduler
        .solve_at(&notes, &[], "test-user", base())
        .unwrap_err();
    assert_eq!(err, SchedulerError::NoAvailability);
}

#[test]
fn note_due_before_all_slots_gets_nothing() {
    let scheduler = Scheduler::new();
    let notes = vec![note("stale", -48, 3.0), note("fresh", 24, 0.5)];
    let calendar = vec![slot(0, 90, false)];

    let blocks = scheduler
        .solve_at(&notes, &calendar, "test-user", base())
        .unwrap();

    assert!(blocks.iter().all(|b| b.note_id == "fresh"));
    assert_eq!(blocks.len(), 3);
}

// Non-overlapping calendars with gaps, mixed busy flags and fragment-length
// tails, walked forward from the base time.
fn calendar_strategy() -> impl Strategy<Value = Vec<CalendarSlot>> {
    prop::collection::vec((0i64..120, 0i64..150, any::<bool>()), 0..6).prop_map(|parts| {
        let mut cursor = base();
        let mut calendar = Vec::new();
        for (gap_min, len_min, busy) in parts {
            let start = cursor + Duration::minutes(gap_min);
            let end = start + Duration::minutes(len_min);
            calendar.push(CalendarSlot { start, end, busy });
            cursor = end;
        }
        calendar
    })
}

fn notes_strategy() -> impl Strategy<Value = Vec<Note>> {
    prop::collection::vec((-600i64..6000, 0.1f64..5.0), 0..8).prop_map(|parts| {
        parts
            .into_iter()
            .enumerate()
            .map(|(i, (due_min, weight))| Note {
                id: format!("n{i}"),
                due_date: base() + Duration::minutes(due_min),
                weight,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn allocator_invariants_hold(
        notes in notes_strategy(),
        calendar in calendar_strategy(),
    ) {
        let scheduler = Scheduler::new();
        let blocks = match scheduler.solve_at(&notes, &calendar, "prop-user", base()) {
            Ok(blocks) => blocks,
            Err(SchedulerError::NoAvailability) => {
                // Only legal when every interval is zero-length (or absent).
                prop_assert!(calendar.iter().all(|s| s.start == s.end));
                return Ok(());
            }
        };

        // Per-note cap.
        for n in &notes {
            let count = blocks.iter().filter(|b| b.note_id == n.id).count();
            prop_assert!(count <= 3, "note {} got {count} blocks", n.id);
        }

        for block in &blocks {
            // Canonical duration, shorter only for a truncated tail.
            let minutes = block.duration_minutes();
            prop_assert!(minutes > 0 && minutes <= 30);

            // Never scheduled at or past the note's due date.
            let due = notes.iter().find(|n| n.id == block.note_id).unwrap().due_date;
            prop_assert!(block.end < due);

            // Never inside a busy interval.
            for interval in calendar.iter().filter(|s| s.busy) {
                prop_assert!(block.end <= interval.start || block.start >= interval.end);
            }
        }

        // Slot exclusivity: calendar intervals are non-overlapping by
        // construction, so no two blocks may overlap at all.
        let mut sorted: Vec<_> = blocks.iter().map(|b| (b.start, b.end)).collect();
        sorted.sort();
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0, "blocks overlap: {pair:?}");
        }

        // Determinism for a fixed reference time.
        let again = scheduler.solve_at(&notes, &calendar, "prop-user", base()).unwrap();
        prop_assert_eq!(blocks, again);
    }
}
