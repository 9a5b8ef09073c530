//! Antibiotic course reconstruction.
//!
//! Every `AntibioticStart` becomes one [`Interval`]. Its end is the earliest
//! unconsumed `AntibioticEnd` on or after the start date whose drug token
//! matches, or a generic (detail-less) stop. An end event closes at most one
//! course.

use std::collections::HashSet;

use chrono::NaiveDate;
use timeline_core::{Event, EventId, EventKind, Interval};
use tracing::warn;

/// First whitespace-delimited word of `details`, lower-cased.
pub fn drug_token(details: &str) -> Option<String> {
    details.split_whitespace().next().map(str::to_lowercase)
}

/// Pair antibiotic starts with their stops. Input order does not matter.
pub fn match_courses(events: &[Event]) -> Vec<Interval> {
    let starts = collect_dated(events, EventKind::AntibioticStart);
    let ends = collect_dated(events, EventKind::AntibioticEnd);

    let mut consumed: HashSet<EventId> = HashSet::new();
    let mut intervals = Vec::with_capacity(starts.len());

    for start in &starts {
        let start_token = start.token.as_deref();

        let mut candidates: Vec<&DatedEvent<'_>> = ends
            .iter()
            .filter(|end| !consumed.contains(&end.event.id) && end.date >= start.date)
            .collect();
        // Stable: equal keys keep (date, id) order from `collect_dated`.
        candidates.sort_by_key(|end| (end.date, candidate_rank(start_token, end.token.as_deref())));

        let accepted = candidates
            .into_iter()
            .find(|end| accepts(start_token, end.token.as_deref()));

        let (end_date, source_end_id) = match accepted {
            Some(end) => {
                consumed.insert(end.event.id);
                (Some(end.date), Some(end.event.id))
            }
            None => (None, None),
        };

        intervals.push(Interval {
            start_date: start.date,
            end_date,
            label: start.event.details().to_string(),
            source_start_id: start.event.id,
            source_end_id,
        });
    }

    intervals
}

struct DatedEvent<'a> {
    event: &'a Event,
    date: NaiveDate,
    token: Option<String>,
}

fn collect_dated(events: &[Event], kind: EventKind) -> Vec<DatedEvent<'_>> {
    let mut dated: Vec<DatedEvent<'_>> = events
        .iter()
        .filter(|event| event.kind() == kind)
        .filter_map(|event| match event.calendar_date() {
            Some(date) => Some(DatedEvent {
                event,
                date,
                token: drug_token(event.details()),
            }),
            None => {
                warn!(
                    event_id = %event.id,
                    date = event.date.as_str(),
                    "skipping {kind} with malformed date"
                );
                None
            }
        })
        .collect();
    dated.sort_by_key(|item| (item.date, item.event.id));
    dated
}

/// 0 = same drug, 1 = generic stop, 2 = some other drug.
fn candidate_rank(start_token: Option<&str>, end_token: Option<&str>) -> u8 {
    match end_token {
        Some(token) if Some(token) == start_token => 0,
        None => 1,
        Some(_) => 2,
    }
}

fn accepts(start_token: Option<&str>, end_token: Option<&str>) -> bool {
    match (start_token, end_token) {
        (_, None) | (None, _) => true,
        (Some(start), Some(end)) => start == end,
    }
}
