//! Per-category overview lists shown next to the chart.

use serde::{Deserialize, Serialize};
use timeline_core::{Event, EventDate, EventId, EventKind, EventPayload, Germ, Interval};

use crate::courses::match_courses;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryEntry {
    pub event_id: EventId,
    pub date: EventDate,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summaries {
    pub procedures: Vec<SummaryEntry>,
    pub microbiology: Vec<SummaryEntry>,
    pub antibiotics: Vec<Interval>,
}

pub fn summarize(events: &[Event]) -> Summaries {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| {
        let date = event.calendar_date();
        (date.is_none(), date, event.id)
    });

    let entries = |kind: EventKind| -> Vec<SummaryEntry> {
        ordered
            .iter()
            .filter(|event| event.kind() == kind)
            .map(|event| SummaryEntry {
                event_id: event.id,
                date: event.date.clone(),
                text: entry_text(event),
            })
            .collect()
    };

    Summaries {
        procedures: entries(EventKind::Procedure),
        microbiology: entries(EventKind::MicrobiologySample),
        antibiotics: match_courses(events),
    }
}

/// "01.01.2024 - 08.01.2024: Amoxicillin 500mg", or "... - ongoing: ..." for open courses.
pub fn format_course(interval: &Interval) -> String {
    let end = interval
        .end_date
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "ongoing".to_string());
    let label = if interval.label.trim().is_empty() {
        "(no details)"
    } else {
        interval.label.as_str()
    };
    format!(
        "{} - {end}: {label}",
        interval.start_date.format("%d.%m.%Y")
    )
}

/// Entry date in `dd.mm.yyyy`, or the raw text when it does not parse.
pub fn format_entry_date(date: &EventDate) -> String {
    date.calendar()
        .map(|day| day.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| date.as_str().to_string())
}

fn entry_text(event: &Event) -> String {
    match &event.payload {
        EventPayload::MicrobiologySample {
            details,
            sample_type,
            germ,
        } => {
            let germ = match germ {
                Germ::Negative => "negative".to_string(),
                Germ::Identified(organism) => organism.clone(),
            };
            match sample_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                Some(sample_type) => format!("{details} ({sample_type}): {germ}"),
                None => format!("{details}: {germ}"),
            }
        }
        payload => payload.details().to_string(),
    }
}
