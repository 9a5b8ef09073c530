use std::fs;

use chrono::NaiveDate;
use serde_json::Value;
use timeline_core::{EventId, EventLog, TimelineConfig, TimelineDocument};
use timeline_layout::{
    layout_timeline, summarize, SkipReason, SkippedEvent, TickUnit, Track,
};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_log() -> EventLog {
    let raw = fs::read_to_string(fixture_path("knee_infection_events.json"))
        .expect("Không đọc được nhật ký mẫu");
    let document = TimelineDocument::from_json(&raw).expect("Tài liệu mẫu không hợp lệ");
    let (_, log) = EventLog::from_document(document).expect("Không dựng được nhật ký");
    log
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("ngày hợp lệ")
}

#[test]
fn summaries_match_golden() {
    let log = load_log();
    let actual = serde_json::to_value(summarize(log.events())).expect("Không serialize tóm tắt");

    let expected = fs::read_to_string(fixture_path("knee_infection_summary.json"))
        .expect("Không đọc được golden");
    let expected: Value = serde_json::from_str(&expected).expect("Golden không hợp lệ");

    assert_eq!(actual, expected);
}

#[test]
fn layout_covers_every_track() {
    let log = load_log();
    let config = TimelineConfig::default();
    let view = layout_timeline(log.events(), &config);
    let chart = view.chart().expect("Phải có biểu đồ");

    assert_eq!(chart.scale.min.date(), ymd(2023, 12, 31));
    assert_eq!(chart.scale.max.date(), ymd(2024, 2, 16));

    assert_eq!(chart.max_rows, 2);
    let rows: Vec<(EventId, usize)> = chart
        .courses
        .iter()
        .map(|bar| (bar.assignment.interval.source_start_id, bar.assignment.row))
        .collect();
    assert_eq!(
        rows,
        vec![(EventId(3), 0), (EventId(6), 1), (EventId(8), 0)]
    );
    let open: Vec<bool> = chart.courses.iter().map(|bar| bar.open).collect();
    assert_eq!(open, vec![false, false, true]);

    let tracks: Vec<Track> = chart.markers.iter().map(|marker| marker.track).collect();
    assert_eq!(
        tracks,
        vec![
            Track::Procedures,
            Track::Samples,
            Track::Procedures,
            Track::ClinicalEvents
        ]
    );

    let lab_points: Vec<usize> = chart
        .lab_series
        .iter()
        .map(|series| series.points.len())
        .collect();
    assert_eq!(lab_points, vec![1, 2]);

    assert_eq!(
        chart.skipped,
        vec![
            SkippedEvent {
                event_id: EventId(13),
                reason: SkipReason::MalformedDate
            },
            SkippedEvent {
                event_id: EventId(14),
                reason: SkipReason::NonNumericLab
            },
        ]
    );

    assert_eq!(chart.tick_interval.unit, TickUnit::Day);
    assert!(chart.tick_diagnostic.is_none());
    for pair in chart.ticks.windows(2) {
        assert!(pair[0].tick.date < pair[1].tick.date);
        assert!(pair[0].x < pair[1].x);
    }
    for mark in &chart.ticks {
        assert!(chart.scale.contains(mark.tick.date));
    }
}

#[test]
fn view_serializes_with_status_tag() {
    let log = load_log();
    let view = layout_timeline(log.events(), &TimelineConfig::default());
    let value = serde_json::to_value(&view).expect("Không serialize layout");

    assert_eq!(value["status"], "chart");
    assert_eq!(value["max_rows"], 2);
    assert_eq!(value["courses"][0]["row"], 0);
    assert_eq!(value["courses"][0]["interval"]["label"], "Cefazolin 2g");

    let empty = serde_json::to_value(layout_timeline(&[], &TimelineConfig::default()))
        .expect("Không serialize layout rỗng");
    assert_eq!(empty["status"], "empty");
}
