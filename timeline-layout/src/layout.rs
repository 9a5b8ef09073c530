//! Composition of matcher, row packer, scale and tick planner into one
//! coordinate space for the renderer.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use timeline_core::{
    Event, EventId, EventKind, EventPayload, Germ, LabAnalyte, RowAssignment, Tick,
    TimelineConfig,
};
use tracing::{debug, warn};

use crate::courses::match_courses;
use crate::rows::pack_rows;
use crate::scale::TimeScale;
use crate::ticks::{ticks_for_range, TickDiagnostic, TickInterval};

/// Horizontal bands, top to bottom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Procedures,
    ClinicalEvents,
    Antibiotics,
    Samples,
    LabLc,
    LabCrp,
}

impl Track {
    pub const ORDER: [Track; 6] = [
        Track::Procedures,
        Track::ClinicalEvents,
        Track::Antibiotics,
        Track::Samples,
        Track::LabLc,
        Track::LabCrp,
    ];

    /// Track for a point marker; antibiotic events are drawn as bars and labs as series.
    fn for_marker(kind: EventKind) -> Option<Track> {
        match kind {
            EventKind::Procedure => Some(Track::Procedures),
            EventKind::ClinicalEvent | EventKind::ClinicalNote => Some(Track::ClinicalEvents),
            EventKind::MicrobiologySample => Some(Track::Samples),
            EventKind::AntibioticStart
            | EventKind::AntibioticEnd
            | EventKind::LabCrp
            | EventKind::LabLc => None,
        }
    }

    fn for_lab(analyte: LabAnalyte) -> Track {
        match analyte {
            LabAnalyte::Lc => Track::LabLc,
            LabAnalyte::Crp => Track::LabCrp,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrackBand {
    pub track: Track,
    pub y: f64,
    pub height: f64,
}

impl TrackBand {
    pub fn center(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Antibiotic course bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseBar {
    #[serde(flatten)]
    pub assignment: RowAssignment,
    /// End actually drawn: the stop date, or for open courses the calendar day
    /// of the chart edge. `end_x` of an open bar is the exact edge, so it can sit
    /// past `scale.x(resolved_end)` by the fractional padding.
    pub resolved_end: NaiveDate,
    pub open: bool,
    pub start_x: f64,
    pub end_x: f64,
    pub y: f64,
    pub height: f64,
}

/// Procedure, sample or clinical event marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointMarker {
    pub event_id: EventId,
    pub kind: EventKind,
    pub track: Track,
    pub date: NaiveDate,
    pub label: String,
    /// 0 for the first marker on a (track, date), then 1, 2, ...
    pub offset_index: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabPoint {
    pub event_id: EventId,
    pub date: NaiveDate,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabSeries {
    pub analyte: LabAnalyte,
    pub unit: String,
    /// Value mapped to the top of the plotted range (at least 1).
    pub max_value: f64,
    pub points: Vec<LabPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickMark {
    #[serde(flatten)]
    pub tick: Tick,
    pub x: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MalformedDate,
    NonNumericLab,
}

/// Event left out of the geometry; it still belongs in plain listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedEvent {
    pub event_id: EventId,
    pub reason: SkipReason,
}

/// Full geometry of a non-empty timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartLayout {
    pub scale: TimeScale,
    pub tracks: Vec<TrackBand>,
    pub total_height: f64,
    pub max_rows: usize,
    pub courses: Vec<CourseBar>,
    pub markers: Vec<PointMarker>,
    pub lab_series: Vec<LabSeries>,
    pub tick_interval: TickInterval,
    pub ticks: Vec<TickMark>,
    pub tick_diagnostic: Option<TickDiagnostic>,
    pub skipped: Vec<SkippedEvent>,
}

impl ChartLayout {
    pub fn band(&self, track: Track) -> Option<&TrackBand> {
        self.tracks.iter().find(|band| band.track == track)
    }
}

/// Layout result; `Empty` is the normal "nothing to draw yet" state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimelineView {
    Empty { skipped: Vec<SkippedEvent> },
    Chart(Box<ChartLayout>),
}

impl TimelineView {
    pub fn chart(&self) -> Option<&ChartLayout> {
        match self {
            TimelineView::Chart(chart) => Some(chart),
            TimelineView::Empty { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TimelineView::Empty { .. })
    }
}

/// Compute the whole timeline geometry from an event snapshot.
///
/// Never fails: events with malformed dates or non-numeric lab values are
/// reported in `skipped` and the rest is laid out.
pub fn layout_timeline(events: &[Event], config: &TimelineConfig) -> TimelineView {
    let mut skipped = Vec::new();

    let mut dated: Vec<(&Event, NaiveDate)> = events
        .iter()
        .filter_map(|event| match event.calendar_date() {
            Some(date) => Some((event, date)),
            None => {
                warn!(
                    event_id = %event.id,
                    date = event.date.as_str(),
                    "event excluded from timeline: malformed date"
                );
                skipped.push(SkippedEvent {
                    event_id: event.id,
                    reason: SkipReason::MalformedDate,
                });
                None
            }
        })
        .collect();
    dated.sort_by_key(|(event, date)| (*date, event.id));
    skipped.sort_by_key(|item| item.event_id);

    let intervals = match_courses(events);
    let boundaries = intervals
        .iter()
        .flat_map(|interval| std::iter::once(interval.start_date).chain(interval.end_date));
    let all_dates = dated.iter().map(|(_, date)| *date).chain(boundaries);

    let (Some(first), Some(last)) = (all_dates.clone().min(), all_dates.max()) else {
        debug!(events = events.len(), "no datable events, timeline empty");
        return TimelineView::Empty { skipped };
    };

    let scale = TimeScale::padded(first, last, config);
    let packing = pack_rows(&intervals);
    let (tracks, total_height) = stack_tracks(packing.max_rows, config);
    let band = |track: Track| {
        tracks
            .iter()
            .find(|band| band.track == track)
            .copied()
            .unwrap_or(TrackBand {
                track,
                y: 0.0,
                height: config.row_height,
            })
    };

    let antibiotics = band(Track::Antibiotics);
    let chart_end = scale.max.date();
    let courses = packing
        .assignments
        .into_iter()
        .map(|assignment| {
            let open = assignment.interval.is_open();
            let resolved_end = assignment.interval.end_date.unwrap_or(chart_end);
            let start_x = scale.x(assignment.interval.start_date);
            let end_x = if open {
                scale.x_at(scale.max)
            } else {
                scale.x(resolved_end)
            };
            let y = antibiotics.y + assignment.row as f64 * config.row_height;
            CourseBar {
                assignment,
                resolved_end,
                open,
                start_x,
                end_x,
                y,
                height: config.row_height,
            }
        })
        .collect();

    let mut stacked: HashMap<(Track, NaiveDate), usize> = HashMap::new();
    let mut markers = Vec::new();
    for (event, date) in &dated {
        let Some(track) = Track::for_marker(event.kind()) else {
            continue;
        };
        let slot = stacked.entry((track, *date)).or_insert(0);
        let offset_index = *slot;
        *slot += 1;

        markers.push(PointMarker {
            event_id: event.id,
            kind: event.kind(),
            track,
            date: *date,
            label: marker_label(event),
            offset_index,
            x: scale.x(*date),
            y: band(track).center() + offset_index as f64 * config.micro_offset_px,
        });
    }

    let lab_series = [LabAnalyte::Lc, LabAnalyte::Crp]
        .into_iter()
        .filter_map(|analyte| {
            build_lab_series(&dated, analyte, &scale, band(Track::for_lab(analyte)), &mut skipped)
        })
        .collect();

    let tick_set = ticks_for_range(scale.min, scale.max, config);
    let ticks = tick_set
        .ticks
        .into_iter()
        .map(|tick| TickMark {
            x: scale.x(tick.date),
            tick,
        })
        .collect();

    TimelineView::Chart(Box::new(ChartLayout {
        scale,
        tracks,
        total_height,
        max_rows: packing.max_rows,
        courses,
        markers,
        lab_series,
        tick_interval: tick_set.interval,
        ticks,
        tick_diagnostic: tick_set.diagnostic,
        skipped,
    }))
}

/// Stack bands in [`Track::ORDER`]; the antibiotic block grows with `max_rows`.
pub fn stack_tracks(max_rows: usize, config: &TimelineConfig) -> (Vec<TrackBand>, f64) {
    let mut y = 0.0;
    let mut bands = Vec::with_capacity(Track::ORDER.len());

    for track in Track::ORDER {
        let height = match track {
            Track::Antibiotics => max_rows.max(1) as f64 * config.row_height,
            Track::LabLc | Track::LabCrp => config.lab_band_height,
            Track::Procedures | Track::ClinicalEvents | Track::Samples => config.row_height,
        };
        bands.push(TrackBand { track, y, height });
        y += height + config.track_gap;
    }

    (bands, y - config.track_gap)
}

fn build_lab_series(
    dated: &[(&Event, NaiveDate)],
    analyte: LabAnalyte,
    scale: &TimeScale,
    band: TrackBand,
    skipped: &mut Vec<SkippedEvent>,
) -> Option<LabSeries> {
    let mut readings = Vec::new();
    for (event, date) in dated {
        let EventPayload::LabValue {
            analyte: event_analyte,
            ..
        } = &event.payload
        else {
            continue;
        };
        if *event_analyte != analyte {
            continue;
        }
        match event.lab_value() {
            Some((_, value)) => readings.push((event.id, *date, value)),
            None => {
                warn!(
                    event_id = %event.id,
                    details = event.details(),
                    "lab value is not numeric, left out of series"
                );
                skipped.push(SkippedEvent {
                    event_id: event.id,
                    reason: SkipReason::NonNumericLab,
                });
            }
        }
    }

    if readings.is_empty() {
        return None;
    }

    let max_value = readings
        .iter()
        .map(|(_, _, value)| *value)
        .fold(1.0_f64, f64::max);
    let bottom = band.y + band.height;

    let points = readings
        .into_iter()
        .map(|(event_id, date, value)| LabPoint {
            event_id,
            date,
            value,
            x: scale.x(date),
            y: bottom - (value.max(0.0) / max_value) * band.height * 0.9,
        })
        .collect();

    Some(LabSeries {
        analyte,
        unit: analyte.unit().to_string(),
        max_value,
        points,
    })
}

fn marker_label(event: &Event) -> String {
    match &event.payload {
        EventPayload::MicrobiologySample { details, germ, .. } => match germ {
            Germ::Negative => format!("{details}: negative"),
            Germ::Identified(organism) => format!("{details}: {organism}"),
        },
        payload => payload.details().to_string(),
    }
}
