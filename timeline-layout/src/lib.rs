//! Course reconstruction and timeline geometry for a patient event log.
//!
//! Everything here is a pure function of an event snapshot: [`match_courses`]
//! pairs antibiotic starts and stops, [`pack_rows`] spreads overlapping
//! courses over display rows, [`plan_tick_interval`] / [`enumerate_ticks`]
//! build the time axis and [`layout_timeline`] ties them into pixel
//! coordinates for a renderer.

pub mod courses;
pub mod layout;
pub mod rows;
pub mod scale;
pub mod summary;
pub mod ticks;

pub use courses::{drug_token, match_courses};
pub use layout::{
    layout_timeline, stack_tracks, ChartLayout, CourseBar, LabPoint, LabSeries, PointMarker,
    SkipReason, SkippedEvent, TickMark, TimelineView, Track, TrackBand,
};
pub use rows::{pack_rows, RowPacking};
pub use scale::TimeScale;
pub use summary::{format_course, format_entry_date, summarize, SummaryEntry, Summaries};
pub use ticks::{
    enumerate_ticks, first_tick_date, format_tick, plan_tick_interval, ticks_for_range,
    TickDiagnostic, TickInterval, TickSet, TickUnit,
};
