//! Date range padding and the linear date→pixel scale.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use timeline_core::TimelineConfig;

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Linear map from `[min, max]` onto `[0, width]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeScale {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
    pub width: f64,
}

impl TimeScale {
    pub fn new(min: NaiveDateTime, max: NaiveDateTime, width: f64) -> Self {
        Self { min, max, width }
    }

    /// Padded scale around the first and last event date.
    ///
    /// Each side gets `max(padding_ratio * span, min_padding_days)`, so a single
    /// day still yields a range of `2 * min_padding_days`.
    pub fn padded(first: NaiveDate, last: NaiveDate, config: &TimelineConfig) -> Self {
        let (first, last) = if first <= last { (first, last) } else { (last, first) };
        let start = midnight(first);
        let end = midnight(last);

        let span_ms = (end - start).num_milliseconds() as f64;
        let min_pad_ms = f64::from(config.min_padding_days) * MS_PER_DAY;
        let pad = Duration::milliseconds((span_ms * config.padding_ratio).max(min_pad_ms).round() as i64);

        Self {
            min: start.checked_sub_signed(pad).unwrap_or(start),
            max: end.checked_add_signed(pad).unwrap_or(end),
            width: f64::from(config.width_px),
        }
    }

    pub fn span_ms(&self) -> i64 {
        (self.max - self.min).num_milliseconds()
    }

    /// Pixel position of an instant, clamped to `[0, width]`.
    pub fn x_at(&self, instant: NaiveDateTime) -> f64 {
        let total = self.span_ms() as f64;
        if total <= 0.0 {
            return 0.0;
        }
        let offset = (instant - self.min).num_milliseconds() as f64;
        (offset / total * self.width).clamp(0.0, self.width)
    }

    /// Pixel position of a calendar day (its UTC midnight).
    pub fn x(&self, date: NaiveDate) -> f64 {
        self.x_at(midnight(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let instant = midnight(date);
        instant >= self.min && instant <= self.max
    }
}

pub(crate) fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
