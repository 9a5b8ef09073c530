//! Axis tick planning: pick a day/week/month granularity for the visible
//! range and enumerate calendar-aligned tick dates.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use timeline_core::{Tick, TimelineConfig};
use tracing::error;

use crate::scale::{midnight, MS_PER_DAY};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TickUnit {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickInterval {
    pub unit: TickUnit,
    pub step: u32,
}

impl TickInterval {
    const fn new(unit: TickUnit, step: u32) -> Self {
        Self { unit, step }
    }
}

/// Why enumeration stopped early. Either case is a bug in the stepping, not
/// a runtime condition; the cap used by [`ticks_for_range`] scales with the plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TickDiagnostic {
    Stalled { at: NaiveDate },
    IterationCap { cap: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickSet {
    pub interval: TickInterval,
    pub ticks: Vec<Tick>,
    pub diagnostic: Option<TickDiagnostic>,
}

/// Choose unit and step so that roughly one tick lands every `tick_spacing_px`.
pub fn plan_tick_interval(time_range_ms: u64, width_px: u32, config: &TimelineConfig) -> TickInterval {
    let per_tick = config.tick_spacing_px.max(1);
    let max_ticks = f64::from(config.min_ticks.max(width_px / per_tick).max(1));
    let days = time_range_ms as f64 / MS_PER_DAY;

    if days <= 0.0 || days <= max_ticks * 1.5 {
        TickInterval::new(TickUnit::Day, 1)
    } else if days <= max_ticks * 4.0 {
        TickInterval::new(TickUnit::Day, 2)
    } else if days <= max_ticks * 10.0 {
        TickInterval::new(TickUnit::Day, (days / max_ticks).ceil() as u32)
    } else if days <= max_ticks * 20.0 {
        TickInterval::new(TickUnit::Week, 1)
    } else if days <= max_ticks * 50.0 {
        TickInterval::new(TickUnit::Week, 2)
    } else if days <= max_ticks * 150.0 {
        TickInterval::new(TickUnit::Month, 1)
    } else if days <= max_ticks * 400.0 {
        TickInterval::new(TickUnit::Month, 3)
    } else {
        TickInterval::new(TickUnit::Month, 6)
    }
}

/// Enumerate ticks inside `[min, max]`, at most `cap` loop iterations.
pub fn enumerate_ticks(
    min: NaiveDateTime,
    max: NaiveDateTime,
    interval: TickInterval,
    cap: usize,
) -> TickSet {
    let mut ticks = Vec::new();
    let mut diagnostic = None;
    let mut current = first_tick_date(min.date(), interval.unit);
    let mut iterations = 0usize;

    while let Some(date) = current {
        if midnight(date) > max {
            break;
        }
        if iterations >= cap {
            error!(cap, ?interval, "tick enumeration hit its iteration cap");
            diagnostic = Some(TickDiagnostic::IterationCap { cap });
            break;
        }
        iterations += 1;

        if midnight(date) >= min {
            ticks.push(Tick {
                date,
                label: format_tick(date, interval.unit),
            });
        }

        match advance(date, interval) {
            Some(next) if next > date => current = Some(next),
            Some(_) => {
                error!(%date, ?interval, "tick date did not advance");
                diagnostic = Some(TickDiagnostic::Stalled { at: date });
                break;
            }
            // Past the end of the calendar.
            None => current = None,
        }
    }

    TickSet {
        interval,
        ticks,
        diagnostic,
    }
}

/// Plan and enumerate ticks for a padded range in one go.
pub fn ticks_for_range(min: NaiveDateTime, max: NaiveDateTime, config: &TimelineConfig) -> TickSet {
    let range_ms = u64::try_from((max - min).num_milliseconds()).unwrap_or_default();
    let interval = plan_tick_interval(range_ms, config.width_px, config);
    let cap = runaway_cap(range_ms, interval, config.tick_iteration_cap);
    enumerate_ticks(min, max, interval, cap)
}

/// Iteration cap for a planned interval: never below the configured cap and
/// always twice the ticks the plan can produce, so only a stepping fault hits it.
fn runaway_cap(range_ms: u64, interval: TickInterval, configured: usize) -> usize {
    // Shortest month is 28 days.
    let unit_days = match interval.unit {
        TickUnit::Day => 1.0,
        TickUnit::Week => 7.0,
        TickUnit::Month => 28.0,
    };
    let step_days = unit_days * f64::from(interval.step.max(1));
    let planned = (range_ms as f64 / MS_PER_DAY / step_days).ceil() as usize + 2;
    configured.max(2 * planned)
}

/// First aligned tick on or after `start`: the day itself, the next Monday,
/// or the next 1st of a month.
pub fn first_tick_date(start: NaiveDate, unit: TickUnit) -> Option<NaiveDate> {
    match unit {
        TickUnit::Day => Some(start),
        TickUnit::Week => {
            let until_monday = (7 - start.weekday().num_days_from_monday()) % 7;
            start.checked_add_days(Days::new(u64::from(until_monday)))
        }
        TickUnit::Month if start.day() == 1 => Some(start),
        TickUnit::Month => start
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1))),
    }
}

fn advance(date: NaiveDate, interval: TickInterval) -> Option<NaiveDate> {
    match interval.unit {
        TickUnit::Day => date.checked_add_days(Days::new(u64::from(interval.step))),
        TickUnit::Week => date.checked_add_days(Days::new(7 * u64::from(interval.step))),
        TickUnit::Month => date.checked_add_months(Months::new(interval.step)),
    }
}

/// "5 Apr" for day/week ticks, "Apr 2024" for month ticks on the 1st.
pub fn format_tick(date: NaiveDate, unit: TickUnit) -> String {
    match unit {
        TickUnit::Month if date.day() == 1 => date.format("%b %Y").to_string(),
        _ => date.format("%-d %b").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Weekday};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("ngày hợp lệ")
    }

    fn days_ms(days: u64) -> u64 {
        days * 86_400_000
    }

    #[test]
    fn plan_follows_density_thresholds() {
        let config = TimelineConfig::default();
        // 800px -> 10 ticks.
        let plan = |days: u64| plan_tick_interval(days_ms(days), 800, &config);

        assert_eq!(plan(0), TickInterval::new(TickUnit::Day, 1));
        assert_eq!(plan(15), TickInterval::new(TickUnit::Day, 1));
        assert_eq!(plan(40), TickInterval::new(TickUnit::Day, 2));
        assert_eq!(plan(73), TickInterval::new(TickUnit::Day, 8));
        assert_eq!(plan(200), TickInterval::new(TickUnit::Week, 1));
        assert_eq!(plan(500), TickInterval::new(TickUnit::Week, 2));
        assert_eq!(plan(1500), TickInterval::new(TickUnit::Month, 1));
        assert_eq!(plan(4000), TickInterval::new(TickUnit::Month, 3));
        assert_eq!(plan(4001), TickInterval::new(TickUnit::Month, 6));
    }

    #[test]
    fn narrow_width_keeps_minimum_tick_count() {
        let config = TimelineConfig::default();
        // 100px would mean 1 tick; floor is 5.
        assert_eq!(
            plan_tick_interval(days_ms(7), 100, &config),
            TickInterval::new(TickUnit::Day, 1)
        );
        assert_eq!(
            plan_tick_interval(days_ms(8), 100, &config),
            TickInterval::new(TickUnit::Day, 2)
        );
    }

    #[test]
    fn alignment_to_monday_and_first_of_month() {
        let wednesday = ymd(2024, 4, 3);
        let monday = first_tick_date(wednesday, TickUnit::Week).expect("có thứ Hai");
        assert_eq!(monday, ymd(2024, 4, 8));
        assert_eq!(monday.weekday(), Weekday::Mon);
        assert_eq!(first_tick_date(monday, TickUnit::Week), Some(monday));

        assert_eq!(
            first_tick_date(ymd(2024, 12, 15), TickUnit::Month),
            Some(ymd(2025, 1, 1))
        );
        assert_eq!(
            first_tick_date(ymd(2024, 3, 1), TickUnit::Month),
            Some(ymd(2024, 3, 1))
        );
    }

    #[test]
    fn month_steps_follow_the_calendar() {
        let min = midnight(ymd(2024, 1, 20));
        let max = midnight(ymd(2024, 12, 31));
        let set = enumerate_ticks(min, max, TickInterval::new(TickUnit::Month, 3), 200);

        let dates: Vec<NaiveDate> = set.ticks.iter().map(|tick| tick.date).collect();
        assert_eq!(
            dates,
            vec![ymd(2024, 2, 1), ymd(2024, 5, 1), ymd(2024, 8, 1), ymd(2024, 11, 1)]
        );
        assert_eq!(set.ticks[0].label, "Feb 2024");
        assert!(set.diagnostic.is_none());
    }

    #[test]
    fn ticks_are_increasing_and_in_range() {
        let config = TimelineConfig::default();
        let first = ymd(2023, 11, 3);
        for span in [0i64, 3, 20, 61, 190, 700, 3000] {
            let min = midnight(first) - Duration::hours(50);
            let max = midnight(first + Duration::days(span)) + Duration::hours(50);
            let set = ticks_for_range(min, max, &config);

            assert!(!set.ticks.is_empty(), "span {span}");
            assert!(set.diagnostic.is_none(), "span {span}");
            for pair in set.ticks.windows(2) {
                assert!(pair[0].date < pair[1].date);
            }
            for tick in &set.ticks {
                assert!(midnight(tick.date) >= min && midnight(tick.date) <= max);
            }
        }
    }

    #[test]
    fn day_labels_and_fractional_start() {
        let min = midnight(ymd(2024, 4, 4)) + Duration::hours(6);
        let max = midnight(ymd(2024, 4, 7));
        let set = enumerate_ticks(min, max, TickInterval::new(TickUnit::Day, 1), 200);

        let labels: Vec<&str> = set.ticks.iter().map(|tick| tick.label.as_str()).collect();
        assert_eq!(labels, vec!["5 Apr", "6 Apr", "7 Apr"]);
    }

    #[test]
    fn zero_step_stalls_with_diagnostic() {
        let min = midnight(ymd(2024, 1, 1));
        let max = midnight(ymd(2024, 1, 31));
        let set = enumerate_ticks(min, max, TickInterval::new(TickUnit::Day, 0), 200);

        assert_eq!(set.ticks.len(), 1);
        assert_eq!(
            set.diagnostic,
            Some(TickDiagnostic::Stalled {
                at: ymd(2024, 1, 1)
            })
        );
    }

    #[test]
    fn wide_chart_day_ticks_reach_range_end() {
        let config = TimelineConfig {
            width_px: 12_000,
            ..TimelineConfig::default()
        };
        let min = midnight(ymd(2023, 12, 28)) + Duration::hours(2);
        let max = midnight(ymd(2024, 7, 18)) + Duration::hours(22);
        let set = ticks_for_range(min, max, &config);

        assert_eq!(set.interval, TickInterval::new(TickUnit::Day, 1));
        assert!(set.ticks.len() > config.tick_iteration_cap);
        assert!(set.diagnostic.is_none());
        let last = set.ticks.last().expect("phải có vạch");
        assert_eq!(last.date, ymd(2024, 7, 18));
    }

    #[test]
    fn iteration_cap_stops_enumeration() {
        let min = midnight(ymd(2024, 1, 1));
        let max = midnight(ymd(2024, 12, 31));
        let set = enumerate_ticks(min, max, TickInterval::new(TickUnit::Day, 1), 10);

        assert_eq!(set.ticks.len(), 10);
        assert_eq!(set.diagnostic, Some(TickDiagnostic::IterationCap { cap: 10 }));
    }
}
