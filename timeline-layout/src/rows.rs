//! Greedy interval partitioning of courses into display rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use timeline_core::{Interval, RowAssignment};

/// Row assignment for a set of intervals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowPacking {
    pub assignments: Vec<RowAssignment>,
    /// Number of rows in use (1 + highest row index), 0 when empty.
    pub max_rows: usize,
}

/// Assign each interval the lowest row whose previous occupant has ended.
///
/// Spans are half-open: a course ending on the day another starts can share
/// its row. A single-day course still blocks its day. Open intervals occupy their row forever. The row count equals the
/// largest number of courses active at one instant.
pub fn pack_rows(intervals: &[Interval]) -> RowPacking {
    let mut ordered: Vec<&Interval> = intervals.iter().collect();
    ordered.sort_by_key(|interval| (interval.start_date, span_end(interval)));

    let mut row_ends: Vec<NaiveDate> = Vec::new();
    let mut assignments = Vec::with_capacity(ordered.len());

    for interval in ordered {
        let end = span_end(interval);
        let row = match row_ends
            .iter()
            .position(|row_end| interval.start_date >= *row_end)
        {
            Some(row) => {
                row_ends[row] = end;
                row
            }
            None => {
                row_ends.push(end);
                row_ends.len() - 1
            }
        };

        assignments.push(RowAssignment {
            interval: interval.clone(),
            row,
        });
    }

    RowPacking {
        assignments,
        max_rows: row_ends.len(),
    }
}

/// End used for packing: open = +infinity. A course that stops on (or, when
/// inverted, before) its start day still occupies that one day.
pub(crate) fn span_end(interval: &Interval) -> NaiveDate {
    match interval.end_date {
        Some(end) if end > interval.start_date => end,
        Some(_) => interval.start_date.succ_opt().unwrap_or(NaiveDate::MAX),
        None => NaiveDate::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_core::EventId;

    fn course(id: u64, start: (u32, u32), end: Option<(u32, u32)>) -> Interval {
        let ymd = |(m, d): (u32, u32)| NaiveDate::from_ymd_opt(2024, m, d).expect("ngày hợp lệ");
        Interval {
            start_date: ymd(start),
            end_date: end.map(ymd),
            label: format!("course {id}"),
            source_start_id: EventId(id),
            source_end_id: end.map(|_| EventId(id + 1000)),
        }
    }

    fn row_of(packing: &RowPacking, id: u64) -> usize {
        packing
            .assignments
            .iter()
            .find(|assignment| assignment.interval.source_start_id == EventId(id))
            .map(|assignment| assignment.row)
            .expect("đợt điều trị phải có hàng")
    }

    /// Largest number of simultaneously active half-open spans.
    fn max_active(intervals: &[Interval]) -> usize {
        let mut edges: Vec<(NaiveDate, i32)> = Vec::new();
        for interval in intervals {
            edges.push((interval.start_date, 1));
            edges.push((span_end(interval), -1));
        }
        // Ends sort before starts on the same day.
        edges.sort();
        let mut active = 0i32;
        let mut peak = 0i32;
        for (_, delta) in edges {
            active += delta;
            peak = peak.max(active);
        }
        peak as usize
    }

    fn assert_no_overlap(packing: &RowPacking) {
        for (i, a) in packing.assignments.iter().enumerate() {
            for b in packing.assignments.iter().skip(i + 1) {
                if a.row != b.row {
                    continue;
                }
                let overlap = a.interval.start_date < span_end(&b.interval)
                    && b.interval.start_date < span_end(&a.interval);
                assert!(!overlap, "{:?} và {:?} chồng nhau trên hàng {}", a, b, a.row);
            }
        }
    }

    #[test]
    fn empty_input_uses_no_rows() {
        let packing = pack_rows(&[]);
        assert_eq!(packing.max_rows, 0);
        assert!(packing.assignments.is_empty());
    }

    #[test]
    fn overlapping_third_course_gets_second_row() {
        let intervals = vec![
            course(1, (1, 1), Some((1, 5))),
            course(2, (1, 10), Some((1, 15))),
            course(3, (1, 3), Some((1, 12))),
        ];
        let packing = pack_rows(&intervals);

        assert_eq!(row_of(&packing, 1), 0);
        assert_eq!(row_of(&packing, 2), 0);
        assert_eq!(row_of(&packing, 3), 1);
        assert_eq!(packing.max_rows, 2);
    }

    #[test]
    fn touching_courses_share_a_row() {
        let intervals = vec![
            course(1, (2, 1), Some((2, 5))),
            course(2, (2, 5), Some((2, 9))),
        ];
        let packing = pack_rows(&intervals);
        assert_eq!(packing.max_rows, 1);
    }

    #[test]
    fn single_day_courses_occupy_their_day() {
        let intervals = vec![
            course(1, (2, 5), Some((2, 5))),
            course(2, (2, 5), Some((2, 5))),
            course(3, (2, 6), Some((2, 1))),
            course(4, (2, 6), Some((2, 9))),
        ];
        let packing = pack_rows(&intervals);

        assert_eq!(row_of(&packing, 1), 0);
        assert_eq!(row_of(&packing, 2), 1);
        // Inverted span counts as 6 Feb only; both rows are free again.
        assert_eq!(row_of(&packing, 3), 0);
        assert_eq!(row_of(&packing, 4), 1);
        assert_eq!(packing.max_rows, 2);
    }

    #[test]
    fn open_course_blocks_its_row() {
        let intervals = vec![
            course(1, (3, 1), None),
            course(2, (3, 20), Some((3, 25))),
            course(3, (4, 1), Some((4, 3))),
        ];
        let packing = pack_rows(&intervals);

        assert_eq!(row_of(&packing, 1), 0);
        assert_eq!(row_of(&packing, 2), 1);
        assert_eq!(row_of(&packing, 3), 1);
        assert_eq!(packing.max_rows, 2);
    }

    #[test]
    fn row_count_matches_sweep_oracle() {
        // xorshift keeps the case list reproducible without extra crates.
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move |bound: u64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % bound
        };

        for round in 0..50 {
            let count = 1 + next(25);
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).expect("ngày hợp lệ");
            let intervals: Vec<Interval> = (0..count)
                .map(|i| {
                    let start = base + chrono::Duration::days(next(60) as i64);
                    let end = match next(6) {
                        0 => None,
                        _ => Some(start + chrono::Duration::days(1 + next(20) as i64)),
                    };
                    Interval {
                        start_date: start,
                        end_date: end,
                        label: format!("r{round}-{i}"),
                        source_start_id: EventId(i),
                        source_end_id: None,
                    }
                })
                .collect();

            let packing = pack_rows(&intervals);
            assert_eq!(packing.assignments.len(), intervals.len());
            assert_no_overlap(&packing);

            assert_eq!(packing.max_rows, max_active(&intervals), "round {round}");
        }
    }
}
