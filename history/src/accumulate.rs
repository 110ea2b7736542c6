//! Daily star buckets and cumulative-series bookkeeping.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Count of star events per UTC calendar day for one repository.
///
/// Iteration is always in ascending date order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DailyDelta(BTreeMap<NaiveDate, u32>);

impl DailyDelta {
    pub fn new() -> Self {
        DailyDelta::default()
    }

    pub fn record(&mut self, day: NaiveDate) {
        *self.0.entry(day).or_insert(0) += 1;
    }

    pub fn get(&self, day: NaiveDate) -> u32 {
        self.0.get(&day).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total events across all recorded days.
    pub fn sum(&self) -> u64 {
        self.0.values().map(|&count| count as u64).sum()
    }

    /// Total events strictly after `day`.
    pub fn sum_after(&self, day: NaiveDate) -> u64 {
        self.0
            .iter()
            .filter(|(date, _)| **date > day)
            .map(|(_, &count)| count as u64)
            .sum()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.0.iter().map(|(&date, &count)| (date, count))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }
}

impl FromIterator<(NaiveDate, u32)> for DailyDelta {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u32)>>(iter: I) -> Self {
        DailyDelta(iter.into_iter().collect())
    }
}

/// Inclusive range of calendar days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Every day from `start` to `end` inclusive, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |day| day.succ_opt())
            .take_while(move |day| *day <= end)
    }
}

/// Star count held immediately before a backfill window starts.
///
/// Derived from three independent fetches: the current total, the deltas
/// inside the window, and the deltas strictly after the window end. Assumes
/// no stars land between the fetches; under concurrent activity the result
/// can come out slightly low or even negative.
pub fn baseline(current_total: u64, in_window: u64, after_window: u64) -> i64 {
    current_total as i64 - in_window as i64 - after_window as i64
}

/// Running star totals over an ascending date axis.
///
/// Values are non-decreasing as long as the deltas that produced them are
/// non-negative; dates are strictly increasing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CumulativeSeries {
    points: Vec<(NaiveDate, i64)>,
}

impl CumulativeSeries {
    /// Builds a series from already-accumulated points, sorting by date.
    pub fn from_points(mut points: Vec<(NaiveDate, i64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        CumulativeSeries { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[(NaiveDate, i64)] {
        &self.points
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(date, _)| *date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(date, _)| *date)
    }

    pub fn last_value(&self) -> Option<i64> {
        self.points.last().map(|(_, value)| *value)
    }

    /// Value on `day`, carrying the last known value forward. `None` before
    /// the first point.
    pub fn value_on(&self, day: NaiveDate) -> Option<i64> {
        let idx = self.points.partition_point(|(date, _)| *date <= day);
        idx.checked_sub(1).map(|idx| self.points[idx].1)
    }

    /// Rebuilds the series on every day of `range`, forward-filling between
    /// known points and back-filling days before the first one.
    pub fn reindex(&self, range: DateRange) -> CumulativeSeries {
        let first_value = match self.points.first() {
            Some((_, value)) => *value,
            None => return CumulativeSeries::default(),
        };
        let points = range
            .days()
            .map(|day| (day, self.value_on(day).unwrap_or(first_value)))
            .collect();
        CumulativeSeries { points }
    }
}

/// Folds daily deltas into a cumulative series anchored at `baseline`.
///
/// `dates` supplies the axis in ascending order; days absent from `deltas`
/// carry the previous total forward. Works equally for the observed-dates
/// axis, a union axis across repositories, or a contiguous range.
pub fn cumulative_over(
    dates: impl IntoIterator<Item = NaiveDate>,
    baseline: i64,
    deltas: &DailyDelta,
) -> CumulativeSeries {
    let mut total = baseline;
    let points = dates
        .into_iter()
        .map(|day| {
            total += deltas.get(day) as i64;
            (day, total)
        })
        .collect();
    CumulativeSeries { points }
}
