//! Short-horizon trend fitting and crossing prediction.
//!
//! Given two cumulative series on the same date axis, fits an ordinary
//! least-squares line to the tail of each over several lookback windows and
//! estimates the date at which the reference series overtakes the
//! competitor. Degenerate inputs never error; they simply yield no
//! prediction.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::accumulate::CumulativeSeries;

/// Canonical lookback windows, in days.
pub const DEFAULT_WINDOWS: [i64; 3] = [30, 90, 180];

/// Predictions further out than this are treated as noise.
pub const MAX_HORIZON_DAYS: f64 = 3650.0;

/// A predicted overtake: the calendar date and the reference's net gain in
/// stars per day at that trend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossing {
    pub date: NaiveDate,
    pub daily_gain: f64,
}

/// Ordinary least-squares slope of y over x. `None` when there are fewer
/// than two samples or no x-variance.
pub fn ols_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mean_x) * (x - mean_x)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    Some(sxy / sxx)
}

/// Points of `series` on or after `cutoff`, as (days since first kept date,
/// value) pairs.
fn window_tail(series: &CumulativeSeries, cutoff: NaiveDate) -> Vec<(i64, i64)> {
    let kept: Vec<_> = series
        .points()
        .iter()
        .filter(|(date, _)| *date >= cutoff)
        .collect();
    let origin = match kept.first() {
        Some((date, _)) => *date,
        None => return Vec::new(),
    };
    kept.iter()
        .map(|(date, value)| ((*date - origin).num_days(), *value))
        .collect()
}

fn distinct<T: Ord + Copy>(values: impl Iterator<Item = T>) -> usize {
    values.collect::<BTreeSet<_>>().len()
}

/// Crossing prediction from one lookback window ending at the later of the
/// two series' last dates.
///
/// If the reference is already at or above the competitor the crossing is
/// reported as `today` with the slope difference as the gain, whatever its
/// sign. Otherwise a crossing needs the reference trend to be strictly
/// steeper and the extrapolated distance to fall inside
/// [`MAX_HORIZON_DAYS`].
pub fn predict_window(
    reference: &CumulativeSeries,
    competitor: &CumulativeSeries,
    window_days: i64,
    today: NaiveDate,
) -> Option<Crossing> {
    let axis_end = reference.last_date()?.max(competitor.last_date()?);
    let cutoff = axis_end - Duration::days(window_days);

    let ref_tail = window_tail(reference, cutoff);
    let comp_tail = window_tail(competitor, cutoff);
    if distinct(ref_tail.iter().map(|(x, _)| *x)) < 2
        || distinct(comp_tail.iter().map(|(x, _)| *x)) < 2
    {
        return None;
    }
    if distinct(ref_tail.iter().map(|(_, y)| *y)) <= 1
        || distinct(comp_tail.iter().map(|(_, y)| *y)) <= 1
    {
        return None;
    }

    let ref_slope = slope_of(&ref_tail)?;
    let comp_slope = slope_of(&comp_tail)?;

    let ref_current = reference.last_value()? as f64;
    let comp_current = competitor.last_value()? as f64;

    if ref_current >= comp_current {
        return Some(Crossing {
            date: today,
            daily_gain: ref_slope - comp_slope,
        });
    }
    if ref_slope <= comp_slope {
        return None;
    }

    let daily_gain = ref_slope - comp_slope;
    let days_to_cross = (comp_current - ref_current) / daily_gain;
    if days_to_cross < 0.0 || days_to_cross > MAX_HORIZON_DAYS {
        return None;
    }
    Some(Crossing {
        date: today + Duration::days(days_to_cross as i64),
        daily_gain,
    })
}

fn slope_of(tail: &[(i64, i64)]) -> Option<f64> {
    let xs: Vec<f64> = tail.iter().map(|(x, _)| *x as f64).collect();
    let ys: Vec<f64> = tail.iter().map(|(_, y)| *y as f64).collect();
    ols_slope(&xs, &ys)
}

/// Aggregates per-window predictions into one crossing.
///
/// The aggregate date is the first valid window's date plus the mean of the
/// signed offsets from it; the gain is the plain mean. A prediction whose
/// aggregate date is already past is dropped as not upcoming.
pub fn predict_crossing(
    reference: &CumulativeSeries,
    competitor: &CumulativeSeries,
    windows: &[i64],
    today: NaiveDate,
) -> Option<Crossing> {
    let hits: Vec<Crossing> = windows
        .iter()
        .filter_map(|&window| predict_window(reference, competitor, window, today))
        .collect();
    let first = hits.first()?.date;
    let mean_offset = hits
        .iter()
        .map(|crossing| (crossing.date - first).num_days())
        .sum::<i64>() as f64
        / hits.len() as f64;
    let date = first + Duration::days(mean_offset as i64);
    if date < today {
        return None;
    }
    let daily_gain = hits.iter().map(|crossing| crossing.daily_gain).sum::<f64>() / hits.len() as f64;
    Some(Crossing { date, daily_gain })
}

/// Keeps the `n` soonest predicted crossings, soonest first.
pub fn rank_crossings<T>(mut predictions: Vec<(T, Crossing)>, n: usize) -> Vec<(T, Crossing)> {
    predictions.sort_by_key(|(_, crossing)| crossing.date);
    predictions.truncate(n);
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::CumulativeSeries;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, n).unwrap()
    }

    fn series(start_day: u32, values: &[i64]) -> CumulativeSeries {
        CumulativeSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| (day(start_day + i as u32), value))
                .collect(),
        )
    }

    #[test]
    fn already_ahead_crosses_today_even_with_flat_gain() {
        let reference = series(1, &[100, 110, 120]);
        let competitor = series(1, &[50, 55, 60]);
        let today = day(3);
        let crossing = predict_window(&reference, &competitor, 30, today).unwrap();
        assert_eq!(crossing.date, today);
        assert!((crossing.daily_gain - 5.0).abs() < 1e-9);

        // still reported when the reference trend is the slower one
        let slow_reference = series(1, &[100, 101, 102]);
        let fast_competitor = series(1, &[50, 60, 70]);
        let crossing = predict_window(&slow_reference, &fast_competitor, 30, today).unwrap();
        assert_eq!(crossing.date, today);
        assert!(crossing.daily_gain < 0.0);
    }

    #[test]
    fn converging_trends_close_the_gap_at_the_net_rate() {
        // reference gains 2/day from 100, competitor 1/day from 150:
        // the remaining 48-star gap closes at 1 star per day
        let reference = series(1, &[100, 102, 104]);
        let competitor = series(1, &[150, 151, 152]);
        let today = day(3);
        let crossing = predict_window(&reference, &competitor, 30, today).unwrap();
        assert_eq!(crossing.date, today + Duration::days(48));
        assert!((crossing.daily_gain - 1.0).abs() < 1e-9);
    }

    #[test]
    fn diverging_trends_predict_nothing() {
        let reference = series(1, &[100, 101, 102]);
        let competitor = series(1, &[150, 152, 154]);
        assert_eq!(predict_window(&reference, &competitor, 30, day(3)), None);
    }

    #[test]
    fn far_future_extrapolations_are_rejected() {
        // gap of 9998 closing at 1/day is past the ten-year horizon
        let reference = series(1, &[0, 2, 4]);
        let competitor = series(1, &[10000, 10001, 10002]);
        assert_eq!(predict_window(&reference, &competitor, 30, day(3)), None);
    }

    #[test]
    fn degenerate_windows_predict_nothing() {
        let flat = series(1, &[100, 100, 100]);
        let rising = series(1, &[50, 60, 70]);
        assert_eq!(predict_window(&rising, &flat, 30, day(3)), None);
        assert_eq!(predict_window(&flat, &rising, 30, day(3)), None);

        let single = series(1, &[100]);
        assert_eq!(predict_window(&single, &rising, 30, day(3)), None);
    }

    #[test]
    fn window_restricts_the_regression_input() {
        // flat for a long stretch, then a late surge; a short window sees
        // only the surge
        let mut values: Vec<i64> = vec![100; 60];
        for (i, value) in values.iter_mut().enumerate().skip(50) {
            *value = 100 + (i as i64 - 49) * 10;
        }
        let reference = CumulativeSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| {
                    (
                        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap() + Duration::days(i as i64),
                        value,
                    )
                })
                .collect(),
        );
        let competitor = CumulativeSeries::from_points(
            (0..60)
                .map(|i| {
                    (
                        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap() + Duration::days(i),
                        300 + i as i64,
                    )
                })
                .collect(),
        );
        let today = NaiveDate::from_ymd_opt(2025, 5, 30).unwrap();
        let short = predict_window(&reference, &competitor, 5, today).unwrap();
        let long = predict_window(&reference, &competitor, 59, today).unwrap();
        assert!(short.daily_gain > long.daily_gain);
    }

    #[test]
    fn aggregate_is_the_mean_of_window_predictions() {
        let reference = series(1, &[100, 102, 104]);
        let competitor = series(1, &[150, 151, 152]);
        let today = day(3);
        // every window sees the same three points, so the mean equals the
        // per-window result
        let crossing = predict_crossing(&reference, &competitor, &DEFAULT_WINDOWS, today).unwrap();
        assert_eq!(crossing.date, today + Duration::days(48));
        assert!((crossing.daily_gain - 1.0).abs() < 1e-9);
    }

    #[test]
    fn aggregate_of_no_hits_is_none() {
        let reference = series(1, &[100, 101, 102]);
        let competitor = series(1, &[150, 152, 154]);
        assert_eq!(
            predict_crossing(&reference, &competitor, &DEFAULT_WINDOWS, day(3)),
            None
        );
    }

    #[test]
    fn ranking_keeps_the_soonest_n() {
        let crossings = vec![
            ("c", Crossing { date: day(20), daily_gain: 1.0 }),
            ("a", Crossing { date: day(5), daily_gain: 2.0 }),
            ("b", Crossing { date: day(10), daily_gain: 3.0 }),
        ];
        let ranked = rank_crossings(crossings, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, "a");
        assert_eq!(ranked[1].0, "b");
    }

    #[test]
    fn ols_slope_needs_variance() {
        assert_eq!(ols_slope(&[1.0, 1.0], &[2.0, 3.0]), None);
        assert_eq!(ols_slope(&[1.0], &[2.0]), None);
        let slope = ols_slope(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-9);
    }
}
