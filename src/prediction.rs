//! Cycle length prediction from period start dates.
//!
//! Input dates are UTC calendar days in ascending order. Each consecutive
//! pair contributes one gap in whole days; the average gap, rounded to the
//! nearest day with halves rounded up, is added to the last start date.
//! Out-of-order or duplicate dates are not rejected, they simply produce
//! negative or zero gaps.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// A projected next period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub average_cycle_length_days: i64,
    pub last_period_start: NaiveDate,
    pub predicted_next_period: NaiveDate,
}

/// Result of running the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionOutcome {
    /// Fewer than two start dates. Not an error.
    InsufficientData,
    Predicted(Prediction),
}

pub fn predict(start_dates: &[NaiveDate]) -> PredictionOutcome {
    let [.., _, last] = start_dates else {
        return PredictionOutcome::InsufficientData;
    };

    let total_days: i64 = start_dates
        .windows(2)
        .map(|pair| pair[1].signed_duration_since(pair[0]).num_days())
        .sum();
    let gaps = (start_dates.len() - 1) as i64;
    let average = round_half_up(total_days, gaps);

    PredictionOutcome::Predicted(Prediction {
        average_cycle_length_days: average,
        last_period_start: *last,
        predicted_next_period: add_days_saturating(*last, average),
    })
}

/// `numerator / denominator` rounded to the nearest integer, with exact
/// halves rounded toward positive infinity. `denominator` must be positive.
fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

fn add_days_saturating(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}
