use chrono::{Datelike, Timelike};
use rust_decimal::Decimal;

use crate::models::{AmountCategory, Enrichment, Record, RiskLevel, Status};
use crate::types::Timestamp;

const HIGH_AMOUNT: i64 = 5_000;
const VERY_HIGH_AMOUNT: i64 = 10_000;

const HIGH_AMOUNT_RISK: f64 = 30.0;
const VERY_HIGH_AMOUNT_RISK: f64 = 40.0;
const FAILED_STATUS_RISK: f64 = 50.0;
const WEEKEND_RISK: f64 = 10.0;
const NIGHT_RISK: f64 = 20.0;

/// Hours `[0, NIGHT_END_HOUR)` count as late night.
const NIGHT_END_HOUR: u32 = 6;

/// Buckets an amount into right-closed ranges: (0, 50], (50, 200], (200, 500],
/// (500, 1000], (1000, inf). Non-positive amounts have no bucket.
pub fn amount_category(amount: Decimal) -> Option<AmountCategory> {
    if amount <= Decimal::ZERO {
        return None;
    }

    let category = if amount <= Decimal::from(50) {
        AmountCategory::Small
    } else if amount <= Decimal::from(200) {
        AmountCategory::Medium
    } else if amount <= Decimal::from(500) {
        AmountCategory::Large
    } else if amount <= Decimal::from(1_000) {
        AmountCategory::VeryLarge
    } else {
        AmountCategory::Exceptional
    };

    Some(category)
}

/// Additive risk score. Contributions are independent, so an amount above
/// 10,000 collects both amount weights.
pub fn risk_score(amount: Decimal, status: Option<Status>, dayofweek: u32, hour: u32) -> f64 {
    let mut score = 0.0;

    if amount > Decimal::from(HIGH_AMOUNT) {
        score += HIGH_AMOUNT_RISK;
    }

    if amount > Decimal::from(VERY_HIGH_AMOUNT) {
        score += VERY_HIGH_AMOUNT_RISK;
    }

    if status == Some(Status::Failed) {
        score += FAILED_STATUS_RISK;
    }

    if dayofweek >= 5 {
        score += WEEKEND_RISK;
    }

    if hour < NIGHT_END_HOUR {
        score += NIGHT_RISK;
    }

    score
}

/// Buckets a score into (-inf, 20], (20, 50], (50, 80], (80, inf).
///
/// The score is not clamped first; anything above 100 still lands in `Critical`.
pub fn risk_level(score: f64) -> RiskLevel {
    if score <= 20.0 {
        RiskLevel::Low
    } else if score <= 50.0 {
        RiskLevel::Medium
    } else if score <= 80.0 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

/// Derives the calendar, amount and risk fields of a coerced record.
pub fn enrich(record: &Record, processed_at: Timestamp) -> Option<Enrichment> {
    let date = *record.date()?;
    let amount = *record.amount_value()?;
    let amount_category = amount_category(amount)?;

    let status = record.status.as_deref().and_then(Status::from_normalized);
    let dayofweek = date.weekday().num_days_from_monday();
    let hour = date.hour();
    let risk_score = risk_score(amount, status, dayofweek, hour);

    Some(Enrichment {
        transaction_year: date.year(),
        transaction_month: date.month(),
        transaction_day: date.day(),
        transaction_dayofweek: dayofweek,
        transaction_hour: hour,
        amount_category,
        risk_score,
        risk_level: risk_level(risk_score),
        processed_at
    })
}
