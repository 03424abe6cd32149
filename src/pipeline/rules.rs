use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::models::{Record, Status};
use crate::types::Timestamp;

/// Evaluation-time inputs shared by every stage of one `transform` call.
pub struct RunContext<'a> {
    pub config: &'a PipelineConfig,
    /// Captured once per run; also stamped as `processed_at`.
    pub now: Timestamp,
    oldest_allowed: Option<Timestamp>
}

impl<'a> RunContext<'a> {
    pub fn new(config: &'a PipelineConfig, now: Timestamp) -> Self {
        let oldest_allowed = TimeDelta::try_days(config.max_age_days)
            .and_then(|window| now.checked_sub_signed(window));

        Self { config, now, oldest_allowed }
    }
}

/// Independent record filters, applied in this order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessRule {
    PositiveAmount,
    MaxAmount,
    ValidStatus,
    NotFuture,
    MaxAge
}

impl BusinessRule {
    pub const ALL: [BusinessRule; 5] = [
        BusinessRule::PositiveAmount,
        BusinessRule::MaxAmount,
        BusinessRule::ValidStatus,
        BusinessRule::NotFuture,
        BusinessRule::MaxAge
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BusinessRule::PositiveAmount => "positive_amount",
            BusinessRule::MaxAmount => "max_amount",
            BusinessRule::ValidStatus => "valid_status",
            BusinessRule::NotFuture => "not_future",
            BusinessRule::MaxAge => "max_age"
        }
    }

    pub fn admits(&self, record: &Record, context: &RunContext<'_>) -> bool {
        match self {
            BusinessRule::PositiveAmount => record.amount_value().is_some_and(|amount| *amount > Decimal::ZERO),
            BusinessRule::MaxAmount => record.amount_value().is_some_and(|amount| *amount <= context.config.max_amount),
            BusinessRule::ValidStatus => record.status.as_deref().and_then(Status::from_normalized).is_some(),
            BusinessRule::NotFuture => record.date().is_some_and(|date| *date <= context.now),
            BusinessRule::MaxAge => match (record.date(), context.oldest_allowed) {
                (Some(date), Some(oldest)) => *date >= oldest,
                (Some(_), None) => true,
                (None, _) => false
            }
        }
    }
}

impl Display for BusinessRule {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let description = match self {
            BusinessRule::PositiveAmount => "non-positive amount",
            BusinessRule::MaxAmount => "amount above the maximum",
            BusinessRule::ValidStatus => "invalid status",
            BusinessRule::NotFuture => "future transaction date",
            BusinessRule::MaxAge => "transaction date outside the retention window"
        };

        formatter.write_str(description)
    }
}
