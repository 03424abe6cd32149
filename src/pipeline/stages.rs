use std::collections::HashSet;
use std::fmt;
use std::fmt::{Display, Formatter};

use tracing::{debug, warn};

use crate::models::{Record, Tabular};
use crate::pipeline::enrichment::enrich;
use crate::pipeline::report::{DropReason, Removal};
use crate::pipeline::rules::{BusinessRule, RunContext};
use crate::types::{Coercible, CoercionError, parse_amount, parse_timestamp};

const CRITICAL_FIELDS: [&str; 3] = ["transaction_id", "customer_id", "amount"];

/// One cleaning step. Every stage returns at most as many records as it receives.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Stage {
    Deduplicate,
    HandleMissing,
    CoerceTypes,
    BusinessRule(BusinessRule),
    DeriveFields
}

#[derive(Debug, Default)]
pub struct StageOutcome {
    pub records: Vec<Record>,
    pub removals: Vec<Removal>
}

impl Stage {
    /// Fixed execution order. Final validation follows as the terminal step.
    pub const SEQUENCE: [Stage; 9] = [
        Stage::Deduplicate,
        Stage::HandleMissing,
        Stage::CoerceTypes,
        Stage::BusinessRule(BusinessRule::PositiveAmount),
        Stage::BusinessRule(BusinessRule::MaxAmount),
        Stage::BusinessRule(BusinessRule::ValidStatus),
        Stage::BusinessRule(BusinessRule::NotFuture),
        Stage::BusinessRule(BusinessRule::MaxAge),
        Stage::DeriveFields
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Deduplicate => "deduplicate",
            Stage::HandleMissing => "handle_missing",
            Stage::CoerceTypes => "coerce_types",
            Stage::BusinessRule(_) => "business_rules",
            Stage::DeriveFields => "derive_fields"
        }
    }

    pub fn apply(&self, records: Vec<Record>, context: &RunContext<'_>) -> StageOutcome {
        let input_count = records.len();

        let outcome = match self {
            Stage::Deduplicate => deduplicate(records),
            Stage::HandleMissing => handle_missing(records, context),
            Stage::CoerceTypes => coerce_types(records),
            Stage::BusinessRule(rule) => apply_rule(*rule, records, context),
            Stage::DeriveFields => derive_fields(records, context)
        };

        for removal in &outcome.removals {
            warn!("Stage [{}] removed {} record(s): {}", removal.stage, removal.count, removal.reason);
        }

        debug!("Stage [{self}] complete. Records: {input_count} -> {}", outcome.records.len());

        outcome
    }

    fn removal(&self, reason: DropReason, count: usize) -> Option<Removal> {
        (count > 0).then_some(Removal { stage: self.name(), reason, count })
    }
}

impl Display for Stage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BusinessRule(rule) => write!(formatter, "{}:{}", self.name(), rule.name()),
            _ => formatter.write_str(self.name())
        }
    }
}

/// Dedup key: the trimmed, upper-cased transaction id. Blank ids share the `None` key.
fn dedup_key(record: &Record) -> Option<String> {
    record.transaction_id.as_deref()
        .map(|id| id.trim().to_uppercase())
        .filter(|id| !id.is_empty())
}

fn deduplicate(records: Vec<Record>) -> StageOutcome {
    let input_count = records.len();
    let mut seen = HashSet::with_capacity(input_count);

    let records: Vec<Record> = records.into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect();

    let removals = Stage::Deduplicate
        .removal(DropReason::DuplicateTransactionId, input_count - records.len())
        .into_iter()
        .collect();

    StageOutcome { records, removals }
}

fn handle_missing(mut records: Vec<Record>, context: &RunContext<'_>) -> StageOutcome {
    let mut removals = Vec::new();

    for field in CRITICAL_FIELDS {
        let before = records.len();
        records.retain(|record| !record.is_null(field));

        removals.extend(Stage::HandleMissing.removal(DropReason::MissingField(field), before - records.len()));
    }

    let config = context.config;

    for record in records.iter_mut() {
        if record.is_null("merchant_id") {
            record.merchant_id = Some(config.unknown_merchant.clone());
        }

        if record.is_null("category") {
            record.category = Some(config.unknown_category.clone());
        }

        if record.is_null("payment_method") {
            record.payment_method = Some(config.unknown_payment_method.clone());
        }
    }

    StageOutcome { records, removals }
}

fn coerce<T, F>(value: Option<Coercible<T>>, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Result<T, CoercionError>,
{
    match value?.coerce_with(parse) {
        Ok(value) => Some(value),
        Err(error) => {
            debug!("{error}");
            None
        }
    }
}

fn normalize_identifier(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_uppercase())
}

fn normalize_categorical(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_lowercase())
}

fn coerce_types(records: Vec<Record>) -> StageOutcome {
    let mut invalid_dates = 0;
    let mut invalid_amounts = 0;

    let records: Vec<Record> = records.into_iter()
        .filter_map(|mut record| {
            let Some(date) = coerce(record.transaction_date.take(), parse_timestamp) else {
                invalid_dates += 1;
                return None;
            };

            let Some(amount) = coerce(record.amount.take(), parse_amount) else {
                invalid_amounts += 1;
                return None;
            };

            Some(Record {
                transaction_id: normalize_identifier(record.transaction_id),
                customer_id: normalize_identifier(record.customer_id),
                transaction_date: Some(Coercible::Value(date)),
                amount: Some(Coercible::Value(amount)),
                merchant_id: normalize_identifier(record.merchant_id),
                category: normalize_categorical(record.category),
                status: normalize_categorical(record.status),
                payment_method: normalize_categorical(record.payment_method),
                enrichment: record.enrichment
            })
        })
        .collect();

    let removals = [
        Stage::CoerceTypes.removal(DropReason::InvalidValue("transaction_date"), invalid_dates),
        Stage::CoerceTypes.removal(DropReason::InvalidValue("amount"), invalid_amounts)
    ].into_iter().flatten().collect();

    StageOutcome { records, removals }
}

fn apply_rule(rule: BusinessRule, mut records: Vec<Record>, context: &RunContext<'_>) -> StageOutcome {
    let before = records.len();
    records.retain(|record| rule.admits(record, context));

    let removals = Stage::BusinessRule(rule)
        .removal(DropReason::BusinessRule(rule), before - records.len())
        .into_iter()
        .collect();

    StageOutcome { records, removals }
}

fn derive_fields(mut records: Vec<Record>, context: &RunContext<'_>) -> StageOutcome {
    for record in records.iter_mut() {
        record.enrichment = enrich(record, context.now);
    }

    StageOutcome { records, removals: Vec::new() }
}
