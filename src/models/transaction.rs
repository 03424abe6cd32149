use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::errors::RecordError;
use crate::models::{AmountCategory, Record, RiskLevel, Status};
use crate::types::{CustomerId, Timestamp, TransactionId};

/// A validated, enriched transaction ready for loading.
///
/// Field order matches the output schema, so CSV rows serialize in the same
/// column order as `CLEAN_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanTransaction {
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    pub transaction_date: Timestamp,
    pub amount: Decimal,
    pub merchant_id: String,
    pub category: String,
    pub status: Status,
    pub payment_method: String,
    pub transaction_year: i32,
    pub transaction_month: u32,
    pub transaction_day: u32,
    pub transaction_dayofweek: u32,
    pub transaction_hour: u32,
    pub amount_category: AmountCategory,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub processed_at: Timestamp
}

impl TryFrom<Record> for CleanTransaction {
    type Error = RecordError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let transaction_date = record.date().copied();
        let amount = record.amount_value().copied();
        let status = record.status.as_deref().and_then(Status::from_normalized);

        let Record { transaction_id, customer_id, merchant_id, category, payment_method, enrichment, .. } = record;

        match (transaction_id, customer_id, transaction_date, amount, merchant_id, category, status, payment_method, enrichment) {
            (
                Some(transaction_id),
                Some(customer_id),
                Some(transaction_date),
                Some(amount),
                Some(merchant_id),
                Some(category),
                Some(status),
                Some(payment_method),
                Some(enrichment)
            ) => Ok(Self {
                transaction_id,
                customer_id,
                transaction_date,
                amount,
                merchant_id,
                category,
                status,
                payment_method,
                transaction_year: enrichment.transaction_year,
                transaction_month: enrichment.transaction_month,
                transaction_day: enrichment.transaction_day,
                transaction_dayofweek: enrichment.transaction_dayofweek,
                transaction_hour: enrichment.transaction_hour,
                amount_category: enrichment.amount_category,
                risk_score: enrichment.risk_score,
                risk_level: enrichment.risk_level,
                processed_at: enrichment.processed_at
            }),
            (transaction_id, customer_id, transaction_date, amount, merchant_id, category, status, payment_method, enrichment) => {
                let mut fields = Vec::new();

                if transaction_id.is_none() { fields.push("transaction_id"); }
                if customer_id.is_none() { fields.push("customer_id"); }
                if transaction_date.is_none() { fields.push("transaction_date"); }
                if amount.is_none() { fields.push("amount"); }
                if merchant_id.is_none() { fields.push("merchant_id"); }
                if category.is_none() { fields.push("category"); }
                if status.is_none() { fields.push("status"); }
                if payment_method.is_none() { fields.push("payment_method"); }
                if enrichment.is_none() {
                    fields.push("risk_score");
                    fields.push("risk_level");
                }

                Err(RecordError::MissingFields { transaction_id, fields })
            }
        }
    }
}
