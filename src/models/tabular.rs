use crate::models::{CLEAN_COLUMNS, CleanTransaction, RAW_COLUMNS, Record};
use crate::types::Coercible;

/// Column-level view of a row, used for null counting and quality scoring.
pub trait Tabular {
    /// Column names in schema order.
    fn columns() -> &'static [&'static str];

    /// Whether the named column holds no value in this row.
    fn is_null(&self, column: &str) -> bool;

    /// The dedup key of this row. `None` when the key itself is null.
    fn key(&self) -> Option<&str>;

    fn null_count(&self) -> usize {
        Self::columns().iter().filter(|column| self.is_null(column)).count()
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|text| text.trim().is_empty())
}

fn blank_coercible<T>(value: &Option<Coercible<T>>) -> bool {
    value.as_ref().is_none_or(Coercible::is_blank)
}

impl Tabular for Record {
    fn columns() -> &'static [&'static str] {
        &RAW_COLUMNS
    }

    fn is_null(&self, column: &str) -> bool {
        match column {
            "transaction_id" => blank(&self.transaction_id),
            "customer_id" => blank(&self.customer_id),
            "transaction_date" => blank_coercible(&self.transaction_date),
            "amount" => blank_coercible(&self.amount),
            "merchant_id" => blank(&self.merchant_id),
            "category" => blank(&self.category),
            "status" => blank(&self.status),
            "payment_method" => blank(&self.payment_method),
            _ => true
        }
    }

    fn key(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }
}

impl Tabular for CleanTransaction {
    fn columns() -> &'static [&'static str] {
        &CLEAN_COLUMNS
    }

    fn is_null(&self, column: &str) -> bool {
        !CLEAN_COLUMNS.contains(&column)
    }

    fn key(&self) -> Option<&str> {
        Some(&self.transaction_id)
    }
}
