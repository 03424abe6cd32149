use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{error, info};

use crate::ingest::IngestError;
use crate::models::{Record, RecordBatch};
use crate::pipeline::CustomerSet;
use crate::types::Coercible;

const CUSTOMER_COLUMN: &str = "customer_id";

/// One transaction row exactly as it appears in the input. Empty cells and
/// absent columns both read as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    transaction_id: Option<String>,
    customer_id: Option<String>,
    transaction_date: Option<String>,
    amount: Option<String>,
    merchant_id: Option<String>,
    category: Option<String>,
    status: Option<String>,
    payment_method: Option<String>
}

impl From<RawRow> for Record {
    fn from(row: RawRow) -> Self {
        Record {
            transaction_id: row.transaction_id,
            customer_id: row.customer_id,
            transaction_date: row.transaction_date.map(Coercible::Raw),
            amount: row.amount.map(Coercible::Raw),
            merchant_id: row.merchant_id,
            category: row.category,
            status: row.status,
            payment_method: row.payment_method,
            enrichment: None
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    customer_id: Option<String>
}

/// Dataset name for an input file: its file stem.
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(path: &Path) -> Result<BufReader<File>, IngestError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| IngestError::Open { path: path.display().to_string(), source })
}

/// Reads a raw transaction batch. The batch keeps the header as its schema so
/// the pipeline can reject inputs missing a raw column.
pub fn read_transactions<R: Read>(dataset: &str, input: R) -> Result<RecordBatch, IngestError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();

    for result in reader.deserialize::<RawRow>() {
        match result {
            Ok(row) => records.push(Record::from(row)),
            Err(error) => {
                error!("CSV deserialization error in [{dataset}]: {error}");
            }
        }
    }

    info!("Read {} raw records from [{dataset}]", records.len());

    Ok(RecordBatch::with_columns(dataset, columns, records))
}

pub fn read_transactions_file(path: &Path) -> Result<RecordBatch, IngestError> {
    read_transactions(&dataset_name(path), open(path)?)
}

/// Reads the known customer ids from any CSV carrying a `customer_id` column.
pub fn read_customers<R: Read>(input_name: &str, input: R) -> Result<CustomerSet, IngestError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    if !reader.headers()?.iter().any(|column| column == CUSTOMER_COLUMN) {
        return Err(IngestError::MissingColumn { input: input_name.to_string(), column: CUSTOMER_COLUMN });
    }

    let mut ids = Vec::new();

    for result in reader.deserialize::<CustomerRow>() {
        match result {
            Ok(CustomerRow { customer_id: Some(id) }) => ids.push(id),
            Ok(_) => {}
            Err(error) => {
                error!("CSV deserialization error in [{input_name}]: {error}");
            }
        }
    }

    let customers: CustomerSet = ids.into_iter().collect();

    info!("Loaded {} known customers from [{input_name}]", customers.len());

    Ok(customers)
}

pub fn read_customers_file(path: &Path) -> Result<CustomerSet, IngestError> {
    read_customers(&path.display().to_string(), open(path)?)
}
