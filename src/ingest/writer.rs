use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::ingest::IngestError;
use crate::models::{CLEAN_COLUMNS, CleanTransaction};

/// Writes clean transactions as CSV. The header is always written, even for
/// an empty batch.
pub fn write_transactions<W: Write>(output: W, records: &[CleanTransaction]) -> Result<(), IngestError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(CLEAN_COLUMNS)?;

    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_transactions_file(path: &Path, records: &[CleanTransaction]) -> Result<(), IngestError> {
    write_transactions(create(path)?, records)
}

pub fn write_json<W: Write, T: Serialize + ?Sized>(mut output: W, value: &T) -> Result<(), IngestError> {
    serde_json::to_writer_pretty(&mut output, value)?;
    writeln!(output)?;
    output.flush()?;

    Ok(())
}

pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IngestError> {
    write_json(create(path)?, value)
}

fn create(path: &Path) -> Result<BufWriter<File>, IngestError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| IngestError::Open { path: path.display().to_string(), source })
}
