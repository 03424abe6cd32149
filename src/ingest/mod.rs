mod errors;
mod reader;
mod writer;

pub use errors::IngestError;
pub use reader::{dataset_name, read_customers, read_customers_file, read_transactions, read_transactions_file};
pub use writer::{write_json, write_json_file, write_transactions, write_transactions_file};
