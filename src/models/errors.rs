use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Record [{}] is missing required fields: {:?}", .transaction_id.as_deref().unwrap_or("<none>"), .fields)]
    MissingFields {
        transaction_id: Option<String>,
        fields: Vec<&'static str>
    }
}
