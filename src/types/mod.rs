mod coercion;
mod errors;

use chrono::{DateTime, Utc};

pub use coercion::{Coercible, parse_amount, parse_timestamp};
pub use errors::CoercionError;

pub type TransactionId = String;
pub type CustomerId = String;
pub type Timestamp = DateTime<Utc>;
