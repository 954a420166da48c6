//! Record decoders.
//!
//! A decoder turns one raw record into a structured event for the
//! sink. Returning `Ok(None)` (or an empty map) drops the record;
//! errors are logged by the caller and never abort a read pass.

use serde_json::Value;

/// A structured event produced from one raw record.
pub type Event = serde_json::Map<String, Value>;

/// Errors produced while decoding a record.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The record is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The record parsed but is not a JSON object.
    #[error("Record is not a JSON object")]
    NotAnObject,
}

/// Converts raw records into structured events.
pub trait RecordDecoder: Send + Sync {
    /// Decode one record (delimiter already stripped).
    ///
    /// `Ok(None)` signals "drop this record".
    ///
    /// # Errors
    ///
    /// Returns an error for a record this decoder cannot interpret.
    fn decode(&self, record: &str) -> Result<Option<Event>, DecodeError>;
}

/// Wraps each record verbatim under a `message` key.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainDecoder;

impl RecordDecoder for PlainDecoder {
    fn decode(&self, record: &str) -> Result<Option<Event>, DecodeError> {
        let mut event = Event::new();
        event.insert("message".to_string(), Value::String(record.to_string()));
        Ok(Some(event))
    }
}

/// Parses each record as a JSON object.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl RecordDecoder for JsonDecoder {
    fn decode(&self, record: &str) -> Result<Option<Event>, DecodeError> {
        let trimmed = record.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(DecodeError::NotAnObject),
        }
    }
}
