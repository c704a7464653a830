use chrono::{DateTime, Duration, Utc};
use conductor_core::{ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category used when a caller does not name one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Categories advertised to tool clients. Any other string is accepted too.
pub const KNOWN_CATEGORIES: [&str; 6] = [
    "general",
    "session",
    "orchestration",
    "performance",
    "dashboard",
    "user_prefs",
];

/// How a stored value is encoded in the `value` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Stored as-is.
    String,
    /// Stored as JSON number text.
    Number,
    /// Stored as `true` or `false`.
    Boolean,
    /// Objects, arrays and null, stored as JSON text.
    Json,
}

impl ValueType {
    /// Name stored in the `value_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }

    /// Type a JSON value is stored as.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null | Value::Array(_) | Value::Object(_) => Self::Json,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown value type '{other}'")),
        }
    }
}

/// Text form of `value` for the `value` column.
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Inverse of [`encode_value`]. Text that does not parse as its declared type
/// comes back as a string.
pub fn decode_value(text: &str, value_type: ValueType) -> Value {
    match value_type {
        ValueType::String => Value::String(text.to_string()),
        ValueType::Boolean => Value::Bool(matches!(
            text.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )),
        ValueType::Number | ValueType::Json => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
    }
}

/// A value to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    /// Unique key; storing an existing key overwrites it.
    pub key: String,
    /// Value to store.
    pub value: Value,
    /// Category, [`DEFAULT_CATEGORY`] unless set.
    pub category: String,
    /// After this instant the entry is hidden and eligible for cleanup.
    pub expires_at: Option<DateTime<Utc>>,
    /// Session the entry belongs to.
    pub session_id: Option<String>,
    /// Free-form JSON kept alongside the value.
    pub metadata: Value,
}

impl NewMemory {
    /// Value under `key` in the default category, never expiring.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            category: DEFAULT_CATEGORY.to_string(),
            expires_at: None,
            session_id: None,
            metadata: Value::Object(serde_json::Map::new()),
        }
    }

    /// Store under `category`.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Expire `hours` from now. Zero means no expiry.
    ///
    /// Offsets that do not fit a timestamp are rejected rather than wrapped.
    pub fn expires_in_hours(mut self, hours: u64) -> ConductorResult<Self> {
        if hours == 0 {
            self.expires_at = None;
            return Ok(self);
        }
        let out_of_range =
            || ConductorError::InvalidArgument(format!("expires_hours {hours} is out of range"));
        let delta = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(out_of_range)?;
        self.expires_at = Some(
            Utc::now()
                .checked_add_signed(delta)
                .ok_or_else(out_of_range)?,
        );
        Ok(self)
    }

    /// Expire at an absolute instant.
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Attach the entry to a session.
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Replace the metadata object.
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A stored, unexpired value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique key.
    pub key: String,
    /// Category the entry is listed under.
    pub category: String,
    /// Decoded value.
    pub value: Value,
    /// How the value was stored.
    pub value_type: ValueType,
    /// First store of the key.
    pub created_at: DateTime<Utc>,
    /// Latest store of the key.
    pub updated_at: DateTime<Utc>,
    /// Expiry instant, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Owning session, if any.
    pub session_id: Option<String>,
    /// Metadata object.
    pub metadata: Value,
}

/// A tracked client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Caller-chosen id.
    pub session_id: String,
    /// First creation.
    pub created_at: DateTime<Utc>,
    /// Last create or refresh.
    pub last_active: DateTime<Utc>,
    /// Context object supplied on the last refresh.
    pub context_data: Value,
    /// Whether the session is still active.
    pub is_active: bool,
}

/// Storage statistics reported by `memory_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Unexpired entries.
    pub total_entries: u64,
    /// Unexpired entries per category.
    pub category_breakdown: BTreeMap<String, u64>,
    /// Expired entries not yet cleaned up.
    pub expired_entries: u64,
    /// Tracked sessions.
    pub sessions: u64,
    /// Page count times page size.
    pub database_size_bytes: u64,
    /// [`KNOWN_CATEGORIES`] as strings.
    pub categories_available: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_of() {
        assert_eq!(ValueType::of(&json!("x")), ValueType::String);
        assert_eq!(ValueType::of(&json!(3.5)), ValueType::Number);
        assert_eq!(ValueType::of(&json!(true)), ValueType::Boolean);
        assert_eq!(ValueType::of(&json!({"a": 1})), ValueType::Json);
        assert_eq!(ValueType::of(&Value::Null), ValueType::Json);
    }

    #[test]
    fn test_strings_stored_raw() {
        assert_eq!(encode_value(&json!("hello")), "hello");
        assert_eq!(decode_value("hello", ValueType::String), json!("hello"));
    }

    #[test]
    fn test_boolean_decoding_is_lenient() {
        assert_eq!(decode_value("yes", ValueType::Boolean), json!(true));
        assert_eq!(decode_value("off", ValueType::Boolean), json!(false));
    }

    #[test]
    fn test_bad_number_falls_back_to_string() {
        assert_eq!(decode_value("12abc", ValueType::Number), json!("12abc"));
        assert_eq!(decode_value("42", ValueType::Number), json!(42));
    }

    #[test]
    fn test_zero_hours_never_expires() {
        let memory = NewMemory::new("k", json!(1)).expires_in_hours(0).unwrap();
        assert!(memory.expires_at.is_none());
        let memory = NewMemory::new("k", json!(1)).expires_in_hours(2).unwrap();
        assert!(memory.expires_at.unwrap() > Utc::now());
    }

    #[test]
    fn test_huge_expiry_rejected() {
        for hours in [10_000_000_000, i64::MAX as u64, u64::MAX] {
            let err = NewMemory::new("k", json!(1))
                .expires_in_hours(hours)
                .unwrap_err();
            assert!(matches!(err, ConductorError::InvalidArgument(_)), "{hours}: {err}");
        }
    }
}
