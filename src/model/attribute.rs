use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Value, json};

/// A single model attribute.
///
/// Most attributes carry their raw JSON value straight through. Attributes
/// declared as dates on the model descriptor are held as real timestamps
/// instead, with a wire form of integer seconds since the epoch - not the
/// ISO string they may have arrived as. The conversion is reversible:
/// parsing a wire timestamp yields the same date back.
#[derive(Debug, Clone)]
pub enum Attribute {
    Value(Value),
    Date(DateTime<Utc>),
}

impl Attribute {
    /// Build an attribute from its wire value. Date columns are coerced
    /// when the value parses as a date; anything unparseable is kept raw.
    pub fn from_wire(value: Value, is_date: bool) -> Self {
        if is_date && !value.is_null() {
            if let Some(date) = parse_date(&value) {
                return Attribute::Date(date);
            }
        }

        Attribute::Value(value)
    }

    /// The JSON form sent over the wire. Dates serialize to integer
    /// seconds since the epoch.
    pub fn to_wire(&self) -> Value {
        match self {
            Attribute::Value(value) => value.clone(),
            Attribute::Date(date) => json!(date.timestamp()),
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Attribute::Date(date) => Some(*date),
            Attribute::Value(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Attribute::Value(Value::Null))
    }
}

/// Dates compare by underlying timestamp, everything else by value.
impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Attribute::Date(a), Attribute::Date(b)) => a.timestamp() == b.timestamp(),
            _ => self.to_wire() == other.to_wire(),
        }
    }
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_string(s),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }

    // Offsets without a colon, e.g. "2015-11-23T12:11:03+0000"
    if let Ok(date) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}
