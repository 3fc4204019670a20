use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_meters")]
    pub meters: f64,
    #[serde(
        default,
        deserialize_with = "lenient_note",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<String>,
}

impl Session {
    pub fn km(&self) -> f64 {
        self.meters / 1000.0
    }
}

/// Accepts numbers and numeric strings. Anything else, or a negative or
/// non-finite value, reads as zero.
fn lenient_meters<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let meters = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if meters.is_finite() && meters > 0.0 { meters } else { 0.0 })
}

/// Strings are kept, numbers become their text form, anything else is empty.
/// A row with an unusable date still counts towards the distance.
fn lenient_date<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_note<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?).filter(|note| !note.is_empty()))
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
