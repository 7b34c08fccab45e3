//! Turning free-text model replies into typed values.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

use crate::error::UpstreamError;

/// Remove markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Outermost `{...}` or `[...]` span, whichever opens first.
pub fn json_span(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let close = if text.as_bytes()[start] == b'{' { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply as `T`: fence-stripped text first, then the embedded
/// JSON span when the model wrapped the payload in prose.
pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T, UpstreamError> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<T>(&cleaned) {
        Ok(v) => Ok(v),
        Err(first) => json_span(&cleaned)
            .filter(|span| span.len() < cleaned.len())
            .and_then(|span| serde_json::from_str::<T>(span).ok())
            .ok_or_else(|| UpstreamError::Parse(first.to_string())),
    }
}

/// Accept a JSON string, number or bool and keep it as text. Models are loose
/// about `"85%"` versus `85`.
pub fn lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Accept a number or a numeric string like `"12.5"` / `"85%"`.
pub fn lenient_f64<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(d)?;
    let parsed = match &v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .replace(',', "")
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {v}")))
}
