//! Response parsing: JSON extraction and schema validation.

use serde_json::Value;

use super::types::Category;
use crate::error::ClassifyError;

/// True iff `value` is an object with a known `category`, a numeric
/// `confidence` in `[0, 1]`, and a string `reasoning`.
pub fn validate_classification(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let category_ok = obj
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::parse)
        .is_some();
    let confidence_ok = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .is_some_and(|c| (0.0..=1.0).contains(&c));
    let reasoning_ok = obj.get("reasoning").is_some_and(Value::is_string);

    category_ok && confidence_ok && reasoning_ok
}

/// Extract and parse the first JSON object embedded in a model response.
///
/// Each `{` is tried in order as the opening of a balanced object; the
/// first one that parses wins.
pub fn extract_json_object(text: &str) -> Result<Value, ClassifyError> {
    let mut found_brace = false;

    for (start, _) in text.match_indices('{') {
        found_brace = true;
        let Some(end) = balanced_object_end(text, start) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
            return Ok(value);
        }
    }

    if found_brace {
        Err(ClassifyError::InvalidJson)
    } else {
        Err(ClassifyError::NoJsonFound)
    }
}

/// Byte index of the `}` closing the object opened at `start`.
///
/// Braces inside string literals are ignored.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// A classification the model returned and the validator accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
}

/// Turn raw completion text into a verdict.
///
/// Confidence is clamped to `[0, 1]` even though validation already
/// rejects values outside it.
pub fn parse_classification(text: &str) -> Result<Verdict, ClassifyError> {
    let value = extract_json_object(text)?;
    if !validate_classification(&value) {
        return Err(ClassifyError::InvalidFormat);
    }

    let category = value["category"]
        .as_str()
        .and_then(Category::parse)
        .ok_or(ClassifyError::InvalidFormat)?;
    let confidence = value["confidence"]
        .as_f64()
        .ok_or(ClassifyError::InvalidFormat)?
        .clamp(0.0, 1.0);
    let reasoning = value["reasoning"].as_str().unwrap_or_default().to_string();

    Ok(Verdict {
        category,
        confidence,
        reasoning,
    })
}
