use chrono::NaiveDate;
use serde::Serialize;

use shelfwise_core::ValueObject;

use crate::field::FieldType;

/// A custom-field value, tagged by the shape its field declares.
///
/// Serializes untagged: text/select as strings, numbers as JSON numbers,
/// dates as `YYYY-MM-DD`, booleans as JSON booleans.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Select(String),
}

impl ValueObject for FieldValue {}

impl FieldValue {
    /// The field type this variant is legal for.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Date(_) => FieldType::Date,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Select(_) => FieldType::Select,
        }
    }

    /// Human-readable rendering used by item detail views.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Select(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Boolean(true) => "Yes".to_string(),
            FieldValue::Boolean(false) => "No".to_string(),
        }
    }
}

/// Rendering for a value that may be absent.
pub fn display_or_not_set(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "Not set".to_string(), FieldValue::display)
}

/// Format a number with `,` thousands separators.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }

    let raw = n.abs().to_string();
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (raw, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
