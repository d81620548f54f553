use crate::helper::{error_chain_fmt, escape_control_chars};
use serde_json::Value as JsonValue;

/// Renders a result caption as one `- **label**: value` line per field.
///
/// Fields holding a mapping (ex: a metadata group) are flattened one level:
/// each of their sub-fields gets its own line, labelled with the sub-field name.
/// Control characters in labels and values are escaped so each field stays on one line.
pub fn format_detail(caption: &str) -> Result<String, DetailFormatError> {
    let fields = match serde_json::from_str(caption)? {
        JsonValue::Object(fields) => fields,
        _ => return Err(DetailFormatError::NotAMapping(caption.to_string())),
    };

    let mut lines = Vec::with_capacity(fields.len());
    for (label, value) in &fields {
        match value {
            JsonValue::Object(group) => {
                for (sub_label, sub_value) in group {
                    lines.push(detail_line(sub_label, sub_value));
                }
            }
            _ => lines.push(detail_line(label, value)),
        }
    }

    Ok(lines.join("\n"))
}

fn detail_line(label: &str, value: &JsonValue) -> String {
    let value = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "- **{}**: {}",
        escape_control_chars(label),
        escape_control_chars(&value)
    )
}

#[derive(thiserror::Error)]
pub enum DetailFormatError {
    #[error("Caption is not valid JSON: {0}")]
    InvalidCaption(#[from] serde_json::Error),
    #[error("Caption is not a JSON mapping: {0}")]
    NotAMapping(String),
}

impl std::fmt::Debug for DetailFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
