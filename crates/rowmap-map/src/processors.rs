//! Built-in value processors that configuration files can name.

use rowmap_model::Value;

use crate::rule::ValueProcessor;

/// Names accepted by [`by_name`].
pub const BUILTIN_PROCESSORS: &[&str] = &["trim", "uppercase", "lowercase", "empty_as_null"];

/// Trims surrounding whitespace from text values.
pub fn trim() -> ValueProcessor {
    map_text("trim", |text| text.trim().to_string())
}

pub fn uppercase() -> ValueProcessor {
    map_text("uppercase", |text| text.to_uppercase())
}

pub fn lowercase() -> ValueProcessor {
    map_text("lowercase", |text| text.to_lowercase())
}

/// Turns blank text into `NULL`.
pub fn empty_as_null() -> ValueProcessor {
    ValueProcessor::new("empty_as_null", |_, raw, _| {
        Ok(match raw {
            Value::Text(text) if text.trim().is_empty() => Value::Null,
            other => other,
        })
    })
}

/// Looks up a built-in processor by its configuration name.
pub fn by_name(name: &str) -> Option<ValueProcessor> {
    match name {
        "trim" => Some(trim()),
        "uppercase" => Some(uppercase()),
        "lowercase" => Some(lowercase()),
        "empty_as_null" => Some(empty_as_null()),
        _ => None,
    }
}

fn map_text(key: &'static str, f: fn(&str) -> String) -> ValueProcessor {
    ValueProcessor::new(key, move |_, raw, _| {
        Ok(match raw {
            Value::Text(text) => Value::Text(f(&text)),
            other => other,
        })
    })
}
