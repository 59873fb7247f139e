//! Message template rendering
//!
//! Templates name their arguments with `{@name}` placeholders, where `name`
//! is made of ASCII letters and digits (and may be empty). Arguments are
//! matched to placeholders by position.

use super::error::{LoggerError, Result};
use super::field::{Attributes, FieldValue};

/// A placeholder occurrence: byte range inside the template and its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

fn placeholders(template: &str) -> Vec<Placeholder<'_>> {
    let bytes = template.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'@' {
            let name_start = i + 2;
            let mut j = name_start;
            while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'}' {
                found.push(Placeholder {
                    start: i,
                    end: j + 1,
                    name: &template[name_start..j],
                });
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }

    found
}

/// Number of placeholders in `template`
#[must_use]
pub fn placeholder_count(template: &str) -> usize {
    placeholders(template).len()
}

/// Substitute `args` into `template`, returning the rendered message and the
/// attribute map keyed by placeholder name.
///
/// # Errors
///
/// Returns [`LoggerError::ArgumentMismatch`] when the number of placeholders
/// differs from the number of arguments.
pub fn render(template: &str, args: &[FieldValue]) -> Result<(String, Attributes)> {
    let found = placeholders(template);
    if found.len() != args.len() {
        return Err(LoggerError::argument_mismatch(found.len(), args.len()));
    }

    let mut message = String::with_capacity(template.len());
    let mut attrs = Attributes::new();
    let mut cursor = 0;

    for (placeholder, arg) in found.iter().zip(args) {
        message.push_str(&template[cursor..placeholder.start]);
        message.push_str(&arg.to_string());
        attrs.insert(placeholder.name.to_string(), arg.clone());
        cursor = placeholder.end;
    }
    message.push_str(&template[cursor..]);

    Ok((message, attrs))
}
