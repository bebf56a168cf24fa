//! Isolates the JSON object embedded in a text-generation answer.
//!
//! Models frequently wrap structured answers in markdown fences or add a
//! sentence of prose around them. [`extract_json_payload`] strips that
//! wrapping and only returns text that actually parses as a JSON object.

use serde_json::Value;

/// Find the JSON object in `text`
///
/// Tried in order:
/// 1. a ```` ```json ```` fenced block
/// 2. any other fenced block (language tag skipped)
/// 3. the first balanced `{ ... }` span in the raw text that parses
///
/// Returns `None` when no candidate parses as a JSON object.
pub fn extract_json_payload(text: &str) -> Option<&str> {
    let candidates = [
        fenced_block(text, "```json"),
        fenced_block(text, "```"),
        balanced_object(text),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| is_json_object(candidate))
}

/// Parse the embedded payload into `T`
pub fn parse_json_payload<T>(text: &str) -> Result<T, PayloadError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let payload = extract_json_payload(text).ok_or(PayloadError::NotFound)?;
    serde_json::from_str(payload).map_err(PayloadError::Invalid)
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("no JSON object found in response")]
    NotFound,

    #[error("JSON payload did not match the expected shape: {0}")]
    Invalid(#[source] serde_json::Error),
}

fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    // Skip the language tag (or the rest of the opener line)
    let body_start = if opener == "```" {
        rest.find('\n').map(|i| i + 1).unwrap_or(0)
    } else {
        0
    };
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn balanced_object(text: &str) -> Option<&str> {
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_span(&text[start..]))
        .find(|span| is_json_object(span))
}

/// The `{ ... }` prefix of `text` whose braces balance, ignoring braces in strings
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_json_object(candidate: &str) -> bool {
    matches!(serde_json::from_str::<Value>(candidate), Ok(Value::Object(_)))
}
