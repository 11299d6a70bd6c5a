//! Heuristic parsing of free-form correction feedback.
//!
//! The critique step asks the model for a correction in prose. Nothing
//! guarantees a structure, so this parser only assumes:
//!
//! - the first non-empty line is `label: corrected sentence` (or just the
//!   corrected sentence when there is no colon). The label ends at the first
//!   ASCII `:` or full-width `：`, whichever comes first,
//! - any further non-empty lines are the explanation.
//!
//! Keeping it a standalone pure function lets it be swapped for a
//! structured-output contract without touching the pipeline.

use crate::core::UserCorrection;

/// Parse model feedback into a correction for `original`.
///
/// Returns `None` when the feedback has no non-empty lines.
pub fn parse_correction(original: &str, feedback: &str) -> Option<UserCorrection> {
    let lines: Vec<&str> = feedback
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let (first, rest) = lines.split_first()?;

    let corrected = match split_label(first) {
        Some(after) if !after.is_empty() => after,
        _ => first,
    };

    let explain = if rest.is_empty() {
        first.to_string()
    } else {
        rest.join("\n")
    };

    Some(UserCorrection {
        original: original.to_string(),
        corrected: if corrected.is_empty() {
            original.to_string()
        } else {
            corrected.to_string()
        },
        explain,
    })
}

/// Text after the first colon (ASCII or full-width), trimmed.
fn split_label(line: &str) -> Option<&str> {
    line.find([':', '：']).map(|idx| {
        let colon_len = line[idx..].chars().next().map_or(1, char::len_utf8);
        line[idx + colon_len..].trim()
    })
}
