// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Parsing of classifier responses

use serde::Deserialize;

use crate::content::CategorizationResult;
use crate::{ArgusError, Result};

#[derive(Deserialize)]
struct ClassificationResponse {
    has_people: bool,
    has_hardware: bool,
}

/// Parse a classifier reply into facets.
///
/// Models often wrap the object in prose or a code fence, so the outermost
/// `{...}` span is extracted first. Missing or non-boolean fields are errors.
pub fn parse_classification(raw: &str) -> Result<CategorizationResult> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => {
            return Err(ArgusError::Analysis(format!(
                "No JSON object in classifier response: {:?}",
                truncate(raw, 120)
            )))
        }
    };

    let parsed: ClassificationResponse = serde_json::from_str(json)?;
    Ok(CategorizationResult {
        has_people: parsed.has_people,
        has_hardware: parsed.has_hardware,
    })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
