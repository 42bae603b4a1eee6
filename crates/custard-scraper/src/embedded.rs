//! JSON documents embedded in page markup.

use regex::Regex;
use serde_json::Value;

use crate::error::ScraperError;
use crate::markup::ParsedMarkup;

/// Parse the Next.js `__NEXT_DATA__` script block, if the page has one.
///
/// # Errors
///
/// Returns [`ScraperError::Deserialize`] when the block exists but is not
/// valid JSON.
pub fn next_data(html: &str) -> Result<Option<Value>, ScraperError> {
    let raw = {
        let markup = ParsedMarkup::parse(html);
        match markup.select_first("script#__NEXT_DATA__") {
            Some(script) => script.raw_text(),
            None => return Ok(None),
        }
    };
    serde_json::from_str(raw.trim())
        .map(Some)
        .map_err(|source| ScraperError::Deserialize {
            context: "__NEXT_DATA__".to_string(),
            source,
        })
}

/// Find `window.<var> = {...}` (or an array) in the page's inline scripts and
/// parse the assigned value.
///
/// # Errors
///
/// Returns [`ScraperError::Deserialize`] when the assignment is found but
/// its value does not parse.
pub fn window_assignment(html: &str, var: &str) -> Result<Option<Value>, ScraperError> {
    let pattern = format!(r"window\.{}\s*=\s*", regex::escape(var));
    let Ok(assignment) = Regex::new(&pattern) else {
        return Ok(None);
    };

    let scripts = ParsedMarkup::parse(html).inline_scripts();
    for script in &scripts {
        for found in assignment.find_iter(script) {
            let Some(literal) = extract_balanced(&script[found.end()..]) else {
                continue;
            };
            return serde_json::from_str(literal)
                .map(Some)
                .map_err(|source| ScraperError::Deserialize {
                    context: format!("window.{var}"),
                    source,
                });
        }
    }
    Ok(None)
}

/// Follow `path` through nested objects.
#[must_use]
pub fn json_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Return the leading JSON object or array of `s`, matched by bracket depth
/// with string literals skipped.
fn extract_balanced(s: &str) -> Option<&str> {
    if !s.starts_with('{') && !s.starts_with('[') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
