// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sign number syntax: four digits with an optional one-level decimal suffix

use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}(?:\.[0-9]+)?$").expect("label pattern is valid"));

/// Placeholder number printed on templates, never a real sign
const PLACEHOLDER: &str = "0000";

/// Whether `text` (already trimmed) is a reportable sign number
pub fn is_label(text: &str) -> bool {
    text != PLACEHOLDER && LABEL_PATTERN.is_match(text)
}

/// Integer part of a sign number ("2001.2" -> "2001")
pub fn base_number(label: &str) -> &str {
    label.split('.').next().unwrap_or(label)
}

/// Base number of a series member, `None` for plain labels
pub fn series_base(label: &str) -> Option<&str> {
    label.contains('.').then(|| base_number(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_label() {
        assert!(is_label("2001"));
        assert!(is_label("2001.1"));
        assert!(is_label("0001"));
        assert!(is_label("2001.15"));
        assert!(!is_label("0000"));
        assert!(!is_label("20011"));
        assert!(!is_label("201"));
        assert!(!is_label("2001."));
        assert!(!is_label("2001.1.2"));
        assert!(!is_label(" 2001"));
        assert!(!is_label("२००१"));
    }

    #[test]
    fn test_series_base() {
        assert_eq!(series_base("2001.2"), Some("2001"));
        assert_eq!(series_base("2001"), None);
        assert_eq!(base_number("2001"), "2001");
    }
}
