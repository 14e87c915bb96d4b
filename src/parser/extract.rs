use regex::Regex;
use tracing::warn;

use crate::parser::patterns;
use crate::store::FieldMap;

/// Extract every recognizable field from one page of OCR text.
///
/// Evaluation order matters: a bare "Name:" line is tried first, a
/// first+last name pair overrides it, and only then does the general table
/// run (skipping `name` once it is resolved). Extraction is a pure function
/// of the text; a pattern that finds nothing simply leaves its field out.
pub fn extract_page_fields(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    // A line ending in "Name: <value>" is the most reliable name source on
    // scanned forms, so it gets first claim.
    if let Some(name_rule) = patterns::get("name") {
        if let Some(alt) = &name_rule.alternate {
            if let Some(value) = capture(alt, text).and_then(|raw| accept("name", &raw)) {
                fields.insert("name".to_string(), value);
            }
        }
    }

    // Forms that split the name into first/last are stitched back together,
    // overriding whatever the labeled line produced.
    let first = patterns::get("first_name")
        .and_then(|p| capture(&p.primary, text))
        .and_then(|raw| accept("first_name", &raw));
    let last = patterns::get("last_name")
        .and_then(|p| capture(&p.primary, text))
        .and_then(|raw| accept("last_name", &raw));
    if let (Some(first), Some(last)) = (first, last) {
        if let Some(value) = accept("name", &format!("{} {}", first, last)) {
            fields.insert("name".to_string(), value);
        }
    }

    for pattern in patterns::all() {
        if matches!(pattern.field, "first_name" | "last_name") {
            continue;
        }
        if pattern.field == "name" && fields.contains_key("name") {
            continue;
        }

        let mut value = capture(&pattern.primary, text);
        if value.is_none() && pattern.field == "dob" {
            if let Some(alt) = &pattern.alternate {
                value = capture(alt, text);
            }
        }

        if let Some(value) = value.and_then(|raw| accept(pattern.field, &raw)) {
            fields.insert(pattern.field.to_string(), value);
        }
    }

    // "Name: Student" and friends are the form talking about itself.
    let placeholder = fields
        .get("name")
        .is_some_and(|name| patterns::is_reserved_name(name));
    if placeholder {
        fields.remove("name");
    }

    fields
}

fn capture(rule: &Regex, text: &str) -> Option<String> {
    rule.captures(text).map(|caps| caps[1].trim().to_string())
}

/// Trim and validate a captured value. Rejections are logged and the field is
/// dropped; the page keeps processing.
fn accept(field: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.chars().count() > patterns::MAX_VALUE_CHARS {
        warn!("skipping over-long value for {}: {}...", field, sample(value));
        return None;
    }
    if field != "address" && value.split_whitespace().count() > patterns::MAX_VALUE_TOKENS {
        warn!("skipping sentence-like value for {}: {}...", field, sample(value));
        return None;
    }
    Some(value.to_string())
}

fn sample(value: &str) -> String {
    value.chars().take(50).collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_name_line_binds_name() {
        let fields = extract_page_fields("Name: Jane Doe\nStudent ID: 12345\nCourse: CS");
        assert_eq!(fields.get("name").map(String::as_str), Some("Jane Doe"));
        assert_eq!(fields.get("student_id").map(String::as_str), Some("12345"));
        assert_eq!(fields.get("course").map(String::as_str), Some("CS"));
    }

    #[test]
    fn first_and_last_name_override_labeled_line() {
        // The digit line stops the first-name capture at the line break.
        let fields = extract_page_fields("First Name: Jane\n2024 intake\nLast Name: Doe");
        assert_eq!(fields.get("name").map(String::as_str), Some("Jane Doe"));
        assert!(!fields.contains_key("first_name"));
        assert!(!fields.contains_key("last_name"));
    }

    #[test]
    fn first_name_alone_does_not_synthesize() {
        let fields = extract_page_fields("First Name: Jane\n2024 intake");
        // The bare "Name:" line rule still sees "First Name: Jane".
        assert_eq!(fields.get("name").map(String::as_str), Some("Jane"));
    }

    #[test]
    fn dob_falls_back_to_year_first_format() {
        let fields = extract_page_fields("DOB: 2006-11-5");
        assert_eq!(fields.get("dob").map(String::as_str), Some("2006-11-5"));
    }

    #[test]
    fn over_long_value_is_dropped() {
        let text = format!("Course: {}", "x".repeat(120));
        let fields = extract_page_fields(&text);
        assert!(!fields.contains_key("course"));
    }

    #[test]
    fn sentence_like_value_is_dropped_except_for_address() {
        let sentence = "one two three four five six seven eight nine ten eleven";
        let fields = extract_page_fields(&format!("Course: {}", sentence));
        assert!(!fields.contains_key("course"));

        let fields = extract_page_fields(&format!("Address: {}", sentence));
        assert_eq!(fields.get("address").map(String::as_str), Some(sentence));
    }

    #[test]
    fn reserved_placeholder_names_are_removed() {
        let fields = extract_page_fields("Name: Candidate\nStudent ID: 12345");
        assert!(!fields.contains_key("name"));
        assert_eq!(fields.get("student_id").map(String::as_str), Some("12345"));

        let fields = extract_page_fields("Name: the student\nStudent ID: 12345");
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn unlabeled_text_yields_no_fields() {
        assert!(extract_page_fields("lorem ipsum dolor sit amet").is_empty());
        assert!(extract_page_fields("").is_empty());
    }
}
