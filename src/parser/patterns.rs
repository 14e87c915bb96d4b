use std::sync::LazyLock;

use regex::Regex;

/// One labeled-value extraction rule. `alternate` exists for two fields:
/// `name` (a bare "Name:" line, tried before anything else) and `dob`
/// (year-first date format, tried only when the primary fails).
pub struct FieldPattern {
    pub field: &'static str,
    pub primary: Regex,
    pub alternate: Option<Regex>,
}

/// Values this long or longer are almost always a mis-anchored match that ran
/// into surrounding prose.
pub const MAX_VALUE_CHARS: usize = 100;
/// Same idea, measured in whitespace-separated tokens. `address` is exempt.
pub const MAX_VALUE_TOKENS: usize = 10;

/// Names that are really the form's own wording, not a person.
pub const RESERVED_NAMES: &[&str] = &["candidate", "student", "the candidate", "the student"];

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name.to_lowercase().as_str())
}

fn rule(pattern: &str) -> Regex {
    Regex::new(pattern).expect("field pattern must compile")
}

/// The full pattern table, in evaluation order. Label synonyms reflect the
/// wording seen on scanned admission/enrollment forms; all rules are
/// case-insensitive and capture up to the first character outside the value's
/// alphabet.
pub static PATTERNS: LazyLock<Vec<FieldPattern>> = LazyLock::new(|| {
    vec![
        FieldPattern {
            field: "student_id",
            primary: rule(
                r"(?i)(?:Student\s*ID|ID\s*Number|Roll\s*No|Application\s*No|Registration\s*No)[:.\s]+([A-Za-z0-9/_-]+)",
            ),
            alternate: None,
        },
        FieldPattern {
            field: "name",
            primary: rule(
                r"(?i)(?:Student\s*Name|Name\s*of\s*the\s*Student|Candidate\s*Name|Full\s*Name|Name)[:.\s]+([A-Za-z\s.'-]+)",
            ),
            // A plain "Name:" label anchored to the end of its line.
            alternate: Some(rule(r"(?i)Name\s*[:.]\s*([A-Za-z\s.'-]+)(?:\r|\n|$)")),
        },
        FieldPattern {
            field: "first_name",
            primary: rule(r"(?i)(?:First\s*Name)[:.\s]+([A-Za-z\s]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "last_name",
            primary: rule(r"(?i)(?:Last\s*Name|Surname)[:.\s]+([A-Za-z\s]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "dob",
            primary: rule(
                r"(?i)(?:Date\s*of\s*Birth|DOB|Birth\s*Date)[:.\s]+(\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4})",
            ),
            // Year-first dates (yyyy-mm-dd), only consulted when the
            // day-first rule finds nothing.
            alternate: Some(rule(
                r"(?i)(?:Date\s*of\s*Birth|DOB|Birth\s*Date)[:.\s]+(\d{2,4}[/.-]\d{1,2}[/.-]\d{1,2})",
            )),
        },
        FieldPattern {
            field: "course",
            primary: rule(r"(?i)(?:Course|Program|Degree|Branch)[:.\s]+([A-Za-z0-9\s()&./-]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "grade",
            primary: rule(r"(?i)(?:Grade|CGPA|GPA|Percentage)[:.\s]+([\d.]+|[A-F][+-]?|[\d.]+\s*%)"),
            alternate: None,
        },
        FieldPattern {
            field: "email",
            primary: rule(
                r"(?i)(?:Email|E-mail|Email\s*Address)[:.\s]+([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})",
            ),
            alternate: None,
        },
        FieldPattern {
            field: "phone",
            primary: rule(
                r"(?i)(?:Phone|Mobile|Contact|Tel|Telephone)[:.\s]+((?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})",
            ),
            alternate: None,
        },
        FieldPattern {
            field: "address",
            primary: rule(
                r"(?i)(?:Address|Permanent\s*Address|Residential\s*Address)[:.\s]+([A-Za-z0-9\s.,/#()-]+)",
            ),
            alternate: None,
        },
        FieldPattern {
            field: "gender",
            primary: rule(r"(?i)(?:Gender|Sex)[:.\s]+([A-Za-z]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "category",
            primary: rule(r"(?i)(?:Category|Caste|Social\s*Category)[:.\s]+([A-Za-z\s]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "father_name",
            primary: rule(r"(?i)(?:Father's\s*Name|Father\s*Name)[:.\s]+([A-Za-z\s.]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "mother_name",
            primary: rule(r"(?i)(?:Mother's\s*Name|Mother\s*Name)[:.\s]+([A-Za-z\s.]+)"),
            alternate: None,
        },
        FieldPattern {
            field: "academic_year",
            primary: rule(r"(?i)(?:Academic\s*Year|Year)[:.\s]+(\d{4}\s*[-/]\s*\d{2,4}|\d{4})"),
            alternate: None,
        },
    ]
});

pub fn all() -> &'static [FieldPattern] {
    &PATTERNS
}

pub fn get(field: &str) -> Option<&'static FieldPattern> {
    PATTERNS.iter().find(|p| p.field == field)
}

// ── Tests ──
