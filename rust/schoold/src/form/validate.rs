use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::value::{format_number, FieldValue};

static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]{10,}$").expect("static pattern"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("static pattern")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub code: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Alphanumeric,
    Phone,
    Email,
}

impl PatternKind {
    fn matches(self, s: &str) -> bool {
        match self {
            PatternKind::Alphanumeric => ALPHANUMERIC.is_match(s),
            PatternKind::Phone => PHONE.is_match(s),
            PatternKind::Email => {
                // Overall and local-part length limits from RFC 5321.
                let local_len = s.split('@').next().map(str::len).unwrap_or(0);
                s.len() <= 254 && local_len <= 64 && EMAIL.is_match(s)
            }
        }
    }

    fn error(self) -> FieldError {
        match self {
            PatternKind::Alphanumeric => FieldError::new("pattern", "only letters and digits are allowed"),
            PatternKind::Phone => FieldError::new("pattern", "enter a valid phone number"),
            PatternKind::Email => FieldError::new("email", "enter a valid email address"),
        }
    }
}

/// Field-level validator. Everything except `Required` and `MinItems` passes
/// on an empty value, so optional fields only validate once filled in.
#[derive(Debug, Clone)]
pub enum Validator {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Integer,
    Pattern(PatternKind),
    OneOf(&'static [&'static str]),
    MinItems(usize),
}

impl Validator {
    pub fn check(&self, value: &FieldValue) -> Option<FieldError> {
        match self {
            Validator::Required => value
                .is_empty()
                .then(|| FieldError::new("required", "this field is required")),
            Validator::MinItems(min) => {
                let actual = value.as_list().len();
                (actual < *min).then(|| {
                    FieldError::new(
                        "arrayMinLength",
                        format!("select at least {min} (currently {actual})"),
                    )
                })
            }
            _ if value.is_empty() => None,
            Validator::MinLength(min) => {
                let len = length_of(value);
                (len < *min).then(|| {
                    FieldError::new("minlength", format!("must be at least {min} characters"))
                })
            }
            Validator::MaxLength(max) => {
                let len = length_of(value);
                (len > *max).then(|| {
                    FieldError::new("maxlength", format!("must be at most {max} characters"))
                })
            }
            Validator::Min(min) => match value.as_number() {
                None => Some(FieldError::new("number", "must be a number")),
                Some(n) if n < *min => Some(FieldError::new(
                    "min",
                    format!("must be at least {}", format_number(*min)),
                )),
                Some(_) => None,
            },
            Validator::Max(max) => match value.as_number() {
                None => Some(FieldError::new("number", "must be a number")),
                Some(n) if n > *max => Some(FieldError::new(
                    "max",
                    format!("must be at most {}", format_number(*max)),
                )),
                Some(_) => None,
            },
            Validator::Integer => match value.as_number() {
                None => Some(FieldError::new("number", "must be a number")),
                Some(_) if value.as_whole().is_none() => {
                    Some(FieldError::new("integer", "must be a whole number"))
                }
                Some(_) => None,
            },
            Validator::Pattern(kind) => (!kind.matches(&value.text())).then(|| kind.error()),
            Validator::OneOf(options) => {
                let text = value.text();
                (!options.contains(&text.as_str())).then(|| {
                    FieldError::new("oneOf", format!("must be one of: {}", options.join(", ")))
                })
            }
        }
    }
}

fn length_of(value: &FieldValue) -> usize {
    match value {
        FieldValue::List(v) => v.len(),
        other => other.text().chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn required_rejects_empty_text_and_lists() {
        assert!(Validator::Required.check(&text("")).is_some());
        assert!(Validator::Required.check(&FieldValue::empty_list()).is_some());
        assert!(Validator::Required.check(&text("A")).is_none());
        assert!(Validator::Required.check(&FieldValue::Number(0.0)).is_none());
    }

    #[test]
    fn optional_validators_skip_empty_values() {
        assert!(Validator::Min(1.0).check(&text("")).is_none());
        assert!(Validator::MinLength(3).check(&text("")).is_none());
        assert!(Validator::Pattern(PatternKind::Email).check(&text("")).is_none());
    }

    #[test]
    fn numeric_bounds_accept_numeric_text() {
        assert!(Validator::Min(1.0).check(&text("12")).is_none());
        assert_eq!(Validator::Min(1.0).check(&text("0")).unwrap().code, "min");
        assert_eq!(Validator::Max(20.0).check(&FieldValue::Number(21.0)).unwrap().code, "max");
        assert_eq!(Validator::Min(1.0).check(&text("abc")).unwrap().code, "number");
    }

    #[test]
    fn integer_rejects_fractions_and_out_of_range_numbers() {
        assert!(Validator::Integer.check(&text("12")).is_none());
        assert!(Validator::Integer.check(&FieldValue::Number(3.0)).is_none());
        assert_eq!(Validator::Integer.check(&text("5.7")).unwrap().code, "integer");
        assert_eq!(Validator::Integer.check(&FieldValue::Number(1e300)).unwrap().code, "integer");
        assert_eq!(Validator::Integer.check(&text("five")).unwrap().code, "number");
        assert!(Validator::Integer.check(&text("")).is_none());
    }

    #[test]
    fn patterns_match_expected_shapes() {
        let roll = Validator::Pattern(PatternKind::Alphanumeric);
        assert!(roll.check(&text("A12")).is_none());
        assert!(roll.check(&text("A-12")).is_some());

        let phone = Validator::Pattern(PatternKind::Phone);
        assert!(phone.check(&text("+1 (555) 012-3456")).is_none());
        assert!(phone.check(&text("12345")).is_some());

        let email = Validator::Pattern(PatternKind::Email);
        assert!(email.check(&text("john.doe@school.edu")).is_none());
        assert!(email.check(&text("john.doe@")).is_some());
        assert!(email.check(&text("no-at-sign")).is_some());
    }

    #[test]
    fn min_items_counts_list_entries() {
        let v = Validator::MinItems(1);
        assert!(v.check(&FieldValue::empty_list()).is_some());
        assert!(v.check(&FieldValue::List(vec!["English".into()])).is_none());
    }
}
