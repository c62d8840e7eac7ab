//! Validation failures and the rule checks behind `#[track(required)]` and
//! `#[track(email)]`.
//!
//! Validation is a pure query over current values. It never touches the
//! ledger: an entity can be invalid and unchanged, or valid and changed.

use std::fmt;

/// One failed rule: a message and the fields it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidationFailure {
    pub message: String,
    pub fields: Vec<&'static str>,
}

impl ValidationFailure {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: vec![field],
        }
    }

    /// A failure spanning several fields (cross-field rules).
    #[must_use]
    pub fn spanning(fields: &[&'static str], message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: fields.to_vec(),
        }
    }

    #[must_use]
    pub fn concerns(&self, field: &str) -> bool {
        self.fields.iter().any(|f| *f == field)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.fields.join(", "), self.message)
    }
}

/// Field types the built-in rules understand.
pub trait RuleInput {
    /// Whether a required-rule accepts the value.
    fn is_present(&self) -> bool;

    /// Text view for format rules; `None` for non-text values.
    fn as_text(&self) -> Option<&str> {
        None
    }
}

impl RuleInput for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }

    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl RuleInput for &str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }

    fn as_text(&self) -> Option<&str> {
        Some(*self)
    }
}

impl<T: RuleInput> RuleInput for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(RuleInput::is_present)
    }

    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(RuleInput::as_text)
    }
}

macro_rules! always_present {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RuleInput for $ty {
                fn is_present(&self) -> bool {
                    true
                }
            }
        )*
    };
}

always_present!(bool, i32, i64, u32, f64);

/// Required-rule check.
#[must_use]
pub fn required<T: RuleInput + ?Sized>(value: &T) -> bool {
    value.is_present()
}

/// Email-format check.
///
/// Empty and non-text values pass; pair with [`required`] to reject them.
/// Otherwise the text must hold exactly one `@`, neither first nor last.
#[must_use]
pub fn email<T: RuleInput + ?Sized>(value: &T) -> bool {
    let Some(text) = value.as_text() else {
        return true;
    };
    if text.is_empty() {
        return true;
    }
    let mut parts = text.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_text_and_none() {
        assert!(!required(&String::new()));
        assert!(!required(&"   ".to_owned()));
        assert!(required(&"Berlin".to_owned()));
        assert!(!required(&None::<String>));
        assert!(required(&Some(3_i64)));
        assert!(required(&0_i64));
    }

    #[test]
    fn email_needs_one_inner_at() {
        assert!(email(&"a@b.com".to_owned()));
        assert!(!email(&"ab.com".to_owned()));
        assert!(!email(&"@b.com".to_owned()));
        assert!(!email(&"a@".to_owned()));
        assert!(!email(&"a@b@c".to_owned()));
        assert!(email(&String::new()));
        assert!(email(&None::<String>));
    }

    #[test]
    fn failure_display_lists_fields() {
        let failure = ValidationFailure::spanning(&["is_developer", "emails"], "needs email");
        assert_eq!(failure.to_string(), "is_developer, emails: needs email");
        assert!(failure.concerns("emails"));
        assert!(!failure.concerns("first_name"));
    }
}
