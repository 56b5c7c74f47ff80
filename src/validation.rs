use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{AppError, FieldError};
use crate::money::{AMOUNT_MAX, AMOUNT_MIN};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref COLOR_RE: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_color(color: &str) -> bool {
    COLOR_RE.is_match(color)
}

/// Collects field errors so a request reports every bad field at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "Please provide a valid email")
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min {
            let message = if min <= 1 {
                format!("{field} is required")
            } else {
                format!("{field} must be at least {min} characters")
            };
            self.errors.push(FieldError::new(field, message));
        } else if len > max {
            self.errors
                .push(FieldError::new(field, format!("{field} must be at most {max} characters")));
        }
        self
    }

    pub fn amount(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value < AMOUNT_MIN {
            self.errors
                .push(FieldError::new(field, "Amount must be greater than 0"));
        } else if value > AMOUNT_MAX {
            self.errors.push(FieldError::new(field, "Amount is too large"));
        }
        self
    }

    pub fn color(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            is_valid_color(value),
            field,
            "Invalid color format. Use hex format (#RRGGBB)",
        )
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        if value.chars().count() < PASSWORD_MIN {
            self.errors.push(FieldError::new(
                field,
                format!("Password must be at least {PASSWORD_MIN} characters"),
            ));
            return self;
        }
        let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        self.check(
            has_lower && has_upper && has_digit,
            field,
            "Password must contain uppercase, lowercase, and number",
        )
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(f) => f.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert_eq!(normalize_email("  Foo@Example.COM "), "foo@example.com");
    }

    #[test]
    fn color_accepts_either_case() {
        assert!(is_valid_color("#10B981"));
        assert!(is_valid_color("#abcdef"));
        assert!(!is_valid_color("10B981"));
        assert!(!is_valid_color("#12345"));
        assert!(!is_valid_color("#GGGGGG"));
    }

    #[test]
    fn amount_range_is_inclusive() {
        let mut v = Validator::new();
        v.amount("a", dec!(0.01)).amount("b", dec!(999999.99));
        assert!(v.is_empty());

        let mut v = Validator::new();
        v.amount("zero", Decimal::ZERO)
            .amount("negative", dec!(-5))
            .amount("huge", dec!(1000000));
        assert_eq!(fields(v.finish().unwrap_err()), vec!["zero", "negative", "huge"]);
    }

    #[test]
    fn password_policy() {
        let mut v = Validator::new();
        v.password("password", "Abcdefg1");
        assert!(v.is_empty());

        for weak in ["short1A", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
            let mut v = Validator::new();
            v.password("password", weak);
            assert!(!v.is_empty(), "{weak} should be rejected");
        }
    }

    #[test]
    fn length_counts_characters() {
        let mut v = Validator::new();
        v.length("name", "Éa", NAME_MIN, NAME_MAX);
        assert!(v.is_empty());

        let mut v = Validator::new();
        v.length("name", "", 1, NAME_MAX)
            .length("description", &"x".repeat(DESCRIPTION_MAX + 1), 1, DESCRIPTION_MAX);
        assert_eq!(fields(v.finish().unwrap_err()), vec!["name", "description"]);
    }
}
