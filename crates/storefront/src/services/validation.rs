//! Input validation for the sign-in and sign-up forms.
//!
//! Pure functions over already-extracted strings. Every rule that fails is
//! reported, not just the first, so forms can highlight all fields at once.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use footwear_core::Email;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;

/// How a password composition rule is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleMode {
    /// Not checked.
    Off,
    /// Checked; a violation is reported as a warning but does not fail.
    #[default]
    Advisory,
    /// Checked; a violation fails validation.
    Enforce,
}

impl FromStr for RuleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "advisory" => Ok(Self::Advisory),
            "enforce" => Ok(Self::Enforce),
            other => Err(format!("expected off, advisory or enforce, got {other:?}")),
        }
    }
}

/// Password rules. Length limits always apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PasswordPolicy {
    pub require_uppercase: RuleMode,
    pub require_lowercase: RuleMode,
    pub require_digit: RuleMode,
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validation failed; carries every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Messages grouped by field, for the `fieldErrors` JSON member.
    #[must_use]
    pub fn by_field(&self) -> BTreeMap<&'static str, Vec<String>> {
        let mut map: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for error in &self.0 {
            map.entry(error.field).or_default().push(error.message.clone());
        }
        map
    }

    /// Whether `field` has at least one error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

/// Validated sign-up input.
#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: Email,
    pub name: String,
    pub password: String,
    /// Advisory rules the password broke.
    pub warnings: Vec<FieldError>,
}

/// Validated sign-in input.
#[derive(Debug, Clone)]
pub struct SignInInput {
    pub email: Email,
    pub password: String,
}

/// Validate an email address. Trimmed and lower-cased on success.
///
/// # Errors
///
/// Returns a [`FieldError`] for `email` if the address is malformed.
pub fn validate_email(raw: &str) -> Result<Email, FieldError> {
    Email::parse(raw).map_err(|_| FieldError::new("email", "Please enter a valid email address"))
}

/// Validate a display name. Trimmed, with `<` and `>` removed.
///
/// # Errors
///
/// Returns a [`FieldError`] for `name` if it is too short or too long.
pub fn validate_name(raw: &str) -> Result<String, FieldError> {
    let name = sanitize(raw);
    let len = name.chars().count();
    if len < MIN_NAME_LENGTH {
        return Err(FieldError::new(
            "name",
            format!("Name must be at least {MIN_NAME_LENGTH} characters"),
        ));
    }
    if len > MAX_NAME_LENGTH {
        return Err(FieldError::new(
            "name",
            format!("Name must be within {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(name)
}

/// Check a password against the length limits and `policy`.
///
/// Returns `(errors, warnings)`. Passwords are never trimmed.
#[must_use]
pub fn check_password(
    password: &str,
    policy: &PasswordPolicy,
) -> (Vec<FieldError>, Vec<FieldError>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if len > MAX_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be within {MAX_PASSWORD_LENGTH} characters"),
        ));
    }

    let rules: [(RuleMode, fn(char) -> bool, &str); 3] = [
        (
            policy.require_uppercase,
            char::is_uppercase,
            "Password must contain at least one uppercase letter",
        ),
        (
            policy.require_lowercase,
            char::is_lowercase,
            "Password must contain at least one lowercase letter",
        ),
        (
            policy.require_digit,
            |c| c.is_ascii_digit(),
            "Password must contain at least one number",
        ),
    ];

    for (mode, predicate, message) in rules {
        if mode == RuleMode::Off || password.chars().any(predicate) {
            continue;
        }
        let error = FieldError::new("password", message);
        match mode {
            RuleMode::Enforce => errors.push(error),
            RuleMode::Advisory => warnings.push(error),
            RuleMode::Off => {}
        }
    }

    (errors, warnings)
}

/// Validate the sign-up form.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing every violated rule.
pub fn validate_sign_up(
    email: &str,
    name: &str,
    password: &str,
    policy: &PasswordPolicy,
) -> Result<SignUpInput, ValidationErrors> {
    let mut errors = Vec::new();

    let email = validate_email(email).map_err(|e| errors.push(e)).ok();
    let name = validate_name(name).map_err(|e| errors.push(e)).ok();
    let (password_errors, warnings) = check_password(password, policy);
    errors.extend(password_errors);

    match (email, name) {
        (Some(email), Some(name)) if errors.is_empty() => Ok(SignUpInput {
            email,
            name,
            password: password.to_string(),
            warnings,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validate the sign-in form.
///
/// Only length limits apply to the password; composition rules are a
/// sign-up concern.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing every violated rule.
pub fn validate_sign_in(email: &str, password: &str) -> Result<SignInInput, ValidationErrors> {
    let mut errors = Vec::new();

    let email = validate_email(email).map_err(|e| errors.push(e)).ok();
    let off = PasswordPolicy {
        require_uppercase: RuleMode::Off,
        require_lowercase: RuleMode::Off,
        require_digit: RuleMode::Off,
    };
    let (password_errors, _) = check_password(password, &off);
    errors.extend(password_errors);

    match email {
        Some(email) if errors.is_empty() => Ok(SignInInput {
            email,
            password: password.to_string(),
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

fn sanitize(input: &str) -> String {
    input.replace(['<', '>'], "").trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_collects_all_errors() {
        let err = validate_sign_up("bad-email", "A", "short", &PasswordPolicy::default())
            .unwrap_err();
        assert!(err.has("email"));
        assert!(err.has("name"));
        assert!(err.has("password"));
        assert_eq!(err.by_field().len(), 3);
    }

    #[test]
    fn test_advisory_rules_warn_only() {
        let input = validate_sign_up(
            " Ada@Example.com ",
            "Ada <b>Lovelace</b>",
            "alllowercase",
            &PasswordPolicy::default(),
        )
        .unwrap();
        assert_eq!(input.email.as_str(), "ada@example.com");
        assert_eq!(input.name, "Ada bLovelace/b");
        assert_eq!(input.warnings.len(), 2);
    }

    #[test]
    fn test_enforced_rules_fail() {
        let policy = PasswordPolicy {
            require_uppercase: RuleMode::Enforce,
            require_lowercase: RuleMode::Off,
            require_digit: RuleMode::Enforce,
        };
        let (errors, warnings) = check_password("lowercase", &policy);
        assert_eq!(errors.len(), 2);
        assert!(warnings.is_empty());

        let (errors, _) = check_password("Upper1case", &policy);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_password_length_limits() {
        let policy = PasswordPolicy::default();
        assert!(!check_password("1234567", &policy).0.is_empty());
        assert!(check_password("12345678", &policy).0.is_empty());
        assert!(!check_password(&"a".repeat(129), &policy).0.is_empty());
    }

    #[test]
    fn test_sign_in_skips_composition_rules() {
        let input = validate_sign_in("ada@example.com", "alllowercase").unwrap();
        assert_eq!(input.password, "alllowercase");
        assert!(validate_sign_in("ada@example.com", "").is_err());
    }

    #[test]
    fn test_rule_mode_parses() {
        assert_eq!("Enforce".parse::<RuleMode>().unwrap(), RuleMode::Enforce);
        assert_eq!(" off ".parse::<RuleMode>().unwrap(), RuleMode::Off);
        assert!("sometimes".parse::<RuleMode>().is_err());
    }
}
