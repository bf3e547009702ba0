//! Validation rules of the sign-up forms.
//!
//! Validation never fails hard: a rejected form yields the message to display
//! next to each offending field.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::form::{Errors, Value};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A password must contain at least one of these.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*";

pub const SECURITY_QUESTIONS: [&str; 8] = [
    "What was your childhood nickname?",
    "What is the name of your favorite childhood friend?",
    "What was the name of your first pet?",
    "What was the name of the street you grew up on?",
    "What is your mother's maiden name?",
    "What is the name of your first school?",
    "What was your dream job as a child?",
    "What is the name of your favorite teacher?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
    UserRole,
    SecurityQuestion,
    SecurityAnswer,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Password => write!(f, "password"),
            Self::ConfirmPassword => write!(f, "confirmPassword"),
            Self::UserRole => write!(f, "userRole"),
            Self::SecurityQuestion => write!(f, "question"),
            Self::SecurityAnswer => write!(f, "answer"),
        }
    }
}

pub type FieldErrors = Errors<Field>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "admin0")]
    Admin,
    #[serde(rename = "regular")]
    Regular,
}

impl UserRole {
    pub const ALL: [UserRole; 2] = [UserRole::Admin, UserRole::Regular];

    /// Value stored in the identity provider `custom:userRole` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin0",
            Self::Regular => "regular",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Regular => "Regular",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin0" => Ok(Self::Admin),
            "regular" => Ok(Self::Regular),
            _ => Err(format!("Unknown user role '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Digit,
    SpecialCharacter,
    Uppercase,
    Lowercase,
}

impl PasswordRule {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MinLength => "Password must be at least 8 characters",
            Self::Digit => "Password must contain at least one number",
            Self::SpecialCharacter => "Password must contain at least one special character",
            Self::Uppercase => "Password must contain at least one uppercase letter",
            Self::Lowercase => "Password must contain at least one lowercase letter",
        }
    }
}

/// Every rule the password breaks, in the order they are reported.
pub fn password_violations(password: &str) -> Vec<PasswordRule> {
    let mut violations = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordRule::Digit);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        violations.push(PasswordRule::SpecialCharacter);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PasswordRule::Lowercase);
    }
    violations
}

pub fn is_valid_email(email: &str) -> bool {
    email_address::EmailAddress::parse_with_options(
        email,
        email_address::Options::default().with_required_tld(),
    )
    .is_ok()
}

pub fn is_security_question(question: &str) -> bool {
    SECURITY_QUESTIONS.contains(&question)
}

/// Stage 1 input once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Stage 2 input once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialsForm {
    pub email: Value<String>,
    pub password: Value<String>,
    pub confirm_password: Value<String>,
    pub user_role: Value<String>,
}

impl CredentialsForm {
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = &self.email.value;
        if email.is_empty() {
            errors.insert(Field::Email, "Email is required.");
        } else if !is_valid_email(email) {
            errors.insert(Field::Email, "Invalid email address");
        }

        let password = &self.password.value;
        if let Some(rule) = password_violations(password).first() {
            errors.insert(Field::Password, rule.message());
        }

        if *password != self.confirm_password.value {
            errors.insert(Field::ConfirmPassword, "Passwords don't match");
        }

        let role = if self.user_role.value.is_empty() {
            errors.insert(Field::UserRole, "User role is required");
            None
        } else {
            match UserRole::from_str(&self.user_role.value) {
                Ok(role) => Some(role),
                Err(_) => {
                    errors.insert(Field::UserRole, "Unknown user role");
                    None
                }
            }
        };

        match role {
            Some(role) if errors.is_empty() => Ok(Credentials {
                email: email.clone(),
                password: password.clone(),
                role,
            }),
            _ => Err(errors),
        }
    }

    /// Attaches the messages to the matching fields.
    pub fn apply(&mut self, errors: &FieldErrors) {
        for (field, message) in errors.iter() {
            match field {
                Field::Email => self.email.invalidate(message),
                Field::Password => self.password.invalidate(message),
                Field::ConfirmPassword => self.confirm_password.invalidate(message),
                Field::UserRole => self.user_role.invalidate(message),
                Field::SecurityQuestion | Field::SecurityAnswer => {}
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecurityForm {
    pub question: Value<String>,
    pub answer: Value<String>,
}

impl SecurityForm {
    pub fn validate(&self) -> Result<SecurityAnswer, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.question.value.is_empty() {
            errors.insert(Field::SecurityQuestion, "Security question is required");
        } else if !is_security_question(&self.question.value) {
            errors.insert(Field::SecurityQuestion, "Unknown security question");
        }

        if self.answer.value.trim().is_empty() {
            errors.insert(Field::SecurityAnswer, "Answer is required");
        }

        errors.into_result(|| SecurityAnswer {
            question: self.question.value.clone(),
            answer: self.answer.value.trim().to_string(),
        })
    }

    pub fn apply(&mut self, errors: &FieldErrors) {
        for (field, message) in errors.iter() {
            match field {
                Field::SecurityQuestion => self.question.invalidate(message),
                Field::SecurityAnswer => self.answer.invalidate(message),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str, confirm: &str, role: &str) -> CredentialsForm {
        CredentialsForm {
            email: Value::new(email.to_string()),
            password: Value::new(password.to_string()),
            confirm_password: Value::new(confirm.to_string()),
            user_role: Value::new(role.to_string()),
        }
    }

    #[test]
    fn valid_credentials() {
        let form = credentials("a@b.com", "Abcd1234!", "Abcd1234!", "regular");
        assert_eq!(
            form.validate(),
            Ok(Credentials {
                email: "a@b.com".to_string(),
                password: "Abcd1234!".to_string(),
                role: UserRole::Regular,
            })
        );
    }

    #[test]
    fn email_rules() {
        let errors = credentials("", "Abcd1234!", "Abcd1234!", "regular")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is required."));

        for email in ["a@b", "not-an-email", "a@@b.com", "@b.com"] {
            let errors = credentials(email, "Abcd1234!", "Abcd1234!", "regular")
                .validate()
                .unwrap_err();
            assert_eq!(errors.get(Field::Email), Some("Invalid email address"), "{}", email);
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn password_rules_name_the_violated_rule() {
        let cases = [
            ("Ab1!", PasswordRule::MinLength),
            ("Abcdefgh!", PasswordRule::Digit),
            ("Abcd12345", PasswordRule::SpecialCharacter),
            ("abcd1234!", PasswordRule::Uppercase),
            ("ABCD1234!", PasswordRule::Lowercase),
            // Not part of the special character set.
            ("Abcd1234?", PasswordRule::SpecialCharacter),
        ];
        for (password, rule) in cases {
            assert_eq!(password_violations(password), vec![rule], "{}", password);
            let errors = credentials("a@b.com", password, password, "admin0")
                .validate()
                .unwrap_err();
            assert_eq!(errors.get(Field::Password), Some(rule.message()));
            assert_eq!(errors.len(), 1);
        }
        assert!(password_violations("Abcd1234!").is_empty());
        assert_eq!(password_violations("").len(), 5);
    }

    #[test]
    fn mismatch_is_reported_on_confirmation_only() {
        for (password, confirm) in [("Abcd1234!", "Abcd1234?"), ("Abcd1234!", ""), ("x", "y")] {
            let errors = credentials("a@b.com", password, confirm, "regular")
                .validate()
                .unwrap_err();
            assert_eq!(errors.get(Field::ConfirmPassword), Some("Passwords don't match"));
            assert_ne!(errors.get(Field::Password), Some("Passwords don't match"));
            assert!(!errors.contains(Field::Email));
        }
    }

    #[test]
    fn role_rules() {
        let errors = credentials("a@b.com", "Abcd1234!", "Abcd1234!", "")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get(Field::UserRole), Some("User role is required"));
        let errors = credentials("a@b.com", "Abcd1234!", "Abcd1234!", "root")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get(Field::UserRole), Some("Unknown user role"));
        assert_eq!("admin0".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!(serde_json::to_string(&UserRole::Regular).unwrap(), "\"regular\"");
    }

    #[test]
    fn apply_marks_fields() {
        let mut form = credentials("a@b.com", "Abcd1234!", "nope", "regular");
        let errors = form.validate().unwrap_err();
        form.apply(&errors);
        assert!(!form.confirm_password.valid);
        assert!(form.password.valid);
        assert_eq!(
            form.confirm_password.warning.as_deref(),
            Some("Passwords don't match")
        );
    }

    #[test]
    fn security_form_rules() {
        let form = SecurityForm {
            question: Value::new(SECURITY_QUESTIONS[2].to_string()),
            answer: Value::new("Rex".to_string()),
        };
        assert_eq!(
            form.validate(),
            Ok(SecurityAnswer {
                question: SECURITY_QUESTIONS[2].to_string(),
                answer: "Rex".to_string(),
            })
        );

        let errors = SecurityForm::default().validate().unwrap_err();
        assert!(errors.contains(Field::SecurityQuestion));
        assert!(errors.contains(Field::SecurityAnswer));

        let form = SecurityForm {
            question: Value::new("What is your favorite color?".to_string()),
            answer: Value::new("   ".to_string()),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(Field::SecurityQuestion),
            Some("Unknown security question")
        );
        assert_eq!(errors.get(Field::SecurityAnswer), Some("Answer is required"));
    }

    #[test]
    fn security_answer_is_sent_trimmed() {
        let form = SecurityForm {
            question: Value::new(SECURITY_QUESTIONS[2].to_string()),
            answer: Value::new("  Rex  ".to_string()),
        };
        assert_eq!(form.validate().unwrap().answer, "Rex");
    }
}
