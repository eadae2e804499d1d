//! Password policy enforcement for new passwords.

use serde_json::json;

use stowage_core::config::AuthConfig;
use stowage_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length in characters.
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// `user_inputs` (username, email) are fed to the strength estimator
    /// so that passwords derived from them score low. Every violation is
    /// reported under the `password` field of the error details.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
        let mut problems: Vec<String> = Vec::new();

        if password.chars().count() < self.min_length {
            problems.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            problems.push("Password must contain at least one uppercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            problems.push("Password must contain at least one lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            problems.push("Password must contain at least one digit".to_string());
        }
        if !password.chars().any(|c| !c.is_alphanumeric()) {
            problems.push("Password must contain at least one special character".to_string());
        }

        if problems.is_empty() {
            let estimate = zxcvbn::zxcvbn(password, user_inputs);
            if estimate.score() < zxcvbn::Score::Three {
                problems.push(
                    "Password is too weak. Please use a stronger password with more entropy."
                        .to_string(),
                );
            }
        }

        if problems.is_empty() {
            return Ok(());
        }

        Err(AppError::validation(problems[0].clone())
            .with_key("validation.password_policy")
            .with_details(json!({ "password": problems })))
    }
}
