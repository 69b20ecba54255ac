//! Field validators shared by the lead editor, the convert form and the
//! controllers that guard the backend.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::types::OpportunityDraft;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Validate an email address as typed by the user.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::Email("Email is required".to_string()));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::Email(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Parse an optional amount field. Blank input means "no amount".
pub fn parse_amount(input: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let amount: f64 = trimmed
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::Amount("Please enter a valid number".to_string()))?;

    check_amount(amount)?;
    Ok(Some(amount))
}

fn check_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::Amount(
            "Please enter a valid number".to_string(),
        ));
    }
    if amount < 0.0 {
        return Err(ValidationError::Amount("Amount must be positive".to_string()));
    }
    Ok(())
}

pub fn require(value: &str, message: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredField(message.to_string()));
    }
    Ok(())
}

/// Validate a draft before it goes to the backend. First failure wins.
pub fn validate_draft(draft: &OpportunityDraft) -> Result<(), ValidationError> {
    require(&draft.name, "Opportunity name is required")?;
    require(&draft.account_name, "Account name is required")?;
    if let Some(amount) = draft.amount {
        check_amount(amount)?;
    }
    Ok(())
}
