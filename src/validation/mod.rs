use chrono::NaiveDate;
use std::fmt;

pub const CARD_NUMBER_LEN: usize = 16;
pub const CARDHOLDER_NAME_MIN_LEN: usize = 3;
pub const CARDHOLDER_NAME_MAX_LEN: usize = 100;
pub const BLOCK_REASON_MAX_LEN: usize = 500;
pub const DESCRIPTION_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_card_number(card_number: &str) -> ValidationResult {
    validate_required("card_number", card_number)?;

    if card_number.len() != CARD_NUMBER_LEN
        || !card_number.chars().all(|ch| ch.is_ascii_digit())
    {
        return Err(ValidationError::new(
            "card_number",
            format!("must be {} digits", CARD_NUMBER_LEN),
        ));
    }

    Ok(())
}

pub fn validate_cardholder_name(name: &str) -> ValidationResult {
    validate_required("cardholder_name", name)?;

    if name.len() < CARDHOLDER_NAME_MIN_LEN || name.len() > CARDHOLDER_NAME_MAX_LEN {
        return Err(ValidationError::new(
            "cardholder_name",
            format!(
                "must be between {} and {} characters",
                CARDHOLDER_NAME_MIN_LEN, CARDHOLDER_NAME_MAX_LEN
            ),
        ));
    }

    Ok(())
}

pub fn validate_expiry_date(expiry_date: NaiveDate, today: NaiveDate) -> ValidationResult {
    if expiry_date <= today {
        return Err(ValidationError::new(
            "expiry_date",
            "must be in the future",
        ));
    }

    Ok(())
}

pub fn validate_block_reason(reason: &str) -> ValidationResult {
    validate_required("reason", reason)?;
    validate_max_len("reason", reason, BLOCK_REASON_MAX_LEN)?;

    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult {
    validate_max_len("description", description, DESCRIPTION_MAX_LEN)
}
