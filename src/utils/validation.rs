//! Validation helpers
//!
//! Regexes referenced from `#[validate(regex = ...)]` attributes plus a few
//! checks the derive cannot express.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Indian-style plates such as `KA01AB1234` or `DL 03 CA 9324` (spaces allowed)
    pub static ref REGISTRATION_NUMBER_REGEX: Regex =
        Regex::new(r"^[A-Za-z]{2}\s?[0-9]{1,2}\s?[A-Za-z]{0,3}\s?[0-9]{1,4}$").unwrap();

    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();

    pub static ref PINCODE_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

pub fn validate_pincodes(values: &[String]) -> Result<(), ValidationError> {
    if let Some(bad) = values.iter().find(|p| !PINCODE_REGEX.is_match(p)) {
        let mut error = ValidationError::new("pincode");
        error.add_param("value".into(), bad);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_number_regex() {
        assert!(REGISTRATION_NUMBER_REGEX.is_match("KA01AB1234"));
        assert!(REGISTRATION_NUMBER_REGEX.is_match("DL 03 CA 9324"));
        assert!(!REGISTRATION_NUMBER_REGEX.is_match("12345"));
    }

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_REGEX.is_match("+919876543210"));
        assert!(PHONE_REGEX.is_match("9876543210"));
        assert!(!PHONE_REGEX.is_match("12-34"));
    }

    #[test]
    fn test_pincodes() {
        assert!(validate_pincodes(&["560001".to_string()]).is_ok());
        assert!(validate_pincodes(&["56001".to_string()]).is_err());
        assert!(validate_not_blank("  ").is_err());
    }
}
