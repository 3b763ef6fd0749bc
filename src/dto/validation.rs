//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a free-text field carries non-whitespace content.
pub fn validate_non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a poll option list: at least two entries, none of them blank.
pub fn validate_options(options: &Vec<String>) -> Result<(), ValidationError> {
    if options.len() < 2 {
        let mut err = ValidationError::new("options_count");
        err.message =
            Some(format!("at least 2 options are required (got {})", options.len()).into());
        return Err(err);
    }

    if options.iter().any(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("options_blank");
        err.message = Some("options must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_blank() {
        assert!(validate_non_blank("Pick one").is_ok());
        assert!(validate_non_blank("").is_err());
        assert!(validate_non_blank("   ").is_err());
    }

    #[test]
    fn test_validate_options_requires_two_entries() {
        assert!(validate_options(&vec!["A".into(), "B".into()]).is_ok());
        assert!(validate_options(&vec!["A".into()]).is_err());
        assert!(validate_options(&Vec::new()).is_err());
    }

    #[test]
    fn test_validate_options_rejects_blank_entries() {
        assert!(validate_options(&vec!["A".into(), " ".into()]).is_err());
        assert!(validate_options(&vec!["".into(), "B".into()]).is_err());
    }
}
