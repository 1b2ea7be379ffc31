use super::error::InputViolation;
use regex::Regex;

/// Minimum password length accepted by the provider.
pub const MIN_PASSWORD_LEN: usize = 6;

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// # Errors
/// Returns `InputViolation::MalformedEmail` when `email` has no `@` or no domain dot.
pub fn check_email(email: &str) -> Result<(), InputViolation> {
    if valid_email(email.trim()) {
        Ok(())
    } else {
        Err(InputViolation::MalformedEmail)
    }
}

/// # Errors
/// Returns `InputViolation::PasswordTooShort` below [`MIN_PASSWORD_LEN`] characters.
pub fn check_password_length(password: &str) -> Result<(), InputViolation> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Err(InputViolation::PasswordTooShort)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("ana@example.com"));
        assert!(valid_email("first.last+tag@school.co.uk"));
        assert!(!valid_email("ana.example.com"));
        assert!(!valid_email("ana@example"));
        assert!(!valid_email("ana@"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("ana @example.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn check_email_trims() {
        assert_eq!(check_email("  ana@example.com "), Ok(()));
        assert_eq!(check_email("nope"), Err(InputViolation::MalformedEmail));
    }

    #[test]
    fn password_length_counts_characters() {
        assert_eq!(check_password_length("12345"), Err(InputViolation::PasswordTooShort));
        assert_eq!(check_password_length(""), Err(InputViolation::PasswordTooShort));
        assert_eq!(check_password_length("123456"), Ok(()));
        // five multi-byte characters are still five characters
        assert_eq!(check_password_length("ééééé"), Err(InputViolation::PasswordTooShort));
    }
}
