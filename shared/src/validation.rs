//! Validation utilities for the Pro Connect marketplace
//!
//! Includes Nepal-specific validations matching the registration contract.

use crate::models::Skill;

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength: at least 8 characters including uppercase,
/// lowercase, digit, and a special character.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err("Password must include uppercase, lowercase, number, and special character")
    }
}

/// Validate Nepal phone number format: +977 followed by 10 digits.
pub fn validate_nepal_phone(phone: &str) -> Result<(), &'static str> {
    let rest = phone
        .strip_prefix("+977")
        .ok_or("Phone number must be in Nepal format +977XXXXXXXXXX")?;
    if rest.len() == 10 && rest.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Phone number must be in Nepal format +977XXXXXXXXXX")
    }
}

/// Validate a rating score (1 to 5 inclusive).
pub fn validate_score(score: i32) -> Result<(), &'static str> {
    if (1..=5).contains(&score) {
        Ok(())
    } else {
        Err("Rating score must be between 1 and 5")
    }
}

/// Parse a submitted skill list. Accepts either a JSON array of strings
/// (`["a","b"]`) or a comma-separated list (`a, b`); either way the result
/// must be non-empty.
pub fn parse_skill_list(raw: &str) -> Result<Vec<Skill>, &'static str> {
    let names: Vec<String> = if raw.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw)
            .map_err(|_| "Skills/Expertise must be a valid array of strings")?
    } else {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    if names.is_empty() {
        return Err("Skills/Expertise must be a non-empty list");
    }
    Ok(names.into_iter().map(Skill::named).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a@b.c").is_ok());
    }

    #[test]
    fn rejects_invalid_emails() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn password_strength_rules() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("short1!").is_err());
        assert!(validate_password("alllowercase1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
    }

    #[test]
    fn nepal_phone_format() {
        assert!(validate_nepal_phone("+9779812345678").is_ok());
        assert!(validate_nepal_phone("9812345678").is_err());
        assert!(validate_nepal_phone("+977981234567").is_err());
        assert!(validate_nepal_phone("+97798123456789").is_err());
        assert!(validate_nepal_phone("+9779812x45678").is_err());
    }

    #[test]
    fn score_range() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(5).is_ok());
        assert!(validate_score(0).is_err());
        assert!(validate_score(6).is_err());
    }

    #[test]
    fn parses_comma_separated_skills() {
        let skills = parse_skill_list("wiring, plumbing , ").unwrap();
        let names: Vec<_> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["wiring", "plumbing"]);
    }

    #[test]
    fn parses_json_array_skills() {
        let skills = parse_skill_list(r#"["wiring","plumbing"]"#).unwrap();
        assert_eq!(skills.len(), 2);
    }

    #[test]
    fn rejects_empty_skill_list() {
        assert!(parse_skill_list("").is_err());
        assert!(parse_skill_list("[]").is_err());
        assert!(parse_skill_list(" , ,").is_err());
    }
}
