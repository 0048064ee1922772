//! Master password strength scoring.
//!
//! Used to refuse obviously weak passwords when a new vault is created.
//! Existing vaults are never re-checked.

/// Passwords shorter than this always score zero.
const MIN_LENGTH: usize = 12;

/// Highest raw score: 2 points for length plus 4 character classes.
const MAX_RAW_SCORE: u32 = 6;

const COMMON_PASSWORDS: &[&str] = &[
    "123456",
    "password",
    "12345678",
    "qwerty",
    "123456789",
    "12345",
    "123",
    "pass",
    "111111",
];

/// Result of scoring a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0..=100.
    pub score: u8,
    /// Short human-readable verdict.
    pub message: &'static str,
}

/// Score a candidate master password.
pub fn check_password_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength {
            score: 0,
            message: "",
        };
    }

    let length = password.chars().count();
    if length < MIN_LENGTH {
        return PasswordStrength {
            score: 0,
            message: "Too short (min 12 chars)",
        };
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return PasswordStrength {
            score: 0,
            message: "Very common password",
        };
    }

    let mut raw = (length / 6).min(2) as u32;
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        raw += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        raw += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        raw += 1;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        raw += 1;
    }

    let message = match raw {
        0..=3 => "Weak",
        4..=5 => "Okay",
        _ => "Strong",
    };

    // Round to the nearest whole percent.
    let score = ((raw * 100 + MAX_RAW_SCORE / 2) / MAX_RAW_SCORE) as u8;

    PasswordStrength { score, message }
}
