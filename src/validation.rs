use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static PROJECT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooShort,
    TooLong,
    InvalidCharacters,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            NameError::Empty => "Project name is required",
            NameError::TooShort => "At least 3 characters",
            NameError::TooLong => "Maximum 30 characters",
            NameError::InvalidCharacters => "Only lowercase letters, numbers, and hyphens",
        };
        f.write_str(msg)
    }
}

/// Length is counted in chars so multi-byte input reports the same bound
/// the user typed against.
pub fn validate_project_name(name: &str) -> Result<(), NameError> {
    let len = name.chars().count();
    if len == 0 {
        return Err(NameError::Empty);
    }
    if len < NAME_MIN_LEN {
        return Err(NameError::TooShort);
    }
    if len > NAME_MAX_LEN {
        return Err(NameError::TooLong);
    }
    if !PROJECT_NAME_RE.is_match(name) {
        return Err(NameError::InvalidCharacters);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Normalise free text into the project-name alphabet.
pub fn sanitize_input(input: &str) -> String {
    DISALLOWED_RE
        .replace_all(&input.trim().to_lowercase(), "")
        .into_owned()
}
