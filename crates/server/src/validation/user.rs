use super::FieldError;
use crate::dto::UserRequest;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const FULL_NAME_MAX_LEN: usize = 100;

/// Validates a create/update payload, collecting every rejected field.
pub fn validate_user_request(request: &UserRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let username = request.username.as_str();
    if username.trim().is_empty() {
        errors.push(FieldError::new("username", "Username must not be blank"));
    } else {
        let len = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            errors.push(FieldError::new(
                "username",
                format!(
                    "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
                ),
            ));
        }
    }

    let email = request.email.as_str();
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email must not be blank"));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Email must be a well-formed address"));
    }

    if let Some(full_name) = &request.full_name {
        if full_name.chars().count() > FULL_NAME_MAX_LEN {
            errors.push(FieldError::new(
                "fullName",
                format!("Full name must not exceed {FULL_NAME_MAX_LEN} characters"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Pragmatic address check: one `@`, a dot-atom local part and a hostname
/// made of letter/digit/hyphen labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.is_empty() || domain.len() > 255 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));
    if !local_ok {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
