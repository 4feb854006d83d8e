use crate::error::ApiError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 6;
const EMAIL_MAX: usize = 254;

/// Usernames share the login namespace with emails, so they may not
/// contain `@`.
pub fn username(value: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::validation(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if value.contains('@') {
        return Err(ApiError::validation("username must not contain '@'"));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(ApiError::validation(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiError> {
    if is_email(value) {
        Ok(())
    } else {
        Err(ApiError::validation("invalid email"))
    }
}

/// Rejects blank values. `field` names the JSON field in the message.
pub fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Shape check only: one `@`, a non-empty local part, and a dotted domain
/// without empty labels.
fn is_email(value: &str) -> bool {
    if value.len() > EMAIL_MAX || value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
