//! Library folder name validation.

/// Maximum length of a library folder name.
pub const MAX_NAME_LENGTH: usize = 63;

/// Replace every character that is not allowed in a library name.
///
/// Letters and digits are kept. `-` and `.` are kept anywhere except the first
/// position. Everything else becomes `_`. A leading digit gets a `_` prefix and
/// the result is truncated to [`MAX_NAME_LENGTH`] characters.
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len() + 1);

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.push('_');
    }

    for (i, c) in name.chars().enumerate() {
        let keep = c.is_ascii_alphanumeric() || (i > 0 && (c == '-' || c == '.'));
        sanitized.push(if keep { c } else { '_' });
    }

    sanitized.truncate(MAX_NAME_LENGTH);
    sanitized
}

/// Returns true if `name` can be used as a library folder name as-is.
pub fn is_sanitary_name(name: &str) -> bool {
    !name.is_empty() && sanitize_name(name) == name
}
