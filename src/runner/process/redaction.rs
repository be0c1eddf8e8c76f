//! Argument redaction for logged program command lines.
//!
//! Captured programs often receive credentials for registries or services.
//! Both `key=value` arguments and `--key value` pairs with a sensitive key
//! keep the key and lose the value.

const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: [&str; 7] = [
    "password",
    "token",
    "secret",
    "api_key",
    "apikey",
    "auth",
    "authorization",
];

fn is_sensitive_key(key: &str) -> bool {
    let bare = key.trim().trim_start_matches('-').replace('-', "_");
    SENSITIVE_KEYS
        .iter()
        .any(|candidate| bare.eq_ignore_ascii_case(candidate))
}

/// Redact `key=value` when `key` is sensitive.
fn redact_assignment(arg: &str) -> Option<String> {
    let (key, _) = arg.split_once('=')?;
    is_sensitive_key(key).then(|| format!("{}={REDACTED}", key.trim()))
}

/// `--token` style flag whose value is the next argument.
fn is_sensitive_flag(arg: &str) -> bool {
    arg.starts_with("--") && !arg.contains('=') && is_sensitive_key(arg)
}

/// Redact sensitive values from `args`, preserving argument count.
///
/// # Examples
///
/// ```ignore
/// let args = ["--token", "abc", "auth=xyz", "out.txt"].map(String::from);
/// assert_eq!(
///     redact_sensitive_args(&args),
///     ["--token", "***REDACTED***", "auth=***REDACTED***", "out.txt"],
/// );
/// ```
pub(super) fn redact_sensitive_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            redacted.push(REDACTED.to_owned());
            hide_next = false;
            continue;
        }
        hide_next = is_sensitive_flag(arg);
        redacted.push(redact_assignment(arg).unwrap_or_else(|| arg.clone()));
    }
    redacted
}
