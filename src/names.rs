/// Identity key for a character: everything before the first `(`, trimmed.
pub fn clean_name(raw: &str) -> &str {
    raw.split('(').next().unwrap_or(raw).trim()
}

/// Splits `"Sasuke Uchiha (Final Battle)"` into `("Sasuke Uchiha", Some("Final Battle"))`.
///
/// The context runs from the first `(` to the last `)`; anything outside the
/// parentheses stays part of the display name.
pub fn split_context(raw: &str) -> (String, Option<String>) {
    if let Some(open) = raw.find('(')
        && let Some(close) = raw.rfind(')')
        && close > open + 1
    {
        let context = raw[open + 1..close].to_string();
        let mut display = String::with_capacity(raw.len());
        display.push_str(&raw[..open]);
        display.push_str(&raw[close + 1..]);
        return (display.trim().to_string(), Some(context));
    }
    (raw.trim().to_string(), None)
}
