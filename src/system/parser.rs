//! Parsers for the text that external tools print back.

/// Extract the gametime from `time query gametime` console output.
/// Input: "The time is 1957699916"
pub fn parse_gametime(output: &str) -> Option<String> {
    let rest = output.split("The time is").nth(1)?;
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// tmux prints "duplicate session: <name>" when new-session loses to an existing one.
pub fn is_duplicate_session(stderr: &str) -> bool {
    stderr.contains("duplicate session")
}
