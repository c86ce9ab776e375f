use crate::consent::SignalValue;
use console::style;
use std::fmt::Display;

/// Green bold: success checkmarks, confirmations
pub fn success<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

/// White bold: section headers, titles
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: secondary text, decorative lines
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Yellow: warnings
pub fn yellow<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Cyan: field labels
pub fn cyan<D: Display>(text: D) -> String {
    style(text).cyan().to_string()
}

/// Green for granted, red for denied.
pub fn signal(value: SignalValue) -> String {
    match value {
        SignalValue::Granted => style(value).green().to_string(),
        SignalValue::Denied => style(value).red().to_string(),
    }
}

/// Red bold `BLOCKED` or green bold `ALLOWED`.
pub fn verdict(blocked: bool) -> String {
    if blocked {
        style("BLOCKED").red().bold().to_string()
    } else {
        success("ALLOWED")
    }
}
