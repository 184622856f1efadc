//! Code fragments between `### [name]` or `/// [name]` markers.

use regex::Regex;

/// Text between the first and the last marker pair named `name`, dedented
/// and trimmed. Empty when the markers are missing.
#[must_use]
pub fn extract_fragment(text: &str, name: &str) -> String {
    let name = regex::escape(name);
    let pattern = format!(r"(?:###|///)\s*\[{name}\]([\s\S]*)(?:###|///)\s*\[{name}\]");
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| strip_indent(m.as_str()).trim().to_owned())
        .unwrap_or_default()
}

/// Remove the indentation shared by all non-blank lines.
#[must_use]
pub fn strip_indent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return text.to_owned();
    }
    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
