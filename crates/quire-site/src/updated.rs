//! `{docsify-updated}` placeholder.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::{Captures, Regex};

/// Placeholder replaced with the page's modification time.
pub const UPDATED_PLACEHOLDER: &str = "{docsify-updated}";

static DATE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(YYYY|YY|MM|DD|HH|mm|ss|fff)\}").unwrap());

/// Format `updated_at` with `{YYYY}`-style tokens.
///
/// Unknown braces are kept verbatim. Each token is zero-padded to its width.
#[must_use]
pub fn format_date(format: &str, updated_at: DateTime<Utc>) -> String {
    DATE_TOKEN_RE
        .replace_all(format, |caps: &Captures<'_>| {
            let token = &caps[1];
            let value = match token {
                "YYYY" => i64::from(updated_at.year()),
                "YY" => i64::from(updated_at.year() % 100),
                "MM" => i64::from(updated_at.month()),
                "DD" => i64::from(updated_at.day()),
                "HH" => i64::from(updated_at.hour()),
                "mm" => i64::from(updated_at.minute()),
                "ss" => i64::from(updated_at.second()),
                _ => i64::from(updated_at.timestamp_subsec_millis()),
            };
            format!("{value:0width$}", width = token.len())
        })
        .into_owned()
}

/// Replace every placeholder in `html`.
///
/// Without a format the RFC 2822 rendering of the timestamp is used.
#[must_use]
pub fn format_updated(html: &str, updated_at: DateTime<Utc>, format: Option<&str>) -> String {
    if !html.contains(UPDATED_PLACEHOLDER) {
        return html.to_owned();
    }
    let rendered = match format {
        Some(format) => format_date(format, updated_at),
        None => updated_at.to_rfc2822(),
    };
    html.replace(UPDATED_PLACEHOLDER, &rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap()
    }

    #[test]
    fn test_format_date_tokens() {
        assert_eq!(
            format_date("{YYYY}-{MM}-{DD} {HH}:{mm}:{ss}", timestamp()),
            "2024-03-07 09:05:02"
        );
        assert_eq!(format_date("{DD}/{MM}/{YY}", timestamp()), "07/03/24");
        assert_eq!(format_date("{fff} {unknown}", timestamp()), "000 {unknown}");
    }

    #[test]
    fn test_format_updated_replaces_all() {
        let html = "<p>{docsify-updated}</p><footer>{docsify-updated}</footer>";
        assert_eq!(
            format_updated(html, timestamp(), Some("{YYYY}")),
            "<p>2024</p><footer>2024</footer>"
        );
    }

    #[test]
    fn test_format_updated_default_format() {
        let rendered = format_updated("{docsify-updated}", timestamp(), None);
        assert!(rendered.starts_with("Thu, "));
        assert!(rendered.contains("Mar 2024 09:05:02"));
    }

    #[test]
    fn test_format_updated_without_placeholder() {
        assert_eq!(format_updated("<p>x</p>", timestamp(), Some("{YYYY}")), "<p>x</p>");
    }
}
