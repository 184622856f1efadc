//! Pure path helpers shared by the history strategies.
//!
//! None of these functions fail: malformed input degrades to a best-effort
//! normalization.

use std::sync::LazyLock;

use quire_config::AliasRule;
use regex::Regex;

static LEADING_SLASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/+").unwrap());
static DOUBLE_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^:])/{2,}").unwrap());
static URL_PARTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:/?#]+:)?(?://+([^/?#]*))?").unwrap());

/// Upper bound on alias rewrites for a single path.
///
/// The textual guard only stops one-step cycles (`a -> a`); longer cycles
/// (`a -> b -> a`) hit this bound instead of looping forever.
const MAX_ALIAS_REWRITES: usize = 32;

/// Collapse `.` and `..` segments with a stack.
///
/// # Examples
///
/// ```
/// use quire_router::path::resolve_path;
///
/// assert_eq!(resolve_path("/guide/../api/./index"), "/api/index");
/// assert_eq!(resolve_path("../../x"), "/x");
/// ```
#[must_use]
pub fn resolve_path(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let mut resolved: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            ".." => {
                resolved.pop();
            }
            "." => {}
            other => resolved.push(other),
        }
    }
    format!("/{}", resolved.join("/"))
}

/// Collapse leading slashes to one and repeated slashes to one, except right
/// after a scheme colon.
#[must_use]
pub fn clean_path(path: &str) -> String {
    let path = LEADING_SLASHES_RE.replace(path, "/");
    DOUBLE_SLASH_RE.replace_all(&path, "$1/").into_owned()
}

/// Whether a path carries a scheme or is protocol-relative.
#[must_use]
pub fn is_absolute_path(path: &str) -> bool {
    path.contains(':') || path.contains("//")
}

/// Whether a URL points at a different origin than `origin`
/// (`scheme://host[:port]`).
#[must_use]
pub fn is_external(url: &str, origin: &str) -> bool {
    let (protocol, host) = origin.split_once("//").unwrap_or(("", origin));
    let Some(caps) = URL_PARTS_RE.captures(url) else {
        return false;
    };
    if let Some(scheme) = caps.get(1)
        && !scheme.as_str().eq_ignore_ascii_case(protocol)
    {
        return true;
    }
    if let Some(target) = caps.get(2).map(|m| m.as_str())
        && !target.is_empty()
    {
        let default_port = match protocol {
            "http:" => ":80",
            "https:" => ":443",
            _ => "",
        };
        let target = if default_port.is_empty() {
            target
        } else {
            target.strip_suffix(default_port).unwrap_or(target)
        };
        if target != host {
            return true;
        }
    }
    url.starts_with("/\\")
}

/// Directory part of a path, including the trailing slash.
///
/// Empty when the path holds no directory at all.
#[must_use]
pub fn parent_path(path: &str) -> String {
    if path.ends_with('/') {
        return path.to_owned();
    }
    match path.rfind('/') {
        Some(idx) => {
            let dir = &path[..=idx];
            let start = dir.rfind(char::is_whitespace).map_or(0, |ws| ws + 1);
            dir[start..].to_owned()
        }
        None => String::new(),
    }
}

/// Drop the query string and fragment.
#[must_use]
pub fn remove_params(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

/// Drop every segment that carries a `#`.
#[must_use]
pub fn normalise_fragment(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.contains('#'))
        .collect::<Vec<_>>()
        .join("/")
}

/// Join path parts with `/`, dropping fragment segments, then clean.
///
/// # Examples
///
/// ```
/// use quire_router::path::join_path;
///
/// assert_eq!(join_path(&["/docs/", "guide.md"]), "/docs/guide.md");
/// assert_eq!(join_path(&["http://x.io/", "/a"]), "http://x.io/a");
/// ```
#[must_use]
pub fn join_path(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|part| normalise_fragment(part))
        .collect::<Vec<_>>()
        .join("/");
    clean_path(&joined)
}

/// Turn the first `#` into `?id=`, so a fragment becomes the reserved anchor
/// query key.
#[must_use]
pub fn replace_slug(path: &str) -> String {
    path.replacen('#', "?id=", 1)
}

/// Append the default extension the way files are looked up.
///
/// Paths ending in `ext` or `.html` are returned unchanged; directories get
/// `README{ext}`.
#[must_use]
pub fn file_name(path: &str, ext: &str) -> String {
    if path.ends_with(ext) || path.ends_with(".html") {
        path.to_owned()
    } else if path.ends_with('/') {
        format!("{path}README{ext}")
    } else {
        format!("{path}{ext}")
    }
}

/// [`file_name`], then substitute the homepage for `/README{ext}`.
#[must_use]
pub fn to_file(path: &str, ext: &str, homepage: &str) -> String {
    let file = file_name(path, ext);
    if file == format!("/README{ext}") && !homepage.is_empty() {
        format!("/{}", homepage.trim_start_matches('/'))
    } else {
        file
    }
}

/// Compiled alias table, tried in declaration order.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    rules: Vec<(Regex, String)>,
}

impl AliasTable {
    /// Compile alias rules as anchored regexes. Invalid patterns are skipped.
    #[must_use]
    pub fn new(rules: &[AliasRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match Regex::new(&format!("^(?:{})$", rule.pattern)) {
                Ok(re) => Some((re, rule.target.clone())),
                Err(e) => {
                    tracing::warn!(pattern = %rule.pattern, error = %e, "Skipping invalid alias");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Whether no alias is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `path` until no alias matches or a rewrite leaves it unchanged.
    #[must_use]
    pub fn apply(&self, path: &str) -> String {
        let mut current = path.to_owned();
        let mut last: Option<String> = None;

        for _ in 0..MAX_ALIAS_REWRITES {
            if last.as_deref() == Some(current.as_str()) {
                return current;
            }
            let Some((re, target)) = self.rules.iter().find(|(re, _)| re.is_match(&current))
            else {
                return current;
            };
            let next = re.replace(&current, target.as_str()).into_owned();
            last = Some(std::mem::replace(&mut current, next));
        }

        tracing::warn!(path, rewritten = %current, "Alias rewrites did not settle");
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alias(pattern: &str, target: &str) -> AliasRule {
        AliasRule {
            pattern: pattern.to_owned(),
            target: target.to_owned(),
        }
    }

    #[test]
    fn test_resolve_path_collapses_dots() {
        assert_eq!(resolve_path("/a/b/../c/./d"), "/a/c/d");
        assert_eq!(resolve_path("a/b"), "/a/b");
        assert_eq!(resolve_path("/"), "/");
        assert_eq!(resolve_path(""), "/");
    }

    #[test]
    fn test_resolve_path_is_idempotent() {
        for path in ["/a/../b", "//x/./y", "../../z", "/a//b/..", "", "/guide/"] {
            let once = resolve_path(path);
            assert_eq!(resolve_path(&once), once, "not idempotent for {path:?}");
        }
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("///a//b"), "/a/b");
        assert_eq!(clean_path("https://x.io//a"), "https://x.io/a");
        assert_eq!(clean_path("/a/b"), "/a/b");
    }

    #[test]
    fn test_is_absolute_path() {
        assert!(is_absolute_path("https://x.io"));
        assert!(is_absolute_path("//cdn.io/a.png"));
        assert!(is_absolute_path("mailto:me@x.io"));
        assert!(!is_absolute_path("/guide"));
        assert!(!is_absolute_path("guide.md"));
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("https://other.io/a", "https://docs.io"));
        assert!(is_external("//other.io/a", "https://docs.io"));
        assert!(!is_external("https://docs.io/a", "https://docs.io"));
        assert!(!is_external("https://docs.io:443/a", "https://docs.io"));
        assert!(is_external("http://docs.io/a", "https://docs.io"));
        assert!(!is_external("/guide", "https://docs.io"));
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/guide/intro.md"), "/guide/");
        assert_eq!(parent_path("/guide/"), "/guide/");
        assert_eq!(parent_path("/README.md"), "/");
        assert_eq!(parent_path("/a b/c"), "b/");
        assert_eq!(parent_path("b"), "");
        assert_eq!(parent_path(""), "");
    }

    #[test]
    fn test_remove_params() {
        assert_eq!(remove_params("/a?id=x"), "/a");
        assert_eq!(remove_params("/a#x"), "/a");
        assert_eq!(remove_params("/a"), "/a");
    }

    #[test]
    fn test_join_path_drops_fragment_segments() {
        assert_eq!(join_path(&["/", "#/guide", "intro.md"]), "/guide/intro.md");
        assert_eq!(join_path(&["/a#b/", "c.md"]), "/c.md");
        assert_eq!(join_path(&["/base/", "/a.md"]), "/base/a.md");
    }

    #[test]
    fn test_replace_slug() {
        assert_eq!(replace_slug("/guide#intro"), "/guide?id=intro");
        assert_eq!(replace_slug("/guide"), "/guide");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/guide", ".md"), "/guide.md");
        assert_eq!(file_name("/guide.md", ".md"), "/guide.md");
        assert_eq!(file_name("/page.html", ".md"), "/page.html");
        assert_eq!(file_name("/zh-cn/", ".md"), "/zh-cn/README.md");
    }

    #[test]
    fn test_to_file_substitutes_homepage() {
        assert_eq!(to_file("/", ".md", "README.md"), "/README.md");
        assert_eq!(to_file("/", ".md", "home.md"), "/home.md");
        assert_eq!(to_file("/zh-cn/", ".md", "home.md"), "/zh-cn/README.md");
    }

    #[test]
    fn test_alias_first_match_wins() {
        let table = AliasTable::new(&[
            alias("/zh-cn/changelog", "/changelog"),
            alias("/.*/changelog", "/other"),
        ]);
        assert_eq!(table.apply("/zh-cn/changelog"), "/changelog");
    }

    #[test]
    fn test_alias_captures() {
        let table = AliasTable::new(&[alias("/api/(.*)", "/reference/$1")]);
        assert_eq!(table.apply("/api/fetch"), "/reference/fetch");
    }

    #[test]
    fn test_alias_chain_reaches_fixed_point() {
        let table = AliasTable::new(&[alias("/a", "/b"), alias("/b", "/c")]);
        assert_eq!(table.apply("/a"), "/c");
        assert_eq!(table.apply("/c"), "/c");
    }

    #[test]
    fn test_alias_self_rewrite_stops() {
        let table = AliasTable::new(&[alias("/.*/_sidebar.md", "/_sidebar.md")]);
        assert_eq!(table.apply("/guide/_sidebar.md"), "/_sidebar.md");
    }

    #[test]
    fn test_alias_two_step_cycle_terminates() {
        let table = AliasTable::new(&[alias("/a", "/b"), alias("/b", "/a")]);
        let result = table.apply("/a");
        assert!(result == "/a" || result == "/b");
    }

    #[test]
    fn test_alias_invalid_pattern_skipped() {
        let table = AliasTable::new(&[alias("/(", "/x"), alias("/y", "/z")]);
        assert_eq!(table.apply("/y"), "/z");
    }

    #[test]
    fn test_alias_is_anchored() {
        let table = AliasTable::new(&[alias("/a", "/b")]);
        assert_eq!(table.apply("/ab"), "/ab");
    }
}
