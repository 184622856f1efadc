//! Heading slugs.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"[\x{2000}-\x{206F}\x{2E00}-\x{2E7F}\\'!"#$%&()*+,./:;<=>?@\[\]^`{|}~]"##).unwrap()
});
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());
static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());
static LEADING_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9])").unwrap());

/// Slugify heading text without de-duplication.
///
/// ASCII letters are lowercased, tags and punctuation dropped, whitespace
/// turned into dashes. A leading digit gets a `_` prefix so the slug is a
/// valid element id.
///
/// # Examples
///
/// ```
/// use quire_renderer::slugify;
///
/// assert_eq!(slugify("Hello World!"), "hello-world");
/// assert_eq!(slugify("2. Install"), "_2-install");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let slug = text.trim().to_ascii_lowercase();
    let slug = TAG_RE.replace_all(&slug, "");
    let slug = PUNCTUATION_RE.replace_all(&slug, "");
    let slug = WHITESPACE_RE.replace_all(&slug, "-");
    let slug = DASHES_RE.replace_all(&slug, "-");
    LEADING_DIGIT_RE.replace(&slug, "_$1").into_owned()
}

/// De-duplicating slugifier for one compile session.
///
/// The first occurrence of a slug is returned as is; later ones get `-1`,
/// `-2`, ... appended.
#[derive(Debug, Default)]
pub struct Slugger {
    counts: HashMap<String, usize>,
}

impl Slugger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `text`, unique within this session.
    pub fn slug(&mut self, text: &str) -> String {
        let slug = slugify(text);
        let count = self
            .counts
            .entry(slug.clone())
            .and_modify(|count| *count += 1)
            .or_insert(0);
        if *count == 0 {
            slug
        } else {
            format!("{slug}-{count}")
        }
    }

    /// Forget all seen slugs.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
