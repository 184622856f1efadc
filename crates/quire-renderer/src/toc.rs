//! Table of contents entries and the sidebar tree built from them.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Template for sub-sidebars attached under the active sidebar entry.
pub const SUB_SIDEBAR_TEMPLATE: &str = r#"<ul class="app-sub-sidebar">{inner}</ul>"#;

/// Template for the sidebar generated from a page's headings.
pub const SIDEBAR_TEMPLATE: &str = "<ul>{inner}</ul>";

/// Table of contents entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading HTML with links removed.
    pub title: String,
    /// Navigable URL of the heading.
    pub slug: String,
    /// Anchor id of the heading element.
    pub id: String,
    /// Left out of the TOC.
    pub ignore_sub_heading: bool,
    /// Deeper headings that follow are left out of the TOC.
    pub ignore_all_subs: bool,
    /// Populated by [`gen_tree`] only.
    pub children: Vec<TocEntry>,
}

/// Drop ignored entries from a flat TOC.
///
/// An `ignore_all_subs` entry removes the strictly deeper entries after it,
/// up to the next entry at the same or a shallower level. An
/// `ignore_sub_heading` entry removes only itself.
#[must_use]
pub fn filter_ignored(entries: &[TocEntry]) -> Vec<TocEntry> {
    let mut kept = Vec::with_capacity(entries.len());
    let mut skip_deeper_than: Option<u8> = None;

    for entry in entries {
        if let Some(level) = skip_deeper_than {
            if entry.level > level {
                continue;
            }
            skip_deeper_than = None;
        }
        if entry.ignore_all_subs {
            skip_deeper_than = Some(entry.level);
        }
        if !entry.ignore_sub_heading {
            kept.push(entry.clone());
        }
    }
    kept
}

/// Nest a flat TOC.
///
/// Entries deeper than `max_level` are dropped. Every other entry becomes a
/// child of the last entry seen exactly one level above it, or a root when
/// there is none.
#[must_use]
pub fn gen_tree(entries: &[TocEntry], max_level: u8) -> Vec<TocEntry> {
    let mut nodes: Vec<TocEntry> = Vec::new();
    let mut children: Vec<Vec<usize>> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    let mut last_at_level: HashMap<u8, usize> = HashMap::new();

    for entry in entries {
        let level = entry.level.max(1);
        if level > max_level {
            continue;
        }

        let index = nodes.len();
        nodes.push(TocEntry {
            children: Vec::new(),
            ..entry.clone()
        });
        children.push(Vec::new());

        match last_at_level.get(&(level - 1)) {
            Some(&parent) => children[parent].push(index),
            None => roots.push(index),
        }
        last_at_level.insert(level, index);
    }

    roots
        .into_iter()
        .map(|index| assemble(index, &nodes, &children))
        .collect()
}

fn assemble(index: usize, nodes: &[TocEntry], children: &[Vec<usize>]) -> TocEntry {
    let mut node = nodes[index].clone();
    node.children = children[index]
        .iter()
        .map(|&child| assemble(child, nodes, children))
        .collect();
    node
}

/// Render a tree as nested lists of section links.
///
/// `template` must contain `{inner}`. Children are rendered with the same
/// template right after their parent's item. An empty tree renders nothing.
#[must_use]
pub fn render_tree(tree: &[TocEntry], template: &str) -> String {
    if tree.is_empty() {
        return String::new();
    }

    let mut inner = String::new();
    for node in tree {
        let plain = TAG_RE.replace_all(&node.title, "");
        write!(
            inner,
            r#"<li><a class="section-link" href="{}" title="{plain}">{}</a></li>"#,
            node.slug, node.title
        )
        .unwrap();
        inner.push_str(&render_tree(&node.children, template));
    }
    template.replacen("{inner}", &inner, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(level: u8, title: &str) -> TocEntry {
        TocEntry {
            level,
            title: title.to_owned(),
            slug: format!("#/?id={}", title.to_lowercase()),
            id: title.to_lowercase(),
            ..TocEntry::default()
        }
    }

    fn titles(tree: &[TocEntry]) -> Vec<(String, Vec<String>)> {
        tree.iter()
            .map(|node| {
                (
                    node.title.clone(),
                    node.children.iter().map(|c| c.title.clone()).collect(),
                )
            })
            .collect()
    }

    fn assert_levels_increase(tree: &[TocEntry]) {
        for node in tree {
            for child in &node.children {
                assert!(child.level > node.level);
            }
            assert_levels_increase(&node.children);
        }
    }

    #[test]
    fn test_gen_tree_nests_by_level() {
        let entries = vec![
            entry(1, "Title"),
            entry(2, "A"),
            entry(3, "A1"),
            entry(2, "B"),
        ];
        let tree = gen_tree(&entries, 6);
        assert_eq!(tree.len(), 1);
        assert_eq!(
            titles(&tree[0].children),
            vec![
                ("A".to_owned(), vec!["A1".to_owned()]),
                ("B".to_owned(), vec![]),
            ]
        );
        assert_levels_increase(&tree);
    }

    #[test]
    fn test_gen_tree_skipped_level_becomes_root() {
        let tree = gen_tree(&[entry(2, "A"), entry(4, "Deep")], 6);
        assert_eq!(
            titles(&tree),
            vec![("A".to_owned(), vec![]), ("Deep".to_owned(), vec![])]
        );
    }

    #[test]
    fn test_gen_tree_drops_entries_past_max_level() {
        let entries = vec![entry(2, "A"), entry(3, "A1"), entry(4, "A1a"), entry(3, "A2")];
        let tree = gen_tree(&entries, 3);
        assert_eq!(
            titles(&tree),
            vec![("A".to_owned(), vec!["A1".to_owned(), "A2".to_owned()])]
        );
        assert!(tree[0].children[0].children.is_empty());
    }

    #[test]
    fn test_gen_tree_levels_always_increase() {
        let levels = [3u8, 1, 2, 2, 4, 3, 5, 6, 2, 1, 3];
        let entries: Vec<TocEntry> = levels
            .iter()
            .enumerate()
            .map(|(i, &level)| entry(level, &format!("h{i}")))
            .collect();
        assert_levels_increase(&gen_tree(&entries, 6));
    }

    #[test]
    fn test_filter_ignore_sub_heading_removes_only_itself() {
        let mut done = entry(2, "Done");
        done.ignore_sub_heading = true;
        let entries = vec![entry(1, "T"), done, entry(3, "Child"), entry(2, "Next")];
        let kept: Vec<String> = filter_ignored(&entries)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(kept, vec!["T", "Child", "Next"]);
    }

    #[test]
    fn test_filter_ignore_all_subs_removes_deeper_followers() {
        let mut api = entry(2, "Api");
        api.ignore_all_subs = true;
        let entries = vec![
            api,
            entry(3, "Get"),
            entry(4, "Params"),
            entry(2, "Next"),
            entry(3, "Kept"),
        ];
        let kept: Vec<String> = filter_ignored(&entries)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(kept, vec!["Api", "Next", "Kept"]);
    }

    #[test]
    fn test_render_tree() {
        let tree = gen_tree(&[entry(2, "A"), entry(3, "<code>B</code>")], 6);
        assert_eq!(
            render_tree(&tree, SIDEBAR_TEMPLATE),
            concat!(
                r##"<ul><li><a class="section-link" href="#/?id=a" title="A">A</a></li>"##,
                r##"<ul><li><a class="section-link" href="#/?id=<code>b</code>" title="B"><code>B</code></a></li></ul></ul>"##,
            )
        );
    }

    #[test]
    fn test_render_empty_tree() {
        assert_eq!(render_tree(&[], SUB_SIDEBAR_TEMPLATE), "");
    }
}
