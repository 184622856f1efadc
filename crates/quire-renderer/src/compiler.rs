//! Stateful compiler shared across navigation cycles.

use std::collections::HashMap;

use quire_config::Config;

use crate::emoji::emojify;
use crate::highlight::{Highlighter, SyntectHighlighter};
use crate::lexer::{TokenStream, lex};
use crate::renderer::{CompileError, MarkdownRenderer};
use crate::resolver::{LinkPolicy, LinkResolver};
use crate::toc::{
    SIDEBAR_TEMPLATE, SUB_SIDEBAR_TEMPLATE, TocEntry, filter_ignored, gen_tree, render_tree,
};

/// Markdown compiler with HTML, TOC and sidebar tree caches.
///
/// The TOC accumulates across compiles (cover, sidebar, page) until
/// [`Compiler::sub_sidebar`] consumes it.
pub struct Compiler {
    policy: LinkPolicy,
    no_emoji: bool,
    highlighter: Box<dyn Highlighter>,
    html_cache: HashMap<String, String>,
    toc: Vec<TocEntry>,
    toc_cache: HashMap<String, Vec<TocEntry>>,
    tree_cache: HashMap<String, Vec<TocEntry>>,
    cross_origin_links: Vec<String>,
}

impl Compiler {
    /// Create a compiler highlighting with syntect.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_highlighter(config, Box::new(SyntectHighlighter::new()))
    }

    #[must_use]
    pub fn with_highlighter(config: &Config, highlighter: Box<dyn Highlighter>) -> Self {
        Self {
            policy: LinkPolicy::from_config(config),
            no_emoji: config.render.no_emoji,
            highlighter,
            html_cache: HashMap::new(),
            toc: Vec::new(),
            toc_cache: HashMap::new(),
            tree_cache: HashMap::new(),
            cross_origin_links: Vec::new(),
        }
    }

    /// Compile Markdown source.
    pub fn compile(
        &mut self,
        source: &str,
        resolver: &dyn LinkResolver,
    ) -> Result<String, CompileError> {
        if source.is_empty() {
            return Ok(String::new());
        }
        if self.html_cache.contains_key(source) {
            return Ok(self.cache_hit(source, resolver));
        }
        let stream = lex(source);
        self.compile_stream(source, &stream, resolver)
    }

    /// Compile an already lexed (and possibly embed-spliced) stream.
    ///
    /// `key` identifies the stream in the HTML cache, normally its raw
    /// source. On a hit the TOC snapshot of the current file is restored.
    pub fn compile_stream(
        &mut self,
        key: &str,
        stream: &TokenStream,
        resolver: &dyn LinkResolver,
    ) -> Result<String, CompileError> {
        if self.html_cache.contains_key(key) {
            return Ok(self.cache_hit(key, resolver));
        }

        let mut renderer = MarkdownRenderer::new(resolver, self.highlighter.as_ref(), &self.policy);
        renderer.render_stream(stream)?;
        let output = renderer.finish();

        let html = if self.no_emoji {
            output.html
        } else {
            emojify(&output.html)
        };

        self.toc.extend(output.toc);
        for link in output.cross_origin_links {
            if !self.cross_origin_links.contains(&link) {
                self.cross_origin_links.push(link);
            }
        }
        self.toc_cache
            .insert(resolver.current_file(), self.toc.clone());
        self.html_cache.insert(key.to_owned(), html.clone());
        Ok(html)
    }

    fn cache_hit(&mut self, key: &str, resolver: &dyn LinkResolver) -> String {
        let file = resolver.current_file();
        tracing::debug!(file = %file, "Compiled HTML cache hit");
        self.toc = self.toc_cache.get(&file).cloned().unwrap_or_default();
        self.html_cache.get(key).cloned().unwrap_or_default()
    }

    /// Compile the sidebar.
    ///
    /// With `text` the sidebar file is compiled. Without it the sidebar is
    /// generated from the collected TOC, down to `max_level`.
    pub fn sidebar(
        &mut self,
        text: Option<&str>,
        max_level: u8,
        resolver: &dyn LinkResolver,
    ) -> Result<String, CompileError> {
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            return self.compile(text, resolver);
        }

        let path = resolver.current_path();
        let tree = match self.tree_cache.get(&path) {
            Some(tree) => tree.clone(),
            None => gen_tree(&filter_ignored(&self.toc), max_level),
        };
        let html = render_tree(&tree, SIDEBAR_TEMPLATE);
        self.tree_cache.insert(path, tree);
        Ok(html)
    }

    /// Build the sub-sidebar from the collected TOC and clear it.
    ///
    /// Returns `None` when `max_level` is 0, which only clears the TOC.
    pub fn sub_sidebar(&mut self, max_level: u8, resolver: &dyn LinkResolver) -> Option<String> {
        let toc = std::mem::take(&mut self.toc);
        if max_level == 0 {
            return None;
        }

        let path = resolver.current_path();
        let tree = match self.tree_cache.get(&path) {
            Some(tree) => tree.clone(),
            None => {
                let mut entries = filter_ignored(&toc);
                if entries.first().is_some_and(|entry| entry.level == 1) {
                    entries.remove(0);
                }
                gen_tree(&entries, max_level)
            }
        };
        let html = render_tree(&tree, SUB_SIDEBAR_TEMPLATE);
        self.tree_cache.insert(path, tree);
        Some(html)
    }

    /// Compile the cover page without adding its headings to the TOC.
    pub fn cover(&mut self, text: &str, resolver: &dyn LinkResolver) -> Result<String, CompileError> {
        self.compile_detached(text, resolver)
    }

    /// Compile the navbar without adding its headings to the TOC.
    pub fn navbar(&mut self, text: &str, resolver: &dyn LinkResolver) -> Result<String, CompileError> {
        self.compile_detached(text, resolver)
    }

    fn compile_detached(
        &mut self,
        text: &str,
        resolver: &dyn LinkResolver,
    ) -> Result<String, CompileError> {
        let file = resolver.current_file();
        let saved = self.toc.clone();
        let saved_snapshot = self.toc_cache.get(&file).cloned();
        let html = self.compile(text, resolver);
        self.toc = saved;
        match saved_snapshot {
            Some(snapshot) => self.toc_cache.insert(file, snapshot),
            None => self.toc_cache.remove(&file),
        };
        html
    }

    /// Render a standalone heading, as inserted by `auto_header`.
    #[must_use]
    pub fn header(&self, text: &str, level: u8, resolver: &dyn LinkResolver) -> String {
        let mut renderer = MarkdownRenderer::new(resolver, self.highlighter.as_ref(), &self.policy);
        renderer.heading(level, text);
        renderer.finish().html
    }

    /// Headings collected since the last sub-sidebar.
    #[must_use]
    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Drain links annotated `:crossorgin` found so far.
    pub fn take_cross_origin_links(&mut self) -> Vec<String> {
        std::mem::take(&mut self.cross_origin_links)
    }
}
