//! Event-driven Markdown renderer.
//!
//! Walks pulldown-cmark events and writes HTML the way the site's themes
//! expect it: anchored headings, `v-pre` code blocks, tip/warn paragraphs,
//! task lists, and links and images resolved through the router.

use std::fmt::Write;
use std::sync::LazyLock;

use pulldown_cmark::{BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Parser, Tag, TagEnd};
use quire_router::path::{is_absolute_path, join_path, parent_path};
use regex::Regex;

use crate::annotation;
use crate::highlight::Highlighter;
use crate::lexer::{TokenKind, TokenStream, parser_options};
use crate::resolver::{LinkPolicy, LinkResolver};
use crate::slug::Slugger;
use crate::state::{
    CodeBlockState, HeadingState, ImageState, ItemFrame, ListFrame, TableState, escape_html,
};
use crate::toc::TocEntry;

/// Stands in for backticks inside embedded code so the embedding fence
/// stays intact; restored before highlighting.
pub const BACKTICK_PLACEHOLDER: &str = "@QUIRE_QM@";

const DEFAULT_CODE_LANG: &str = "markup";

/// Heading markers, checked in this order. `true` marks the "all subs" form.
const IGNORE_MARKERS: [(&str, bool); 4] = [
    ("<!-- {docsify-ignore} -->", false),
    ("{docsify-ignore}", false),
    ("<!-- {docsify-ignore-all} -->", true),
    ("{docsify-ignore-all}", true),
];

static A_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?a(?:\s[^>]*)?>").unwrap());

/// Compilation failure.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A container end event arrived without a matching start.
    #[error("unbalanced markdown events: end of {0} without a matching start")]
    UnbalancedTag(String),
}

fn unbalanced(tag: TagEnd) -> CompileError {
    CompileError::UnbalancedTag(format!("{tag:?}"))
}

/// Result of rendering markdown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub html: String,
    /// Headings in document order.
    pub toc: Vec<TocEntry>,
    /// Links annotated `:crossorgin` under native routing.
    pub cross_origin_links: Vec<String>,
}

/// Markdown renderer for one compile session.
///
/// Slugs are de-duplicated across everything rendered by the same instance.
pub struct MarkdownRenderer<'a> {
    resolver: &'a dyn LinkResolver,
    highlighter: &'a dyn Highlighter,
    policy: &'a LinkPolicy,
    current_path: String,
    content_base: String,
    output: String,
    open_tags: usize,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    paragraphs: Vec<usize>,
    lists: Vec<ListFrame>,
    items: Vec<ItemFrame>,
    slugger: Slugger,
    toc: Vec<TocEntry>,
    cross_origin_links: Vec<String>,
}

impl<'a> MarkdownRenderer<'a> {
    #[must_use]
    pub fn new(
        resolver: &'a dyn LinkResolver,
        highlighter: &'a dyn Highlighter,
        policy: &'a LinkPolicy,
    ) -> Self {
        Self {
            resolver,
            highlighter,
            policy,
            current_path: resolver.current_path(),
            content_base: resolver.content_base(),
            output: String::with_capacity(4096),
            open_tags: 0,
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            paragraphs: Vec::new(),
            lists: Vec::new(),
            items: Vec::new(),
            slugger: Slugger::new(),
            toc: Vec::new(),
            cross_origin_links: Vec::new(),
        }
    }

    /// Render markdown text.
    pub fn render_markdown(&mut self, markdown: &str) -> Result<(), CompileError> {
        self.render(Parser::new_ext(markdown, parser_options()))
    }

    /// Render a lexed stream. References resolve through the stream's link
    /// table; HTML tokens are written verbatim.
    pub fn render_stream(&mut self, stream: &TokenStream) -> Result<(), CompileError> {
        for token in &stream.tokens {
            if token.kind == TokenKind::Html {
                self.output.push_str(&token.text);
                continue;
            }
            let callback = |link: BrokenLink| {
                stream.links.get(&link.reference).map(|def| {
                    (
                        CowStr::from(def.href.clone()),
                        CowStr::from(def.title.clone().unwrap_or_default()),
                    )
                })
            };
            let parser =
                Parser::new_with_broken_link_callback(&token.text, parser_options(), Some(callback));
            self.render(parser)?;
        }
        Ok(())
    }

    /// Render markdown events.
    pub fn render<'e, I>(&mut self, events: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Event<'e>>,
    {
        for event in events {
            self.process_event(event)?;
        }
        Ok(())
    }

    /// Render a heading from plain text, outside of any document.
    pub fn heading(&mut self, level: u8, text: &str) {
        self.finish_heading(level, text, &escape_html(text));
    }

    /// Take the rendered HTML and collected metadata.
    #[must_use]
    pub fn finish(self) -> CompileOutput {
        CompileOutput {
            html: self.output,
            toc: self.toc,
            cross_origin_links: self.cross_origin_links,
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) -> Result<(), CompileError> {
        match event {
            Event::Start(tag) => {
                self.open_tags += 1;
                self.start_tag(tag);
            }
            Event::End(tag) => {
                if self.open_tags == 0 {
                    return Err(unbalanced(tag));
                }
                self.open_tags -= 1;
                self.end_tag(tag)?;
            }
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.output.push_str(&html),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.paragraphs.push(self.output.len()),
            Tag::Heading { level, .. } => self.heading.start(level as u8),
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(ToOwned::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(first_number) => self.lists.push(ListFrame {
                start: self.output.len(),
                first_number,
                has_task: false,
            }),
            Tag::Item => self.items.push(ItemFrame {
                start: self.output.len(),
                is_task: false,
            }),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let open = self.link_open_tag(link_type, &dest_url, &title);
                self.push_inline(&open);
            }
            Tag::Image {
                dest_url, title, ..
            } => self.image.start(dest_url.into_string(), title.into_string()),
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), CompileError> {
        match tag {
            TagEnd::Paragraph => {
                let start = self.paragraphs.pop().ok_or_else(|| unbalanced(tag))?;
                let inner = self.output.split_off(start);
                self.paragraph(&inner);
            }
            TagEnd::Heading(_) => {
                let (level, text, html) = self.heading.complete().ok_or_else(|| unbalanced(tag))?;
                self.finish_heading(level, &text, &html);
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => self.code_block(),
            TagEnd::List(ordered) => {
                let frame = self.lists.pop().ok_or_else(|| unbalanced(tag))?;
                let name = if ordered { "ol" } else { "ul" };
                let mut open = format!("<{name}");
                if frame.has_task {
                    open.push_str(r#" class="task-list""#);
                }
                if let Some(n) = frame.first_number.filter(|&n| n > 1) {
                    write!(open, r#" start="{n}""#).unwrap();
                }
                open.push('>');
                self.output.insert_str(frame.start, &open);
                write!(self.output, "</{name}>").unwrap();
            }
            TagEnd::Item => {
                let item = self.items.pop().ok_or_else(|| unbalanced(tag))?;
                if item.is_task {
                    if let Some(list) = self.lists.last_mut() {
                        list.has_task = true;
                    }
                    self.output
                        .insert_str(item.start, r#"<li class="task-list-item"><label>"#);
                    self.output.push_str("</label></li>");
                } else {
                    self.output.insert_str(item.start, "<li>");
                    self.output.push_str("</li>");
                }
            }
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                let (src, title, alt) = self.image.end().ok_or_else(|| unbalanced(tag))?;
                let img = self.image_tag(&src, &title, &alt);
                self.push_inline(&img);
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        if let Some(item) = self.items.last_mut() {
            item.is_task = true;
        }
        let checked = if checked { r#"checked="" "# } else { "" };
        write!(
            self.output,
            r#"<input {checked}disabled="" type="checkbox"> "#
        )
        .unwrap();
    }

    /// `!>` paragraphs become tips, `?>` paragraphs warnings.
    fn paragraph(&mut self, inner: &str) {
        if let Some(rest) = inner.strip_prefix("!&gt;") {
            write!(self.output, r#"<p class="tip">{}</p>"#, rest.trim()).unwrap();
        } else if let Some(rest) = inner.strip_prefix("?&gt;") {
            write!(self.output, r#"<p class="warn">{}</p>"#, rest.trim()).unwrap();
        } else {
            write!(self.output, "<p>{inner}</p>").unwrap();
        }
    }

    fn finish_heading(&mut self, level: u8, text: &str, html: &str) {
        let (mut html, config) = annotation::parse(html.trim());
        let (mut text, _) = annotation::parse(text.trim());

        let mut ignore_sub_heading = false;
        let mut ignore_all_subs = false;
        for (marker, all) in IGNORE_MARKERS {
            if html.contains(marker) || text.contains(marker) {
                html = html.replacen(marker, "", 1);
                text = text.replacen(marker, "", 1);
                if all {
                    ignore_all_subs = true;
                } else {
                    ignore_sub_heading = true;
                }
            }
        }
        let html = html.trim();
        let text = text.trim();

        let slug = self.slugger.slug(config.get("id").unwrap_or(text));
        let url = self.resolver.heading_url(&slug);

        self.toc.push(TocEntry {
            level,
            title: A_TAG_RE.replace_all(html, "").into_owned(),
            slug: url.clone(),
            id: slug.clone(),
            ignore_sub_heading,
            ignore_all_subs,
            children: Vec::new(),
        });

        write!(
            self.output,
            r#"<h{level} id="{slug}"><a href="{}" data-id="{slug}" class="anchor"><span>{html}</span></a></h{level}>"#,
            escape_html(&url)
        )
        .unwrap();
    }

    fn code_block(&mut self) {
        let (lang, content) = self.code.end();
        let lang = lang.unwrap_or_else(|| DEFAULT_CODE_LANG.to_owned());
        let content = content.strip_suffix('\n').unwrap_or(&content);
        let code = content.replace(BACKTICK_PLACEHOLDER, "`");
        let highlighted = self.highlighter.highlight(&code, &lang);
        let lang = escape_html(&lang);
        write!(
            self.output,
            r#"<pre v-pre data-lang="{lang}"><code class="lang-{lang}">{highlighted}</code></pre>"#
        )
        .unwrap();
    }

    fn link_open_tag(&mut self, link_type: LinkType, dest: &str, title: &str) -> String {
        let (title, config) = annotation::parse(title);
        let target = config
            .get("target")
            .unwrap_or(&self.policy.external_target)
            .to_owned();
        let rel = if target == "_blank" {
            self.policy.external_rel.as_str()
        } else {
            ""
        };

        let mut href = if link_type == LinkType::Email {
            format!("mailto:{dest}")
        } else {
            dest.to_owned()
        };
        let mut attrs: Vec<String> = Vec::new();

        if !is_absolute_path(&href) && !self.policy.is_no_compile(&href) && !config.has("ignore") {
            if href == self.policy.homepage {
                "README".clone_into(&mut href);
            }
            href = self.resolver.to_url(&href, &[], Some(&self.current_path));
        } else {
            if !is_absolute_path(&href) && href.starts_with("./") {
                href = format!("{}{href}", self.resolver.document_dir());
            }
            if !href.starts_with("mailto:") {
                attrs.push(format!(r#"target="{}""#, escape_html(&target)));
                if !rel.is_empty() {
                    attrs.push(format!(r#"rel="{}""#, escape_html(rel)));
                }
            }
        }

        if config.has("crossorgin")
            && target == "_self"
            && self.resolver.is_native()
            && !self.cross_origin_links.contains(&href)
        {
            self.cross_origin_links.push(href.clone());
        }
        if config.has("disabled") {
            attrs.push("disabled".to_owned());
            "javascript:void(0)".clone_into(&mut href);
        }
        if let Some(class) = config.get("class") {
            attrs.push(format!(r#"class="{class}""#));
        }
        if let Some(id) = config.get("id") {
            attrs.push(format!(r#"id="{id}""#));
        }
        if !title.is_empty() {
            attrs.push(format!(r#"title="{}""#, escape_html(&title)));
        }

        let mut tag = format!(r#"<a href="{}""#, escape_html(&href));
        for attr in attrs {
            tag.push(' ');
            tag.push_str(&attr);
        }
        tag.push('>');
        tag
    }

    fn image_tag(&self, href: &str, title: &str, alt: &str) -> String {
        let (title, config) = annotation::parse(title);
        let mut attrs: Vec<String> = Vec::new();

        if config.has("no-zoom") {
            attrs.push("data-no-zoom".to_owned());
        }
        if !title.is_empty() {
            attrs.push(format!(r#"title="{}""#, escape_html(&title)));
        }
        if let Some(size) = config.get("size") {
            match size.split_once('x') {
                Some((width, height)) if !height.is_empty() => {
                    attrs.push(format!(r#"width="{width}" height="{height}""#));
                }
                Some((width, _)) => attrs.push(format!(r#"width="{width}""#)),
                None => attrs.push(format!(r#"width="{size}""#)),
            }
        }
        if let Some(class) = config.get("class") {
            attrs.push(format!(r#"class="{class}""#));
        }
        if let Some(id) = config.get("id") {
            attrs.push(format!(r#"id="{id}""#));
        }

        let url = if is_absolute_path(href) {
            href.to_owned()
        } else {
            join_path(&[&self.content_base, &parent_path(&self.current_path), href])
        };
        let (url, href, alt) = (escape_html(&url), escape_html(href), escape_html(alt));

        if attrs.is_empty() {
            format!(r#"<img src="{url}" data-origin="{href}" alt="{alt}">"#)
        } else {
            format!(
                r#"<img src="{url}" data-origin="{href}" alt="{alt}" {} />"#,
                attrs.join(" ")
            )
        }
    }
}
