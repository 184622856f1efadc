//! Configuration management for Quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. The loaded
//! [`Config`] is never mutated afterwards; consumers hold it by reference or
//! behind an `Arc`.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `docs.base_path`
//! - `docs.source_dir` (also expands a leading `~`)
//! - `fetch.request_headers` (values only)

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
    /// Override the base path prepended to every fetched file.
    pub base_path: Option<String>,
    /// Override router mode.
    pub router_mode: Option<RouterMode>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation source configuration.
    pub docs: DocsConfig,
    /// Routing configuration.
    pub router: RouterConfig,
    /// Sidebar configuration.
    pub sidebar: SidebarConfig,
    /// Navbar configuration.
    pub navbar: NavbarConfig,
    /// Cover page configuration.
    pub cover: CoverConfig,
    /// Link compilation configuration.
    pub links: LinksConfig,
    /// Fetch configuration.
    pub fetch: FetchConfig,
    /// Render configuration.
    pub render: RenderConfig,

    /// Resolved source directory (set after loading).
    #[serde(skip)]
    pub source_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Documentation source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Source directory, relative to the config file.
    source_dir: Option<String>,
    /// Base path prepended to every resolved file.
    pub base_path: String,
    /// Default extension of Markdown files, including the dot.
    pub ext: String,
    /// File served for `/README{ext}`.
    pub homepage: String,
    /// Site name shown in the sidebar.
    pub name: String,
    /// Link target of the site name.
    pub name_link: NameLink,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            base_path: String::new(),
            ext: ".md".to_owned(),
            homepage: "README.md".to_owned(),
            name: String::new(),
            name_link: NameLink::Url("/".to_owned()),
        }
    }
}

/// Site name link: one URL or a per-path table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameLink {
    Url(String),
    PerPath(BTreeMap<String, String>),
}

/// History strategy used by the router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    /// `#/path` fragments.
    #[default]
    Hash,
    /// Native push-state history (falls back to hash when unsupported).
    History,
}

impl std::str::FromStr for RouterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(Self::Hash),
            "history" => Ok(Self::History),
            other => Err(ConfigError::Validation(format!(
                "router.mode must be \"hash\" or \"history\", got \"{other}\""
            ))),
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// History strategy.
    pub mode: RouterMode,
    /// Resolve links relative to the current page directory.
    pub relative_path: bool,
    /// Path aliases, tried in declaration order.
    pub alias: Vec<AliasRule>,
}

/// One alias: an anchored regex and its replacement (`$1` captures allowed).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AliasRule {
    pub pattern: String,
    pub target: String,
}

/// A file option given either as a flag or as an explicit path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileToggle {
    Enabled(bool),
    Path(String),
}

impl Default for FileToggle {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl FileToggle {
    /// Resolve to a file name: `true` becomes `{stem}{ext}`.
    #[must_use]
    pub fn file(&self, stem: &str, ext: &str) -> Option<String> {
        match self {
            Self::Enabled(true) => Some(format!("{stem}{ext}")),
            Self::Enabled(false) => None,
            Self::Path(path) if path.is_empty() => None,
            Self::Path(path) => Some(path.clone()),
        }
    }
}

/// Sidebar configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Load a sidebar file (`true` means `_sidebar{ext}`).
    pub load: FileToggle,
    /// Deepest heading level in the generated sidebar.
    pub max_level: u8,
    /// Deepest heading level in the sub-sidebar; 0 disables it.
    pub sub_max_level: u8,
    /// Do not render a sidebar at all.
    pub hide: bool,
    /// Insert the active sidebar entry as H1 when the page lacks one.
    pub auto_header: bool,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            load: FileToggle::default(),
            max_level: 6,
            sub_max_level: 0,
            hide: false,
            auto_header: false,
        }
    }
}

/// Navbar configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NavbarConfig {
    /// Load a navbar file (`true` means `_navbar{ext}`).
    pub load: FileToggle,
}

/// Which routes get a cover page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Coverpage {
    /// `true` shows `_coverpage{ext}` on `/`.
    Enabled(bool),
    /// Explicit file shown on `/`.
    Path(String),
    /// `_coverpage` shown on each listed route.
    Paths(Vec<String>),
    /// Per-route cover file (`true` means `_coverpage`).
    PerPath(BTreeMap<String, FileToggle>),
}

impl Default for Coverpage {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Cover page configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub page: Coverpage,
    /// Render only the cover on routes that have one.
    pub only: bool,
}

/// Link compilation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Regexes of hrefs left untouched by the link compiler.
    pub no_compile: Vec<String>,
    /// `target` of external links.
    pub external_target: String,
    /// `rel` of external links.
    pub external_rel: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            no_compile: Vec::new(),
            external_target: "_blank".to_owned(),
            external_rel: "noopener".to_owned(),
        }
    }
}

/// Not-found page selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NotFoundPage {
    /// `true` fetches `_404{ext}`.
    Enabled(bool),
    /// Explicit file.
    Path(String),
    /// Files per route prefix; the longest matching prefix wins.
    PerPrefix(BTreeMap<String, String>),
}

impl Default for NotFoundPage {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Fetch configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Extra headers sent with every request.
    pub request_headers: BTreeMap<String, String>,
    /// Locale prefixes that fall back to the default-language page.
    pub fallback_languages: Vec<String>,
    pub not_found_page: NotFoundPage,
}

/// Scroll-to-top behavior after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Auto2Top {
    Enabled(bool),
    Offset(u32),
}

impl Default for Auto2Top {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl Auto2Top {
    /// Scroll offset, or `None` when scrolling to top is disabled.
    #[must_use]
    pub fn offset(self) -> Option<u32> {
        match self {
            Self::Enabled(true) => Some(0),
            Self::Enabled(false) | Self::Offset(0) => None,
            Self::Offset(offset) => Some(offset),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Skip `:emoji:` replacement.
    pub no_emoji: bool,
    /// Format of `{docsify-updated}`, with `{YYYY}`-style tokens.
    pub format_updated: Option<String>,
    pub auto2top: Auto2Top,
    /// Offset used when scrolling a heading into view.
    pub top_margin: u32,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`docs.base_path`").
        field: String,
        /// Error message (e.g., "${`DOCS_BASE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a heading level within `min..=6`.
fn require_level(value: u8, min: u8, field: &str) -> Result<(), ConfigError> {
    if !(min..=6).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be between {min} and 6"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.source_dir.clone_from(source_dir);
        }
        if let Some(base_path) = &settings.base_path {
            self.docs.base_path.clone_from(base_path);
        }
        if let Some(mode) = settings.router_mode {
            self.router.mode = mode;
        }
    }

    /// Sidebar file name, if a sidebar should be loaded.
    #[must_use]
    pub fn sidebar_file(&self) -> Option<String> {
        self.sidebar.load.file("_sidebar", &self.docs.ext)
    }

    /// Navbar file name, if a navbar should be loaded.
    #[must_use]
    pub fn navbar_file(&self) -> Option<String> {
        self.navbar.load.file("_navbar", &self.docs.ext)
    }

    /// Cover file for a route path, relative to the route's parent directory.
    #[must_use]
    pub fn cover_file(&self, route_path: &str) -> Option<String> {
        match &self.cover.page {
            Coverpage::Enabled(true) if route_path == "/" => {
                Some(format!("_coverpage{}", self.docs.ext))
            }
            Coverpage::Path(path) if route_path == "/" && !path.is_empty() => Some(path.clone()),
            Coverpage::Paths(paths) => paths
                .iter()
                .any(|p| p == route_path)
                .then(|| "_coverpage".to_owned()),
            Coverpage::PerPath(map) => map
                .get(route_path)
                .and_then(|toggle| toggle.file("_coverpage", "")),
            _ => None,
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfig::default(),
            router: RouterConfig::default(),
            sidebar: SidebarConfig::default(),
            navbar: NavbarConfig::default(),
            cover: CoverConfig::default(),
            links: LinksConfig::default(),
            fetch: FetchConfig::default(),
            render: RenderConfig::default(),
            source_dir: base.join("docs"),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_docs()?;
        require_level(self.sidebar.max_level, 1, "sidebar.max_level")?;
        require_level(self.sidebar.sub_max_level, 0, "sidebar.sub_max_level")?;
        require_non_empty(&self.links.external_target, "links.external_target")?;
        for rule in &self.router.alias {
            require_non_empty(&rule.pattern, "router.alias.pattern")?;
        }
        Ok(())
    }

    /// Validate docs configuration.
    fn validate_docs(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.docs.homepage, "docs.homepage")?;
        if !self.docs.ext.starts_with('.') || self.docs.ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "docs.ext must start with a dot, got \"{}\"",
                self.docs.ext
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.docs.base_path = expand::expand_env(&self.docs.base_path, "docs.base_path")?;
        if let Some(dir) = &self.docs.source_dir {
            self.docs.source_dir = Some(expand::expand_dir(dir, "docs.source_dir")?);
        }
        expand::expand_headers(&mut self.fetch.request_headers)
    }

    /// Resolve the source directory against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.source_dir = config_dir.join(self.docs.source_dir.as_deref().unwrap_or("docs"));
    }
}
