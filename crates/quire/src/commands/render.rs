//! `quire render` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use quire_config::{CliSettings, Config, RouterMode};
use quire_fetch::{FsFetch, HttpFetch, LayeredFetch};
use quire_router::Location;
use quire_site::{CoverBackground, Docs, View};

use crate::error::CliError;
use crate::output::Output;

/// How the painted view is printed.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum Format {
    /// HTML sections with headings.
    #[default]
    Html,
    /// The whole view as JSON.
    Json,
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// URL to render, e.g. `http://localhost/#/guide`.
    #[arg(default_value = "http://localhost/")]
    url: String,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation source directory (overrides config).
    #[arg(short, long, env = "QUIRE_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Router mode (overrides config).
    #[arg(short, long)]
    mode: Option<RouterMode>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails to load or the page fails to
    /// compile.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            router_mode: self.mode,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.detail(&format!("Source: {}", config.source_dir.display()));

        let fetch = LayeredFetch::new(FsFetch::new(config.source_dir.clone()), HttpFetch::new(None));
        tracing::info!(url = %self.url, mode = ?config.router.mode, "Rendering");
        let location = Location::new(&self.url).with_push_state(true);
        let mut docs = Docs::new(Arc::new(config), location, Arc::new(fetch));
        docs.start()?;

        output.detail(&format!("Route: {}", docs.router().route().path));
        match self.format {
            Format::Html => print_html(&output, docs.view()),
            Format::Json => output.print(&serde_json::to_string_pretty(docs.view())?),
        }
        Ok(())
    }
}

fn print_html(output: &Output, view: &View) {
    if let Some(title) = &view.title {
        output.info(&format!("Title: {title}"));
    }
    if let Some(cover) = &view.cover {
        output.heading("<!-- cover -->");
        output.print(&cover.html);
        match &cover.background {
            Some(CoverBackground::Color(color)) => output.detail(&format!("Background: {color}")),
            Some(CoverBackground::Image(url)) => output.detail(&format!("Background image: {url}")),
            None => {}
        }
    }
    if let Some(navbar) = &view.navbar {
        output.heading("<!-- navbar -->");
        output.print(navbar);
    }
    if let Some(sidebar) = &view.sidebar {
        output.heading("<!-- sidebar -->");
        output.print(sidebar);
    }
    if !view.cover_only {
        output.heading("<!-- main -->");
        output.print(&view.main);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        args: RenderArgs,
    }

    #[test]
    fn test_parse_render_args() {
        let cli = Cli::try_parse_from([
            "render",
            "http://x.io/#/guide",
            "--mode",
            "history",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.args.url, "http://x.io/#/guide");
        assert_eq!(cli.args.mode, Some(RouterMode::History));
        assert!(matches!(cli.args.format, Format::Json));
        assert!(cli.args.verbose);
    }

    #[test]
    fn test_render_defaults() {
        let cli = Cli::try_parse_from(["render"]).unwrap();
        assert_eq!(cli.args.url, "http://localhost/");
        assert_eq!(cli.args.mode, None);
        assert!(matches!(cli.args.format, Format::Html));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["render", "--mode", "tabs"]).is_err());
    }
}
