//! `quire toc` command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Config};
use quire_fetch::{Fetch, FsFetch};
use quire_renderer::toc::{TocEntry, filter_ignored, gen_tree};
use quire_renderer::Compiler;
use quire_router::{Location, Router};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// URL of the page, e.g. `http://localhost/#/guide`.
    #[arg(default_value = "http://localhost/")]
    url: String,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation source directory (overrides config).
    #[arg(short, long, env = "QUIRE_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Deepest heading level to print (default: `sidebar.max_level`).
    #[arg(long)]
    max_level: Option<u8>,

    /// Print the tree as JSON.
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl TocArgs {
    /// Execute the toc command.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be fetched or compiled.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let max_level = self.max_level.unwrap_or(config.sidebar.max_level);

        let mut router = Router::new(&config, Location::new(&self.url).with_push_state(true));
        router.update_render();
        let file = router.file(&router.route().path);
        output.detail(&format!("Page: {file}"));

        let fetch = FsFetch::new(config.source_dir.clone());
        let page = fetch.get(&file, &BTreeMap::new())?;
        let mut compiler = Compiler::new(&config);
        compiler.compile(&page.body, &router)?;

        let tree = gen_tree(&filter_ignored(compiler.toc()), max_level);
        if self.json {
            output.print(&serde_json::to_string_pretty(&tree)?);
        } else {
            print_tree(&output, &tree, 0);
        }
        Ok(())
    }
}

fn print_tree(output: &Output, entries: &[TocEntry], depth: usize) {
    for entry in entries {
        output.print(&format!(
            "{}- {} ({})",
            "  ".repeat(depth),
            entry.title,
            entry.slug
        ));
        print_tree(output, &entry.children, depth + 1);
    }
}
