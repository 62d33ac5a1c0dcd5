//! Configuration file (`kitbuild.toml`) and the resolved project context.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use kitbuild_pipeline::docs::DEFAULT_CDN_URL;
use kitbuild_pipeline::{CommandRunner, Layout, ProjectPaths, SystemRunner, Tools};
use serde::Deserialize;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Overrides for external tool locations.
#[derive(Debug, Deserialize, Default)]
pub struct ToolsConfig {
    compiler: Option<String>,
    bundler: Option<String>,
    doc_generator: Option<String>,
    package_manager: Option<String>,
    dev_server: Option<String>,
}

/// Overrides for the directory layout, relative to the project root.
#[derive(Debug, Deserialize, Default)]
pub struct PathsConfig {
    src: Option<PathBuf>,
    build: Option<PathBuf>,
    dist: Option<PathBuf>,
    documentation: Option<PathBuf>,
    doc_templates: Option<PathBuf>,
    demo: Option<PathBuf>,
    demo_template: Option<PathBuf>,
    stories: Option<PathBuf>,
    story_index: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct DocsConfig {
    /// Versioned CDN base for the documentation theme
    #[serde(default = "default_cdn_url")]
    pub cdn_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            cdn_url: default_cdn_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WatchConfig {
    /// Quiet period after a change before rebuilding
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_cdn_url() -> String {
    DEFAULT_CDN_URL.to_string()
}
fn default_settle_ms() -> u64 {
    100
}

/// Load configuration if the file exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

/// Everything the commands need to run against one project.
#[derive(Clone)]
pub struct Project {
    pub paths: ProjectPaths,
    pub tools: Tools,
    pub cdn_url: String,
    pub settle: Duration,
    pub runner: Arc<dyn CommandRunner>,
}

impl ConfigFile {
    /// Resolve the configuration against a project root.
    pub fn into_project(self, root: impl Into<PathBuf>) -> Project {
        let defaults = Layout::default();
        let p = self.paths;
        let layout = Layout {
            src: p.src.unwrap_or(defaults.src),
            build: p.build.unwrap_or(defaults.build),
            dist: p.dist.unwrap_or(defaults.dist),
            documentation: p.documentation.unwrap_or(defaults.documentation),
            doc_templates: p.doc_templates.unwrap_or(defaults.doc_templates),
            demo: p.demo.unwrap_or(defaults.demo),
            demo_template: p.demo_template.unwrap_or(defaults.demo_template),
            stories: p.stories.unwrap_or(defaults.stories),
            story_index: p.story_index.unwrap_or(defaults.story_index),
        };

        let defaults = Tools::default();
        let t = self.tools;
        let tools = Tools {
            compiler: t.compiler.unwrap_or(defaults.compiler),
            bundler: t.bundler.unwrap_or(defaults.bundler),
            doc_generator: t.doc_generator.unwrap_or(defaults.doc_generator),
            package_manager: t.package_manager.unwrap_or(defaults.package_manager),
            dev_server: t.dev_server.unwrap_or(defaults.dev_server),
        };

        Project {
            paths: ProjectPaths::new(root, layout),
            tools,
            cdn_url: self.docs.cdn_url,
            settle: Duration::from_millis(self.watch.settle_ms),
            runner: Arc::new(SystemRunner),
        }
    }
}
