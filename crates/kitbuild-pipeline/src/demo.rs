//! Demo application staging.
//!
//! The demo app is materialized from a template. Story sources are embedded
//! into the story index as template literals so the demo can show its own code
//! without reading files at runtime.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::BuildError;
use crate::manifest::Manifest;
use crate::package::BuildOutcome;
use crate::paths::ProjectPaths;
use crate::process::{CommandRunner, Invocation, Tools};
use crate::stager;

/// Marker in the story index replaced by the generated `case` branches.
pub const INJECT_PLACEHOLDER: &str = "/*___INJECT_SOURCE___*/";

/// Switches for the demo flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoOptions {
    /// Install the demo's dependencies
    pub install: bool,
    /// Serve interactively instead of producing a static build
    pub run: bool,
}

/// Escape source text for embedding in a JavaScript template literal.
pub fn escape_template_literal(source: &str) -> String {
    source
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// Escape a file name for a single-quoted JavaScript string.
fn escape_case_label(name: &str) -> String {
    name
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Render one `case` branch per story, returning its escaped source.
pub fn render_story_cases(stories: &[(String, String)]) -> String {
    stories
        .iter()
        .map(|(name, content)| {
            format!(
                "\n    case '{}': {{ return `{}`; }}\n",
                escape_case_label(name),
                escape_template_literal(content)
            )
        })
        .collect()
}

/// Read every story file, sorted by name.
fn read_stories(dir: &Path) -> Result<Vec<(String, String)>, BuildError> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::fs(dir, e))?;

    let mut stories = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::fs(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let content = fs::read_to_string(&path).map_err(|e| BuildError::fs(&path, e))?;
        stories.push((entry.file_name().to_string_lossy().into_owned(), content));
    }

    stories.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(stories)
}

/// Copy the sources into the demo and generate its story index.
///
/// Returns the number of stories injected; nothing is copied when the stories
/// directory is empty.
pub fn inject_stories(paths: &ProjectPaths) -> Result<usize, BuildError> {
    tracing::info!(">> reading demo story source files");
    let stories = read_stories(&paths.stories_dir())?;
    if stories.is_empty() {
        tracing::warn!("No stories found in {}", paths.stories_dir().display());
        return Ok(0);
    }

    let demo_src = paths.demo_dir().join("src");
    stager::copy_dir_all(&paths.src_dir(), &demo_src)?;

    let index_path = paths.story_index();
    let index = fs::read_to_string(&index_path).map_err(|e| BuildError::fs(&index_path, e))?;
    if !index.contains(INJECT_PLACEHOLDER) {
        tracing::warn!(
            "{} has no {} marker; stories not injected",
            index_path.display(),
            INJECT_PLACEHOLDER
        );
    }
    let index = index.replacen(INJECT_PLACEHOLDER, &render_story_cases(&stories), 1);

    let layout = paths.layout();
    let relative = layout
        .story_index
        .strip_prefix(&layout.src)
        .unwrap_or(&layout.story_index);
    stager::write_file(&demo_src.join(relative), index)?;

    Ok(stories.len())
}

/// Stages, installs, serves or builds the demo application.
pub struct DemoBuilder {
    paths: ProjectPaths,
    tools: Tools,
    runner: Arc<dyn CommandRunner>,
}

impl DemoBuilder {
    pub fn new(paths: ProjectPaths, tools: Tools, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            paths,
            tools,
            runner,
        }
    }

    /// Run the demo flow up to serving or the static build.
    ///
    /// With `run` set, the dev server is started detached and the caller is
    /// expected to keep re-injecting stories on source changes.
    pub fn run(&self, options: DemoOptions) -> Result<BuildOutcome, BuildError> {
        let manifest = Manifest::load(&self.paths.manifest())?;

        self.prepare()?;
        inject_stories(&self.paths)?;

        if options.install {
            self.install(&manifest)?;
        }

        if options.run {
            self.serve()?;
            Ok(BuildOutcome::Completed)
        } else {
            self.build_static(&manifest)
        }
    }

    /// Recreate the demo directory from the template, keeping `node_modules`.
    pub fn prepare(&self) -> Result<(), BuildError> {
        tracing::info!(">> creating {}", self.paths.layout().demo.display());

        let demo = self.paths.demo_dir();
        let retained = self.paths.retained_demo_modules();

        if demo.exists() {
            let modules = demo.join("node_modules");
            if modules.is_dir() {
                tracing::info!(">> demo node_modules exists. retaining it.");
                stager::remove_dir_if_exists(&retained)?;
                fs::rename(&modules, &retained).map_err(|e| BuildError::fs(&modules, e))?;
            }
            stager::remove_dir_if_exists(&demo)?;
        }

        stager::copy_dir_all(&self.paths.demo_template_dir(), &demo)?;

        if retained.is_dir() {
            let modules = demo.join("node_modules");
            stager::remove_dir_if_exists(&modules)?;
            fs::rename(&retained, &modules).map_err(|e| BuildError::fs(&retained, e))?;
        }

        Ok(())
    }

    /// Point the demo at the library's dependencies and install them.
    pub fn install(&self, manifest: &Manifest) -> Result<(), BuildError> {
        tracing::info!(">> injecting package.json dependencies into the demo");

        let demo = self.paths.demo_dir();
        let demo_manifest = demo.join("package.json");
        let text =
            fs::read_to_string(&demo_manifest).map_err(|e| BuildError::fs(&demo_manifest, e))?;
        let mut json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| BuildError::fs(&demo_manifest, e))?;

        let deps = serde_json::to_value(&manifest.dependencies)
            .map_err(|e| BuildError::fs(&demo_manifest, e))?;
        match json.as_object_mut() {
            Some(obj) => {
                obj.insert("dependencies".to_string(), deps);
            }
            None => return Err(BuildError::fs(&demo_manifest, "expected a JSON object")),
        }
        stager::write_json(&demo_manifest, &json)?;

        tracing::info!(">> installing demo dependencies (this takes time!)");
        let program = self.tools.program(&self.paths, &self.tools.package_manager);

        let relax_ssl =
            Invocation::new(&program, &demo).args(["config", "set", "strict-ssl", "false"]);
        self.runner.run(&relax_ssl)?.check(&relax_ssl)?;

        let install = Invocation::new(&program, &demo);
        self.runner.run(&install)?.check(&install)?;

        Ok(())
    }

    /// Start the interactive dev server without waiting for it.
    pub fn serve(&self) -> Result<(), BuildError> {
        tracing::info!(">> starting dev server");
        let serve = Invocation::new(
            self.tools.program(&self.paths, &self.tools.dev_server),
            self.paths.demo_dir(),
        )
        .arg("serve");
        self.runner.spawn_detached(&serve)?;
        Ok(())
    }

    /// Produce a static build served under the versioned demo path.
    pub fn build_static(&self, manifest: &Manifest) -> Result<BuildOutcome, BuildError> {
        let base_href = base_href(manifest);
        tracing::info!(">> building demo for base href {}", base_href);

        let build = Invocation::new(
            self.tools.program(&self.paths, &self.tools.dev_server),
            self.paths.demo_dir(),
        )
        .args(["build".to_string(), "--base-href".to_string(), base_href]);

        let output = self.runner.run(&build)?;
        if !output.success {
            tracing::error!("DEMO BUILD ERROR. STOP!");
            for line in output.stderr.lines() {
                tracing::error!("{}", line);
            }
            return Ok(BuildOutcome::Failed {
                tool: build.program_name(),
            });
        }

        Ok(BuildOutcome::Completed)
    }
}

/// Base path the static demo is published under.
pub fn base_href(manifest: &Manifest) -> String {
    format!("/{}/{}/demo/", manifest.module_id, manifest.version)
}
