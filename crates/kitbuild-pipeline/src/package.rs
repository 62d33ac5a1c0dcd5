//! Library package build for one target variant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::BuildError;
use crate::manifest::Manifest;
use crate::paths::{compiler_config_name, ProjectPaths};
use crate::process::{CommandRunner, Invocation, ToolOutput, Tools};
use crate::stager;
use crate::templates::{compiler_config_in, final_descriptor, install_manifest, TargetVariant};

/// Result of a build that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Every step for the variant ran
    Completed,
    /// An external tool exited non-zero; remaining steps were skipped
    Failed { tool: String },
}

impl BuildOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BuildOutcome::Completed)
    }
}

/// Builds the library package: compile, bundle and finalize `dist`.
pub struct PackageBuilder {
    paths: ProjectPaths,
    tools: Tools,
    runner: Arc<dyn CommandRunner>,
    installed: AtomicBool,
}

impl PackageBuilder {
    pub fn new(paths: ProjectPaths, tools: Tools, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            paths,
            tools,
            runner,
            installed: AtomicBool::new(false),
        }
    }

    /// Build one target variant.
    ///
    /// Compiler and bundler failures are logged and reported as
    /// [`BuildOutcome::Failed`]; staging, install and filesystem failures are
    /// returned as errors.
    pub fn build(
        &self,
        variant: TargetVariant,
        watching: bool,
    ) -> Result<BuildOutcome, BuildError> {
        crate::banner(&format!(
            "{} : {}",
            if watching { "WATCH" } else { "BUILD" },
            variant
        ));

        stager::stage_sources(&self.paths)?;
        let manifest = Manifest::load(&self.paths.manifest())?;

        if variant == TargetVariant::Legacy
            && !watching
            && !self.installed.swap(true, Ordering::SeqCst)
        {
            self.install(&manifest)?;
        }

        // Start from an empty output dir; deleted sources leave no declarations.
        stager::remove_dir_if_exists(&self.paths.variant_out_dir(variant))?;

        let staging = relative_arg(&self.paths, &self.paths.build_dir());
        let config = compiler_config_in(variant, &manifest.module_id, &staging);
        stager::write_json(&self.paths.compiler_config(variant), &config)?;

        let compile = Invocation::new(
            self.tools.program(&self.paths, &self.tools.compiler),
            self.paths.root(),
        )
        .args(["-p".to_string(), compiler_config_name(variant)]);

        let output = self.runner.run(&compile)?;
        if !output.success {
            return Ok(report_failure(&compile, &output));
        }
        if !output.stdout.trim().is_empty() {
            tracing::info!("{}", output.stdout.trim_end());
        }

        let entry = self
            .paths
            .variant_out_dir(variant)
            .join("src")
            .join(format!("{}.js", manifest.module_id));
        let bundle = self.paths.bundle(&manifest.module_id, variant);
        stager::ensure_dir(&self.paths.dist_dir())?;

        let rollup = Invocation::new(
            self.tools.program(&self.paths, &self.tools.bundler),
            self.paths.root(),
        )
        .args([
            relative_arg(&self.paths, &entry),
            "-o".to_string(),
            relative_arg(&self.paths, &bundle),
        ]);

        let output = self.runner.run(&rollup)?;
        if !output.success {
            return Ok(report_failure(&rollup, &output));
        }

        // Variant-independent finalization runs once, after the modern build.
        if variant == TargetVariant::Legacy {
            return Ok(BuildOutcome::Completed);
        }

        self.finalize(&manifest)?;
        Ok(BuildOutcome::Completed)
    }

    /// Build both variants in order.
    pub fn build_all(&self, watching: bool) -> Result<Vec<BuildOutcome>, BuildError> {
        TargetVariant::ALL
            .iter()
            .map(|variant| self.build(*variant, watching))
            .collect()
    }

    /// Install everything needed to compile into the staging directory.
    fn install(&self, manifest: &Manifest) -> Result<(), BuildError> {
        let descriptor = install_manifest(manifest)?;
        stager::write_json(&self.paths.staged_manifest(), &descriptor)?;

        tracing::info!(">> installing dependencies in {}", self.paths.build_dir().display());
        let install = Invocation::new(
            self.tools.program(&self.paths, &self.tools.package_manager),
            self.paths.build_dir(),
        )
        .arg("install");

        self.runner.run(&install)?.check(&install)?;
        Ok(())
    }

    /// Write the publishable manifest and copy metadata, README and declarations.
    fn finalize(&self, manifest: &Manifest) -> Result<(), BuildError> {
        let dist = self.paths.dist_dir();
        let modern_src = self
            .paths
            .variant_out_dir(TargetVariant::Modern)
            .join("src");

        stager::write_json(&dist.join("package.json"), &final_descriptor(manifest)?)?;

        let metadata = format!("{}.metadata.json", manifest.module_id);
        stager::copy_file(&modern_src.join(&metadata), &dist.join(&metadata))?;

        let readme = self.paths.readme();
        if readme.exists() {
            stager::copy_file(&readme, &dist.join("README.md"))?;
        } else {
            tracing::warn!("No README.md found at {}", readme.display());
        }

        // The compiler cannot emit a single declaration bundle, so every
        // declaration file is copied over with its directory structure.
        crate::banner("D.TS FILES");
        let copied = stager::copy_dir_filtered(&modern_src, &dist, |path| {
            path.extension().is_some_and(|ext| ext == "ts")
        })?;
        tracing::info!("done ({} declaration files)", copied);

        Ok(())
    }
}

fn report_failure(invocation: &Invocation, output: &ToolOutput) -> BuildOutcome {
    let tool = invocation.program_name();
    tracing::error!("{} ERROR. STOP!", tool.to_uppercase());
    for line in output.stderr.lines().chain(output.stdout.lines()) {
        tracing::error!("{}", line);
    }
    BuildOutcome::Failed { tool }
}

/// Pass paths below the root as `./relative` arguments, like a shell would.
fn relative_arg(paths: &ProjectPaths, path: &std::path::Path) -> String {
    match path.strip_prefix(paths.root()) {
        Ok(rel) => format!("./{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}
