//! One-shot build: both variants, then documentation.

use anyhow::{bail, Context, Result};
use kitbuild_pipeline::{
    banner, stager, DocsBuilder, DocsOutcome, PackageBuilder, PackageDescriptor,
};

use crate::config::Project;

/// Run the build command.
pub async fn run(project: Project) -> Result<()> {
    tokio::task::spawn_blocking(move || build_once(&project))
        .await
        .context("Build task panicked")?
}

/// Build both variants into a fresh `dist` and generate documentation.
///
/// Fails if any step failed, after running every step that still could.
pub fn build_once(project: &Project) -> Result<()> {
    let paths = &project.paths;
    stager::initial_cleanup(paths)?;

    let builder = PackageBuilder::new(paths.clone(), project.tools.clone(), project.runner.clone());
    let outcomes = builder.build_all(false)?;
    let mut failed = outcomes.iter().filter(|o| !o.is_completed()).count();

    if outcomes.last().is_some_and(|o| o.is_completed()) {
        let descriptor = PackageDescriptor::load(&paths.dist_dir().join("package.json"))?;
        let docs = DocsBuilder::new(
            paths.clone(),
            project.tools.clone(),
            project.runner.clone(),
            project.cdn_url.clone(),
        );
        if docs.build(&descriptor.name, &descriptor.version)? == DocsOutcome::Failed {
            failed += 1;
        }
    } else {
        tracing::warn!("Skipping documentation since the package build did not complete");
    }

    if failed > 0 {
        bail!("{} build step(s) failed", failed);
    }

    banner("DONE");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use kitbuild_pipeline::{
        CommandRunner, Invocation, Layout, ProjectPaths, ToolError, ToolOutput, Tools,
    };
    use tempfile::tempdir;

    /// Pretends to be the compiler, bundler and doc generator.
    #[derive(Default)]
    struct FakeTools {
        fail: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl CommandRunner for FakeTools {
        fn run(&self, inv: &Invocation) -> Result<ToolOutput, ToolError> {
            let name = inv.program_name();
            self.seen.lock().unwrap().push(name.clone());
            if self.fail == Some(name.as_str()) {
                return Ok(ToolOutput::failed(1, "failed"));
            }
            match name.as_str() {
                "ngc" => {
                    let variant = if inv.args[1].contains("es5") { "es5" } else { "es2015" };
                    let out = inv.cwd.join(format!("build/_{}/src", variant));
                    fs::create_dir_all(&out).unwrap();
                    fs::write(out.join("toggle.d.ts"), "").unwrap();
                    fs::write(out.join("toggle.metadata.json"), "{}").unwrap();
                }
                "rollup" => fs::write(inv.cwd.join(&inv.args[2]), "").unwrap(),
                _ => {}
            }
            Ok(ToolOutput::ok(""))
        }

        fn spawn_detached(&self, _inv: &Invocation) -> Result<(), ToolError> {
            Ok(())
        }
    }

    fn project(root: &Path, runner: Arc<FakeTools>) -> Project {
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/index.ts"), "").unwrap();
        fs::write(root.join("README.md"), "# toggle").unwrap();
        fs::write(
            root.join("package.json"),
            r#"{"moduleId": "toggle", "version": "2.0.0", "description": "Toggle"}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("dist/leftover.js"), "").unwrap();

        Project {
            paths: ProjectPaths::new(root, Layout::default()),
            tools: Tools::default(),
            cdn_url: "https://cdn.example.com".to_string(),
            settle: Duration::ZERO,
            runner,
        }
    }

    #[test]
    fn builds_both_variants_then_docs() {
        let temp = tempdir().unwrap();
        let runner = Arc::new(FakeTools::default());

        build_once(&project(temp.path(), runner.clone())).unwrap();

        let dist = temp.path().join("dist");
        assert!(!dist.join("leftover.js").exists());
        assert!(dist.join("toggle.es5.js").exists());
        assert!(dist.join("toggle.es2015.js").exists());
        assert!(dist.join("package.json").exists());
        assert_eq!(
            *runner.seen.lock().unwrap(),
            vec!["yarn", "ngc", "rollup", "ngc", "rollup", "index-cli.js"]
        );
    }

    #[test]
    fn compiler_failure_fails_the_run_and_skips_docs() {
        let temp = tempdir().unwrap();
        let runner = Arc::new(FakeTools {
            fail: Some("ngc"),
            ..Default::default()
        });

        let result = build_once(&project(temp.path(), runner.clone()));

        assert!(result.is_err());
        assert!(!runner
            .seen
            .lock()
            .unwrap()
            .contains(&"index-cli.js".to_string()));
    }

    #[test]
    fn docs_failure_fails_the_run() {
        let temp = tempdir().unwrap();
        let runner = Arc::new(FakeTools {
            fail: Some("index-cli.js"),
            ..Default::default()
        });

        assert!(build_once(&project(temp.path(), runner)).is_err());
        assert!(temp.path().join("dist/package.json").exists());
    }
}
