//! Demo application flow.

use anyhow::{bail, Context, Result};
use kitbuild_pipeline::{inject_stories, DemoBuilder, DemoOptions};

use crate::commands::watch::watch_sources;
use crate::config::Project;

/// Run the demo command.
pub async fn run(project: Project, install: bool, serve: bool) -> Result<()> {
    let options = DemoOptions {
        install,
        run: serve,
    };
    let builder = DemoBuilder::new(
        project.paths.clone(),
        project.tools.clone(),
        project.runner.clone(),
    );

    let outcome = tokio::task::spawn_blocking(move || builder.run(options))
        .await
        .context("Demo task panicked")??;

    if !outcome.is_completed() {
        bail!("Demo build failed");
    }

    if serve {
        // The demo compiles the library sources directly, so a change only
        // needs the sources and stories copied over again.
        let paths = project.paths.clone();
        watch_sources(vec![project.paths.src_dir()], project.settle, move || {
            inject_stories(&paths).map(|_| ())
        })
        .await?;
    }

    Ok(())
}
