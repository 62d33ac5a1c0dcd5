//! Continuous rebuilds on source changes.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use kitbuild_pipeline::{banner, BuildError, PackageBuilder};
use kitbuild_watch::{CoalescingQueue, FileWatcher};

use crate::config::Project;

/// Run the watch command.
pub async fn run(project: Project) -> Result<()> {
    let builder = Arc::new(PackageBuilder::new(
        project.paths.clone(),
        project.tools.clone(),
        project.runner.clone(),
    ));

    watch_sources(vec![project.paths.src_dir()], project.settle, move || {
        let outcomes = builder.build_all(true)?;
        if outcomes.iter().all(|o| o.is_completed()) {
            banner("DONE");
        } else {
            tracing::warn!("Rebuild incomplete, waiting for the next change");
        }
        Ok(())
    })
    .await
}

/// Run `job` once per coalesced batch of changes under `paths` until Ctrl-C.
///
/// Jobs run on a blocking worker one at a time; changes made while a job runs
/// trigger exactly one more run. A failing job is logged and the loop goes on.
pub async fn watch_sources<F>(paths: Vec<PathBuf>, settle: Duration, job: F) -> Result<()>
where
    F: Fn() -> Result<(), BuildError> + Send + Sync + 'static,
{
    watch_sources_until(paths, settle, job, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Like [`watch_sources`], stopping when `shutdown` completes.
///
/// Shutdown is honoured while a job is still running; the loop returns
/// without waiting for the job to finish.
pub async fn watch_sources_until<F, S>(
    paths: Vec<PathBuf>,
    settle: Duration,
    job: F,
    shutdown: S,
) -> Result<()>
where
    F: Fn() -> Result<(), BuildError> + Send + Sync + 'static,
    S: Future<Output = ()>,
{
    let job = Arc::new(job);
    let (watcher, rx) = FileWatcher::new(&paths).context("Failed to start file watcher")?;
    let mut queue = CoalescingQueue::new(rx).with_settle(settle);
    tokio::pin!(shutdown);

    loop {
        let batch = tokio::select! {
            batch = queue.next_batch() => batch,
            _ = &mut shutdown => break,
        };
        let Some(batch) = batch else { break };
        for event in &batch {
            tracing::debug!("changed: {}", event.path().display());
        }
        tracing::info!(">> {} change(s) detected, rebuilding", batch.len());

        let job = Arc::clone(&job);
        let task = tokio::task::spawn_blocking(move || job());
        tokio::select! {
            result = task => match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Rebuild failed: {}", e),
                Err(e) => tracing::error!("Rebuild task panicked: {}", e),
            },
            _ = &mut shutdown => break,
        }
    }

    tracing::info!("Stopping watch");
    drop(watcher);
    Ok(())
}
