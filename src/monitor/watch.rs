use std::time::Duration;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::providers::circleci::BuildApi;

use super::cache::{BuildCache, Snapshot};

/// Confirmation shown after a side-effecting command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Triggered,
    Cancelled,
}

/// Receives rendered build state.
pub trait StatusSink {
    fn render(&mut self, snapshot: &Snapshot);

    /// Called between render passes of the watch loop.
    fn clear(&mut self);

    fn notice(&mut self, notice: Notice);
}

/// Exit code forced by a finished build.
///
/// `failed` exits 1, any other outcome exits 0, and a running build
/// (`None`) forces nothing.
pub fn exit_code(outcome: Option<&str>) -> Option<i32> {
    match outcome {
        Some("failed") => Some(1),
        Some(_) => Some(0),
        None => None,
    }
}

/// Render the latest build once.
pub async fn render_once<A, S>(cache: &mut BuildCache<A>, sink: &mut S) -> Result<Option<i32>>
where
    A: BuildApi,
    S: StatusSink,
{
    let snapshot = cache.snapshot().await?;
    sink.render(&snapshot);
    Ok(exit_code(snapshot.build.outcome.as_deref()))
}

/// Start a build of the cached branch.
///
/// The cache is refreshed afterwards so the next render fetches the new
/// build.
pub async fn trigger_build<A, S>(cache: &mut BuildCache<A>, sink: &mut S) -> Result<()>
where
    A: BuildApi,
    S: StatusSink,
{
    cache.trigger().await?;
    sink.notice(Notice::Triggered);
    cache.refresh();
    Ok(())
}

/// Cancel the latest build if it is still running, then render it.
///
/// After a sent cancel the cache is refreshed before rendering and the
/// confirmation follows the status view. A finished build is rendered as is.
pub async fn cancel_build<A, S>(cache: &mut BuildCache<A>, sink: &mut S) -> Result<Option<i32>>
where
    A: BuildApi,
    S: StatusSink,
{
    let cancelled = cache.cancel().await?;
    if cancelled {
        cache.refresh();
    }

    let code = render_once(cache, sink).await?;
    if cancelled {
        sink.notice(Notice::Cancelled);
    }
    Ok(code)
}

/// Render, wait `poll`, refresh, clear, and render again until the build
/// finishes or `shutdown` is cancelled.
///
/// Returns the forced exit code of the finished build, or `None` when the
/// loop was cancelled. Errors from the cache end the loop.
pub async fn watch<A, S>(
    cache: &mut BuildCache<A>,
    sink: &mut S,
    poll: Duration,
    shutdown: &CancellationToken,
) -> Result<Option<i32>>
where
    A: BuildApi,
    S: StatusSink,
{
    info!("Watching build, polling every {}s", poll.as_secs_f64());

    loop {
        if let Some(code) = render_once(cache, sink).await? {
            return Ok(Some(code));
        }

        tokio::select! {
            () = shutdown.cancelled() => {
                debug!("Watch cancelled");
                return Ok(None);
            }
            () = tokio::time::sleep(poll) => {}
        }

        cache.refresh();
        sink.clear();
    }
}
