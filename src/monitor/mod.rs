//! Build status monitoring.
//!
//! A command runs through `validate` (identity and token), then renders the
//! cached build once, or keeps rendering it from the watch loop until the
//! build finishes.

mod cache;
#[cfg(test)]
mod fake;
pub mod format;
pub mod status;
mod watch;

pub use cache::{BuildCache, BuildField, Snapshot};
pub use status::{classify, humanize, StatusColor};
pub use watch::{cancel_build, exit_code, render_once, trigger_build, watch, Notice, StatusSink};

use log::debug;

use crate::auth::Token;
use crate::error::{CircleError, Result};
use crate::repo::{Credential, Identity, Repo};

/// Resolve the repository identity and the CircleCI token.
///
/// # Errors
///
/// Fails with `UnsupportedRemote`, `BranchNotFound` or `MissingCredential`;
/// all of them are fatal for every command that talks to CircleCI.
pub fn validate(repo: &Repo, branch: Option<&str>) -> Result<(Identity, Token)> {
    let identity = repo.resolve(branch)?;
    let token = repo
        .credential(Credential::Circle)?
        .ok_or_else(|| CircleError::MissingCredential(Credential::Circle.setup_message()))?;

    debug!(
        "Resolved {} ({:?} remote {}) on branch {} at {}",
        identity.slug(),
        identity.provider,
        identity.remote_url,
        identity.branch.as_deref().unwrap_or("(detached)"),
        identity.target.as_deref().unwrap_or("(no commits)")
    );

    Ok((identity, token))
}
