use std::path::{Path, PathBuf};

use git2::{BranchType, ConfigLevel, ErrorCode, Repository};
use log::debug;
use url::Url;

use crate::auth::Token;
use crate::error::{CircleError, Result};

const ORIGIN: &str = "origin";

/// A stored credential.
///
/// Each variant maps to a fixed git config key; the values themselves are
/// opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// CircleCI API token
    Circle,
    /// GitHub personal access token
    GitHub,
}

impl Credential {
    pub fn key(self) -> &'static str {
        match self {
            Self::Circle => "circleci.token",
            Self::GitHub => "github.token",
        }
    }

    /// Help text shown when the credential has not been configured.
    pub fn setup_message(self) -> String {
        match self {
            Self::Circle => "CircleCI token hasn't been configured. \
                 Run the following command to login:\n\n  $ circle login\n"
                .to_string(),
            Self::GitHub => format!(
                "Github token hasn't been configured. You can create one here:\n\n  {}\n\n\
                 Once you have a token, add it with the following command:\n\n  \
                 $ circle token --github YOUR_TOKEN\n",
                "https://github.com/settings/tokens/new"
            ),
        }
    }
}

/// Key-value storage for credentials.
pub trait CredentialStore {
    /// Returns `None` when the key is unset. An empty value is `Some("")`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Credentials kept in the repository's git config.
///
/// Reads see every config level (so a global token also counts), writes
/// always go to the repository-local `.git/config`.
pub struct GitConfigStore {
    config: git2::Config,
}

impl GitConfigStore {
    pub fn new(repo: &Repository) -> Result<Self> {
        Ok(Self {
            config: repo.config()?,
        })
    }
}

impl CredentialStore for GitConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.config.open_level(ConfigLevel::Local)?.set_str(key, value)?;
        Ok(())
    }
}

/// In-memory credential store.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Hosting provider recognised from a remote URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostProvider {
    GitHub,
    GitLab,
    Bitbucket,
    Unknown,
}

impl HostProvider {
    fn from_host(host: &str) -> Self {
        let host = host.to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if matches("github.com") {
            Self::GitHub
        } else if matches("gitlab.com") {
            Self::GitLab
        } else if matches("bitbucket.org") {
            Self::Bitbucket
        } else {
            Self::Unknown
        }
    }

    pub fn is_supported(self) -> bool {
        self == Self::GitHub
    }
}

/// Host and path of a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RemoteUrl {
    /// Parse a git remote URL.
    ///
    /// Handles URL forms (`https://`, `ssh://`, `git://`) and the scp-like
    /// SSH form:
    /// - `https://github.com/owner/repo.git` -> `github.com`, `owner/repo`
    /// - `git@github.com:owner/repo.git` -> `github.com`, `owner/repo`
    ///
    /// Returns `None` when the URL has no host or the path is not exactly
    /// `owner/repo`.
    pub fn parse(url: &str) -> Option<Self> {
        let (host, path) = if url.contains("://") {
            let parsed = Url::parse(url).ok()?;
            (parsed.host_str()?.to_string(), parsed.path().to_string())
        } else {
            let (user_host, path) = url.split_once(':')?;
            let host = user_host.rsplit('@').next()?;
            (host.to_string(), path.to_string())
        };

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, name) = path.split_once('/')?;

        if host.is_empty() || owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }

        Some(Self {
            host,
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn provider(&self) -> HostProvider {
        HostProvider::from_host(&self.host)
    }
}

/// Resolved identity of the local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Raw URL of the origin remote
    pub remote_url: String,
    /// Host of the origin remote (e.g., "github.com")
    pub host: String,
    pub provider: HostProvider,
    pub owner: String,
    pub name: String,
    /// Branch used for build queries: the requested branch, or the branch
    /// HEAD points at. `None` on a detached HEAD.
    pub branch: Option<String>,
    /// Commit id at the tip of `branch`, or of HEAD. `None` before the
    /// first commit.
    pub target: Option<String>,
}

impl Identity {
    /// Repository path in format "owner/repo"
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Local git repository plus its credential store.
pub struct Repo {
    repo: Repository,
    store: Box<dyn CredentialStore>,
}

impl Repo {
    /// Opens the repository containing `path`, with credentials stored in its
    /// git config.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)?;
        let store = GitConfigStore::new(&repo)?;
        debug!("Opened repository at {}", repo.path().display());
        Ok(Self::with_store(repo, Box::new(store)))
    }

    pub fn with_store(repo: Repository, store: Box<dyn CredentialStore>) -> Self {
        Self { repo, store }
    }

    /// Working directory of the repository, or the git dir for bare repos.
    pub fn workdir(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    /// URL of the origin remote.
    pub fn origin_url(&self) -> Result<String> {
        let remote = match self.repo.find_remote(ORIGIN) {
            Ok(remote) => remote,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(CircleError::NoRemote(ORIGIN.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        remote
            .url()
            .map(ToString::to_string)
            .ok_or_else(|| CircleError::NoRemote(ORIGIN.to_string()))
    }

    /// Resolve the repository identity.
    ///
    /// # Errors
    ///
    /// - `UnsupportedRemote` if origin is not a GitHub repository URL
    /// - `BranchNotFound` if `branch` is given but no such local branch exists
    pub fn resolve(&self, branch: Option<&str>) -> Result<Identity> {
        let remote_url = self.origin_url()?;

        let parsed = RemoteUrl::parse(&remote_url)
            .filter(|remote| remote.provider().is_supported())
            .ok_or_else(|| CircleError::UnsupportedRemote {
                url: remote_url.clone(),
            })?;

        let (branch, target) = self.target(branch)?;

        Ok(Identity {
            provider: parsed.provider(),
            host: parsed.host,
            owner: parsed.owner,
            name: parsed.name,
            remote_url,
            branch,
            target,
        })
    }

    /// Branch name and tip commit: the named local branch, or HEAD.
    ///
    /// A repository without commits has an unborn HEAD; its branch name is
    /// still read from the symbolic ref.
    fn target(&self, branch: Option<&str>) -> Result<(Option<String>, Option<String>)> {
        if let Some(name) = branch {
            let found = match self.repo.find_branch(name, BranchType::Local) {
                Ok(found) => found,
                Err(e) if e.code() == ErrorCode::NotFound => {
                    return Err(CircleError::BranchNotFound(name.to_string()))
                }
                Err(e) => return Err(e.into()),
            };
            let commit = found.get().peel_to_commit()?;
            return Ok((Some(name.to_string()), Some(commit.id().to_string())));
        }

        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let branch = self
                    .repo
                    .find_reference("HEAD")?
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(ToString::to_string);
                debug!("HEAD is unborn, no commits yet");
                return Ok((branch, None));
            }
            Err(e) => return Err(e.into()),
        };
        let branch = if head.is_branch() {
            head.shorthand().map(ToString::to_string)
        } else {
            None
        };
        let commit = head.peel_to_commit()?;

        Ok((branch, Some(commit.id().to_string())))
    }

    pub fn credential(&self, credential: Credential) -> Result<Option<Token>> {
        Ok(self.store.get(credential.key())?.map(Token::from))
    }

    pub fn set_credential(&mut self, credential: Credential, value: &str) -> Result<()> {
        debug!("Storing {}", credential.key());
        self.store.set(credential.key(), value)
    }
}
