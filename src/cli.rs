use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::Term;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::monitor::{self, BuildCache, BuildField};
use crate::output::{self, blue, green, yellow, Spinner, TerminalSink};
use crate::providers::circleci::{CircleClient, Project};
use crate::repo::{Credential, Repo};

const CIRCLE_TOKEN_URL: &str = "https://circleci.com/account/api";

const LOGIN_HELP: &str = "\
1. Press [enter], and you'll be taken CircleCI.
2. Enter a name for your new token.
3. Click 'Create new token'.
4. Come back to your prompt and paste in your new token.
5. Press enter to complete the process.
";

#[derive(Parser)]
#[command(name = "circle")]
#[command(author, version, about = "CircleCI build status for the current git repository", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the repository
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Settings file (defaults to circle.toml in the repository)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show CircleCI build result
    Status {
        /// Branch name
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Watch your build
    Watch {
        /// Branch name
        #[arg(short, long)]
        branch: Option<String>,

        /// Polling frequency in seconds
        #[arg(short, long)]
        poll: Option<u64>,
    },
    /// List recent builds and their statuses for all branches
    Overview,
    /// Open CircleCI build
    Open {
        /// Branch name
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Trigger a build on CircleCI, then watch it
    Build {
        /// Branch name
        #[arg(short, long)]
        branch: Option<String>,

        /// Polling frequency in seconds
        #[arg(short, long)]
        poll: Option<u64>,
    },
    /// Cancel most recent build
    Cancel {
        /// Branch name
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// View or edit CircleCI token
    Token {
        /// New token value
        value: Option<String>,

        /// Use the GitHub token instead
        #[arg(long)]
        github: bool,
    },
    /// Login to CircleCI
    Login,
}

impl Cli {
    /// Runs the selected command and returns the process exit code.
    pub async fn execute(&self) -> Result<i32> {
        match &self.command {
            None => self.execute_status(None).await,
            Some(Commands::Status { branch }) => self.execute_status(branch.as_deref()).await,
            Some(Commands::Watch { branch, poll }) => {
                let (mut cache, config) = self.connect(branch.as_deref())?;
                Self::prime(&mut cache).await?;
                Self::execute_watch(&mut cache, poll.unwrap_or(config.watch.poll)).await
            }
            Some(Commands::Overview) => self.execute_overview().await,
            Some(Commands::Open { branch }) => self.execute_open(branch.as_deref()).await,
            Some(Commands::Build { branch, poll }) => {
                self.execute_build(branch.as_deref(), *poll).await
            }
            Some(Commands::Cancel { branch }) => self.execute_cancel(branch.as_deref()).await,
            Some(Commands::Token { value, github }) => {
                self.execute_token(value.as_deref(), *github)
            }
            Some(Commands::Login) => self.execute_login(),
        }
    }

    fn open_repo(&self) -> Result<Repo> {
        Repo::open(&self.repo)
            .with_context(|| format!("Failed to open repository at {}", self.repo.display()))
    }

    fn load_config(&self, repo: &Repo) -> Result<Config> {
        Config::load(self.config.as_deref(), &repo.workdir())
    }

    /// Validates identity and token, and builds a cache for the branch.
    fn connect(&self, branch: Option<&str>) -> Result<(BuildCache<CircleClient>, Config)> {
        let repo = self.open_repo()?;
        let (identity, token) = monitor::validate(&repo, branch)?;
        let config = self.load_config(&repo)?;

        info!("Using CircleCI project {}", identity.slug());

        let client = CircleClient::new(&config.api.base_url, &config.api.vcs_type, &token)?;
        let cache = BuildCache::new(client, Project::from(&identity), identity.branch.clone());
        Ok((cache, config))
    }

    /// Fetches everything the status view needs, failing if there is no build.
    async fn prime(cache: &mut BuildCache<CircleClient>) -> Result<()> {
        let spinner = Spinner::start("Fetching latest build...");
        let result = cache.snapshot().await;
        spinner.finish();
        result?;
        Ok(())
    }

    async fn execute_status(&self, branch: Option<&str>) -> Result<i32> {
        let (mut cache, _) = self.connect(branch)?;
        Self::prime(&mut cache).await?;

        let code = monitor::render_once(&mut cache, &mut TerminalSink::new()).await?;
        Ok(code.unwrap_or(0))
    }

    /// Runs the watch loop until the build finishes or Ctrl-C is pressed.
    async fn execute_watch(cache: &mut BuildCache<CircleClient>, poll: u64) -> Result<i32> {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });

        let mut sink = TerminalSink::new();
        let code = tokio::select! {
            result = monitor::watch(cache, &mut sink, Duration::from_secs(poll), &shutdown) => result?,
            () = shutdown.cancelled() => None,
        };

        Ok(code.unwrap_or(0))
    }

    async fn execute_overview(&self) -> Result<i32> {
        let (cache, config) = self.connect(None)?;
        let limit = config.overview.limit;

        let spinner = Spinner::start("Fetching recent builds...");
        let builds = cache.recent_builds(limit).await;
        spinner.finish();

        println!("{}", output::render_overview(&builds?));
        Ok(0)
    }

    async fn execute_open(&self, branch: Option<&str>) -> Result<i32> {
        let (mut cache, _) = self.connect(branch)?;

        let Some(url) = cache.field(BuildField::BuildUrl).await? else {
            bail!("The latest build has no web URL.");
        };

        info!("Opening {url}");
        open::that(&url).with_context(|| format!("Failed to open {url}"))?;
        Ok(0)
    }

    async fn execute_build(&self, branch: Option<&str>, poll: Option<u64>) -> Result<i32> {
        let (mut cache, config) = self.connect(branch)?;
        monitor::trigger_build(&mut cache, &mut TerminalSink::new()).await?;

        Self::prime(&mut cache).await?;
        Self::execute_watch(&mut cache, poll.unwrap_or(config.watch.poll)).await
    }

    async fn execute_cancel(&self, branch: Option<&str>) -> Result<i32> {
        let (mut cache, _) = self.connect(branch)?;
        Self::prime(&mut cache).await?;

        let code = monitor::cancel_build(&mut cache, &mut TerminalSink::new()).await?;
        Ok(code.unwrap_or(0))
    }

    fn execute_token(&self, value: Option<&str>, github: bool) -> Result<i32> {
        let credential = if github {
            Credential::GitHub
        } else {
            Credential::Circle
        };
        let mut repo = self.open_repo()?;

        if let Some(value) = value {
            repo.set_credential(credential, value)?;
        } else if let Some(token) = repo.credential(credential)? {
            println!("{}", token.as_str());
        } else {
            println!("{}", yellow(credential.setup_message()));
        }

        Ok(0)
    }

    fn execute_login(&self) -> Result<i32> {
        let mut repo = self.open_repo()?;
        let term = Term::stdout();

        term.write_line(&yellow(LOGIN_HELP).to_string())?;
        term.write_str(&blue("\nPress [enter] to open CircleCI").to_string())?;
        term.read_line()?;

        if let Err(e) = open::that(CIRCLE_TOKEN_URL) {
            warn!("Failed to open browser: {e}");
            term.write_line(&format!("Open {CIRCLE_TOKEN_URL} in your browser."))?;
        }

        term.write_str(&blue("Enter your token: ").to_string())?;
        let input = term.read_line()?;
        let value = token_input(&input)?;

        repo.set_credential(Credential::Circle, value)?;
        term.write_line(&green(format!("\nYour token has been set to '{value}'.")).to_string())?;

        Ok(0)
    }
}

/// A pasted token, trimmed. Empty input is rejected, which also covers a
/// non-interactive stdin.
fn token_input(input: &str) -> Result<&str> {
    let value = input.trim();
    if value.is_empty() {
        bail!("No token entered; nothing was stored.");
    }
    Ok(value)
}
