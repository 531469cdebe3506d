use serde::Deserialize;

use crate::repo::Identity;

/// A project on the build service, addressed as "owner/name".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub owner: String,
    pub name: String,
}

impl From<&Identity> for Project {
    fn from(identity: &Identity) -> Self {
        Self {
            owner: identity.owner.clone(),
            name: identity.name.clone(),
        }
    }
}

/// A CircleCI build summary.
///
/// Represents one build as returned by the project and branch listing
/// endpoints. Every field the service may omit or null out is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Build {
    /// Build number, unique per project
    pub build_num: u64,
    /// Commit subject of the built revision
    #[serde(default)]
    pub subject: Option<String>,
    /// Lifecycle status (e.g., "running", "success", "failed")
    #[serde(default)]
    pub status: String,
    /// Final result, `None` while the build is still running
    #[serde(default)]
    pub outcome: Option<String>,
    /// ISO-8601 start time
    #[serde(default)]
    pub start_time: Option<String>,
    /// ISO-8601 stop time
    #[serde(default)]
    pub stop_time: Option<String>,
    /// Compare URL for the pushed commits
    #[serde(default)]
    pub compare: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    /// Web URL of the build page
    #[serde(default)]
    pub build_url: Option<String>,
}

/// Full build record, fetched separately to get step details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildDetails {
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A step of a build.
///
/// Parallel builds run one action per container; only the first is shown.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Step {
    pub fn first_action(&self) -> Option<&Action> {
        self.actions.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub run_time_millis: Option<u64>,
}

/// Test metadata collected for a build.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TestResults {
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

impl TestResults {
    /// Tests whose result is "failure".
    pub fn failing(&self) -> Vec<&TestCase> {
        self.tests.iter().filter(|t| t.is_failure()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub name: String,
    /// "success", "failure" or "skipped"
    #[serde(default)]
    pub result: String,
}

impl TestCase {
    pub fn is_failure(&self) -> bool {
        self.result == "failure"
    }
}
