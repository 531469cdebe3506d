//! In-memory `BuildApi` that records how often each call was made.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::circleci::{
    Action, Build, BuildApi, BuildDetails, Project, Step, TestCase, TestResults,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub latest: usize,
    pub recent: usize,
    pub details: usize,
    pub tests: usize,
    pub trigger: usize,
    pub cancel: usize,
}

#[derive(Default)]
struct State {
    /// Successive `latest_build` answers; the last one repeats forever.
    builds: VecDeque<Option<Build>>,
    recent: Vec<Build>,
    details: BuildDetails,
    tests: TestResults,
    calls: Calls,
    /// Call names in the order they were made
    log: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<State>>,
}

pub fn build(build_num: u64, status: &str, outcome: Option<&str>) -> Build {
    Build {
        build_num,
        subject: Some(format!("Commit for build {build_num}")),
        status: status.to_string(),
        outcome: outcome.map(ToString::to_string),
        branch: Some("main".to_string()),
        ..Build::default()
    }
}

impl FakeApi {
    pub fn with_builds(builds: Vec<Option<Build>>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().builds = builds.into();
        api
    }

    pub fn set_recent(&self, recent: Vec<Build>) {
        self.state.lock().unwrap().recent = recent;
    }

    pub fn set_steps(&self, steps: Vec<(&str, &str, Option<u64>)>) {
        self.state.lock().unwrap().details = BuildDetails {
            steps: steps
                .into_iter()
                .map(|(name, status, run_time_millis)| Step {
                    name: name.to_string(),
                    actions: vec![Action {
                        status: status.to_string(),
                        run_time_millis,
                    }],
                })
                .collect(),
        };
    }

    pub fn set_tests(&self, tests: Vec<(&str, &str, &str)>) {
        self.state.lock().unwrap().tests = TestResults {
            tests: tests
                .into_iter()
                .map(|(file, name, result)| TestCase {
                    file: Some(file.to_string()),
                    name: name.to_string(),
                    result: result.to_string(),
                })
                .collect(),
        };
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().log.clone()
    }
}

#[async_trait]
impl BuildApi for FakeApi {
    async fn latest_build(&self, _project: &Project, _branch: Option<&str>) -> Result<Option<Build>> {
        let mut state = self.state.lock().unwrap();
        state.calls.latest += 1;
        state.log.push("latest");
        let next = if state.builds.len() > 1 {
            state.builds.pop_front().flatten()
        } else {
            state.builds.front().cloned().flatten()
        };
        Ok(next)
    }

    async fn recent_builds(&self, _project: &Project, limit: usize) -> Result<Vec<Build>> {
        let mut state = self.state.lock().unwrap();
        state.calls.recent += 1;
        state.log.push("recent");
        Ok(state.recent.iter().take(limit).cloned().collect())
    }

    async fn build_details(&self, _project: &Project, _build_num: u64) -> Result<BuildDetails> {
        let mut state = self.state.lock().unwrap();
        state.calls.details += 1;
        state.log.push("details");
        Ok(state.details.clone())
    }

    async fn test_results(&self, _project: &Project, _build_num: u64) -> Result<TestResults> {
        let mut state = self.state.lock().unwrap();
        state.calls.tests += 1;
        state.log.push("tests");
        Ok(state.tests.clone())
    }

    async fn trigger(&self, _project: &Project, _branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.trigger += 1;
        state.log.push("trigger");
        Ok(())
    }

    async fn cancel(&self, _project: &Project, _build_num: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.cancel += 1;
        state.log.push("cancel");
        Ok(())
    }
}
