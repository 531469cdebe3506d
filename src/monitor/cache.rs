use log::{debug, info};

use crate::error::{CircleError, Result};
use crate::providers::circleci::{Build, BuildApi, BuildDetails, Project, Step, TestCase, TestResults};

/// A memoized value with an explicit valid/invalid state.
///
/// A valid entry may hold an "absent" result (e.g. `Option::None` for "no
/// builds"); that is cached like any other value.
struct CacheEntry<T> {
    value: Option<T>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> CacheEntry<T> {
    fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    fn invalidate(&mut self) {
        self.value = None;
    }
}

/// Named build fields, for callers that only need one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildField {
    Subject,
    Status,
    Outcome,
    StartTime,
    StopTime,
    Compare,
    Branch,
    BuildUrl,
}

impl BuildField {
    fn read(self, build: &Build) -> Option<String> {
        match self {
            Self::Subject => build.subject.clone(),
            Self::Status => Some(build.status.clone()),
            Self::Outcome => build.outcome.clone(),
            Self::StartTime => build.start_time.clone(),
            Self::StopTime => build.stop_time.clone(),
            Self::Compare => build.compare.clone(),
            Self::Branch => build.branch.clone(),
            Self::BuildUrl => build.build_url.clone(),
        }
    }
}

/// Everything one render pass shows, taken from the same cached state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub build: Build,
    pub steps: Vec<Step>,
    pub failing: Vec<TestCase>,
}

/// Cache of the latest build for one project and branch.
///
/// The build record, its steps and its test results are fetched lazily and
/// independently, and stay cached until [`BuildCache::refresh`] is called.
pub struct BuildCache<A> {
    api: A,
    project: Project,
    branch: Option<String>,
    latest: CacheEntry<Option<Build>>,
    details: CacheEntry<BuildDetails>,
    tests: CacheEntry<TestResults>,
}

impl<A: BuildApi> BuildCache<A> {
    pub fn new(api: A, project: Project, branch: Option<String>) -> Self {
        Self {
            api,
            project,
            branch,
            latest: CacheEntry::default(),
            details: CacheEntry::default(),
            tests: CacheEntry::default(),
        }
    }

    /// Latest build, fetched at most once until the next refresh.
    pub async fn latest(&mut self) -> Result<Option<&Build>> {
        if self.latest.is_valid() {
            debug!("Latest build cache hit");
        } else {
            let build = self
                .api
                .latest_build(&self.project, self.branch.as_deref())
                .await?;
            debug!(
                "Cached latest build: {}",
                build
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |b| format!("#{}", b.build_num))
            );
            self.latest.set(build);
        }

        Ok(self.latest.get().and_then(Option::as_ref))
    }

    /// Latest build, failing with `NoBuildFound` when there is none.
    pub async fn build(&mut self) -> Result<&Build> {
        self.latest().await?.ok_or(CircleError::NoBuildFound)
    }

    pub async fn field(&mut self, field: BuildField) -> Result<Option<String>> {
        Ok(field.read(self.build().await?))
    }

    /// Drop every cached value so the next access fetches again.
    pub fn refresh(&mut self) {
        debug!("Invalidating build cache");
        self.latest.invalidate();
        self.details.invalidate();
        self.tests.invalidate();
    }

    pub async fn step_details(&mut self) -> Result<&[Step]> {
        if !self.details.is_valid() {
            let build_num = self.build().await?.build_num;
            let details = self.api.build_details(&self.project, build_num).await?;
            self.details.set(details);
        }

        Ok(self
            .details
            .get()
            .map(|details| details.steps.as_slice())
            .unwrap_or_default())
    }

    pub async fn test_results(&mut self) -> Result<&TestResults> {
        if !self.tests.is_valid() {
            let build_num = self.build().await?.build_num;
            let results = self.api.test_results(&self.project, build_num).await?;
            self.tests.set(results);
        }

        self.tests.get().ok_or(CircleError::NoBuildFound)
    }

    pub async fn snapshot(&mut self) -> Result<Snapshot> {
        let build = self.build().await?.clone();
        let steps = self.step_details().await?.to_vec();
        let failing = self
            .test_results()
            .await?
            .failing()
            .into_iter()
            .cloned()
            .collect();

        Ok(Snapshot {
            build,
            steps,
            failing,
        })
    }

    /// Recent builds across all branches. Not cached.
    ///
    /// An empty list is an error: there is nothing to show.
    pub async fn recent_builds(&self, limit: usize) -> Result<Vec<Build>> {
        let builds = self.api.recent_builds(&self.project, limit).await?;
        if builds.is_empty() {
            return Err(CircleError::NoRecentBuilds);
        }
        Ok(builds)
    }

    /// Start a new build of the resolved branch.
    ///
    /// The cache is left untouched; call [`BuildCache::refresh`] to see the
    /// new build.
    pub async fn trigger(&self) -> Result<()> {
        let branch = self.branch.as_deref().ok_or(CircleError::DetachedHead)?;
        self.api.trigger(&self.project, branch).await
    }

    /// Cancel the latest build if it has not finished.
    ///
    /// Returns whether a cancel request was sent.
    pub async fn cancel(&mut self) -> Result<bool> {
        let build = self.build().await?;
        if build.outcome.is_some() {
            info!("Build #{} already finished, not cancelling", build.build_num);
            return Ok(false);
        }

        let build_num = build.build_num;
        self.api.cancel(&self.project, build_num).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::fake::{build, FakeApi};

    fn cache(api: &FakeApi) -> BuildCache<FakeApi> {
        BuildCache::new(
            api.clone(),
            Project {
                owner: "acme".to_string(),
                name: "widgets".to_string(),
            },
            Some("main".to_string()),
        )
    }

    #[tokio::test]
    async fn test_latest_is_fetched_once() {
        let api = FakeApi::with_builds(vec![Some(build(1, "running", None))]);
        let mut cache = cache(&api);

        assert_eq!(cache.latest().await.unwrap().unwrap().build_num, 1);
        assert_eq!(cache.latest().await.unwrap().unwrap().build_num, 1);
        assert_eq!(api.calls().latest, 1);
    }

    #[tokio::test]
    async fn test_refresh_forces_exactly_one_fetch() {
        let api = FakeApi::with_builds(vec![
            Some(build(1, "running", None)),
            Some(build(1, "success", Some("success"))),
        ]);
        let mut cache = cache(&api);

        cache.latest().await.unwrap();
        cache.refresh();
        let latest = cache.latest().await.unwrap().unwrap();
        assert_eq!(latest.status, "success");
        cache.latest().await.unwrap();

        assert_eq!(api.calls().latest, 2);
    }

    #[tokio::test]
    async fn test_absent_build_is_cached() {
        let api = FakeApi::with_builds(vec![None]);
        let mut cache = cache(&api);

        assert!(cache.latest().await.unwrap().is_none());
        assert!(cache.latest().await.unwrap().is_none());
        assert_eq!(api.calls().latest, 1);
    }

    #[tokio::test]
    async fn test_field_requires_a_build() {
        let api = FakeApi::with_builds(vec![None]);
        let mut cache = cache(&api);

        let result = cache.field(BuildField::Status).await;
        assert!(matches!(result, Err(CircleError::NoBuildFound)));
    }

    #[tokio::test]
    async fn test_field_reads_build_values() {
        let mut running = build(4, "running", None);
        running.build_url = Some("https://circleci.com/gh/acme/widgets/4".to_string());
        let api = FakeApi::with_builds(vec![Some(running)]);
        let mut cache = cache(&api);

        assert_eq!(
            cache.field(BuildField::Status).await.unwrap().as_deref(),
            Some("running")
        );
        assert_eq!(cache.field(BuildField::Outcome).await.unwrap(), None);
        assert_eq!(
            cache.field(BuildField::BuildUrl).await.unwrap().as_deref(),
            Some("https://circleci.com/gh/acme/widgets/4")
        );
        assert_eq!(api.calls().latest, 1);
    }

    #[tokio::test]
    async fn test_details_and_tests_are_cached_and_refreshed() {
        let api = FakeApi::with_builds(vec![Some(build(2, "failed", Some("failed")))]);
        api.set_steps(vec![("Checkout", "success", Some(1200))]);
        api.set_tests(vec![("spec/a_spec.rb", "passes", "success"), ("spec/b_spec.rb", "breaks", "failure")]);
        let mut cache = cache(&api);

        let snapshot = cache.snapshot().await.unwrap();
        assert_eq!(snapshot.steps.len(), 1);
        assert_eq!(snapshot.failing.len(), 1);
        assert_eq!(snapshot.failing[0].name, "breaks");

        cache.snapshot().await.unwrap();
        let calls = api.calls();
        assert_eq!((calls.latest, calls.details, calls.tests), (1, 1, 1));

        cache.refresh();
        cache.snapshot().await.unwrap();
        let calls = api.calls();
        assert_eq!((calls.latest, calls.details, calls.tests), (2, 2, 2));
    }

    #[tokio::test]
    async fn test_cancel_only_when_outcome_is_null() {
        let api = FakeApi::with_builds(vec![Some(build(3, "running", None))]);
        let mut cache = cache(&api);
        assert!(cache.cancel().await.unwrap());
        assert_eq!(api.calls().cancel, 1);

        let api = FakeApi::with_builds(vec![Some(build(3, "success", Some("success")))]);
        let mut cache = self::cache(&api);
        assert!(!cache.cancel().await.unwrap());
        assert_eq!(api.calls().cancel, 0);
    }

    #[tokio::test]
    async fn test_trigger_does_not_touch_cache() {
        let api = FakeApi::with_builds(vec![Some(build(5, "success", Some("success")))]);
        let mut cache = cache(&api);

        cache.latest().await.unwrap();
        cache.trigger().await.unwrap();
        cache.latest().await.unwrap();

        let calls = api.calls();
        assert_eq!(calls.trigger, 1);
        assert_eq!(calls.latest, 1);
    }

    #[tokio::test]
    async fn test_recent_builds_bypass_cache() {
        let api = FakeApi::with_builds(vec![None]);
        api.set_recent(vec![
            build(3, "running", None),
            build(2, "failed", Some("failed")),
            build(1, "success", Some("success")),
        ]);
        let cache = cache(&api);

        let recent = cache.recent_builds(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].build_num, 3);
        cache.recent_builds(2).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls.recent, 2);
        assert_eq!(calls.latest, 0);
    }

    #[tokio::test]
    async fn test_empty_recent_builds_is_an_error() {
        let api = FakeApi::with_builds(vec![None]);
        api.set_recent(vec![]);
        let cache = cache(&api);

        let result = cache.recent_builds(30).await;
        match result {
            Err(err @ CircleError::NoRecentBuilds) => {
                assert_eq!(err.to_string(), "No recent builds.");
            }
            other => panic!("expected NoRecentBuilds, got {other:?}"),
        }
        assert_eq!(api.calls().recent, 1);
    }

    #[tokio::test]
    async fn test_trigger_needs_a_branch() {
        let api = FakeApi::with_builds(vec![None]);
        let cache = BuildCache::new(
            api.clone(),
            Project {
                owner: "acme".to_string(),
                name: "widgets".to_string(),
            },
            None,
        );

        assert!(matches!(cache.trigger().await, Err(CircleError::DetachedHead)));
        assert_eq!(api.calls().trigger, 0);
    }
}
