//! Helpers and objects for building load test profiles.
//!
//! A load test is described with a series of objects:
//!
//! - [`Profile`] each simulated user is assigned a profile, which is a collection of
//!   weighted tasks and the time to wait between them.
//! - [`Task`] tasks define one or more requests and are registered with profiles.
//! - [`SwarmUser`] the per-session HTTP client handed to each task, which records
//!   metrics about every request it sends.
//!
//! ## Creating Profiles
//!
//! A [`Profile`] is created by passing in a `&str` name to the `new` function or the
//! [`profile!`](../macro.profile.html) macro:
//!
//! ```rust
//! use storefront_swarm::prelude::*;
//!
//! let mut shopper = profile!("Shopper");
//! ```
//!
//! ### Wait Time
//!
//! Wait time is specified as a low-high [`Duration`] range. Each time a task
//! completes, the user pauses for a random number of milliseconds inclusively
//! between the low and high wait times.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use storefront_swarm::prelude::*;
//!
//! let shopper = profile!("Shopper")
//!     .set_wait_time(Duration::from_secs(1), Duration::from_secs(3))
//!     .unwrap();
//! ```
//!
//! ## Creating Tasks
//!
//! A [`Task`] wraps an async function that accepts a `&mut SwarmUser`. Tasks can be
//! named, weighted and tagged:
//!
//! ```rust
//! use storefront_swarm::prelude::*;
//!
//! let mut view = task!(view_cart).set_name("view_cart").set_tag("view");
//!
//! async fn view_cart(user: &mut SwarmUser) -> TaskResult {
//!     let _swarm = user.get("/cart").await?;
//!
//!     Ok(())
//! }
//! ```

use http::method::Method;
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::{fmt, str};
use url::Url;

use crate::config::{SwarmConfiguration, Tags};
use crate::metrics::{RequestMetric, SwarmMetric};
use crate::{util, SwarmError};

/// By default simulated users identify themselves with the crate name and version.
static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout, in seconds.
const DEFAULT_TIMEOUT: f32 = 60.0;

/// task!(foo) expands to Task::new(foo), wrapping the async function so it can be
/// stored and invoked repeatedly.
#[macro_export]
macro_rules! task {
    ($task_func:ident) => {
        $crate::swarm::Task::new(std::sync::Arc::new(move |s| {
            std::boxed::Box::pin($task_func(s))
        }))
    };
}

/// profile!("foo") expands to Profile::new("foo").
#[macro_export]
macro_rules! profile {
    ($name:tt) => {
        $crate::swarm::Profile::new($name)
    };
}

/// The result of invoking a task function.
pub type TaskResult = Result<(), Box<TaskError>>;

/// The async function invoked each time a [`Task`] runs.
pub type TaskFunction = Arc<
    dyn for<'r> Fn(&'r mut SwarmUser) -> Pin<Box<dyn Future<Output = TaskResult> + Send + 'r>>
        + Send
        + Sync,
>;

/// Errors a task function can return.
///
/// A request that reaches the server and fails, or that fails in transit, is not an
/// error here: it is recorded in the request metrics and handed back inside the
/// [`SwarmResponse`].
#[derive(Debug)]
pub enum TaskError {
    /// Wraps a [`reqwest::Error`] raised while building a request.
    Reqwest(reqwest::Error),
    /// Wraps a [`url::ParseError`] raised while building a URL.
    Url(url::ParseError),
    /// The request used an HTTP method that isn't supported.
    InvalidMethod {
        /// The unsupported method.
        method: Method,
    },
    /// The request metric could not be delivered to the driver.
    MetricsFailed {
        /// Wraps the [`flume::SendError`].
        source: flume::SendError<SwarmMetric>,
    },
}
impl TaskError {
    fn describe(&self) -> &str {
        match *self {
            TaskError::Reqwest(_) => "reqwest::Error",
            TaskError::Url(_) => "url::ParseError",
            TaskError::InvalidMethod { .. } => "unsupported HTTP method",
            TaskError::MetricsFailed { .. } => "failed to send metrics to parent",
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TaskError::Reqwest(ref source) => {
                write!(f, "TaskError: {} ({})", self.describe(), source)
            }
            TaskError::Url(ref source) => write!(f, "TaskError: {} ({})", self.describe(), source),
            TaskError::InvalidMethod { ref method } => {
                write!(f, "TaskError: {} ({})", self.describe(), method)
            }
            TaskError::MetricsFailed { ref source } => {
                write!(f, "TaskError: {} ({})", self.describe(), source)
            }
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            TaskError::Reqwest(ref source) => Some(source),
            TaskError::Url(ref source) => Some(source),
            TaskError::MetricsFailed { ref source } => Some(source),
            TaskError::InvalidMethod { .. } => None,
        }
    }
}

/// Auto-convert Reqwest errors.
impl From<reqwest::Error> for TaskError {
    fn from(err: reqwest::Error) -> TaskError {
        TaskError::Reqwest(err)
    }
}

/// Auto-convert Url errors.
impl From<url::ParseError> for TaskError {
    fn from(err: url::ParseError) -> TaskError {
        TaskError::Url(err)
    }
}

/// Auto-convert metrics channel errors.
impl From<flume::SendError<SwarmMetric>> for TaskError {
    fn from(source: flume::SendError<SwarmMetric>) -> TaskError {
        TaskError::MetricsFailed { source }
    }
}

/// A collection of weighted, tagged tasks run by a simulated user.
#[derive(Clone)]
pub struct Profile {
    /// The name of the profile.
    pub name: String,
    /// Where this profile lives in the driver's list of registered profiles.
    pub profiles_index: usize,
    /// Controls how often this profile is assigned to a user, relative to other profiles.
    pub weight: usize,
    /// Optional minimum and maximum pause between tasks.
    pub task_wait: Option<(Duration, Duration)>,
    /// One copy of each task registered with this profile.
    pub tasks: Vec<Task>,
    /// Indexes into `tasks`, each enabled task repeated in proportion to its weight.
    ///
    /// Built by [`Profile::apply_tag_filter`] when the load test starts.
    pub weighted_tasks: Vec<usize>,
    /// An optional default host to run this profile against.
    pub host: Option<String>,
}
impl Profile {
    /// Creates a new profile. Once created, tasks must be registered with it, and
    /// finally it must be registered with the [`SwarmAttack`](../struct.SwarmAttack.html).
    pub fn new(name: &str) -> Self {
        trace!("new profile: name: {}", &name);
        Profile {
            name: name.to_string(),
            profiles_index: usize::MAX,
            weight: 1,
            task_wait: None,
            tasks: Vec::new(),
            weighted_tasks: Vec::new(),
            host: None,
        }
    }

    /// Registers a [`Task`] with the profile.
    pub fn register_task(mut self, mut task: Task) -> Self {
        trace!("{} register_task: {}", self.name, task.name);
        task.tasks_index = self.tasks.len();
        self.tasks.push(task);
        self
    }

    /// Sets a weight on the profile. The larger the weight, the more often the
    /// profile is assigned to users when several profiles are registered.
    pub fn set_weight(mut self, weight: usize) -> Result<Self, SwarmError> {
        trace!("{} set_weight: {}", self.name, weight);
        if weight == 0 {
            return Err(SwarmError::InvalidWeight {
                weight,
                detail: format!("profile {} weight of 0 is not allowed", self.name),
            });
        }
        self.weight = weight;
        Ok(self)
    }

    /// Sets a default host for the profile, used when no `--host` is configured.
    pub fn set_host(mut self, host: &str) -> Self {
        trace!("{} set_host: {}", self.name, host);
        // Host validation happens when the load test starts.
        self.host = Some(host.to_string());
        self
    }

    /// Configure the profile to pause after running each task. The pause is
    /// randomly selected from `min_wait` to `max_wait` inclusively.
    pub fn set_wait_time(mut self, min_wait: Duration, max_wait: Duration) -> Result<Self, SwarmError> {
        trace!(
            "{} set_wait time: min: {:?} max: {:?}",
            self.name,
            min_wait,
            max_wait
        );
        if min_wait > max_wait {
            return Err(SwarmError::InvalidWaitTime {
                min_wait,
                max_wait,
                detail: "min_wait can't be larger than max_wait".to_string(),
            });
        }
        self.task_wait = Some((min_wait, max_wait));
        Ok(self)
    }

    /// Rebuild `weighted_tasks` from the tasks that pass the tag filter, returning
    /// how many tasks are enabled.
    ///
    /// Weights are reduced by their greatest common divisor, so tasks weighted 10
    /// and 20 are stored the same as tasks weighted 1 and 2.
    pub fn apply_tag_filter(&mut self, include: &Tags, exclude: &Tags) -> usize {
        let enabled: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.is_enabled(include, exclude))
            .collect();
        let u = enabled
            .iter()
            .fold(0, |divisor, task| util::gcd(divisor, task.weight));

        let mut weighted_tasks = Vec::new();
        for task in &enabled {
            weighted_tasks.extend(vec![task.tasks_index; task.weight / u]);
        }
        let enabled_count = enabled.len();
        debug!(
            "{} enabled {} of {} tasks: {:?}",
            self.name,
            enabled_count,
            self.tasks.len(),
            weighted_tasks
        );
        self.weighted_tasks = weighted_tasks;
        enabled_count
    }

    /// Weighted random choice among enabled tasks, returning an index into `tasks`.
    ///
    /// Returns `None` if no task is enabled.
    pub fn select_task<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.weighted_tasks.is_empty() {
            None
        } else {
            Some(self.weighted_tasks[rng.random_range(0..self.weighted_tasks.len())])
        }
    }

    /// Draw a pause uniformly from the configured wait time, with millisecond
    /// granularity. Returns `None` if no wait time is configured.
    pub fn sample_wait<R: Rng>(&self, rng: &mut R) -> Option<Duration> {
        let (min_wait, max_wait) = self.task_wait?;
        let min_ms = min_wait.as_millis() as u64;
        let max_ms = max_wait.as_millis() as u64;
        Some(Duration::from_millis(rng.random_range(min_ms..=max_ms)))
    }
}

/// An individual task within a [`Profile`].
#[derive(Clone)]
pub struct Task {
    /// Where this task lives in [`Profile::tasks`].
    pub tasks_index: usize,
    /// The name of the task, displayed in metrics and in `--list`.
    pub name: String,
    /// Controls how often this task is selected, relative to other enabled tasks.
    pub weight: usize,
    /// Labels used to enable and disable subsets of tasks at run time.
    pub tags: BTreeSet<String>,
    /// The function executed each time this task runs.
    pub function: TaskFunction,
}
impl Task {
    pub fn new(function: TaskFunction) -> Self {
        trace!("new task");
        Task {
            tasks_index: usize::MAX,
            name: "".to_string(),
            weight: 1,
            tags: BTreeSet::new(),
            function,
        }
    }

    /// Set the task name.
    pub fn set_name(mut self, name: &str) -> Self {
        trace!("[{}] set_name: {}", self.tasks_index, name);
        self.name = name.to_string();
        self
    }

    /// Sets the task weight. A task weighted 3 is selected three times as often as
    /// a task weighted 1.
    pub fn set_weight(mut self, weight: usize) -> Result<Self, SwarmError> {
        trace!("[{}] set_weight: {}", self.tasks_index, weight);
        if weight == 0 {
            return Err(SwarmError::InvalidWeight {
                weight,
                detail: format!("task {} weight of 0 is not allowed", self.name),
            });
        }
        self.weight = weight;
        Ok(self)
    }

    /// Adds a tag to the task. Can be called more than once.
    pub fn set_tag(mut self, tag: &str) -> Self {
        trace!("[{}] set_tag: {}", self.tasks_index, tag);
        self.tags.insert(tag.trim().to_lowercase());
        self
    }

    /// Whether the task runs under the given tag filters.
    ///
    /// A task tagged with any excluded tag never runs. Otherwise, if any tags are
    /// included, the task must carry at least one of them.
    pub fn is_enabled(&self, include: &Tags, exclude: &Tags) -> bool {
        if self.tags.iter().any(|tag| exclude.contains(tag)) {
            return false;
        }
        include.is_empty() || self.tags.iter().any(|tag| include.contains(tag))
    }
}

/// Commands sent from the driver to user threads.
#[derive(Debug, Clone, PartialEq)]
pub enum SwarmUserCommand {
    /// Tell the user thread to exit.
    Exit,
}

/// Supported HTTP methods.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum RequestMethod {
    Delete,
    Get,
    Head,
    Patch,
    Post,
    Put,
}
impl RequestMethod {
    /// The matching [`http::Method`].
    pub fn as_method(&self) -> Method {
        match self {
            RequestMethod::Delete => Method::DELETE,
            RequestMethod::Get => Method::GET,
            RequestMethod::Head => Method::HEAD,
            RequestMethod::Patch => Method::PATCH,
            RequestMethod::Post => Method::POST,
            RequestMethod::Put => Method::PUT,
        }
    }
}

/// Display method in upper case.
impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestMethod::Delete => write!(f, "DELETE"),
            RequestMethod::Get => write!(f, "GET"),
            RequestMethod::Head => write!(f, "HEAD"),
            RequestMethod::Patch => write!(f, "PATCH"),
            RequestMethod::Post => write!(f, "POST"),
            RequestMethod::Put => write!(f, "PUT"),
        }
    }
}

/// Convert [`http::Method`] to [`RequestMethod`].
pub fn request_method_from_method(method: &Method) -> Result<RequestMethod, Box<TaskError>> {
    Ok(match *method {
        Method::DELETE => RequestMethod::Delete,
        Method::GET => RequestMethod::Get,
        Method::HEAD => RequestMethod::Head,
        Method::PATCH => RequestMethod::Patch,
        Method::POST => RequestMethod::Post,
        Method::PUT => RequestMethod::Put,
        _ => {
            return Err(Box::new(TaskError::InvalidMethod {
                method: method.clone(),
            }))
        }
    })
}

/// The response to a request made by a [`SwarmUser`], together with the metric
/// recorded for it.
#[derive(Debug)]
pub struct SwarmResponse {
    /// The request metric sent to the driver.
    pub request: RequestMetric,
    /// The server response, or the error that prevented one.
    pub response: Result<Response, reqwest::Error>,
}
impl SwarmResponse {
    pub fn new(request: RequestMetric, response: Result<Response, reqwest::Error>) -> Self {
        SwarmResponse { request, response }
    }
}

/// The per-session HTTP client handed to every task a simulated user runs.
#[derive(Debug, Clone)]
pub struct SwarmUser {
    /// When the user started.
    pub started: Instant,
    /// Which profile this user runs.
    pub profiles_index: usize,
    /// Client used to make requests, managing sessions and cookies.
    pub client: Client,
    /// The base URL every relative path is joined to.
    pub base_url: Url,
    /// A copy of the load test configuration.
    pub config: SwarmConfiguration,
    /// Channel to the driver, where metrics are aggregated.
    pub(crate) channel_to_parent: Option<flume::Sender<SwarmMetric>>,
    /// Which user this is, counting from 0.
    pub(crate) weighted_users_index: usize,
}
impl SwarmUser {
    /// Create a new user bound to `base_url`.
    pub fn new(
        profiles_index: usize,
        base_url: Url,
        configuration: &SwarmConfiguration,
    ) -> Result<Self, SwarmError> {
        trace!("new SwarmUser");

        let timeout = util::get_float_from_string(configuration.timeout.clone())
            .unwrap_or(DEFAULT_TIMEOUT);

        let builder = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_millis((timeout * 1_000.0) as u64));
        #[cfg(feature = "cookies")]
        let builder = builder.cookie_store(true);
        let client = builder.build()?;

        Ok(SwarmUser {
            started: Instant::now(),
            profiles_index,
            client,
            base_url,
            config: configuration.clone(),
            channel_to_parent: None,
            weighted_users_index: usize::MAX,
        })
    }

    /// Create a standalone user, not managed by a driver.
    pub fn single(base_url: Url, configuration: &SwarmConfiguration) -> Result<Self, SwarmError> {
        let mut single_user = SwarmUser::new(0, base_url, configuration)?;
        single_user.weighted_users_index = 0;
        Ok(single_user)
    }

    /// Joins `path` to the base URL. Absolute URLs are returned unchanged.
    pub fn build_url(&self, path: &str) -> Result<String, Box<TaskError>> {
        if let Ok(parsed_path) = Url::parse(path) {
            return Ok(parsed_path.to_string());
        }
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Box::new(TaskError::from(e)))?;
        Ok(url.to_string())
    }

    /// A helper to make a `GET` request of a path and collect relevant metrics.
    pub async fn get(&mut self, path: &str) -> Result<SwarmResponse, Box<TaskError>> {
        let request_builder = self.request_builder(&RequestMethod::Get, path)?;
        self.send(request_builder).await
    }

    /// A helper to make a `POST` request of a path with a JSON body and collect
    /// relevant metrics.
    pub async fn post_json<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        json: &T,
    ) -> Result<SwarmResponse, Box<TaskError>> {
        let request_builder = self.request_builder(&RequestMethod::Post, path)?;
        self.send(request_builder.json(json)).await
    }

    /// Prepare a [`reqwest::RequestBuilder`] for `path`, to customize before
    /// passing it to [`SwarmUser::send`].
    pub fn request_builder(
        &self,
        method: &RequestMethod,
        path: &str,
    ) -> Result<RequestBuilder, Box<TaskError>> {
        let url = self.build_url(path)?;
        Ok(self.client.request(method.as_method(), &url))
    }

    /// Builds and executes a request, timing it and sending the resulting
    /// [`RequestMetric`] to the driver.
    ///
    /// Non-2xx responses and transport errors are recorded as failures and
    /// returned inside the [`SwarmResponse`].
    pub async fn send(
        &mut self,
        request_builder: RequestBuilder,
    ) -> Result<SwarmResponse, Box<TaskError>> {
        let request = request_builder
            .build()
            .map_err(|e| Box::new(TaskError::from(e)))?;
        let method = request_method_from_method(request.method())?;
        let request_name = request.url().path().to_string();
        let url = request.url().to_string();

        let mut request_metric = RequestMetric::new(
            method,
            &request_name,
            &url,
            self.started.elapsed().as_millis(),
            self.weighted_users_index,
        );

        let started = Instant::now();
        let response = self.client.execute(request).await;
        request_metric.set_response_time(started.elapsed().as_millis());

        match &response {
            Ok(r) => {
                let status_code = r.status();
                debug!("{:?}: status_code {}", &request_name, status_code);
                request_metric.set_status_code(Some(status_code));
                if !status_code.is_success() {
                    request_metric.success = false;
                    request_metric.error = status_code.to_string();
                }
            }
            Err(e) => {
                warn!("{:?}: {}", &request_name, e);
                request_metric.success = false;
                request_metric.set_status_code(None);
                request_metric.error = e.to_string();
            }
        };

        self.send_request_metric_to_parent(request_metric.clone())?;

        Ok(SwarmResponse::new(request_metric, response))
    }

    fn send_request_metric_to_parent(&self, request_metric: RequestMetric) -> TaskResult {
        if let Some(parent) = self.channel_to_parent.as_ref() {
            parent
                .send(SwarmMetric::Request(request_metric))
                .map_err(|e| Box::new(TaskError::from(e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::str::FromStr;

    async fn example_task(_user: &mut SwarmUser) -> TaskResult {
        Ok(())
    }

    fn tags(list: &str) -> Tags {
        Tags::from_str(list).unwrap()
    }

    #[test]
    fn task_builder() {
        let task = task!(example_task)
            .set_name("browse")
            .set_weight(3)
            .unwrap()
            .set_tag("View")
            .set_tag(" catalog ");
        assert_eq!(task.name, "browse");
        assert_eq!(task.weight, 3);
        assert!(task.tags.contains("view"));
        assert!(task.tags.contains("catalog"));

        // Zero weight is rejected.
        assert!(task!(example_task).set_weight(0).is_err());
    }

    #[test]
    fn profile_builder() {
        let profile = profile!("Shopper")
            .register_task(task!(example_task).set_name("a"))
            .register_task(task!(example_task).set_name("b"))
            .set_host("http://localhost:8080")
            .set_weight(2)
            .unwrap();
        assert_eq!(profile.name, "Shopper");
        assert_eq!(profile.weight, 2);
        assert_eq!(profile.tasks[0].tasks_index, 0);
        assert_eq!(profile.tasks[1].tasks_index, 1);
        assert_eq!(profile.host, Some("http://localhost:8080".to_string()));
        assert!(profile!("Shopper").set_weight(0).is_err());
    }

    #[test]
    fn wait_time_bounds() {
        assert!(profile!("Shopper")
            .set_wait_time(Duration::from_secs(3), Duration::from_secs(1))
            .is_err());

        let profile = profile!("Shopper")
            .set_wait_time(Duration::from_secs(1), Duration::from_secs(3))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let wait = profile.sample_wait(&mut rng).unwrap();
            assert!(wait >= Duration::from_secs(1));
            assert!(wait <= Duration::from_secs(3));
        }

        // Equal bounds always return the same pause.
        let fixed = profile!("Shopper")
            .set_wait_time(Duration::from_secs(2), Duration::from_secs(2))
            .unwrap();
        assert_eq!(fixed.sample_wait(&mut rng), Some(Duration::from_secs(2)));

        // No wait configured.
        assert_eq!(profile!("Shopper").sample_wait(&mut rng), None);
    }

    #[test]
    fn tag_filter() {
        let task = task!(example_task).set_tag("view");
        let untagged = task!(example_task);

        // No filters enable everything.
        assert!(task.is_enabled(&Tags::default(), &Tags::default()));
        assert!(untagged.is_enabled(&Tags::default(), &Tags::default()));

        // Included tags must intersect.
        assert!(task.is_enabled(&tags("view"), &Tags::default()));
        assert!(task.is_enabled(&tags("update,view"), &Tags::default()));
        assert!(!task.is_enabled(&tags("update"), &Tags::default()));
        assert!(!untagged.is_enabled(&tags("update"), &Tags::default()));

        // Excluded tags win.
        assert!(!task.is_enabled(&Tags::default(), &tags("view")));
        assert!(!task.is_enabled(&tags("view"), &tags("view")));
        assert!(untagged.is_enabled(&Tags::default(), &tags("view")));
    }

    #[test]
    fn weighted_selection() {
        let mut profile = profile!("Shopper")
            .register_task(task!(example_task).set_weight(10).unwrap().set_tag("a"))
            .register_task(task!(example_task).set_weight(30).unwrap().set_tag("b"));
        assert_eq!(profile.apply_tag_filter(&Tags::default(), &Tags::default()), 2);
        // Weights are reduced to 1:3.
        assert_eq!(profile.weighted_tasks, vec![0, 1, 1, 1]);

        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[profile.select_task(&mut rng).unwrap()] += 1;
        }
        assert!(counts[0] > 2_200 && counts[0] < 2_800);

        // Filtering leaves only one task.
        assert_eq!(profile.apply_tag_filter(&tags("a"), &Tags::default()), 1);
        assert_eq!(profile.weighted_tasks, vec![0]);

        // Filtering everything out leaves nothing to select.
        assert_eq!(profile.apply_tag_filter(&tags("c"), &Tags::default()), 0);
        assert_eq!(profile.select_task(&mut rng), None);
    }

    #[test]
    fn build_urls() {
        let configuration = SwarmConfiguration::default();
        let user = SwarmUser::single(
            Url::parse("http://127.0.0.1:8080").unwrap(),
            &configuration,
        )
        .unwrap();
        assert_eq!(
            user.build_url("/products/1").unwrap(),
            "http://127.0.0.1:8080/products/1"
        );
        assert_eq!(
            user.build_url("http://example.com/products/2").unwrap(),
            "http://example.com/products/2"
        );
    }

    #[test]
    fn methods() {
        assert_eq!(RequestMethod::Get.to_string(), "GET");
        assert_eq!(RequestMethod::Post.to_string(), "POST");
        assert_eq!(
            request_method_from_method(&Method::POST).unwrap(),
            RequestMethod::Post
        );
        assert!(request_method_from_method(&Method::OPTIONS).is_err());
    }
}
