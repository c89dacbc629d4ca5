//! # Storefront Swarm
//!
//! A load test for an online store's product API, in the style of
//! [Locust](https://locust.io/). Simulated shoppers browse product pages and update
//! product details, pausing between one and three seconds after each task.
//!
//! The crate ships the `OnlineStoreUser` profile in the [`storefront`] module,
//! together with a small load driver, [`SwarmAttack`], which launches users,
//! selects weighted tasks, applies tag filters and aggregates metrics.
//!
//! ## Running the load test
//!
//! The bundled binary runs the `OnlineStoreUser` profile against
//! `http://localhost:8080` unless another host is configured:
//!
//! ```bash
//! $ storefront-swarm --host http://10.21.32.33:8080 --users 10 --hatch-rate 2 --run-time 5m
//! ```
//!
//! Only browse products:
//!
//! ```bash
//! $ storefront-swarm --tags view
//! ```
//!
//! Run everything except product updates:
//!
//! ```bash
//! $ storefront-swarm --exclude-tags update
//! ```
//!
//! ## Building a profile
//!
//! Profiles are built from async task functions that accept a
//! [`SwarmUser`](./swarm/struct.SwarmUser.html) and return a
//! [`TaskResult`](./swarm/type.TaskResult.html):
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use storefront_swarm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SwarmError> {
//!     let _swarm_metrics = SwarmAttack::initialize()?
//!         .register_profile(
//!             profile!("Shopper")
//!                 .set_wait_time(Duration::from_secs(1), Duration::from_secs(3))?
//!                 .register_task(task!(view_cart).set_name("view_cart").set_tag("view"))
//!                 .register_task(task!(checkout).set_name("checkout").set_weight(2)?),
//!         )
//!         .set_default(SwarmDefault::Host, "http://localhost:8080")?
//!         .set_default(SwarmDefault::RunTime, 60)?
//!         .execute()
//!         .await?;
//!
//!     Ok(())
//! }
//!
//! async fn view_cart(user: &mut SwarmUser) -> TaskResult {
//!     let _swarm = user.get("/cart").await?;
//!
//!     Ok(())
//! }
//!
//! async fn checkout(user: &mut SwarmUser) -> TaskResult {
//!     let _swarm = user.post_json("/checkout", &serde_json::json!({"cart": 1})).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! When the load test finishes, metrics are displayed as a series of tables: per
//! task, per request, response times, percentiles, status codes and errors.
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! <http://www.apache.org/licenses/LICENSE-2.0>
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

#[macro_use]
extern crate log;

pub mod config;
pub mod metrics;
pub mod prelude;
pub mod storefront;
pub mod swarm;
mod user;
pub mod util;

use chrono::prelude::*;
use gumdrop::Options;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::{fmt, io, time};
use url::Url;

use crate::config::{SwarmConfiguration, SwarmDefaults};
use crate::metrics::{SwarmMetric, SwarmMetrics};
use crate::swarm::{Profile, SwarmUser, SwarmUserCommand};

/// An enumeration of all errors a [`SwarmAttack`] can return.
#[derive(Debug)]
pub enum SwarmError {
    /// Wraps a [`std::io::Error`].
    Io(io::Error),
    /// Wraps a [`reqwest::Error`].
    Reqwest(reqwest::Error),
    /// Wraps a [`tokio::task::JoinError`].
    TokioJoin(tokio::task::JoinError),
    /// Wraps a [`serde_json::Error`].
    Serde(serde_json::Error),
    /// Failed to parse a hostname.
    InvalidHost {
        /// The invalid hostname that caused this error.
        host: String,
        /// An optional explanation of the error.
        detail: String,
        /// Wraps a [`url::ParseError`].
        parse_error: url::ParseError,
    },
    /// Invalid option or value specified, may only be invalid in context.
    InvalidOption {
        /// The invalid option that caused this error, may be only invalid in context.
        option: String,
        /// The invalid value that caused this error, may be only invalid in context.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// Invalid wait time specified.
    InvalidWaitTime {
        // The specified minimum wait time.
        min_wait: time::Duration,
        // The specified maximum wait time.
        max_wait: time::Duration,
        /// An optional explanation of the error.
        detail: String,
    },
    /// Invalid weight specified.
    InvalidWeight {
        // The specified weight.
        weight: usize,
        /// An optional explanation of the error.
        detail: String,
    },
    /// [`SwarmAttack`] has no [`Profile`](./swarm/struct.Profile.html) registered.
    NoProfiles {
        /// An optional explanation of the error.
        detail: String,
    },
    /// Tag filters left no [`Task`](./swarm/struct.Task.html) enabled.
    NoTasks {
        /// An optional explanation of the error.
        detail: String,
    },
}
/// Implement a helper to provide a text description of all possible types of errors.
impl SwarmError {
    fn describe(&self) -> &str {
        match *self {
            SwarmError::Io(_) => "io::Error",
            SwarmError::Reqwest(_) => "reqwest::Error",
            SwarmError::TokioJoin(_) => "tokio::task::JoinError",
            SwarmError::Serde(_) => "serde_json::Error",
            SwarmError::InvalidHost { .. } => "failed to parse hostname",
            SwarmError::InvalidOption { .. } => "invalid option or value specified",
            SwarmError::InvalidWaitTime { .. } => "invalid wait_time specified",
            SwarmError::InvalidWeight { .. } => "invalid weight specified",
            SwarmError::NoProfiles { .. } => "no profiles registered",
            SwarmError::NoTasks { .. } => "no tasks enabled",
        }
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SwarmError::Io(ref source) => write!(f, "SwarmError: {} ({})", self.describe(), source),
            SwarmError::Reqwest(ref source) => {
                write!(f, "SwarmError: {} ({})", self.describe(), source)
            }
            SwarmError::TokioJoin(ref source) => {
                write!(f, "SwarmError: {} ({})", self.describe(), source)
            }
            SwarmError::Serde(ref source) => {
                write!(f, "SwarmError: {} ({})", self.describe(), source)
            }
            SwarmError::InvalidHost {
                ref parse_error, ..
            } => write!(f, "SwarmError: {} ({})", self.describe(), parse_error),
            SwarmError::InvalidOption { ref detail, .. }
            | SwarmError::InvalidWaitTime { ref detail, .. }
            | SwarmError::InvalidWeight { ref detail, .. }
            | SwarmError::NoProfiles { ref detail }
            | SwarmError::NoTasks { ref detail } => {
                write!(f, "SwarmError: {} ({})", self.describe(), detail)
            }
        }
    }
}

// Define the lower level source of this error, if any.
impl std::error::Error for SwarmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            SwarmError::Io(ref source) => Some(source),
            SwarmError::Reqwest(ref source) => Some(source),
            SwarmError::TokioJoin(ref source) => Some(source),
            SwarmError::Serde(ref source) => Some(source),
            SwarmError::InvalidHost {
                ref parse_error, ..
            } => Some(parse_error),
            _ => None,
        }
    }
}

/// Auto-convert Reqwest errors.
impl From<reqwest::Error> for SwarmError {
    fn from(err: reqwest::Error) -> SwarmError {
        SwarmError::Reqwest(err)
    }
}

/// Auto-convert IO errors.
impl From<io::Error> for SwarmError {
    fn from(err: io::Error) -> SwarmError {
        SwarmError::Io(err)
    }
}

/// Auto-convert TokioJoin errors.
impl From<tokio::task::JoinError> for SwarmError {
    fn from(err: tokio::task::JoinError) -> SwarmError {
        SwarmError::TokioJoin(err)
    }
}

/// Auto-convert serde_json errors.
impl From<serde_json::Error> for SwarmError {
    fn from(err: serde_json::Error) -> SwarmError {
        SwarmError::Serde(err)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A [`SwarmAttack`] load test moves through each of the following phases.
pub enum AttackPhase {
    /// The load test hasn't started yet.
    Idle,
    /// [`SwarmUser`](./swarm/struct.SwarmUser.html)s are launching at the hatch rate.
    Starting,
    /// All users have launched and are generating load.
    Running,
    /// Users are stopping.
    Stopping,
    /// Exiting the load test.
    Shutdown,
}

/// Internal run state for a load test.
#[derive(Debug)]
pub(crate) struct SwarmAttackRunState {
    /// When the previous user was launched.
    spawn_user_timer: time::Instant,
    /// How many milliseconds until the next user should be launched.
    spawn_user_in_ms: usize,
    /// Sender cloned into every user, used to send metrics to the driver.
    all_threads_metrics_tx: flume::Sender<SwarmMetric>,
    /// Receiver the driver aggregates metrics from.
    pub(crate) metrics_rx: flume::Receiver<SwarmMetric>,
    /// All user tasks, so they can be awaited when stopping.
    users: Vec<tokio::task::JoinHandle<()>>,
    /// One sender per user, used to tell users to exit.
    user_channels: Vec<flume::Sender<SwarmUserCommand>>,
    /// Timer tracking when to display running metrics, if enabled.
    pub(crate) running_metrics_timer: time::Instant,
    /// Whether running metrics should be displayed.
    pub(crate) display_running_metrics: bool,
    /// Set by the ctrl-c handler.
    canceled: Arc<AtomicBool>,
}

/// Global internal state for the load test.
#[derive(Clone)]
pub struct SwarmAttack {
    /// One copy of each registered profile.
    profiles: Vec<Profile>,
    /// One user for each user that will run during this load test.
    weighted_users: Vec<SwarmUser>,
    /// Optional default values for run-time options.
    pub(crate) defaults: SwarmDefaults,
    /// Configuration object holding options set when launching the load test.
    pub(crate) configuration: SwarmConfiguration,
    /// How long (in seconds) the load test should run, 0 for no limit.
    run_time: usize,
    /// Which phase the load test is currently operating in.
    attack_phase: AttackPhase,
    /// When the load test started.
    pub(crate) started: Option<time::Instant>,
    /// All metrics merged together.
    pub(crate) metrics: SwarmMetrics,
}
impl SwarmAttack {
    /// Load configuration from the command line and initialize a [`SwarmAttack`].
    ///
    /// # Example
    /// ```rust
    /// use storefront_swarm::prelude::*;
    ///
    /// let swarm_attack = SwarmAttack::initialize();
    /// ```
    pub fn initialize() -> Result<SwarmAttack, SwarmError> {
        Ok(SwarmAttack::initialize_with_config(
            SwarmConfiguration::parse_args_default_or_exit(),
        ))
    }

    /// Initialize a [`SwarmAttack`] with an already loaded configuration.
    ///
    /// # Example
    /// ```rust
    /// use storefront_swarm::config::SwarmConfiguration;
    /// use storefront_swarm::prelude::*;
    ///
    /// let configuration = SwarmConfiguration::default();
    /// let swarm_attack = SwarmAttack::initialize_with_config(configuration);
    /// ```
    pub fn initialize_with_config(configuration: SwarmConfiguration) -> SwarmAttack {
        SwarmAttack {
            profiles: Vec::new(),
            weighted_users: Vec::new(),
            defaults: SwarmDefaults::default(),
            configuration,
            run_time: 0,
            attack_phase: AttackPhase::Idle,
            started: None,
            metrics: SwarmMetrics::default(),
        }
    }

    /// Register a [`Profile`](./swarm/struct.Profile.html) with the load test.
    pub fn register_profile(mut self, mut profile: Profile) -> Self {
        profile.profiles_index = self.profiles.len();
        self.profiles.push(profile);
        self
    }

    /// Execute the load test, returning the collected metrics when it finishes.
    ///
    /// # Example
    /// ```rust,no_run
    /// use storefront_swarm::prelude::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), SwarmError> {
    ///     let _swarm_metrics = SwarmAttack::initialize()?
    ///         .register_profile(storefront::online_store_user()?)
    ///         .set_default(SwarmDefault::Host, "http://localhost:8080")?
    ///         // Exit after one minute so the test doesn't run forever.
    ///         .set_default(SwarmDefault::RunTime, 60)?
    ///         .execute()
    ///         .await?;
    ///
    ///     Ok(())
    /// }
    /// ```
    pub async fn execute(mut self) -> Result<SwarmMetrics, SwarmError> {
        // Merge defaults into the configuration and start logging.
        self.configuration.configure(&self.defaults)?;

        // If version flag is set, display package name and version and exit.
        if self.configuration.version {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }

        self.configuration.validate()?;

        // At least one profile is required.
        if self.profiles.is_empty() {
            return Err(SwarmError::NoProfiles {
                detail: "No profiles are registered.".to_string(),
            });
        }

        // Display profiles and tasks, then exit.
        if self.configuration.list {
            self.print_profiles();
            std::process::exit(0);
        }

        self.prepare_load_test()?;

        self = self.start_attack().await?;

        // Percentiles and errors are only displayed when the load test is finished.
        self.metrics.final_metrics = true;
        if !self.configuration.no_print_metrics {
            self.metrics.print();
        }
        if !self.configuration.report_file.is_empty() {
            self.metrics
                .write_report(&self.configuration.report_file)
                .await?;
        }

        Ok(self.metrics)
    }

    fn print_profiles(&self) {
        println!("Available tasks:");
        for profile in &self.profiles {
            println!(" - {} (weight: {})", profile.name, profile.weight);
            for task in &profile.tasks {
                println!(
                    "    o {} (weight: {}, tags: {})",
                    task.name,
                    task.weight,
                    task.tags.iter().cloned().collect::<Vec<String>>().join(",")
                );
            }
        }
    }

    // Apply tag filters, validate hosts and create one SwarmUser per user.
    fn prepare_load_test(&mut self) -> Result<(), SwarmError> {
        let mut enabled_tasks = 0;
        for profile in &mut self.profiles {
            enabled_tasks += profile
                .apply_tag_filter(&self.configuration.tags, &self.configuration.exclude_tags);
        }
        if enabled_tasks == 0 {
            return Err(SwarmError::NoTasks {
                detail: format!(
                    "No tasks are enabled with tags \"{}\" and excluded tags \"{}\".",
                    self.configuration.tags, self.configuration.exclude_tags
                ),
            });
        }

        self.run_time = util::parse_timespan(&self.configuration.run_time);

        self.metrics = SwarmMetrics::default();
        self.metrics.initialize_task_metrics(&self.profiles);
        self.metrics.host = self.configuration.host.clone();

        self.weighted_users = self.weight_profile_users()?;

        Ok(())
    }

    // Allocate profiles to users round robin, in proportion to profile weight.
    // Profiles with no enabled tasks are skipped.
    fn allocate_profiles(&self) -> Vec<usize> {
        let active: Vec<&Profile> = self
            .profiles
            .iter()
            .filter(|profile| !profile.weighted_tasks.is_empty())
            .collect();
        let u = active
            .iter()
            .fold(0, |divisor, profile| util::gcd(divisor, profile.weight));
        debug!("gcd: {}", u);

        let mut available_profiles: Vec<Vec<usize>> = active
            .iter()
            .map(|profile| vec![profile.profiles_index; profile.weight / u])
            .collect();
        let total_profiles: usize = available_profiles.iter().map(|p| p.len()).sum();

        let mut weighted_profiles = Vec::with_capacity(total_profiles);
        while weighted_profiles.len() < total_profiles {
            for profiles in available_profiles.iter_mut() {
                if let Some(profile) = profiles.pop() {
                    weighted_profiles.push(profile);
                }
            }
        }
        weighted_profiles
    }

    fn weight_profile_users(&self) -> Result<Vec<SwarmUser>, SwarmError> {
        let weighted_profiles = self.allocate_profiles();
        let users = self.configuration.users.unwrap_or(1);

        info!("initializing user states...");
        let mut weighted_users = Vec::with_capacity(users);
        for profiles_index in weighted_profiles.iter().cycle().take(users) {
            let profile = &self.profiles[*profiles_index];
            let base_url = get_base_url(
                &self.configuration.host,
                profile.host.as_deref(),
                &profile.name,
            )?;
            debug!(
                "creating user state: {} ({})",
                weighted_users.len(),
                profile.name
            );
            weighted_users.push(SwarmUser::new(
                *profiles_index,
                base_url,
                &self.configuration,
            )?);
        }
        // Users are launched by popping from the end.
        weighted_users.reverse();
        Ok(weighted_users)
    }

    fn set_attack_phase(&mut self, phase: AttackPhase) {
        if self.attack_phase == phase {
            return;
        }
        info!("entering SwarmAttack phase: {:?}", &phase);
        self.attack_phase = phase;
    }

    fn initialize_attack(&mut self) -> SwarmAttackRunState {
        // A single channel carries metrics from every user to the driver.
        let (all_threads_metrics_tx, metrics_rx): (
            flume::Sender<SwarmMetric>,
            flume::Receiver<SwarmMetric>,
        ) = flume::unbounded();

        let std_now = time::Instant::now();
        let run_state = SwarmAttackRunState {
            spawn_user_timer: std_now,
            spawn_user_in_ms: 0,
            all_threads_metrics_tx,
            metrics_rx,
            users: Vec::new(),
            user_channels: Vec::new(),
            running_metrics_timer: std_now,
            display_running_metrics: false,
            canceled: Arc::new(AtomicBool::new(false)),
        };

        // Catch ctrl-c to allow clean shutdown to display metrics.
        util::setup_ctrlc_handler(&run_state.canceled);

        self.started = Some(std_now);
        self.metrics.started = Some(Local::now());
        run_state
    }

    // Launch the next user if it's time, otherwise sleep until it is.
    async fn spawn_users(&mut self, run_state: &mut SwarmAttackRunState) {
        let hatch_rate = util::get_hatch_rate(self.configuration.hatch_rate.clone());

        if run_state.spawn_user_in_ms == 0
            || util::ms_timer_expired(run_state.spawn_user_timer, run_state.spawn_user_in_ms)
        {
            if let Some(mut thread_user) = self.weighted_users.pop() {
                run_state.spawn_user_timer = time::Instant::now();
                run_state.spawn_user_in_ms = (1_000.0 / hatch_rate) as usize;

                thread_user.weighted_users_index = self.metrics.users;

                // Per-user channel allowing the driver to control the user.
                let (parent_sender, thread_receiver): (
                    flume::Sender<SwarmUserCommand>,
                    flume::Receiver<SwarmUserCommand>,
                ) = flume::unbounded();
                run_state.user_channels.push(parent_sender);

                thread_user.channel_to_parent = Some(run_state.all_threads_metrics_tx.clone());

                let thread_profile = self.profiles[thread_user.profiles_index].clone();

                // Users are numbered from 1 in the logs.
                let thread_number = self.metrics.users + 1;

                let user = tokio::spawn(user::user_main(
                    thread_number,
                    thread_profile,
                    thread_user,
                    thread_receiver,
                ));
                run_state.users.push(user);
                self.metrics.users += 1;
            }
        } else {
            // Sleep until the next user launches, waking at least twice a second.
            let elapsed = run_state.spawn_user_timer.elapsed().as_millis() as usize;
            let remaining = run_state.spawn_user_in_ms.saturating_sub(elapsed).min(500);
            let sleep_duration = time::Duration::from_millis(remaining as u64);
            trace!("sleeping {:?}...", sleep_duration);
            tokio::time::sleep(sleep_duration).await;
        }

        if self.weighted_users.is_empty() {
            info!("launched {} users...", self.metrics.users);
            self.set_attack_phase(AttackPhase::Running);
        }
    }

    // Stop once every user has finished its iterations, otherwise sleep.
    async fn monitor_attack(&mut self, run_state: &mut SwarmAttackRunState) {
        if run_state.users.iter().all(|user| user.is_finished()) {
            info!("all users finished");
            self.set_attack_phase(AttackPhase::Stopping);
        } else {
            tokio::time::sleep(time::Duration::from_millis(500)).await;
        }
    }

    // Tell every user to exit, wait for them, and collect their final metrics.
    async fn stop_attack(&mut self, run_state: &mut SwarmAttackRunState) {
        info!("stopping after {} seconds...", self.metrics.duration);
        for (index, send_to_user) in run_state.user_channels.iter().enumerate() {
            match send_to_user.send(SwarmUserCommand::Exit) {
                Ok(_) => debug!("telling user {} to exit", index),
                // The user already exited.
                Err(e) => debug!("failed to tell user {} to exit: {}", index, e),
            }
        }
        info!("waiting for users to exit");

        let users = std::mem::take(&mut run_state.users);
        for result in futures::future::join_all(users).await {
            if let Err(e) = result {
                warn!("user failed: {}", e);
            }
        }
        debug!("all users exited");

        self.sync_metrics(run_state, true);
    }

    // The driver loop runs from Idle until Shutdown.
    async fn start_attack(mut self) -> Result<SwarmAttack, SwarmError> {
        let mut run_state = self.initialize_attack();
        self.set_attack_phase(AttackPhase::Starting);

        loop {
            match self.attack_phase {
                AttackPhase::Idle => self.set_attack_phase(AttackPhase::Starting),
                AttackPhase::Starting => {
                    self.update_duration();
                    self.spawn_users(&mut run_state).await;
                }
                AttackPhase::Running => {
                    self.update_duration();
                    self.monitor_attack(&mut run_state).await;
                }
                AttackPhase::Stopping => {
                    self.update_duration();
                    self.stop_attack(&mut run_state).await;
                    self.set_attack_phase(AttackPhase::Shutdown);
                }
                AttackPhase::Shutdown => break,
            }

            self.sync_metrics(&mut run_state, false);

            if self.attack_phase == AttackPhase::Starting
                || self.attack_phase == AttackPhase::Running
            {
                if run_state.canceled.load(Ordering::SeqCst) {
                    self.set_attack_phase(AttackPhase::Stopping);
                } else if let Some(started) = self.started {
                    // Run time counts from when the first user launched.
                    if util::timer_expired(started, self.run_time) {
                        info!("run time of {} seconds expired", self.run_time);
                        self.set_attack_phase(AttackPhase::Stopping);
                    }
                }
            }
        }

        Ok(self)
    }
}

// The configured host wins, otherwise fall back to the profile host.
fn get_base_url(
    config_host: &str,
    profile_host: Option<&str>,
    profile_name: &str,
) -> Result<Url, SwarmError> {
    let host = if !config_host.is_empty() {
        config_host
    } else if let Some(host) = profile_host {
        host
    } else {
        return Err(SwarmError::InvalidOption {
            option: "--host".to_string(),
            value: "".to_string(),
            detail: format!("A host must be defined via the --host option, the SwarmAttack.set_default() function, or the Profile.set_host() function (no host defined for {}).", profile_name),
        });
    };
    Url::parse(host).map_err(|parse_error| SwarmError::InvalidHost {
        host: host.to_string(),
        detail: "Invalid host.".to_string(),
        parse_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SwarmDefault, SwarmDefaultType};
    use crate::swarm::TaskResult;
    use crate::{profile, task};

    async fn noop(_user: &mut SwarmUser) -> TaskResult {
        Ok(())
    }

    #[test]
    fn base_url() {
        assert_eq!(
            get_base_url("http://127.0.0.1:8080", Some("http://example.com"), "Shopper")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/"
        );
        assert_eq!(
            get_base_url("", Some("http://example.com"), "Shopper")
                .unwrap()
                .as_str(),
            "http://example.com/"
        );
        assert!(get_base_url("", None, "Shopper").is_err());
        assert!(get_base_url("", Some("example.com"), "Shopper").is_err());
    }

    #[test]
    fn allocate_users() {
        let config = SwarmConfiguration {
            host: "http://127.0.0.1:8080".to_string(),
            users: Some(5),
            ..Default::default()
        };
        let mut swarm_attack = SwarmAttack::initialize_with_config(config)
            .register_profile(profile!("A").register_task(task!(noop)))
            .register_profile(
                profile!("B")
                    .register_task(task!(noop))
                    .set_weight(2)
                    .unwrap(),
            )
            .register_profile(profile!("C").register_task(task!(noop).set_tag("view")));
        swarm_attack.configuration.exclude_tags = "view".parse().unwrap();

        swarm_attack.prepare_load_test().unwrap();
        // Profile C has no enabled tasks and gets no users.
        assert_eq!(swarm_attack.allocate_profiles(), vec![0, 1, 1]);
        let mut profiles: Vec<usize> = swarm_attack
            .weighted_users
            .iter()
            .map(|user| user.profiles_index)
            .collect();
        profiles.reverse();
        assert_eq!(profiles, vec![0, 1, 1, 0, 1]);
    }

    #[tokio::test]
    async fn no_profiles() {
        let config = SwarmConfiguration {
            host: "http://127.0.0.1:8080".to_string(),
            ..Default::default()
        };
        match SwarmAttack::initialize_with_config(config).execute().await {
            Err(SwarmError::NoProfiles { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn no_enabled_tasks() {
        let config = SwarmConfiguration::default();
        let result = SwarmAttack::initialize_with_config(config)
            .register_profile(profile!("Shopper").register_task(task!(noop).set_tag("view")))
            .set_default(SwarmDefault::Host, "http://127.0.0.1:8080")
            .unwrap()
            .set_default(SwarmDefault::Tags, "update")
            .unwrap()
            .execute()
            .await;
        match result {
            Err(SwarmError::NoTasks { .. }) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn missing_host() {
        let result = SwarmAttack::initialize_with_config(SwarmConfiguration::default())
            .register_profile(profile!("Shopper").register_task(task!(noop)))
            .execute()
            .await;
        match result {
            Err(SwarmError::InvalidOption { ref option, .. }) => assert_eq!(option, "--host"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
