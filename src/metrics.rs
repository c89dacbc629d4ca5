//! Optional metrics collected and aggregated during load tests.
//!
//! By default, metrics are collected during a load test and returned in a
//! [`SwarmMetrics`] object by
//! [`SwarmAttack::execute()`](../struct.SwarmAttack.html#method.execute) when the
//! load test finishes. [`SwarmUser`](../swarm/struct.SwarmUser.html)s send a
//! [`SwarmMetric`] over a channel for every request and every task they run, and the
//! driver aggregates them here.

use chrono::prelude::*;
use http::StatusCode;
use itertools::Itertools;
use num_format::{Locale, ToFormattedString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

use crate::swarm::{Profile, RequestMethod};
use crate::{util, SwarmAttack, SwarmAttackRunState, SwarmError};

/// Each time the driver receives messages from users, it spends at most this long
/// draining the channel before returning to the main loop.
const RECEIVE_TIMEOUT: usize = 400;

/// Used to send metrics from [`SwarmUser`](../swarm/struct.SwarmUser.html) threads
/// to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SwarmMetric {
    Request(RequestMetric),
    Task(TaskMetric),
}

/// Errors seen during the load test, keyed by `error.method.name`.
pub type SwarmErrorMetrics = BTreeMap<String, ErrorMetric>;

/// All requests made during a load test, keyed by `"{METHOD} {name}"`.
pub type SwarmRequestMetrics = BTreeMap<String, RequestMetricAggregate>;

/// Per-profile, per-task metrics. The outer vector is indexed by profile, the
/// inner vector by task.
pub type SwarmTaskMetrics = Vec<Vec<TaskMetricAggregate>>;

/// A single request made by a simulated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetric {
    /// How many milliseconds the user had been running when the request was made.
    pub elapsed: u64,
    /// The method being used (ie, Get, Post, etc).
    pub method: RequestMethod,
    /// The name of the request, which is the request path.
    pub name: String,
    /// The full URL that was requested.
    pub url: String,
    /// How many milliseconds the request took.
    pub response_time: u64,
    /// The HTTP response code, or 0 if no response was received.
    pub status_code: u16,
    /// Whether the request returned a 2xx status code.
    pub success: bool,
    /// Which user made the request.
    pub user: usize,
    /// The error caused by this request, if any.
    pub error: String,
}
impl RequestMetric {
    pub(crate) fn new(
        method: RequestMethod,
        name: &str,
        url: &str,
        elapsed: u128,
        user: usize,
    ) -> Self {
        RequestMetric {
            elapsed: elapsed as u64,
            method,
            name: name.to_string(),
            url: url.to_string(),
            response_time: 0,
            status_code: 0,
            success: true,
            user,
            error: "".to_string(),
        }
    }

    // Record how long the `response_time` took.
    pub(crate) fn set_response_time(&mut self, response_time: u128) {
        self.response_time = response_time as u64;
    }

    // Record the returned `status_code`.
    pub(crate) fn set_status_code(&mut self, status_code: Option<StatusCode>) {
        self.status_code = match status_code {
            Some(status_code) => status_code.as_u16(),
            None => 0,
        };
    }
}

/// Metrics collected about a method-path pair, (for example `GET /products/1`).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RequestMetricAggregate {
    /// The request path for which metrics are being collected.
    pub path: String,
    /// The method for which metrics are being collected.
    pub method: RequestMethod,
    /// Per-response-time counters.
    ///
    /// Response times under 100ms are stored without rounding. Response times
    /// between 100 and 500ms are rounded to the nearest 10ms, between 500 and
    /// 1000ms to the nearest 100ms, and larger ones to the nearest 1000ms.
    pub response_times: BTreeMap<usize, usize>,
    /// The shortest response time seen so far, not rounded.
    pub min_response_time: usize,
    /// The longest response time seen so far, not rounded.
    pub max_response_time: usize,
    /// Total combined response times seen so far.
    pub total_response_time: usize,
    /// Total number of response times seen so far.
    pub response_time_counter: usize,
    /// Per-status-code counters. A status code of 0 means no response was received.
    pub status_code_counts: BTreeMap<u16, usize>,
    /// Total number of requests that returned a 2xx status code.
    pub success_count: usize,
    /// Total number of requests that failed.
    pub fail_count: usize,
}
impl RequestMetricAggregate {
    pub(crate) fn new(path: &str, method: RequestMethod) -> Self {
        trace!("new request");
        RequestMetricAggregate {
            path: path.to_string(),
            method,
            response_times: BTreeMap::new(),
            min_response_time: 0,
            max_response_time: 0,
            total_response_time: 0,
            response_time_counter: 0,
            status_code_counts: BTreeMap::new(),
            success_count: 0,
            fail_count: 0,
        }
    }

    /// Track response time.
    pub(crate) fn set_response_time(&mut self, response_time: u64) {
        let response_time_usize = response_time as usize;

        // Update minimum if this one is fastest yet.
        if self.min_response_time == 0
            || (response_time_usize > 0 && response_time_usize < self.min_response_time)
        {
            self.min_response_time = response_time_usize;
        }

        // Update maximum if this one is slowest yet.
        if response_time_usize > self.max_response_time {
            self.max_response_time = response_time_usize;
        }

        self.total_response_time += response_time_usize;
        self.response_time_counter += 1;

        let rounded_response_time = round_time(response_time);
        *self.response_times.entry(rounded_response_time).or_insert(0) += 1;
        debug!("incremented {} counter", rounded_response_time);
    }

    /// Increment counter for status code, creating new counter if first time seeing status code.
    pub(crate) fn set_status_code(&mut self, status_code: u16) {
        *self.status_code_counts.entry(status_code).or_insert(0) += 1;
    }
}
impl Ord for RequestMetricAggregate {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.method, &self.path).cmp(&(&other.method, &other.path))
    }
}
impl PartialOrd for RequestMetricAggregate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The per-task metrics collected each time a task is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMetric {
    /// How many milliseconds the user had been running when the task started.
    pub elapsed: u64,
    /// Which profile the task belongs to.
    pub profiles_index: usize,
    /// Which task this is within the profile.
    pub tasks_index: usize,
    /// The name of the task.
    pub name: String,
    /// How long the task ran, in milliseconds.
    pub run_time: u64,
    /// Whether the task function returned `Ok`.
    pub success: bool,
    /// Which user ran the task.
    pub user: usize,
}
impl TaskMetric {
    pub(crate) fn new(
        elapsed: u128,
        profiles_index: usize,
        tasks_index: usize,
        name: String,
        user: usize,
    ) -> Self {
        TaskMetric {
            elapsed: elapsed as u64,
            profiles_index,
            tasks_index,
            name,
            run_time: 0,
            success: true,
            user,
        }
    }

    pub(crate) fn set_time(&mut self, time: u128, success: bool) {
        self.run_time = time as u64;
        self.success = success;
    }
}

/// Aggregated per-task metrics updated each time a task is invoked.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskMetricAggregate {
    /// Which profile the task belongs to.
    pub profiles_index: usize,
    /// The profile name.
    pub profile_name: String,
    /// Which task this is within the profile.
    pub tasks_index: usize,
    /// The task name.
    pub task_name: String,
    /// Per-run-time counters, rounded the same way as response times.
    pub times: BTreeMap<usize, usize>,
    /// The shortest run-time for this task.
    pub min_time: usize,
    /// The longest run-time for this task.
    pub max_time: usize,
    /// Total combined run-times for this task.
    pub total_time: usize,
    /// Total number of times task has run.
    pub counter: usize,
    /// Total number of times task has run successfully.
    pub success_count: usize,
    /// Total number of times task has failed.
    pub fail_count: usize,
}
impl TaskMetricAggregate {
    pub(crate) fn new(
        profiles_index: usize,
        profile_name: &str,
        tasks_index: usize,
        task_name: &str,
    ) -> Self {
        TaskMetricAggregate {
            profiles_index,
            profile_name: profile_name.to_string(),
            tasks_index,
            task_name: task_name.to_string(),
            times: BTreeMap::new(),
            min_time: 0,
            max_time: 0,
            total_time: 0,
            counter: 0,
            success_count: 0,
            fail_count: 0,
        }
    }

    /// Track task function elapsed time in milliseconds.
    pub(crate) fn set_time(&mut self, time: u64, success: bool) {
        let time_usize = time as usize;

        if self.min_time == 0 || time_usize < self.min_time {
            self.min_time = time_usize;
        }
        if time_usize > self.max_time {
            self.max_time = time_usize;
        }
        self.total_time += time_usize;
        self.counter += 1;

        if success {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }

        *self.times.entry(round_time(time)).or_insert(0) += 1;
    }
}

/// For tracking and counting errors detected during a load test.
///
/// Errors that share the same request method, the same request name, and the same
/// error text are counted together. For example, browsing a product that doesn't
/// exist:
/// ```text
/// ErrorMetric {
///     method: Get,
///     name: "/products/2",
///     error: "404 Not Found",
///     occurrences: 18,
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ErrorMetric {
    /// The method that resulted in an error.
    pub method: RequestMethod,
    /// The name of the request.
    pub name: String,
    /// The error string.
    pub error: String,
    /// How many times this error occurred.
    pub occurrences: usize,
}
impl ErrorMetric {
    pub(crate) fn new(method: RequestMethod, name: String, error: String) -> Self {
        ErrorMetric {
            method,
            name,
            error,
            occurrences: 0,
        }
    }
}

/// All metrics collected during a load test.
///
/// Returned by [`SwarmAttack::execute()`](../struct.SwarmAttack.html#method.execute)
/// when the load test finishes. When viewed with [`std::fmt::Display`] the metrics
/// are rendered as a series of tables.
#[derive(Clone, Debug, Default)]
pub struct SwarmMetrics {
    /// When the load test started.
    pub started: Option<DateTime<Local>>,
    /// How many seconds the load test ran.
    pub duration: usize,
    /// Total number of users simulated during this load test.
    pub users: usize,
    /// The host the load test ran against, when a single host was used.
    pub host: String,
    /// Aggregated request metrics.
    pub requests: SwarmRequestMetrics,
    /// Aggregated task metrics.
    pub tasks: SwarmTaskMetrics,
    /// Summary of errors seen.
    pub errors: SwarmErrorMetrics,
    /// Whether these are the final metrics, which include percentiles and errors.
    pub(crate) final_metrics: bool,
}
impl SwarmMetrics {
    /// Initialize the task metrics vectors, one entry per registered task.
    pub(crate) fn initialize_task_metrics(&mut self, profiles: &[Profile]) {
        self.tasks = profiles
            .iter()
            .map(|profile| {
                profile
                    .tasks
                    .iter()
                    .map(|task| {
                        TaskMetricAggregate::new(
                            profile.profiles_index,
                            &profile.name,
                            task.tasks_index,
                            &task.name,
                        )
                    })
                    .collect()
            })
            .collect();
    }

    /// Merge a [`RequestMetric`] into the matching [`RequestMetricAggregate`],
    /// recording an error if the request failed.
    pub(crate) fn record_request(&mut self, request_metric: &RequestMetric) {
        if !request_metric.error.is_empty() {
            self.record_error(request_metric);
        }

        let key = format!("{} {}", request_metric.method, request_metric.name);
        let merge_request = self.requests.entry(key).or_insert_with(|| {
            RequestMetricAggregate::new(&request_metric.name, request_metric.method.clone())
        });
        merge_request.set_response_time(request_metric.response_time);
        merge_request.set_status_code(request_metric.status_code);
        if request_metric.success {
            merge_request.success_count += 1;
        } else {
            merge_request.fail_count += 1;
        }
    }

    /// Merge a [`TaskMetric`] into the matching [`TaskMetricAggregate`].
    pub(crate) fn record_task(&mut self, task_metric: &TaskMetric) {
        match self
            .tasks
            .get_mut(task_metric.profiles_index)
            .and_then(|profile| profile.get_mut(task_metric.tasks_index))
        {
            Some(task) => task.set_time(task_metric.run_time, task_metric.success),
            None => warn!(
                "received metric for unknown task {}:{}",
                task_metric.profiles_index, task_metric.tasks_index
            ),
        }
    }

    fn record_error(&mut self, raw_request: &RequestMetric) {
        // Create a string to uniquely identify errors for tracking metrics.
        let error_string = format!(
            "{}.{}.{}",
            raw_request.error, raw_request.method, raw_request.name
        );
        self.errors
            .entry(error_string)
            .or_insert_with(|| {
                ErrorMetric::new(
                    raw_request.method.clone(),
                    raw_request.name.to_string(),
                    raw_request.error.to_string(),
                )
            })
            .occurrences += 1;
    }

    /// Display the final metrics of a completed load test.
    pub fn print(&self) {
        info!("printing final metrics after {} seconds...", self.duration);
        print!("{}", self);
    }

    /// Display metrics while a load test is running.
    pub(crate) fn print_running(&self) {
        info!(
            "printing running metrics after {} seconds...",
            self.duration
        );
        // Include a blank line after printing running metrics.
        println!("{}", self);
    }

    /// Write the metrics to `path` as pretty-printed JSON.
    pub(crate) async fn write_report(&self, path: &str) -> Result<(), SwarmError> {
        let report = serde_json::to_string_pretty(self)?;
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(report.as_bytes()).await?;
        file.flush().await?;
        info!("wrote metrics report to: {}", path);
        Ok(())
    }

    fn fmt_tasks(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tasks.iter().all(|profile| profile.is_empty()) {
            return Ok(());
        }

        writeln!(
            fmt,
            "\n === PER TASK METRICS ===\n ------------------------------------------------------------------------------"
        )?;
        writeln!(
            fmt,
            " {:<24} | {:>13} | {:>14} | {:>8} | {:>7}",
            "Name", "# times run", "# fails", "task/s", "fail/s"
        )?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        let mut aggregate_fail_count = 0;
        let mut aggregate_total_count = 0;
        let mut task_count = 0;
        for profile in &self.tasks {
            let mut displayed_profile = false;
            for task in profile {
                task_count += 1;
                let total_count = task.success_count + task.fail_count;

                // First time through display name of profile.
                if !displayed_profile {
                    writeln!(
                        fmt,
                        " {:24 } |",
                        util::truncate_string(
                            &format!("{}: {}", task.profiles_index + 1, &task.profile_name),
                            60
                        ),
                    )?;
                    displayed_profile = true;
                }

                self.fmt_count_row(
                    fmt,
                    &format!("  {}: {}", task.tasks_index + 1, task.task_name),
                    total_count,
                    task.fail_count,
                )?;
                aggregate_total_count += total_count;
                aggregate_fail_count += task.fail_count;
            }
        }
        if task_count > 1 {
            writeln!(
                fmt,
                " -------------------------+---------------+----------------+----------+--------"
            )?;
            self.fmt_count_row(
                fmt,
                "Aggregated",
                aggregate_total_count,
                aggregate_fail_count,
            )?;
        }

        Ok(())
    }

    fn fmt_requests(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requests.is_empty() {
            return Ok(());
        }

        writeln!(
            fmt,
            "\n === PER REQUEST METRICS ===\n ------------------------------------------------------------------------------"
        )?;
        writeln!(
            fmt,
            " {:<24} | {:>13} | {:>14} | {:>8} | {:>7}",
            "Name", "# reqs", "# fails", "req/s", "fail/s"
        )?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        let mut aggregate_fail_count = 0;
        let mut aggregate_total_count = 0;
        for (request_key, request) in self.requests.iter().sorted() {
            let total_count = request.success_count + request.fail_count;
            self.fmt_count_row(fmt, request_key, total_count, request.fail_count)?;
            aggregate_total_count += total_count;
            aggregate_fail_count += request.fail_count;
        }
        if self.requests.len() > 1 {
            writeln!(
                fmt,
                " -------------------------+---------------+----------------+----------+--------"
            )?;
            self.fmt_count_row(
                fmt,
                "Aggregated",
                aggregate_total_count,
                aggregate_fail_count,
            )?;
        }

        Ok(())
    }

    // One row of counts, fails and rates, shared by the task and request tables.
    fn fmt_count_row(
        &self,
        fmt: &mut fmt::Formatter<'_>,
        name: &str,
        total_count: usize,
        fail_count: usize,
    ) -> fmt::Result {
        let fail_percent = if fail_count > 0 {
            fail_count as f32 / total_count as f32 * 100.0
        } else {
            0.0
        };
        // Compress 100.0 and 0.0 to 100 and 0 respectively to save width.
        let fails = if fail_percent as usize == 100 || fail_percent as usize == 0 {
            format!("{} ({}%)", format_number(fail_count), fail_percent as usize)
        } else {
            format!("{} ({:.1}%)", format_number(fail_count), fail_percent)
        };
        let (per_second, fails_per_second) =
            per_second_calculations(self.duration, total_count, fail_count);
        writeln!(
            fmt,
            " {:<24} | {:>13} | {:>14} | {:>8.reqs_p$} | {:>7.fails_p$}",
            util::truncate_string(name, 24),
            format_number(total_count),
            fails,
            per_second,
            fails_per_second,
            reqs_p = determine_precision(per_second),
            fails_p = determine_precision(fails_per_second),
        )
    }

    fn fmt_response_times(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requests.is_empty() {
            return Ok(());
        }

        let mut aggregate = RequestMetricAggregate::new("", RequestMethod::Get);
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        writeln!(
            fmt,
            " {:<24} | {:>11} | {:>10} | {:>11} | {:>10}",
            "Name", "Avg (ms)", "Min", "Max", "Median"
        )?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        for (request_key, request) in self.requests.iter().sorted() {
            merge_aggregate(&mut aggregate, request);
            fmt_response_time_row(fmt, request_key, request)?;
        }
        if self.requests.len() > 1 {
            writeln!(
                fmt,
                " -------------------------+-------------+------------+-------------+-----------"
            )?;
            fmt_response_time_row(fmt, "Aggregated", &aggregate)?;
        }

        Ok(())
    }

    fn fmt_percentiles(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only include percentiles when displaying the final metrics report.
        if !self.final_metrics || self.requests.is_empty() {
            return Ok(());
        }

        let mut aggregate = RequestMetricAggregate::new("", RequestMethod::Get);
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        writeln!(
            fmt,
            " Slowest page load within specified percentile of requests (in ms):"
        )?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        writeln!(
            fmt,
            " {:<24} | {:>6} | {:>6} | {:>6} | {:>6} | {:>6} | {:>6}",
            "Name", "50%", "75%", "98%", "99%", "99.9%", "99.99%"
        )?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        for (request_key, request) in self.requests.iter().sorted() {
            merge_aggregate(&mut aggregate, request);
            fmt_percentile_row(fmt, request_key, request)?;
        }
        if self.requests.len() > 1 {
            writeln!(
                fmt,
                " -------------------------+--------+--------+--------+--------+--------+-------"
            )?;
            fmt_percentile_row(fmt, "Aggregated", &aggregate)?;
        }

        Ok(())
    }

    fn fmt_status_codes(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requests.is_empty() {
            return Ok(());
        }

        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        writeln!(fmt, " {:<24} | {:>51} ", "Name", "Status codes")?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;
        let mut aggregated_status_code_counts: BTreeMap<u16, usize> = BTreeMap::new();
        for (request_key, request) in self.requests.iter().sorted() {
            for (status_code, count) in &request.status_code_counts {
                *aggregated_status_code_counts.entry(*status_code).or_insert(0) += count;
            }
            writeln!(
                fmt,
                " {:<24} | {:>51}",
                util::truncate_string(request_key, 24),
                prepare_status_codes(&request.status_code_counts),
            )?;
        }
        writeln!(
            fmt,
            " -------------------------+----------------------------------------------------"
        )?;
        writeln!(
            fmt,
            " {:<24} | {:>51} ",
            "Aggregated",
            prepare_status_codes(&aggregated_status_code_counts)
        )?;

        Ok(())
    }

    fn fmt_errors(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only include errors when displaying the final metrics report, and if there are
        // errors to display.
        if !self.final_metrics || self.errors.is_empty() {
            return Ok(());
        }

        writeln!(
            fmt,
            "\n === ERRORS ===\n ------------------------------------------------------------------------------"
        )?;
        writeln!(fmt, " {:<11} | Error", "Count")?;
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;

        // Display the error occurring the most first.
        for (occurrences, error) in self
            .errors
            .values()
            .map(|error| {
                (
                    error.occurrences,
                    format!("{} {}: {}", error.method, error.name, error.error),
                )
            })
            .sorted()
            .rev()
        {
            writeln!(fmt, " {:<12}  {}", format_number(occurrences), error)?;
        }

        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )?;

        Ok(())
    }

    fn fmt_overview(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.final_metrics {
            return Ok(());
        }

        writeln!(
            fmt,
            "\n === OVERVIEW ===\n ------------------------------------------------------------------------------"
        )?;
        if let Some(started) = self.started {
            writeln!(
                fmt,
                " Started: {}",
                started.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        writeln!(fmt, " Duration: {} seconds", format_number(self.duration))?;
        writeln!(fmt, " Users: {}", format_number(self.users))?;
        if !self.host.is_empty() {
            writeln!(fmt, " Target host: {}", self.host)?;
        }
        writeln!(
            fmt,
            " ------------------------------------------------------------------------------"
        )
    }
}

impl Serialize for SwarmMetrics {
    // Can't be derived because of the started field.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("SwarmMetrics", 7)?;
        // Convert started field to a unix timestamp.
        let timestamp = match self.started {
            Some(started) => started.timestamp(),
            None => 0,
        };
        s.serialize_field("started", &timestamp)?;
        s.serialize_field("duration", &self.duration)?;
        s.serialize_field("users", &self.users)?;
        s.serialize_field("host", &self.host)?;
        s.serialize_field("requests", &self.requests)?;
        s.serialize_field("tasks", &self.tasks)?;
        s.serialize_field("errors", &self.errors)?;
        s.end()
    }
}

/// Implement format trait to allow displaying metrics.
impl fmt::Display for SwarmMetrics {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_tasks(fmt)?;
        self.fmt_requests(fmt)?;
        self.fmt_response_times(fmt)?;
        self.fmt_percentiles(fmt)?;
        self.fmt_status_codes(fmt)?;
        self.fmt_errors(fmt)?;
        self.fmt_overview(fmt)
    }
}

impl SwarmAttack {
    // Receive metrics from users, and display running metrics when the timer
    // expires. If flush is true every pending message is received regardless of
    // how long it takes.
    pub(crate) fn sync_metrics(&mut self, run_state: &mut SwarmAttackRunState, flush: bool) {
        if let Some(running_metrics) = self.configuration.running_metrics {
            if util::timer_expired(run_state.running_metrics_timer, running_metrics) {
                run_state.running_metrics_timer = Instant::now();
                run_state.display_running_metrics = true;
            }
        }

        self.receive_metrics(run_state, flush);

        if run_state.display_running_metrics {
            run_state.display_running_metrics = false;
            self.update_duration();
            self.metrics.print_running();
        }
    }

    // Drain the metrics channel. Unless flushing, stop after RECEIVE_TIMEOUT
    // milliseconds so the main loop keeps its cadence.
    fn receive_metrics(&mut self, run_state: &mut SwarmAttackRunState, flush: bool) -> bool {
        let mut received_message = false;
        let receive_started = Instant::now();

        while let Ok(message) = run_state.metrics_rx.try_recv() {
            received_message = true;
            match message {
                SwarmMetric::Request(request_metric) => {
                    self.metrics.record_request(&request_metric);
                }
                SwarmMetric::Task(task_metric) => {
                    self.metrics.record_task(&task_metric);
                }
            }
            if !flush && util::ms_timer_expired(receive_started, RECEIVE_TIMEOUT) {
                break;
            }
        }

        received_message
    }

    // Update metrics showing how long the load test has been running.
    pub(crate) fn update_duration(&mut self) {
        self.metrics.duration = match self.started {
            Some(started) => started.elapsed().as_secs() as usize,
            None => 0,
        };
    }
}

// Round the time so similar times are combined. No rounding under 100ms, nearest
// 10ms under 500ms, nearest 100ms under 1000ms, otherwise nearest 1000ms.
fn round_time(time: u64) -> usize {
    if time < 100 {
        time as usize
    } else if time < 500 {
        ((time as f64 / 10.0).round() * 10.0) as usize
    } else if time < 1000 {
        ((time as f64 / 100.0).round() * 100.0) as usize
    } else {
        ((time as f64 / 1000.0).round() * 1000.0) as usize
    }
}

// Merge one request's response times into a running aggregate.
fn merge_aggregate(aggregate: &mut RequestMetricAggregate, request: &RequestMetricAggregate) {
    for (response_time, count) in &request.response_times {
        *aggregate.response_times.entry(*response_time).or_insert(0) += count;
    }
    aggregate.total_response_time += request.total_response_time;
    aggregate.response_time_counter += request.response_time_counter;
    aggregate.min_response_time =
        update_min_time(aggregate.min_response_time, request.min_response_time);
    aggregate.max_response_time =
        update_max_time(aggregate.max_response_time, request.max_response_time);
}

fn fmt_response_time_row(
    fmt: &mut fmt::Formatter<'_>,
    name: &str,
    request: &RequestMetricAggregate,
) -> fmt::Result {
    let average = match request.response_time_counter {
        0 => 0.0,
        _ => request.total_response_time as f32 / request.response_time_counter as f32,
    };
    writeln!(
        fmt,
        " {:<24} | {:>11.avg_precision$} | {:>10} | {:>11} | {:>10}",
        util::truncate_string(name, 24),
        average,
        format_number(request.min_response_time),
        format_number(request.max_response_time),
        percentile(request, 0.5),
        avg_precision = determine_precision(average),
    )
}

fn fmt_percentile_row(
    fmt: &mut fmt::Formatter<'_>,
    name: &str,
    request: &RequestMetricAggregate,
) -> fmt::Result {
    writeln!(
        fmt,
        " {:<24} | {:>6} | {:>6} | {:>6} | {:>6} | {:>6} | {:>6}",
        util::truncate_string(name, 24),
        percentile(request, 0.5),
        percentile(request, 0.75),
        percentile(request, 0.98),
        percentile(request, 0.99),
        percentile(request, 0.999),
        percentile(request, 0.9999),
    )
}

fn percentile(request: &RequestMetricAggregate, percent: f32) -> String {
    calculate_response_time_percentile(
        &request.response_times,
        request.response_time_counter,
        request.min_response_time,
        request.max_response_time,
        percent,
    )
}

/// Helper to calculate requests and fails per seconds.
pub(crate) fn per_second_calculations(duration: usize, total: usize, fail: usize) -> (f32, f32) {
    if duration == 0 {
        (0.0, 0.0)
    } else {
        (
            total as f32 / duration as f32,
            fail as f32 / duration as f32,
        )
    }
}

fn determine_precision(value: f32) -> usize {
    if value < 1000.0 {
        2
    } else {
        0
    }
}

/// Format large number in locale appropriate style.
pub(crate) fn format_number(number: usize) -> String {
    (number).to_formatted_string(&Locale::en)
}

/// A helper function to update the global minimum time based on local time.
pub(crate) fn update_min_time(mut global_min: usize, min: usize) -> usize {
    if global_min == 0 || (min > 0 && min < global_min) {
        global_min = min;
    }
    global_min
}

/// A helper function to update the global maximum time based on local time.
pub(crate) fn update_max_time(mut global_max: usize, max: usize) -> usize {
    if global_max < max {
        global_max = max;
    }
    global_max
}

/// Get the response time that a certain number of percent of the requests finished within.
pub(crate) fn calculate_response_time_percentile(
    response_times: &BTreeMap<usize, usize>,
    total_requests: usize,
    min: usize,
    max: usize,
    percent: f32,
) -> String {
    let percentile_request = (total_requests as f32 * percent).round() as usize;
    debug!(
        "percentile: {}, request {} of total {}",
        percent, percentile_request, total_requests
    );

    let mut total_count: usize = 0;

    for (value, counter) in response_times {
        total_count += counter;
        if total_count >= percentile_request {
            if *value < min {
                return format_number(min);
            } else if *value > max {
                return format_number(max);
            } else {
                return format_number(*value);
            }
        }
    }
    format_number(0)
}

/// Render status code counts as `"18 [200], 2 [404]"`.
pub(crate) fn prepare_status_codes(status_code_counts: &BTreeMap<u16, usize>) -> String {
    status_code_counts
        .iter()
        .map(|(status_code, count)| format!("{} [{}]", format_number(*count), status_code))
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn max_response_time() {
        let mut max_response_time = 99;
        // Update max response time to a higher value.
        max_response_time = update_max_time(max_response_time, 101);
        assert_eq!(max_response_time, 101);
        // Max response time doesn't update when updating with a lower value.
        max_response_time = update_max_time(max_response_time, 1);
        assert_eq!(max_response_time, 101);
    }

    #[test]
    fn min_response_time() {
        let mut min_response_time = 11;
        min_response_time = update_min_time(min_response_time, 9);
        assert_eq!(min_response_time, 9);
        min_response_time = update_min_time(min_response_time, 22);
        assert_eq!(min_response_time, 9);
        // A 0 value is ignored.
        min_response_time = update_min_time(min_response_time, 0);
        assert_eq!(min_response_time, 9);
    }

    #[test]
    fn max_response_time_percentile() {
        let mut response_times: BTreeMap<usize, usize> = BTreeMap::new();
        response_times.insert(1, 1);
        response_times.insert(2, 1);
        response_times.insert(3, 1);
        // 3 * .5 = 1.5, rounds to 2.
        assert_eq!(calculate_response_time_percentile(&response_times, 3, 1, 3, 0.5), "2");
        response_times.insert(3, 2);
        // 4 * .5 = 2
        assert_eq!(calculate_response_time_percentile(&response_times, 4, 1, 3, 0.5), "2");
        // 4 * .25 = 1
        assert_eq!(calculate_response_time_percentile(&response_times, 4, 1, 3, 0.25), "1");
        // 4 * .75 = 3
        assert_eq!(calculate_response_time_percentile(&response_times, 4, 1, 3, 0.75), "3");
        // 4 * .75 = 3, but uses specified maximum of 2
        assert_eq!(calculate_response_time_percentile(&response_times, 4, 1, 2, 0.75), "2");

        response_times.insert(10, 25);
        response_times.insert(20, 25);
        response_times.insert(30, 25);
        response_times.insert(50, 25);
        response_times.insert(100, 10);
        response_times.insert(200, 1);
        assert_eq!(calculate_response_time_percentile(&response_times, 115, 1, 200, 0.9), "50");
        assert_eq!(calculate_response_time_percentile(&response_times, 115, 1, 200, 0.99), "100");
        assert_eq!(calculate_response_time_percentile(&response_times, 115, 1, 200, 0.999), "200");
    }

    #[test]
    fn calculate_per_second() {
        // With duration of 0, requests and fails per second is always 0.
        let (requests_per_second, fails_per_second) = per_second_calculations(0, 10, 10);
        assert!(requests_per_second == 0.0);
        assert!(fails_per_second == 0.0);

        let (requests_per_second, fails_per_second) = per_second_calculations(10, 100, 10);
        assert!((requests_per_second - 10.0).abs() < f32::EPSILON);
        assert!((fails_per_second - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn request_metric() {
        const URL: &str = "http://127.0.0.1:8080/products/1";
        let mut raw_request = RequestMetric::new(RequestMethod::Get, "/products/1", URL, 0, 0);
        assert_eq!(raw_request.method, RequestMethod::Get);
        assert_eq!(raw_request.name, "/products/1");
        assert_eq!(raw_request.url, URL);
        assert_eq!(raw_request.response_time, 0);
        assert_eq!(raw_request.status_code, 0);
        assert!(raw_request.success);

        raw_request.set_response_time(123);
        assert_eq!(raw_request.response_time, 123);

        raw_request.set_status_code(Some(StatusCode::NOT_FOUND));
        assert_eq!(raw_request.status_code, 404);
        raw_request.set_status_code(None);
        assert_eq!(raw_request.status_code, 0);
    }

    #[test]
    fn request_aggregate() {
        let mut request = RequestMetricAggregate::new("/products/1", RequestMethod::Get);
        assert_eq!(request.response_times.len(), 0);

        request.set_response_time(1);
        request.set_response_time(10);
        request.set_response_time(10);
        assert_eq!(request.response_times[&10], 2);
        assert_eq!(request.min_response_time, 1);
        assert_eq!(request.max_response_time, 10);
        assert_eq!(request.total_response_time, 21);
        assert_eq!(request.response_time_counter, 3);

        // Rounded to the nearest 10.
        request.set_response_time(101);
        request.set_response_time(102);
        assert_eq!(request.response_times[&100], 2);
        request.set_response_time(155);
        assert_eq!(request.response_times[&160], 1);
        // Rounded to the nearest 100.
        request.set_response_time(733);
        assert_eq!(request.response_times[&700], 1);
        // Rounded to the nearest 1000.
        request.set_response_time(2345);
        assert_eq!(request.response_times[&2000], 1);
        // Maximum is the actual maximum, not rounded.
        assert_eq!(request.max_response_time, 2345);

        request.set_status_code(200);
        request.set_status_code(200);
        request.set_status_code(404);
        assert_eq!(request.status_code_counts[&200], 2);
        assert_eq!(request.status_code_counts[&404], 1);
        assert_eq!(prepare_status_codes(&request.status_code_counts), "2 [200], 1 [404]");
    }

    #[test]
    fn record_metrics() {
        let mut metrics = SwarmMetrics::default();
        let mut ok = RequestMetric::new(RequestMethod::Get, "/products/1", "", 0, 0);
        ok.set_status_code(Some(StatusCode::OK));
        let mut missing = RequestMetric::new(RequestMethod::Get, "/products/2", "", 0, 0);
        missing.set_status_code(Some(StatusCode::NOT_FOUND));
        missing.success = false;
        missing.error = StatusCode::NOT_FOUND.to_string();

        metrics.record_request(&ok);
        metrics.record_request(&missing);
        metrics.record_request(&missing);

        assert_eq!(metrics.requests["GET /products/1"].success_count, 1);
        assert_eq!(metrics.requests["GET /products/2"].fail_count, 2);
        assert_eq!(metrics.errors.len(), 1);
        let error = metrics.errors.values().next().unwrap();
        assert_eq!(error.occurrences, 2);
        assert_eq!(error.error, "404 Not Found");

        // Task metrics for unknown tasks are ignored.
        metrics.record_task(&TaskMetric::new(0, 3, 3, "missing".to_string(), 0));
        assert!(metrics.tasks.is_empty());

        // The tables render without the final-only sections.
        let running = metrics.to_string();
        assert!(running.contains("PER REQUEST METRICS"));
        assert!(!running.contains("ERRORS"));
        metrics.final_metrics = true;
        let final_report = metrics.to_string();
        assert!(final_report.contains("=== ERRORS ==="));
        assert!(final_report.contains("GET /products/2: 404 Not Found"));
    }
}
