//! Functions and structures related to configuring a load test.
//!
//! A load test can be configured at run time by passing in the options and flags
//! defined by the [`SwarmConfiguration`] structure.
//!
//! It can also be configured programmatically with [`SwarmDefaultType::set_default`].
//! Options passed on the command line always take precedence over programmatic
//! defaults.

use gumdrop::Options;
use serde::{Deserialize, Serialize};
use simplelog::*;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::util;
use crate::{SwarmAttack, SwarmError};

/// Runtime options available when launching a load test.
///
/// Custom defaults can be programmatically set for most of these options using
/// [`SwarmDefaultType::set_default`].
///
/// Help is generated for all of these options by passing a `-h` flag. The help is
/// derived from this structure with [`gumdrop`](https://docs.rs/gumdrop/).
#[derive(Options, Debug, Clone, Default, Serialize, Deserialize)]
#[options(
    help = r#"Simulates shoppers browsing and updating products in an online store.

The following runtime options are available when launching the load test:"#
)]
pub struct SwarmConfiguration {
    /// Displays this help
    #[options(short = "h")]
    pub help: bool,
    /// Prints version information
    #[options(short = "V")]
    pub version: bool,
    /// Lists all tasks and exits
    // Add a blank line after this option
    #[options(short = "l", help = "Lists all tasks and exits\n")]
    pub list: bool,

    /// Defines host to load test (ie http://10.21.32.33)
    #[options(short = "H")]
    pub host: String,
    /// Sets concurrent users (default: number of CPUs)
    #[options(short = "u")]
    pub users: Option<usize>,
    /// Sets per-second user hatch rate (default: 1)
    #[options(short = "r", meta = "RATE")]
    pub hatch_rate: Option<String>,
    /// Stops load test after (30s, 20m, 3h, 1h30m, etc)
    #[options(short = "t", meta = "TIME")]
    pub run_time: String,
    /// Sets how many times each user runs a task then exits
    #[options(no_short, meta = "COUNT")]
    pub iterations: usize,
    /// Only runs tasks with these tags ("view,update")
    #[options(short = "T", meta = "\"TAGS\"")]
    pub tags: Tags,
    /// Never runs tasks with these tags ("view,update")
    #[options(short = "E", meta = "\"TAGS\"")]
    pub exclude_tags: Tags,
    /// Enables log file and sets name
    #[options(short = "G", meta = "NAME")]
    pub log_file: String,
    /// Increases log file level (-g, -gg, etc)
    #[options(short = "g", count)]
    pub log_level: u8,
    /// Decreases verbosity (-q, -qq, etc)
    #[options(count, short = "q", help = "Decreases verbosity (-q, -qq, etc)")]
    pub quiet: u8,
    /// Increases verbosity (-v, -vv, etc)
    #[options(
        count,
        short = "v",
        // Add a blank line and then a 'Metrics:' header after this option
        help = "Increases verbosity (-v, -vv, etc)\n\nMetrics:"
    )]
    pub verbose: u8,

    /// How often to optionally print running metrics
    #[options(no_short, meta = "TIME")]
    pub running_metrics: Option<usize>,
    /// Doesn't display metrics at end of load test
    #[options(no_short)]
    pub no_print_metrics: bool,
    /// Writes final metrics as JSON to this file
    #[options(
        no_short,
        meta = "NAME",
        help = "Writes final metrics as JSON to this file\n\nAdvanced:"
    )]
    pub report_file: String,

    /// Sets per-request timeout, in seconds (default: 60)
    #[options(no_short, meta = "VALUE")]
    pub timeout: Option<String>,
}

/// A set of task tags, used to enable or disable tasks at run time.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    pub active: Vec<String>,
}
impl Tags {
    /// Whether `tag` is in the set, ignoring case.
    pub fn contains(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.active.iter().any(|active| active == &tag)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
/// Implement [`FromStr`] to convert `"foo,bar"` comma separated string to a set of tags.
impl FromStr for Tags {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut active: Vec<String> = Vec::new();
        for line in s.split(',') {
            // Ignore white space and case.
            let tag = line.trim().to_lowercase();
            if tag.is_empty() {
                continue;
            }
            // Valid tags are alphanumeric, and may include dashes and underscores.
            if tag
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
            {
                if !active.contains(&tag) {
                    active.push(tag);
                }
            } else {
                // Logger isn't initialized yet, provide helpful debug output.
                eprintln!("ERROR: invalid tag: '{}'", line);
                eprintln!("  Expected format: --tags \"{{one}},{{two}},{{three}}\"");
                eprintln!("    {{one}}, {{two}}, {{three}}, etc must be alphanumeric");
                eprintln!("    To view the tags of each task invoke `--list`");
                return Err(SwarmError::InvalidOption {
                    option: "`configuration.tags`".to_string(),
                    value: line.to_string(),
                    detail: "invalid tag value.".to_string(),
                });
            }
        }
        Ok(Tags { active })
    }
}
impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.active.join(","))
    }
}

/// Optional default values for run-time options.
///
/// These custom defaults can be configured using [`SwarmDefaultType::set_default()`].
#[derive(Clone, Debug, Default)]
pub(crate) struct SwarmDefaults {
    /// An optional default host to run this load test against.
    pub host: Option<String>,
    /// An optional default number of users to simulate.
    pub users: Option<usize>,
    /// An optional default number of clients to start per second.
    pub hatch_rate: Option<String>,
    /// An optional default number of seconds for the test to run.
    pub run_time: Option<usize>,
    /// An optional default number of iterations each user runs.
    pub iterations: Option<usize>,
    /// Optional default tags to include.
    pub tags: Option<Tags>,
    /// Optional default tags to exclude.
    pub exclude_tags: Option<Tags>,
    /// An optional default log file name.
    pub log_file: Option<String>,
    /// An optional default log file level.
    pub log_level: Option<u8>,
    /// An optional default for how quiet the output is.
    pub quiet: Option<u8>,
    /// An optional default for how verbose the output is.
    pub verbose: Option<u8>,
    /// An optional default for printing running metrics.
    pub running_metrics: Option<usize>,
    /// An optional default for not displaying metrics at the end of the load test.
    pub no_print_metrics: Option<bool>,
    /// An optional default for the JSON report file name.
    pub report_file: Option<String>,
    /// An optional default number of seconds to timeout requests.
    pub timeout: Option<String>,
}

/// Defines all [`SwarmConfiguration`] options that can be programmatically configured
/// with a custom default.
#[derive(Debug)]
pub enum SwarmDefault {
    /// An optional default host to run this load test against.
    Host,
    /// An optional default number of users to simulate.
    Users,
    /// An optional default number of clients to start per second.
    HatchRate,
    /// An optional default number of seconds for the test to run.
    RunTime,
    /// An optional default number of iterations each user runs.
    Iterations,
    /// Optional default tags to include.
    Tags,
    /// Optional default tags to exclude.
    ExcludeTags,
    /// An optional default log file name.
    LogFile,
    /// An optional default log file level.
    LogLevel,
    /// An optional default for how quiet the output is.
    Quiet,
    /// An optional default for how verbose the output is.
    Verbose,
    /// An optional default for printing running metrics.
    RunningMetrics,
    /// An optional default for not displaying metrics at the end of the load test.
    NoPrintMetrics,
    /// An optional default for the JSON report file name.
    ReportFile,
    /// An optional default number of seconds to timeout requests.
    Timeout,
}

/// Most run-time options can be programmatically configured with custom defaults.
///
/// The following options can be configured with a custom default using a `&str`:
///  - [`SwarmDefault::Host`]
///  - [`SwarmDefault::HatchRate`]
///  - [`SwarmDefault::Tags`]
///  - [`SwarmDefault::ExcludeTags`]
///  - [`SwarmDefault::LogFile`]
///  - [`SwarmDefault::ReportFile`]
///  - [`SwarmDefault::Timeout`]
///
/// The following options can be configured with a custom default using a `usize`:
///  - [`SwarmDefault::Users`]
///  - [`SwarmDefault::RunTime`]
///  - [`SwarmDefault::Iterations`]
///  - [`SwarmDefault::LogLevel`]
///  - [`SwarmDefault::Quiet`]
///  - [`SwarmDefault::Verbose`]
///  - [`SwarmDefault::RunningMetrics`]
///
/// The following flags can be configured with a custom default using a `bool`:
///  - [`SwarmDefault::NoPrintMetrics`]
pub trait SwarmDefaultType<T> {
    /// Sets a [`SwarmDefault`] to the provided value.
    ///
    /// # Example
    /// ```rust
    /// use storefront_swarm::prelude::*;
    ///
    /// fn main() -> Result<(), SwarmError> {
    ///     SwarmAttack::initialize()?
    ///         // Only run tasks tagged `view`.
    ///         .set_default(SwarmDefault::Tags, "view")?
    ///         // Do not display info level logs while the test runs.
    ///         .set_default(SwarmDefault::Quiet, 1)?;
    ///
    ///     Ok(())
    /// }
    /// ```
    fn set_default(self, key: SwarmDefault, value: T) -> Result<Box<Self>, SwarmError>;
}
impl SwarmDefaultType<&str> for SwarmAttack {
    /// Sets [`SwarmDefault`] to a [`&str`] value.
    fn set_default(mut self, key: SwarmDefault, value: &str) -> Result<Box<Self>, SwarmError> {
        match key {
            SwarmDefault::Host => {
                self.defaults.host = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            SwarmDefault::HatchRate => self.defaults.hatch_rate = Some(value.to_string()),
            SwarmDefault::Tags => self.defaults.tags = Some(value.parse::<Tags>()?),
            SwarmDefault::ExcludeTags => {
                self.defaults.exclude_tags = Some(value.parse::<Tags>()?)
            }
            SwarmDefault::LogFile => self.defaults.log_file = Some(value.to_string()),
            SwarmDefault::ReportFile => self.defaults.report_file = Some(value.to_string()),
            SwarmDefault::Timeout => self.defaults.timeout = Some(value.to_string()),
            // Otherwise display a helpful and explicit error.
            SwarmDefault::Users
            | SwarmDefault::RunTime
            | SwarmDefault::Iterations
            | SwarmDefault::LogLevel
            | SwarmDefault::Quiet
            | SwarmDefault::Verbose
            | SwarmDefault::RunningMetrics => {
                return Err(SwarmError::InvalidOption {
                    option: format!("SwarmDefault::{:?}", key),
                    value: value.to_string(),
                    detail: format!(
                        "set_default(SwarmDefault::{:?}, {}) expected usize value, received &str",
                        key, value
                    ),
                })
            }
            SwarmDefault::NoPrintMetrics => {
                return Err(SwarmError::InvalidOption {
                    option: format!("SwarmDefault::{:?}", key),
                    value: value.to_string(),
                    detail: format!(
                        "set_default(SwarmDefault::{:?}, {}) expected bool value, received &str",
                        key, value
                    ),
                })
            }
        }
        Ok(Box::new(self))
    }
}
impl SwarmDefaultType<usize> for SwarmAttack {
    /// Sets [`SwarmDefault`] to a [`usize`] value.
    fn set_default(mut self, key: SwarmDefault, value: usize) -> Result<Box<Self>, SwarmError> {
        match key {
            SwarmDefault::Users => self.defaults.users = Some(value),
            SwarmDefault::RunTime => self.defaults.run_time = Some(value),
            SwarmDefault::Iterations => self.defaults.iterations = Some(value),
            SwarmDefault::LogLevel => self.defaults.log_level = Some(value as u8),
            SwarmDefault::Quiet => self.defaults.quiet = Some(value as u8),
            SwarmDefault::Verbose => self.defaults.verbose = Some(value as u8),
            SwarmDefault::RunningMetrics => self.defaults.running_metrics = Some(value),
            // Otherwise display a helpful and explicit error.
            SwarmDefault::Host
            | SwarmDefault::HatchRate
            | SwarmDefault::Tags
            | SwarmDefault::ExcludeTags
            | SwarmDefault::LogFile
            | SwarmDefault::ReportFile
            | SwarmDefault::Timeout => {
                return Err(SwarmError::InvalidOption {
                    option: format!("SwarmDefault::{:?}", key),
                    value: value.to_string(),
                    detail: format!(
                        "set_default(SwarmDefault::{:?}, {}) expected &str value, received usize",
                        key, value
                    ),
                })
            }
            SwarmDefault::NoPrintMetrics => {
                return Err(SwarmError::InvalidOption {
                    option: format!("SwarmDefault::{:?}", key),
                    value: value.to_string(),
                    detail: format!(
                        "set_default(SwarmDefault::{:?}, {}) expected bool value, received usize",
                        key, value
                    ),
                })
            }
        }
        Ok(Box::new(self))
    }
}
impl SwarmDefaultType<bool> for SwarmAttack {
    /// Sets [`SwarmDefault`] to a [`bool`] value.
    fn set_default(mut self, key: SwarmDefault, value: bool) -> Result<Box<Self>, SwarmError> {
        match key {
            SwarmDefault::NoPrintMetrics => self.defaults.no_print_metrics = Some(value),
            // Otherwise display a helpful and explicit error.
            SwarmDefault::Host
            | SwarmDefault::HatchRate
            | SwarmDefault::Tags
            | SwarmDefault::ExcludeTags
            | SwarmDefault::LogFile
            | SwarmDefault::ReportFile
            | SwarmDefault::Timeout => {
                return Err(SwarmError::InvalidOption {
                    option: format!("SwarmDefault::{:?}", key),
                    value: value.to_string(),
                    detail: format!(
                        "set_default(SwarmDefault::{:?}, {}) expected &str value, received bool",
                        key, value
                    ),
                })
            }
            SwarmDefault::Users
            | SwarmDefault::RunTime
            | SwarmDefault::Iterations
            | SwarmDefault::LogLevel
            | SwarmDefault::Quiet
            | SwarmDefault::Verbose
            | SwarmDefault::RunningMetrics => {
                return Err(SwarmError::InvalidOption {
                    option: format!("SwarmDefault::{:?}", key),
                    value: value.to_string(),
                    detail: format!(
                        "set_default(SwarmDefault::{:?}, {}) expected usize value, received bool",
                        key, value
                    ),
                })
            }
        }
        Ok(Box::new(self))
    }
}

/// Used internally to configure [`SwarmConfiguration`] values based on precedence rules.
#[derive(Debug, Clone)]
pub(crate) struct SwarmValue<'a, T> {
    /// The optional value to set.
    pub(crate) value: Option<T>,
    /// Skip this value if true.
    pub(crate) filter: bool,
    /// An optional INFO level log message.
    pub(crate) message: &'a str,
}

pub(crate) trait SwarmConfigure<T> {
    /// Return the first unfiltered [`SwarmValue`].
    fn get_value(&self, values: Vec<SwarmValue<T>>) -> Option<T>;
}
impl<T: fmt::Debug> SwarmConfigure<T> for SwarmConfiguration {
    fn get_value(&self, values: Vec<SwarmValue<T>>) -> Option<T> {
        for value in values {
            if let Some(v) = value.value {
                if value.filter {
                    continue;
                } else {
                    if !value.message.is_empty() {
                        info!("{} = {:?}", value.message, v)
                    }
                    return Some(v);
                }
            }
        }
        None
    }
}

impl SwarmConfiguration {
    /// Apply custom defaults wherever an option wasn't set on the command line,
    /// then initialize the logger.
    pub(crate) fn configure(&mut self, defaults: &SwarmDefaults) -> Result<(), SwarmError> {
        // Configure `quiet`.
        self.quiet = self
            .get_value(vec![
                // Use --quiet if set.
                SwarmValue {
                    value: Some(self.quiet),
                    filter: self.quiet == 0,
                    message: "",
                },
                // Otherwise use SwarmDefault if set.
                SwarmValue {
                    value: defaults.quiet,
                    filter: defaults.quiet.is_none(),
                    message: "",
                },
            ])
            .unwrap_or(0);

        // Configure `verbose`.
        self.verbose = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.verbose),
                    filter: self.verbose == 0,
                    message: "",
                },
                SwarmValue {
                    value: defaults.verbose,
                    filter: defaults.verbose.is_none(),
                    message: "",
                },
            ])
            .unwrap_or(0);

        // Configure `log_level`.
        self.log_level = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.log_level),
                    filter: self.log_level == 0,
                    message: "",
                },
                SwarmValue {
                    value: defaults.log_level,
                    filter: defaults.log_level.is_none(),
                    message: "",
                },
            ])
            .unwrap_or(0);

        // Configure `log_file`.
        self.log_file = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.log_file.to_string()),
                    filter: self.log_file.is_empty(),
                    message: "",
                },
                SwarmValue {
                    value: defaults.log_file.clone(),
                    filter: defaults.log_file.is_none(),
                    message: "",
                },
            ])
            .unwrap_or_default();

        // Everything after this point is logged.
        self.initialize_logger()?;

        // Configure `host`. Profiles may also define their own host.
        self.host = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.host.to_string()),
                    filter: self.host.is_empty(),
                    message: "host",
                },
                SwarmValue {
                    value: defaults.host.clone(),
                    filter: defaults.host.is_none(),
                    message: "host",
                },
            ])
            .unwrap_or_default();

        let default_users = match std::thread::available_parallelism() {
            Ok(ap) => Some(ap.get()),
            Err(e) => {
                // Default to 1 user if unable to detect number of CPUs.
                info!("failed to detect available_parallelism: {}", e);
                Some(1)
            }
        };

        // Configure `users`.
        self.users = self.get_value(vec![
            // Use --users if set.
            SwarmValue {
                value: self.users,
                filter: self.users.is_none(),
                message: "users",
            },
            // Otherwise use SwarmDefault if set.
            SwarmValue {
                value: defaults.users,
                filter: defaults.users.is_none(),
                message: "users",
            },
            // Otherwise use one user per CPU.
            SwarmValue {
                value: default_users,
                filter: false,
                message: "users defaulted to number of CPUs",
            },
        ]);

        // Configure `hatch_rate`.
        self.hatch_rate = self.get_value(vec![
            SwarmValue {
                value: self.hatch_rate.clone(),
                filter: self.hatch_rate.is_none(),
                message: "hatch_rate",
            },
            SwarmValue {
                value: defaults.hatch_rate.clone(),
                filter: defaults.hatch_rate.is_none(),
                message: "hatch_rate",
            },
        ]);

        // Configure `run_time`.
        self.run_time = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.run_time.to_string()),
                    filter: self.run_time.is_empty(),
                    message: "run_time",
                },
                SwarmValue {
                    value: defaults.run_time.map(|run_time| run_time.to_string()),
                    filter: defaults.run_time.is_none(),
                    message: "run_time",
                },
            ])
            .unwrap_or_default();

        // Configure `iterations`.
        self.iterations = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.iterations),
                    filter: self.iterations == 0,
                    message: "iterations",
                },
                SwarmValue {
                    value: defaults.iterations,
                    filter: defaults.iterations.is_none(),
                    message: "iterations",
                },
            ])
            .unwrap_or(0);

        // Configure `tags`.
        self.tags = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.tags.clone()),
                    filter: self.tags.is_empty(),
                    message: "tags",
                },
                SwarmValue {
                    value: defaults.tags.clone(),
                    filter: defaults.tags.is_none(),
                    message: "tags",
                },
            ])
            .unwrap_or_default();

        // Configure `exclude_tags`.
        self.exclude_tags = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.exclude_tags.clone()),
                    filter: self.exclude_tags.is_empty(),
                    message: "exclude_tags",
                },
                SwarmValue {
                    value: defaults.exclude_tags.clone(),
                    filter: defaults.exclude_tags.is_none(),
                    message: "exclude_tags",
                },
            ])
            .unwrap_or_default();

        // Configure `running_metrics`.
        self.running_metrics = self.get_value(vec![
            SwarmValue {
                value: self.running_metrics,
                filter: self.running_metrics.is_none(),
                message: "running_metrics",
            },
            SwarmValue {
                value: defaults.running_metrics,
                filter: defaults.running_metrics.is_none(),
                message: "running_metrics",
            },
        ]);

        // Configure `no_print_metrics`.
        self.no_print_metrics = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.no_print_metrics),
                    filter: !self.no_print_metrics,
                    message: "no_print_metrics",
                },
                SwarmValue {
                    value: defaults.no_print_metrics,
                    filter: defaults.no_print_metrics.is_none(),
                    message: "no_print_metrics",
                },
            ])
            .unwrap_or(false);

        // Configure `report_file`.
        self.report_file = self
            .get_value(vec![
                SwarmValue {
                    value: Some(self.report_file.to_string()),
                    filter: self.report_file.is_empty(),
                    message: "report_file",
                },
                SwarmValue {
                    value: defaults.report_file.clone(),
                    filter: defaults.report_file.is_none(),
                    message: "report_file",
                },
            ])
            .unwrap_or_default();

        // Configure `timeout`.
        self.timeout = self.get_value(vec![
            SwarmValue {
                value: self.timeout.clone(),
                filter: self.timeout.is_none(),
                message: "timeout",
            },
            SwarmValue {
                value: defaults.timeout.clone(),
                filter: defaults.timeout.is_none(),
                message: "timeout",
            },
        ]);

        Ok(())
    }

    /// Validate configured [`SwarmConfiguration`] values.
    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        // Can't set both --verbose and --quiet.
        if self.verbose > 0 && self.quiet > 0 {
            return Err(SwarmError::InvalidOption {
                option: "`configuration.verbose`".to_string(),
                value: self.verbose.to_string(),
                detail: "`configuration.verbose` can not be set with `configuration.quiet`."
                    .to_string(),
            });
        }

        // Validate `users`.
        if let Some(users) = self.users.as_ref() {
            if users == &0 {
                return Err(SwarmError::InvalidOption {
                    option: "`configuration.users`".to_string(),
                    value: users.to_string(),
                    detail: "`configuration.users` must be set to at least 1.".to_string(),
                });
            }
        }

        // If set, hatch rate must be a number greater than zero.
        if let Some(hatch_rate) = self.hatch_rate.as_ref() {
            match util::get_float_from_string(self.hatch_rate.clone()) {
                Some(rate) if rate > 0.0 => (),
                _ => {
                    return Err(SwarmError::InvalidOption {
                        option: "`configuration.hatch_rate`".to_string(),
                        value: hatch_rate.to_string(),
                        detail: "`configuration.hatch_rate` must be a number greater than 0."
                            .to_string(),
                    })
                }
            }
        }

        // If set, timeout must be a number greater than zero.
        if let Some(timeout) = self.timeout.as_ref() {
            match util::get_float_from_string(self.timeout.clone()) {
                Some(seconds) if seconds > 0.0 => (),
                _ => {
                    return Err(SwarmError::InvalidOption {
                        option: "`configuration.timeout`".to_string(),
                        value: timeout.to_string(),
                        detail: "`configuration.timeout` must be a number greater than 0."
                            .to_string(),
                    })
                }
            }
        }

        // If set, the host must be a valid URL.
        if !self.host.is_empty() {
            util::is_valid_host(&self.host)?;
        }

        Ok(())
    }

    /// Configure the logger, writing to stdout and optionally to a log file.
    pub(crate) fn initialize_logger(&self) -> Result<(), SwarmError> {
        // Configure debug output level.
        let debug_level = match self.verbose {
            0 => match self.quiet {
                0 => LevelFilter::Info,
                _ => LevelFilter::Warn,
            },
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Configure log file level.
        let log_level = match self.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        let log_file: Option<PathBuf> = if !self.log_file.is_empty() {
            Some(PathBuf::from(&self.log_file))
        } else {
            None
        };

        let result = if let Some(log_to_file) = log_file.as_ref() {
            CombinedLogger::init(vec![
                SimpleLogger::new(debug_level, Config::default()),
                WriteLogger::new(
                    log_level,
                    Config::default(),
                    std::fs::File::create(log_to_file)?,
                ),
            ])
        } else {
            CombinedLogger::init(vec![SimpleLogger::new(debug_level, Config::default())])
        };
        // Only one logger can be installed per process.
        if let Err(e) = result {
            info!("failed to initialize CombinedLogger: {}", e);
        }

        if let Some(log_to_file) = log_file {
            info!("Writing to log file: {}", log_to_file.display());
        }
        info!("Output verbosity level: {}", debug_level);
        info!("Logfile verbosity level: {}", log_level);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_defaults() {
        let host = "http://example.com/".to_string();
        let users: usize = 10;
        let run_time: usize = 10;
        let hatch_rate = "2".to_string();
        let timeout = "45".to_string();
        let log_file = "custom-swarm.log".to_string();
        let report_file = "custom-swarm-report.json".to_string();

        let swarm_attack = SwarmAttack::initialize_with_config(SwarmConfiguration::default())
            .set_default(SwarmDefault::Host, host.as_str())
            .unwrap()
            .set_default(SwarmDefault::Users, users)
            .unwrap()
            .set_default(SwarmDefault::RunTime, run_time)
            .unwrap()
            .set_default(SwarmDefault::Iterations, 5)
            .unwrap()
            .set_default(SwarmDefault::HatchRate, hatch_rate.as_str())
            .unwrap()
            .set_default(SwarmDefault::Tags, "View, update")
            .unwrap()
            .set_default(SwarmDefault::ExcludeTags, "update")
            .unwrap()
            .set_default(SwarmDefault::LogLevel, 1)
            .unwrap()
            .set_default(SwarmDefault::LogFile, log_file.as_str())
            .unwrap()
            .set_default(SwarmDefault::Quiet, 1)
            .unwrap()
            .set_default(SwarmDefault::Verbose, 0)
            .unwrap()
            .set_default(SwarmDefault::Timeout, timeout.as_str())
            .unwrap()
            .set_default(SwarmDefault::RunningMetrics, 15)
            .unwrap()
            .set_default(SwarmDefault::NoPrintMetrics, true)
            .unwrap()
            .set_default(SwarmDefault::ReportFile, report_file.as_str())
            .unwrap();

        assert_eq!(swarm_attack.defaults.host, Some(host));
        assert_eq!(swarm_attack.defaults.users, Some(users));
        assert_eq!(swarm_attack.defaults.run_time, Some(run_time));
        assert_eq!(swarm_attack.defaults.iterations, Some(5));
        assert_eq!(swarm_attack.defaults.hatch_rate, Some(hatch_rate));
        assert_eq!(
            swarm_attack.defaults.tags,
            Some(Tags {
                active: vec!["view".to_string(), "update".to_string()]
            })
        );
        assert_eq!(
            swarm_attack.defaults.exclude_tags,
            Some(Tags {
                active: vec!["update".to_string()]
            })
        );
        assert_eq!(swarm_attack.defaults.log_level, Some(1));
        assert_eq!(swarm_attack.defaults.log_file, Some(log_file));
        assert_eq!(swarm_attack.defaults.quiet, Some(1));
        assert_eq!(swarm_attack.defaults.verbose, Some(0));
        assert_eq!(swarm_attack.defaults.timeout, Some(timeout));
        assert_eq!(swarm_attack.defaults.running_metrics, Some(15));
        assert_eq!(swarm_attack.defaults.no_print_metrics, Some(true));
        assert_eq!(swarm_attack.defaults.report_file, Some(report_file));
    }

    #[test]
    fn set_defaults_wrong_type() {
        let swarm_attack = SwarmAttack::initialize_with_config(SwarmConfiguration::default());
        assert!(swarm_attack
            .clone()
            .set_default(SwarmDefault::Users, "10")
            .is_err());
        assert!(swarm_attack
            .clone()
            .set_default(SwarmDefault::Host, 10)
            .is_err());
        assert!(swarm_attack
            .clone()
            .set_default(SwarmDefault::RunTime, true)
            .is_err());
        assert!(swarm_attack.set_default(SwarmDefault::Tags, "not valid!").is_err());
    }

    #[test]
    fn parse_tags() {
        let tags = Tags::from_str(" View ,update,view,,").unwrap();
        assert_eq!(tags.active, vec!["view".to_string(), "update".to_string()]);
        assert!(tags.contains("VIEW"));
        assert!(!tags.contains("delete"));
        assert_eq!(tags.to_string(), "view,update");

        assert!(Tags::from_str("").unwrap().is_empty());
        assert!(Tags::from_str("product-view,product_update").is_ok());
        assert!(Tags::from_str("view;update").is_err());
    }

    #[test]
    fn parse_options() {
        let config: SwarmConfiguration = SwarmConfiguration::parse_args_default(&[
            "--host",
            "http://127.0.0.1:8080",
            "--users",
            "3",
            "--tags",
            "update",
            "-E",
            "view",
            "--iterations",
            "2",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(config.host, "http://127.0.0.1:8080");
        assert_eq!(config.users, Some(3));
        assert!(config.tags.contains("update"));
        assert!(config.exclude_tags.contains("view"));
        assert_eq!(config.iterations, 2);
        assert_eq!(config.timeout, Some("5".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_options() {
        let invalid = |args: &[&str]| {
            SwarmConfiguration::parse_args_default(args)
                .unwrap()
                .validate()
                .is_err()
        };
        assert!(invalid(&["--users", "0"]));
        assert!(invalid(&["--hatch-rate", "0"]));
        assert!(invalid(&["--hatch-rate", "fast"]));
        assert!(invalid(&["--timeout", "0"]));
        assert!(invalid(&["--host", "example.com"]));
        assert!(invalid(&["-v", "-q"]));
        assert!(!invalid(&["--hatch-rate", "0.5", "--users", "1"]));
    }
}
