//! Utility functions used by the load test driver and available to profiles.

use regex::Regex;
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time;
use url::Url;

use crate::SwarmError;

/// Parse a string representing a time span and return the number of seconds.
///
/// Can be specified as an integer, indicating seconds. Or can use integers
/// together with one or more of "h", "m", and "s", in that order, indicating
/// "hours", "minutes", and "seconds".
///
/// Valid formats include: 20, 20s, 3m, 2h, 1h20m, 3h30m10s, etc.
///
/// # Example
/// ```rust
/// use storefront_swarm::util;
///
/// // 1 hour 2 minutes and 3 seconds is 3,723 seconds.
/// assert_eq!(util::parse_timespan("1h2m3s"), 3_723);
///
/// // 45 seconds is 45 seconds.
/// assert_eq!(util::parse_timespan("45"), 45);
///
/// // Invalid value is 0 seconds.
/// assert_eq!(util::parse_timespan("foo"), 0);
/// ```
pub fn parse_timespan(time_str: &str) -> usize {
    // If an integer is passed in, assume it's seconds.
    if let Ok(t) = usize::from_str(time_str) {
        trace!("{} is integer: {} seconds", time_str, t);
        return t;
    }

    // Otherwise use a regex to extract hours, minutes and seconds from string.
    let re = match Regex::new(r"((?P<hours>\d+?)h)?((?P<minutes>\d+?)m)?((?P<seconds>\d+?)s)?")
    {
        Ok(re) => re,
        Err(e) => {
            warn!("failed to compile timespan regex: {}", e);
            return 0;
        }
    };
    let time_matches = match re.captures(time_str) {
        Some(m) => m,
        None => return 0,
    };
    let extract = |name: &str| -> usize {
        time_matches
            .name(name)
            .and_then(|m| usize::from_str(m.as_str()).ok())
            .unwrap_or(0)
    };
    let hours = extract("hours");
    let minutes = extract("minutes");
    let seconds = extract("seconds");
    let total = hours * 60 * 60 + minutes * 60 + seconds;
    trace!(
        "{} hours {} minutes {} seconds: {} seconds",
        hours,
        minutes,
        seconds,
        total
    );
    total
}

/// Calculate the greatest common divisor of two integers.
///
/// Used to reduce task weights to their smallest equivalent ratio.
///
/// # Example
/// ```rust
/// use storefront_swarm::util;
///
/// assert_eq!(util::gcd(1, 100), 1);
/// assert_eq!(util::gcd(9, 102), 3);
/// assert_eq!(util::gcd(12345, 67890), 15);
/// ```
pub fn gcd(u: usize, v: usize) -> usize {
    if v == 0 {
        u
    } else {
        gcd(v, u % v)
    }
}

/// Truncate strings when they're too long to display.
///
/// If a string is longer than the specified max length, this function removes extra
/// the characters and replaces the last two with a double-period ellipsis.
///
/// # Example
/// ```rust
/// use storefront_swarm::util;
///
/// // All but 7 characters are truncated, with ".." appended.
/// assert_eq!(util::truncate_string("this is a long string", 9), "this is..");
///
/// // All characters are returned as the string is less than 15 characters long.
/// assert_eq!(util::truncate_string("shorter string", 15), "shorter string");
/// ```
pub fn truncate_string(str_to_truncate: &str, max_length: usize) -> String {
    if max_length > 2 && str_to_truncate.char_indices().count() > max_length {
        match str_to_truncate.char_indices().nth(max_length - 2) {
            None => str_to_truncate.to_string(),
            Some((idx, _)) => format!("{}..", &str_to_truncate[..idx]),
        }
    } else {
        str_to_truncate.to_string()
    }
}

/// Determine if a timer expired, with second granularity.
///
/// A `run_time` of 0 never expires.
pub fn timer_expired(started: time::Instant, run_time: usize) -> bool {
    run_time > 0 && started.elapsed().as_secs() >= run_time as u64
}

/// Determine if a timer expired, with millisecond granularity.
pub fn ms_timer_expired(started: time::Instant, elapsed: usize) -> bool {
    elapsed > 0 && started.elapsed().as_millis() >= elapsed as u128
}

/// Convert optional string to f32, otherwise defaulting to 1.0.
///
/// # Example
/// ```rust
/// use storefront_swarm::util;
///
/// assert_eq!(util::get_hatch_rate(Some("1".to_string())), 1.0);
/// assert_eq!(util::get_hatch_rate(Some(".1".to_string())), 0.1);
/// assert_eq!(util::get_hatch_rate(Some("1.1.1".to_string())), 1.0);
/// assert_eq!(util::get_hatch_rate(None), 1.0);
/// ```
pub fn get_hatch_rate(hatch_rate: Option<String>) -> f32 {
    get_float_from_string(hatch_rate).unwrap_or(1.0)
}

/// Convert optional string to f32, otherwise return None.
pub fn get_float_from_string(string: Option<String>) -> Option<f32> {
    match string {
        Some(s) => match s.parse::<f32>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("failed to convert {} to float: {}", s, e);
                None
            }
        },
        None => None,
    }
}

/// Helper function to determine if a host can be parsed.
///
/// # Example
/// ```rust
/// use storefront_swarm::util;
///
/// assert_eq!(util::is_valid_host("http://localhost:8080/").is_ok(), true);
/// assert_eq!(util::is_valid_host("http://127.0.0.1").is_ok(), true);
///
/// // Protocol is required
/// assert_eq!(util::is_valid_host("example.com/").is_ok(), false);
/// ```
pub fn is_valid_host(host: &str) -> Result<bool, SwarmError> {
    Url::parse(host).map_err(|parse_error| SwarmError::InvalidHost {
        host: host.to_string(),
        detail: "Invalid host.".to_string(),
        parse_error,
    })?;
    Ok(true)
}

// Shut down cleanly on the first ctrl-c, exit abruptly on the second.
pub(crate) fn setup_ctrlc_handler(canceled: &Arc<AtomicBool>) {
    let caught = canceled.clone();
    match ctrlc::set_handler(move || {
        if caught.load(Ordering::SeqCst) {
            warn!("caught another ctrl-c, exiting immediately...");
            std::process::exit(1);
        } else {
            warn!("caught ctrl-c, stopping...");
            caught.store(true, Ordering::SeqCst);
        }
    }) {
        Ok(_) => (),
        // The handler can only be installed once per process, which happens when
        // several load tests run in the same test binary.
        Err(e) => info!("ctrl-c handler already installed: {}", e),
    }
}
