// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sampling policy for inbound requests.
//!
//! # Decision Order
//!
//! The first matching rule wins:
//! 1. **No request**: work running outside a request is never sampled
//! 2. **Upstream decision**: a `true` / `false` `X-B3-Sampled` header is authoritative
//! 3. **Deny-list**: paths starting with a configured prefix are not sampled
//! 4. **Sample rate**: one uniform draw in `[0, 1)` is compared to the rate
//!
//! The decision is taken once per request and inherited by every child
//! context, so a trace is either recorded end to end or not at all.
//!
//! # Configuration
//!
//! - **Sample rate**: a number in `[0, 1]`. Missing or unparsable values mean
//!   `0.0`; numbers outside the range are rejected when the sampler is built.
//! - **Deny-list**: comma separated path prefixes, e.g. `health,/metrics`.

use std::{fmt, sync::Arc};

use tracing::{debug, error};

use crate::config::{ConfigError, SamplerConfig};
use crate::propagation::B3HeaderCodec;
use crate::random::{FastRandom, RandomSource};

/// Parses the configured sample rate.
///
/// Absent, blank, unparsable or NaN input yields `0.0`. A number outside
/// `[0, 1]` is a configuration error.
pub fn parse_sample_rate(value: Option<&str>) -> Result<f64, ConfigError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(0.0);
    };

    let rate = match value.parse::<f64>() {
        Ok(rate) if !rate.is_nan() => rate,
        _ => {
            debug!("Sample rate {value:?} is not a number, using 0.0");
            return Ok(0.0);
        }
    };

    validate_sample_rate(rate)
}

fn validate_sample_rate(rate: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        error!("Sample rate {rate} is not between 0 and 1");
        Err(ConfigError::SampleRateOutOfRange(rate))
    }
}

/// Parses a comma separated deny-list into trimmed, lower-cased prefixes.
///
/// Blank entries are dropped; absent input yields an empty list.
#[must_use]
pub fn parse_dont_sample_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Decides whether a request is sampled.
///
/// Cloning is cheap and clones share the same [`RandomSource`].
#[derive(Clone)]
pub struct Sampler {
    dont_sample_list: Vec<String>,
    sample_rate: f64,
    random: Arc<dyn RandomSource>,
}

impl Sampler {
    /// Builds a sampler from raw configuration strings.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use b3_propagation::{FastRandom, Sampler};
    ///
    /// let sampler = Sampler::new(Some("health, Metrics"), Some("0.25"), Arc::new(FastRandom))?;
    ///
    /// assert_eq!(sampler.sample_rate(), 0.25);
    /// assert_eq!(sampler.dont_sample_list(), ["health", "metrics"]);
    /// # Ok::<(), b3_propagation::ConfigError>(())
    /// ```
    pub fn new(
        dont_sample_list: Option<&str>,
        sample_rate: Option<&str>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            dont_sample_list: parse_dont_sample_list(dont_sample_list),
            sample_rate: parse_sample_rate(sample_rate)?,
            random,
        })
    }

    /// Builds a sampler from an already parsed rate and deny-list.
    pub fn with_rate(
        sample_rate: f64,
        dont_sample_list: Vec<String>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let sample_rate = if sample_rate.is_nan() {
            0.0
        } else {
            validate_sample_rate(sample_rate)?
        };

        Ok(Self {
            dont_sample_list: dont_sample_list
                .into_iter()
                .map(|entry| entry.trim().to_lowercase())
                .filter(|entry| !entry.is_empty())
                .collect(),
            sample_rate,
            random,
        })
    }

    pub fn from_config(
        config: &SamplerConfig,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            config.dont_sample_list.as_deref(),
            config.sample_rate.as_deref(),
            random,
        )
    }

    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[must_use]
    pub fn dont_sample_list(&self) -> &[String] {
        &self.dont_sample_list
    }

    /// Returns `true` when `path` starts with a deny-listed prefix.
    ///
    /// Matching ignores case and a leading `/` on the path, so `health`
    /// matches both `health/check` and `/Health/check`.
    #[must_use]
    pub fn is_in_dont_sample_list(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        let relative = path.trim_start_matches('/');

        self.dont_sample_list
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()) || relative.starts_with(prefix.as_str()))
    }

    /// Decides whether the request at `path` is sampled.
    ///
    /// `path` is `None` when there is no inbound request at all. `sampled` is
    /// the raw `X-B3-Sampled` header value.
    #[must_use]
    pub fn should_sample(&self, path: Option<&str>, sampled: Option<&str>) -> bool {
        let Some(path) = path else {
            return false;
        };

        if let Some(decision) = sampled.and_then(B3HeaderCodec::parse_sampled) {
            return decision;
        }

        if self.is_in_dont_sample_list(path) {
            debug!("Path {path} is in the dont-sample list");
            return false;
        }

        // A zero rate must never sample, even on a zero draw
        self.sample_rate > 0.0 && self.random.next_f64() <= self.sample_rate
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            dont_sample_list: Vec::new(),
            sample_rate: 0.0,
            random: Arc::new(FastRandom),
        }
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("dont_sample_list", &self.dont_sample_list)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}
