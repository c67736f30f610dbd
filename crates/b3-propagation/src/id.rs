// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! 64-bit trace and span identifiers.
//!
//! B3 identifiers travel as lowercase hexadecimal text without a `0x` prefix
//! and without fixed-width zero padding. Parsing accepts what an upstream
//! tracer may reasonably send: up to 16 hex digits in either case, optionally
//! surrounded by whitespace. Signs, prefixes and anything wider than 64 bits
//! are rejected.

use std::{fmt, str::FromStr, sync::Arc};

use crate::random::{FastRandom, RandomSource};

/// Maximum number of hex digits in a 64-bit identifier.
const MAX_HEX_DIGITS: usize = 16;

/// Parses a 64-bit hexadecimal identifier.
///
/// Returns `None` for blank input, non-hex characters, signs or values wider
/// than 64 bits.
#[must_use]
pub fn parse_hex_u64(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty()
        || value.len() > MAX_HEX_DIGITS
        || !value.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }

    u64::from_str_radix(value, 16).ok()
}

/// Error returned when text is not a valid 64-bit hexadecimal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not a 64-bit hexadecimal identifier")]
pub struct ParseIdError;

/// Identifier shared by every span of a distributed trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(u64);

/// Identifier of a single hop in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(u64);

impl TraceId {
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl SpanId {
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// A root span reuses its trace identifier as its span identifier.
impl From<TraceId> for SpanId {
    fn from(trace_id: TraceId) -> Self {
        Self(trace_id.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for TraceId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_u64(s).map(Self).ok_or(ParseIdError)
    }
}

impl FromStr for SpanId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_u64(s).map(Self).ok_or(ParseIdError)
    }
}

/// Generates random trace and span identifiers.
///
/// Identifiers are drawn uniformly from the full 64-bit space. They are not
/// cryptographically strong; collisions are accepted at the birthday bound.
///
/// Cloning is cheap and clones share the same [`RandomSource`].
#[derive(Clone)]
pub struct IdGenerator {
    random: Arc<dyn RandomSource>,
}

impl IdGenerator {
    #[must_use]
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Generates a new span identifier.
    #[must_use]
    pub fn generate(&self) -> SpanId {
        SpanId(self.random.next_u64())
    }

    /// Generates a new trace identifier.
    #[must_use]
    pub fn generate_trace_id(&self) -> TraceId {
        TraceId(self.random.next_u64())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Arc::new(FastRandom))
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}
