// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # B3 Propagation
//!
//! Zipkin B3 multi-header trace context propagation for services that need to
//! join a distributed trace without running a full tracer.
//!
//! ## Overview
//!
//! For every inbound request the crate resolves exactly one [`TraceContext`]:
//! - adopted from the `X-B3-*` headers of the upstream caller, or
//! - minted as a new root when the headers are absent or malformed.
//!
//! The sampling decision is taken once per request by the [`Sampler`]
//! (explicit upstream header, then path deny-list, then sample rate) and is
//! inherited by every child context derived for outbound calls.
//!
//! ## Architecture
//!
//! - [`id`]: 64-bit trace and span identifiers and their generator
//! - [`random`]: injectable, thread-safe randomness
//! - [`propagation`]: carriers and the B3 header codec
//! - [`sampler`]: the sampling policy
//! - [`context`]: the immutable trace context value
//! - [`scope`]: per-request memoization boundary
//! - [`provider`]: the resolution entry point
//! - [`config`]: environment and document configuration
//! - [`logger`]: log formatting and subscriber setup

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_copy_implementations)]
#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// Configuration from environment variables or deserialized documents
pub mod config;

/// Immutable trace context and child derivation
pub mod context;

/// Trace and span identifiers
pub mod id;

/// Logging infrastructure and tracing setup
pub mod logger;

/// Header carriers and the B3 codec
pub mod propagation;

/// Trace context resolution entry point
pub mod provider;

/// Randomness sources shared by id generation and sampling
pub mod random;

/// Sampling policy
pub mod sampler;

/// Per-request context storage
pub mod scope;

pub use config::{ConfigError, SamplerConfig};
pub use context::{Sampling, TraceContext};
pub use id::{IdGenerator, SpanId, TraceId};
pub use propagation::{
    carrier::{Extractor, Injector},
    error::ResolveError,
    B3HeaderCodec,
};
pub use provider::TraceProvider;
pub use random::{FastRandom, RandomSource, SeededRandom};
pub use sampler::Sampler;
pub use scope::{InboundRequest, RequestContext, RequestScope};
