// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace context resolution for inbound requests.
//!
//! # Resolution
//!
//! ```text
//! Uncached ──parse headers + sample──▶ Cached
//!    │                                   │
//!    └──span is its own parent──▶ Err    └──every later call returns the same Arc
//! ```
//!
//! The resolved context is stored in the request's own scope, so the next
//! request always starts uncached.

use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigError, SamplerConfig};
use crate::context::{Sampling, TraceContext};
use crate::id::IdGenerator;
use crate::propagation::{error::ResolveError, B3HeaderCodec};
use crate::random::{FastRandom, RandomSource};
use crate::sampler::Sampler;
use crate::scope::RequestContext;

/// Scope key under which the resolved context is memoized.
pub const TRACE_CONTEXT_KEY: &str = "b3.trace_context";

/// Resolves and derives trace contexts.
///
/// A provider is built once at startup and shared by all request handlers;
/// it holds no per-request state.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use b3_propagation::{InboundRequest, TraceProvider};
///
/// let provider = TraceProvider::new(Some("health"), Some("1.0"))?;
/// let mut request = InboundRequest::new(HashMap::<String, String>::new(), "/orders");
///
/// let context = provider.resolve(&mut request)?;
/// let outbound = provider.next(&context);
///
/// assert_eq!(outbound.trace_id(), context.trace_id());
/// assert_eq!(outbound.parent_span_id(), Some(context.span_id()));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraceProvider {
    generator: IdGenerator,
    sampler: Sampler,
}

impl TraceProvider {
    /// Builds a provider from raw deny-list and sample rate strings, using
    /// the thread-local random source.
    pub fn new(
        dont_sample_list: Option<&str>,
        sample_rate: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Self::with_random(dont_sample_list, sample_rate, Arc::new(FastRandom))
    }

    /// Builds a provider whose id generation and sampling share `random`.
    pub fn with_random(
        dont_sample_list: Option<&str>,
        sample_rate: Option<&str>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let sampler = Sampler::new(dont_sample_list, sample_rate, Arc::clone(&random))?;
        Ok(Self::from_parts(IdGenerator::new(random), sampler))
    }

    pub fn from_config(config: &SamplerConfig) -> Result<Self, ConfigError> {
        let random: Arc<dyn RandomSource> = Arc::new(FastRandom);
        let sampler = Sampler::from_config(config, Arc::clone(&random))?;
        Ok(Self::from_parts(IdGenerator::new(random), sampler))
    }

    #[must_use]
    pub fn from_parts(generator: IdGenerator, sampler: Sampler) -> Self {
        Self { generator, sampler }
    }

    #[must_use]
    pub fn generator(&self) -> &IdGenerator {
        &self.generator
    }

    #[must_use]
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Returns the trace context of `request`, resolving it on first use.
    ///
    /// Later calls for the same request return the same shared instance
    /// without reading headers or sampling again. On error nothing is cached.
    pub fn resolve(
        &self,
        request: &mut dyn RequestContext,
    ) -> Result<Arc<TraceContext>, ResolveError> {
        if let Some(context) = request.scope().get(TRACE_CONTEXT_KEY) {
            return Ok(context);
        }

        let parsed = B3HeaderCodec::parse(request.headers(), &self.generator)?;
        let sampled = self
            .sampler
            .should_sample(Some(request.path()), parsed.sampled.as_deref());

        let context = Arc::new(parsed.into_context(sampled));
        debug!("Resolved trace context {context}");

        request
            .scope()
            .set(TRACE_CONTEXT_KEY, Arc::clone(&context));
        Ok(context)
    }

    /// Creates a root context for work running outside any request.
    ///
    /// Such work is never sampled and nothing is memoized.
    #[must_use]
    pub fn detached(&self) -> TraceContext {
        let sampled = self.sampler.should_sample(None, None);
        TraceContext::root(&self.generator, Sampling::from(sampled))
    }

    /// Derives the context for an outbound call from `context`.
    #[must_use]
    pub fn next(&self, context: &TraceContext) -> TraceContext {
        context.next(&self.generator)
    }
}
