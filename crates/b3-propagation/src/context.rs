// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Distributed trace context carried across service boundaries.
//!
//! # Trace Context
//!
//! A [`TraceContext`] is an immutable value. It is resolved once per inbound
//! request and every outbound call gets its own child derived with
//! [`TraceContext::next`]:
//!
//! ```text
//! inbound   trace=1a2b3c span=4d5e6f parent=7a8b9c sampled
//!   ↓ next
//! outbound  trace=1a2b3c span=<new>  parent=4d5e6f sampled
//! ```
//!
//! The trace id never changes along the chain and the sampling decision is
//! inherited rather than re-rolled.

use std::fmt;

use crate::id::{IdGenerator, SpanId, TraceId};
use crate::propagation::{carrier::Injector, error::ResolveError, B3HeaderCodec};

/// Sampling decision of a trace.
///
/// `Unknown` only exists before a decision has been made, for instance on a
/// context built by hand. Contexts resolved for a request are always
/// `Sampled` or `NotSampled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Sampling {
    /// Spans of this trace should be recorded.
    Sampled,
    /// Spans of this trace should be dropped.
    NotSampled,
    /// No decision has been made yet.
    #[default]
    Unknown,
}

impl Sampling {
    /// Returns `true` only for a positive decision; `Unknown` counts as not sampled.
    #[must_use]
    pub fn is_sampled(self) -> bool {
        matches!(self, Sampling::Sampled)
    }

    /// Returns the decision, or `None` while it is still `Unknown`.
    #[must_use]
    pub fn decision(self) -> Option<bool> {
        match self {
            Sampling::Sampled => Some(true),
            Sampling::NotSampled => Some(false),
            Sampling::Unknown => None,
        }
    }
}

impl From<bool> for Sampling {
    fn from(sampled: bool) -> Self {
        if sampled {
            Sampling::Sampled
        } else {
            Sampling::NotSampled
        }
    }
}

/// Identifier chain and sampling decision of one hop in a distributed trace.
///
/// # Invariants
///
/// - A root context has no parent and its span id equals its trace id.
/// - The span id never equals the parent span id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    sampling: Sampling,
}

impl TraceContext {
    /// Creates a context from known identifiers.
    ///
    /// Fails when `span_id` equals `parent_span_id`.
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        sampling: Sampling,
    ) -> Result<Self, ResolveError> {
        if parent_span_id == Some(span_id) {
            return Err(ResolveError::SpanIsOwnParent { span_id });
        }

        Ok(Self::from_parts(trace_id, span_id, parent_span_id, sampling))
    }

    /// Creates a new root context with a fresh trace id.
    #[must_use]
    pub fn root(generator: &IdGenerator, sampling: Sampling) -> Self {
        let trace_id = generator.generate_trace_id();
        Self::from_parts(trace_id, SpanId::from(trace_id), None, sampling)
    }

    // Callers are responsible for the span/parent invariant
    pub(crate) fn from_parts(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        sampling: Sampling,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            parent_span_id,
            sampling,
        }
    }

    /// Derives the context for an outbound call.
    ///
    /// The child keeps the trace id and sampling decision, gets a fresh span
    /// id and records this context's span as its parent. A generated span id
    /// colliding with the parent is accepted and not re-checked.
    #[must_use]
    pub fn next(&self, generator: &IdGenerator) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: generator.generate(),
            parent_span_id: Some(self.span_id),
            sampling: self.sampling,
        }
    }

    /// Writes this context as B3 headers.
    pub fn inject(&self, carrier: &mut dyn Injector) {
        B3HeaderCodec::inject(self, carrier);
    }

    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    #[must_use]
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    #[must_use]
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    #[must_use]
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    #[must_use]
    pub fn is_sampled(&self) -> bool {
        self.sampling.is_sampled()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace={} span={}", self.trace_id, self.span_id)?;
        if let Some(parent) = self.parent_span_id {
            write!(f, " parent={parent}")?;
        }
        match self.sampling.decision() {
            Some(sampled) => write!(f, " sampled={sampled}"),
            None => write!(f, " sampled=unknown"),
        }
    }
}
