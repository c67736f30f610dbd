// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for trace context resolution.
//!
//! Individually malformed or missing headers never produce an error: they
//! fall back to generated or empty values. The only per-request failure is a
//! structurally invalid chain, which indicates a broken or adversarial
//! upstream caller and is not recovered from.

use thiserror::Error;

use crate::id::SpanId;

/// Error raised while resolving the trace context of an inbound request.
///
/// # Display Format
///
/// `"Cannot resolve trace context: span id 4d5e6f is its own parent"`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The inbound `X-B3-SpanId` and `X-B3-ParentSpanId` are the same value.
    #[error("Cannot resolve trace context: span id {span_id} is its own parent")]
    SpanIsOwnParent { span_id: SpanId },
}
