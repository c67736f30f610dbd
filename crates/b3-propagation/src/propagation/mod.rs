// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace context propagation across service boundaries.
//!
//! # Trace Context Flow
//!
//! ```text
//! Incoming Request Headers
//!   ↓
//! Parse (read X-B3-* headers, apply fallbacks)
//!   ↓
//! TraceContext (trace id, span id, parent span id, sampling)
//!   ↓
//! Derive child context for each outbound call
//!   ↓
//! Inject (write X-B3-* headers)
//!   ↓
//! Outgoing Request Headers
//! ```

pub mod b3;
pub mod carrier;
pub mod error;

pub use b3::{
    B3HeaderCodec, ParsedHeaders, B3_PARENT_SPAN_ID_KEY, B3_SAMPLED_KEY, B3_SPAN_ID_KEY,
    B3_TRACE_ID_KEY,
};
