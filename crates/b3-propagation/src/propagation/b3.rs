// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Zipkin B3 multi-header codec.
//!
//! # Header Format
//!
//! ```text
//! X-B3-TraceId: 1a2b3c
//! X-B3-SpanId: 4d5e6f
//! X-B3-ParentSpanId: 7a8b9c
//! X-B3-Sampled: true
//! ```
//!
//! Identifiers are 64-bit values in lowercase hexadecimal. The parent span id
//! is empty for a root span. The sampled flag is the literal `true` or
//! `false`.
//!
//! # Fallbacks
//!
//! Each header is validated independently and replaced when absent or
//! malformed:
//! 1. **Trace ID**: a freshly generated identifier
//! 2. **Span ID**: the trace id (the request becomes a root span)
//! 3. **Parent Span ID**: none
//! 4. **Sampled**: passed through raw; the [`Sampler`](crate::Sampler) decides

use tracing::{debug, warn};

use crate::context::{Sampling, TraceContext};
use crate::id::{IdGenerator, SpanId, TraceId};
use crate::propagation::{
    carrier::{Extractor, Injector},
    error::ResolveError,
};

/// HTTP header key for the B3 trace id.
pub const B3_TRACE_ID_KEY: &str = "X-B3-TraceId";

/// HTTP header key for the B3 span id.
pub const B3_SPAN_ID_KEY: &str = "X-B3-SpanId";

/// HTTP header key for the B3 parent span id. Empty for root spans.
pub const B3_PARENT_SPAN_ID_KEY: &str = "X-B3-ParentSpanId";

/// HTTP header key for the B3 sampling decision (`true` / `false`).
pub const B3_SAMPLED_KEY: &str = "X-B3-Sampled";

/// Identifiers and raw sampling flag read from inbound B3 headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    /// Raw `X-B3-Sampled` value, not yet interpreted.
    pub sampled: Option<String>,
}

impl ParsedHeaders {
    /// Builds the context for these headers with a final sampling decision.
    #[must_use]
    pub fn into_context(self, sampled: bool) -> TraceContext {
        TraceContext::from_parts(
            self.trace_id,
            self.span_id,
            self.parent_span_id,
            Sampling::from(sampled),
        )
    }
}

/// Codec between [`TraceContext`] and the B3 multi-header set.
#[derive(Debug, Clone, Copy, Default)]
pub struct B3HeaderCodec;

impl B3HeaderCodec {
    /// Reads the B3 headers from `carrier`, applying per-field fallbacks.
    ///
    /// Fails only when the resolved span id and parent span id are equal.
    pub fn parse(
        carrier: &dyn Extractor,
        generator: &IdGenerator,
    ) -> Result<ParsedHeaders, ResolveError> {
        let trace_id = Self::extract_id::<TraceId>(carrier, B3_TRACE_ID_KEY).unwrap_or_else(|| {
            let trace_id = generator.generate_trace_id();
            debug!("No valid `{B3_TRACE_ID_KEY}`, starting trace {trace_id}");
            trace_id
        });

        let span_id = Self::extract_id::<SpanId>(carrier, B3_SPAN_ID_KEY)
            .unwrap_or_else(|| SpanId::from(trace_id));

        let parent_span_id = Self::extract_id::<SpanId>(carrier, B3_PARENT_SPAN_ID_KEY);

        if parent_span_id == Some(span_id) {
            warn!("Rejecting inbound B3 headers, span {span_id} is its own parent");
            return Err(ResolveError::SpanIsOwnParent { span_id });
        }

        Ok(ParsedHeaders {
            trace_id,
            span_id,
            parent_span_id,
            sampled: carrier.get(B3_SAMPLED_KEY).map(str::to_string),
        })
    }

    /// Writes all four B3 headers for `context` into `carrier`.
    pub fn inject(context: &TraceContext, carrier: &mut dyn Injector) {
        carrier.set(B3_TRACE_ID_KEY, context.trace_id().to_string());
        carrier.set(B3_SPAN_ID_KEY, context.span_id().to_string());
        carrier.set(
            B3_PARENT_SPAN_ID_KEY,
            context
                .parent_span_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        carrier.set(B3_SAMPLED_KEY, context.sampling().is_sampled().to_string());
    }

    /// Parses the case-sensitive `true` / `false` literals.
    #[must_use]
    pub fn parse_sampled(value: &str) -> Option<bool> {
        match value.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn extract_id<T: std::str::FromStr>(carrier: &dyn Extractor, key: &str) -> Option<T> {
        let value = carrier.get(key)?;

        match value.parse::<T>() {
            Ok(id) => Some(id),
            Err(_) => {
                if !value.trim().is_empty() {
                    debug!("Ignoring malformed `{key}`: {value:?}");
                }
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tracing_test::traced_test;

    use super::*;
    use crate::random::SeededRandom;

    fn generator() -> IdGenerator {
        IdGenerator::new(Arc::new(SeededRandom::new(11)))
    }

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_all_headers() {
        let carrier = headers(&[
            ("X-B3-TraceId", "1a2b3c"),
            ("X-B3-SpanId", "4d5e6f"),
            ("X-B3-ParentSpanId", "7a8b9c"),
            ("X-B3-Sampled", "true"),
        ]);

        let parsed = B3HeaderCodec::parse(&carrier, &generator()).unwrap();

        assert_eq!(parsed.trace_id.to_string(), "1a2b3c");
        assert_eq!(parsed.span_id.to_string(), "4d5e6f");
        assert_eq!(parsed.parent_span_id.unwrap().to_string(), "7a8b9c");
        assert_eq!(parsed.sampled.as_deref(), Some("true"));
    }

    #[test]
    fn test_parse_lowercase_header_names() {
        let carrier = headers(&[("x-b3-traceid", "abc"), ("x-b3-spanid", "def")]);

        let parsed = B3HeaderCodec::parse(&carrier, &generator()).unwrap();

        assert_eq!(parsed.trace_id.to_string(), "abc");
        assert_eq!(parsed.span_id.to_string(), "def");
        assert_eq!(parsed.parent_span_id, None);
    }

    #[test]
    fn test_parse_no_headers_is_root() {
        let parsed = B3HeaderCodec::parse(&HashMap::<String, String>::new(), &generator()).unwrap();

        assert_eq!(parsed.span_id, SpanId::from(parsed.trace_id));
        assert_eq!(parsed.parent_span_id, None);
        assert_eq!(parsed.sampled, None);
    }

    #[test]
    #[traced_test]
    fn test_parse_invalid_ids_fall_back() {
        let carrier = headers(&[
            ("X-B3-TraceId", "not-hex"),
            ("X-B3-SpanId", "zzzz"),
            ("X-B3-ParentSpanId", "   "),
        ]);

        let parsed = B3HeaderCodec::parse(&carrier, &generator()).unwrap();

        assert_ne!(parsed.trace_id.to_string(), "not-hex");
        assert_eq!(parsed.span_id, SpanId::from(parsed.trace_id));
        assert_eq!(parsed.parent_span_id, None);
        assert!(logs_contain("Ignoring malformed `X-B3-TraceId`"));
        assert!(logs_contain("Ignoring malformed `X-B3-SpanId`"));
    }

    #[test]
    fn test_parse_invalid_span_keeps_valid_parent() {
        let carrier = headers(&[
            ("X-B3-TraceId", "1a2b3c"),
            ("X-B3-SpanId", "nope"),
            ("X-B3-ParentSpanId", "7a8b9c"),
        ]);

        let parsed = B3HeaderCodec::parse(&carrier, &generator()).unwrap();

        assert_eq!(parsed.span_id.to_string(), "1a2b3c");
        assert_eq!(parsed.parent_span_id.unwrap().to_string(), "7a8b9c");
    }

    #[test]
    #[traced_test]
    fn test_parse_span_equal_to_parent_is_rejected() {
        let carrier = headers(&[("X-B3-SpanId", "aa"), ("X-B3-ParentSpanId", "aa")]);

        let err = B3HeaderCodec::parse(&carrier, &generator()).unwrap_err();

        assert_eq!(
            err,
            ResolveError::SpanIsOwnParent {
                span_id: SpanId::from_u64(0xaa)
            }
        );
        assert!(logs_contain("is its own parent"));
    }

    #[test]
    fn test_parse_parent_equal_to_fallback_span_is_rejected() {
        // The span id falls back to the trace id, which collides with the parent
        let carrier = headers(&[("X-B3-TraceId", "bb"), ("X-B3-ParentSpanId", "bb")]);

        assert!(B3HeaderCodec::parse(&carrier, &generator()).is_err());
    }

    #[test]
    fn test_parse_sampled_literals() {
        assert_eq!(B3HeaderCodec::parse_sampled("true"), Some(true));
        assert_eq!(B3HeaderCodec::parse_sampled("false"), Some(false));
        assert_eq!(B3HeaderCodec::parse_sampled(" true "), Some(true));
        assert_eq!(B3HeaderCodec::parse_sampled("True"), None);
        assert_eq!(B3HeaderCodec::parse_sampled("1"), None);
        assert_eq!(B3HeaderCodec::parse_sampled(""), None);
    }

    #[test]
    fn test_inject_root_context() {
        let context = TraceContext::from_parts(
            TraceId::from_u64(0x1a_2b3c),
            SpanId::from_u64(0x1a_2b3c),
            None,
            Sampling::Sampled,
        );
        let mut carrier: HashMap<String, String> = HashMap::new();

        B3HeaderCodec::inject(&context, &mut carrier);

        assert_eq!(carrier.get("X-B3-TraceId").unwrap(), "1a2b3c");
        assert_eq!(carrier.get("X-B3-SpanId").unwrap(), "1a2b3c");
        assert_eq!(carrier.get("X-B3-ParentSpanId").unwrap(), "");
        assert_eq!(carrier.get("X-B3-Sampled").unwrap(), "true");
    }

    #[test]
    fn test_inject_unknown_sampling_as_false() {
        let context = TraceContext::from_parts(
            TraceId::from_u64(1),
            SpanId::from_u64(2),
            Some(SpanId::from_u64(3)),
            Sampling::Unknown,
        );
        let mut carrier: HashMap<String, String> = HashMap::new();

        B3HeaderCodec::inject(&context, &mut carrier);

        assert_eq!(carrier.get("X-B3-ParentSpanId").unwrap(), "3");
        assert_eq!(carrier.get("X-B3-Sampled").unwrap(), "false");
    }

    #[test]
    fn test_inject_then_parse_preserves_context() {
        let generator = generator();
        let context = TraceContext::root(&generator, Sampling::Sampled).next(&generator);
        let mut carrier: HashMap<String, String> = HashMap::new();

        B3HeaderCodec::inject(&context, &mut carrier);
        let parsed = B3HeaderCodec::parse(&carrier, &generator).unwrap();

        assert_eq!(parsed.trace_id, context.trace_id());
        assert_eq!(parsed.span_id, context.span_id());
        assert_eq!(parsed.parent_span_id, context.parent_span_id());
        assert_eq!(parsed.sampled.as_deref(), Some("true"));
    }
}
