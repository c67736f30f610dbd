// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log formatting for services embedding B3 propagation.
//!
//! # Format
//!
//! ```text
//! B3_PROPAGATION | LEVEL | [span_name{span_fields}:] message {event_fields}
//! ```
//!
//! # Examples
//!
//! ```text
//! B3_PROPAGATION | DEBUG | Resolved trace context trace=1a2b3c span=4d5e6f sampled=false
//! B3_PROPAGATION | WARN | request{path=/orders}: Rejecting inbound B3 headers, span aa is its own parent
//! ```

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Prefix written at the start of every log line.
pub const LOG_PREFIX: &str = "B3_PROPAGATION";

/// Log formatter that prefixes messages with [`LOG_PREFIX`].
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "{LOG_PREFIX} | {} | ", metadata.level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                // Formatted by the `fmt` layer on `new_span`
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Installs a global subscriber using [`Formatter`], filtered at `log_level`.
///
/// `RUST_LOG` style directives in `log_level` are accepted. Returns `false`
/// when a global subscriber was already installed.
pub fn init(log_level: &str) -> bool {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .event_format(Formatter)
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
