// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-request storage and the view of an inbound request.
//!
//! A trace context is resolved at most once per inbound request and then
//! memoized in storage owned by that request. Nothing is shared between
//! requests, so the scope is borrowed mutably and needs no locking.
//!
//! # Implementations
//!
//! - [`InboundRequest`]: owned headers, path and scope, for tests and custom servers
//! - `http::Request<B>`: headers, URI path and request extensions

use std::{collections::HashMap, sync::Arc};

use http::{Extensions, HeaderMap};

use crate::context::TraceContext;
use crate::propagation::carrier::Extractor;

/// Per-request key-value store holding resolved contexts.
pub trait RequestScope {
    fn contains(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Arc<TraceContext>>;

    fn set(&mut self, key: &str, context: Arc<TraceContext>);
}

/// The pieces of an inbound request needed to resolve its trace context.
pub trait RequestContext {
    /// Inbound headers.
    fn headers(&self) -> &dyn Extractor;

    /// Request path, used for deny-list matching.
    fn path(&self) -> &str;

    /// Storage scoped to this request.
    fn scope(&mut self) -> &mut dyn RequestScope;
}

impl<S: std::hash::BuildHasher> RequestScope for HashMap<String, Arc<TraceContext>, S> {
    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Arc<TraceContext>> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, context: Arc<TraceContext>) {
        self.insert(key.to_string(), context);
    }
}

/// Contexts stored in `http::Extensions`, which are keyed by type.
#[derive(Clone, Default)]
struct ScopedContexts(HashMap<String, Arc<TraceContext>>);

impl RequestScope for Extensions {
    fn contains(&self, key: &str) -> bool {
        self.get::<ScopedContexts>()
            .is_some_and(|scoped| scoped.0.contains_key(key))
    }

    fn get(&self, key: &str) -> Option<Arc<TraceContext>> {
        Extensions::get::<ScopedContexts>(self).and_then(|scoped| scoped.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, context: Arc<TraceContext>) {
        if let Some(scoped) = self.get_mut::<ScopedContexts>() {
            scoped.0.insert(key.to_string(), context);
            return;
        }

        let mut scoped = ScopedContexts::default();
        scoped.0.insert(key.to_string(), context);
        self.insert(scoped);
    }
}

impl<B> RequestContext for http::Request<B> {
    fn headers(&self) -> &dyn Extractor {
        http::Request::headers(self)
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn scope(&mut self) -> &mut dyn RequestScope {
        self.extensions_mut()
    }
}

/// Inbound request assembled from its parts.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use b3_propagation::{InboundRequest, RequestContext};
///
/// let headers = HashMap::from([("X-B3-TraceId".to_string(), "1a2b3c".to_string())]);
/// let request = InboundRequest::new(headers, "/orders");
///
/// assert_eq!(request.path(), "/orders");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InboundRequest<H = HashMap<String, String>> {
    headers: H,
    path: String,
    scope: HashMap<String, Arc<TraceContext>>,
}

impl<H: Extractor> InboundRequest<H> {
    pub fn new(headers: H, path: impl Into<String>) -> Self {
        Self {
            headers,
            path: path.into(),
            scope: HashMap::new(),
        }
    }
}

impl InboundRequest<HeaderMap> {
    #[must_use]
    pub fn from_header_map(headers: HeaderMap, path: impl Into<String>) -> Self {
        Self::new(headers, path)
    }
}

impl<H: Extractor> RequestContext for InboundRequest<H> {
    fn headers(&self) -> &dyn Extractor {
        &self.headers
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn scope(&mut self) -> &mut dyn RequestScope {
        &mut self.scope
    }
}
