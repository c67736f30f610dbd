// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Carrier traits for trace context propagation.
//!
//! Carriers provide an abstraction for reading from and writing to the
//! transport that moves B3 headers between services.
//!
//! # Carrier Types
//!
//! This module implements carriers for:
//! - **HashMap**: For testing and in-memory operations
//! - **serde_json::Value**: For JSON-based message formats
//! - **http::HeaderMap**: For hyper/axum based servers and clients
//!
//! # Case Handling
//!
//! Lookups are case-insensitive, since HTTP header names are. Writes keep the
//! casing they are given (`X-B3-TraceId`) wherever the carrier can store it;
//! `http::HeaderMap` always normalizes names to lowercase.

use std::collections::HashMap;

use http::{header::HeaderName, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

/// Trait for injecting trace context into a carrier.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use b3_propagation::Injector;
///
/// let mut headers: HashMap<String, String> = HashMap::new();
/// headers.set("X-B3-TraceId", "1a2b3c".to_string());
///
/// assert_eq!(headers.get("X-B3-TraceId"), Some(&"1a2b3c".to_string()));
/// ```
pub trait Injector {
    /// Sets a key-value pair in the carrier, replacing any previous value
    /// stored under the same (case-insensitive) key.
    fn set(&mut self, key: &str, value: String);
}

/// Trait for extracting trace context from a carrier.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use b3_propagation::{Extractor, Injector};
///
/// let mut headers: HashMap<String, String> = HashMap::new();
/// headers.set("X-B3-TraceId", "1a2b3c".to_string());
///
/// assert_eq!(Extractor::get(&headers, "x-b3-traceid"), Some("1a2b3c"));
/// ```
pub trait Extractor {
    /// Gets a value from the carrier by key (case-insensitive).
    fn get(&self, key: &str) -> Option<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    fn set(&mut self, key: &str, value: String) {
        // Drop any differently-cased duplicate so lookups stay unambiguous
        self.retain(|k, _| k == key || !k.eq_ignore_ascii_case(key));
        self.insert(key.to_string(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = HashMap::get(self, key) {
            return Some(value.as_str());
        }

        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Only works with `Value::Object` variants. Non-object values are silently ignored.
impl Injector for Value {
    fn set(&mut self, key: &str, value: String) {
        if let Value::Object(map) = self {
            map.retain(|k, _| k == key || !k.eq_ignore_ascii_case(key));
            map.insert(key.to_string(), Value::String(value));
        }
    }
}

/// Only works with `Value::Object` variants. Non-object values return `None`.
impl Extractor for Value {
    fn get(&self, key: &str) -> Option<&str> {
        let Value::Object(map) = self else {
            return None;
        };

        map.get(key)
            .or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .and_then(Value::as_str)
    }
}

/// Values that are not visible ASCII are treated as absent.
impl Extractor for HeaderMap {
    fn get(&self, key: &str) -> Option<&str> {
        HeaderMap::get(self, key).and_then(|value| value.to_str().ok())
    }
}

/// Invalid header names or values are skipped and logged.
impl Injector for HeaderMap {
    fn set(&mut self, key: &str, value: String) {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                debug!("Skipping invalid header name {key:?}: {e}");
                return;
            }
        };

        match HeaderValue::from_str(&value) {
            Ok(value) => {
                self.insert(name, value);
            }
            Err(e) => debug!("Skipping invalid value for header {key}: {e}"),
        }
    }
}
