//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the engine without
//! making real network or geocoding calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, Result};
use crate::traits::{Fetcher, Geocoder};
use crate::types::GeoPoint;

/// A mock fetcher for testing.
///
/// Returns predefined bodies or errors without touching the network.
#[derive(Default)]
pub struct MockFetcher {
    /// Predefined response bodies by URL
    responses: Arc<RwLock<HashMap<String, Vec<u8>>>>,

    /// Predefined failures by URL
    errors: Arc<RwLock<HashMap<String, FetchError>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockFetcherCall>>>,
}

/// Record of a call made to the mock fetcher.
#[derive(Debug, Clone)]
pub struct MockFetcherCall {
    pub url: String,
    pub timeout: Duration,
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined response body for a URL.
    pub fn with_response(self, url: impl Into<String>, body: Vec<u8>) -> Self {
        self.responses.write().unwrap().insert(url.into(), body);
        self
    }

    /// Add a predefined UTF-8 response body for a URL.
    pub fn with_text_response(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), body.into().into_bytes());
        self
    }

    /// Make a URL fail with the given error on every attempt.
    pub fn with_error(self, url: impl Into<String>, error: FetchError) -> Self {
        self.errors.write().unwrap().insert(url.into(), error);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockFetcherCall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
        self.calls.write().unwrap().push(MockFetcherCall {
            url: url.to_string(),
            timeout,
        });

        if let Some(error) = self.errors.read().unwrap().get(url) {
            return Err(error.clone());
        }

        self.responses
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Network {
                url: url.to_string(),
                reason: "no mock response".to_string(),
            })
    }
}

/// A mock geocoder for testing.
///
/// Resolves predefined addresses; anything else resolves to `None`.
#[derive(Default)]
pub struct MockGeocoder {
    /// Predefined coordinates by address substring match
    points: Arc<RwLock<Vec<(String, GeoPoint)>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockGeocoder {
    /// Create a new mock geocoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve any address containing `fragment` to `point`.
    pub fn with_point(self, fragment: impl Into<String>, point: GeoPoint) -> Self {
        self.points
            .write()
            .unwrap()
            .push((fragment.into().to_lowercase(), point));
        self
    }

    /// Get all addresses this mock was asked to resolve.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        self.calls.write().unwrap().push(address.to_string());

        let needle = address.to_lowercase();
        Ok(self
            .points
            .read()
            .unwrap()
            .iter()
            .find(|(fragment, _)| needle.contains(fragment.as_str()))
            .map(|(_, point)| *point))
    }
}
