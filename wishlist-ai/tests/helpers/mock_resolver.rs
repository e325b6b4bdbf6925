//! Scripted [`PlaceResolver`] for driving the workflow without a network

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use wishlist_ai::services::{BasicResolution, DetailedResolution, PlaceResolver, ResolveError};

/// Answers are keyed by lowercased place name
///
/// Unscripted basic lookups report the place as non-existent; unscripted
/// detail lookups fail with a 500.
#[derive(Default)]
pub struct MockResolver {
    basic: Mutex<HashMap<String, Result<BasicResolution, ResolveError>>>,
    details: Mutex<HashMap<String, Result<DetailedResolution, ResolveError>>>,
    detail_gate: Option<Semaphore>,
    basic_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(self, name: &str, country_name: &str, country_code: &str) -> Self {
        self.script_basic(
            name,
            Ok(BasicResolution {
                place_exists: true,
                country_name: country_name.to_string(),
                country_code: country_code.to_string(),
            }),
        )
    }

    pub fn with_unknown_place(self, name: &str) -> Self {
        self.script_basic(
            name,
            Ok(BasicResolution {
                place_exists: false,
                country_name: String::new(),
                country_code: String::new(),
            }),
        )
    }

    pub fn with_basic_error(self, name: &str, error: ResolveError) -> Self {
        self.script_basic(name, Err(error))
    }

    pub fn with_details(self, name: &str, details: DetailedResolution) -> Self {
        self.script_details(name, Ok(details))
    }

    pub fn with_detail_error(self, name: &str, error: ResolveError) -> Self {
        self.script_details(name, Err(error))
    }

    /// Block detail lookups until [`release_details`](Self::release_details)
    pub fn holding_details(mut self) -> Self {
        self.detail_gate = Some(Semaphore::new(0));
        self
    }

    /// Let `count` held detail lookups complete
    pub fn release_details(&self, count: usize) {
        if let Some(gate) = &self.detail_gate {
            gate.add_permits(count);
        }
    }

    pub fn basic_calls(&self) -> usize {
        self.basic_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn script_basic(self, name: &str, answer: Result<BasicResolution, ResolveError>) -> Self {
        self.basic.lock().unwrap().insert(name.to_lowercase(), answer);
        self
    }

    fn script_details(self, name: &str, answer: Result<DetailedResolution, ResolveError>) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), answer);
        self
    }
}

#[async_trait]
impl PlaceResolver for MockResolver {
    async fn resolve_basic(&self, place_name: &str) -> Result<BasicResolution, ResolveError> {
        self.basic_calls.fetch_add(1, Ordering::SeqCst);

        self.basic
            .lock()
            .unwrap()
            .get(&place_name.to_lowercase())
            .cloned()
            .unwrap_or(Ok(BasicResolution {
                place_exists: false,
                country_name: String::new(),
                country_code: String::new(),
            }))
    }

    async fn resolve_details(
        &self,
        place_name: &str,
    ) -> Result<DetailedResolution, ResolveError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.detail_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.details
            .lock()
            .unwrap()
            .get(&place_name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| Err(ResolveError::ApiError(500, "unscripted".to_string())))
    }
}
