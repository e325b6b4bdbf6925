//! Two-phase place enrichment
//!
//! `Submitting → OptimisticallySaved → DetailPending → Settled`
//!
//! 1. Reject duplicates without touching the network.
//! 2. Basic resolution establishes existence and country.
//! 3. The place is saved immediately with a placeholder description and
//!    control returns to the caller.
//! 4. A spawned task runs detailed resolution and posts the result back to
//!    the store. It captures only the place id, the name and shared handles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AddPlaceError;
use crate::models::Place;
use crate::services::{encode_data_uri, ImageUpload, PlaceResolver};
use crate::store::{self, DetailResult, SharedStore};

/// Workflow stage, used for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submitting,
    OptimisticallySaved,
    DetailPending,
    Settled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Submitting => "submitting",
            Stage::OptimisticallySaved => "optimistically_saved",
            Stage::DetailPending => "detail_pending",
            Stage::Settled => "settled",
        };
        f.write_str(name)
    }
}

/// A user's add-place submission
#[derive(Debug, Clone)]
pub struct AddPlaceRequest {
    pub name: String,
    pub image: ImageUpload,
    pub note: Option<String>,
    pub tags: Vec<String>,
}

/// How a background detail fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Enriched,
    Failed { reason: String },
    /// Place deleted (or already settled) before the result arrived
    Discarded,
}

/// Result of a successful submission
///
/// The place is already visible in the store. `detail_task` completes once
/// the background detail fetch has settled; dropping it detaches the task.
#[derive(Debug)]
pub struct AddPlaceOutcome {
    pub place_id: Uuid,
    pub country_name: String,
    pub detail_task: JoinHandle<Settlement>,
}

/// Orchestrates basic and detailed resolution against the store
#[derive(Clone)]
pub struct EnrichmentWorkflow {
    store: SharedStore,
    resolver: Arc<dyn PlaceResolver>,
    detail_timeout: Option<Duration>,
}

impl EnrichmentWorkflow {
    pub fn new(store: SharedStore, resolver: Arc<dyn PlaceResolver>) -> Self {
        Self {
            store,
            resolver,
            detail_timeout: None,
        }
    }

    /// Settle a detail fetch as failed once `timeout` elapses (`None` waits forever)
    pub fn with_detail_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.detail_timeout = timeout;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Submit a new place
    ///
    /// Returns once the place is optimistically saved. Errors leave the
    /// store untouched.
    pub async fn add_place(
        &self,
        request: AddPlaceRequest,
    ) -> Result<AddPlaceOutcome, AddPlaceError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AddPlaceError::EmptyName);
        }

        debug!(place = %name, stage = %Stage::Submitting, "Place submitted");

        if self.store.read().await.contains_place_named(&name) {
            info!(place = %name, "Duplicate place rejected");
            return Err(AddPlaceError::DuplicatePlace(name));
        }

        let basic = self.resolver.resolve_basic(&name).await.map_err(|e| {
            warn!(place = %name, error = %e, "Basic place resolution failed");
            AddPlaceError::LookupFailed(e)
        })?;

        let country_name = basic.country_name.trim();
        if !basic.place_exists || country_name.is_empty() {
            info!(place = %name, "Place not recognised");
            return Err(AddPlaceError::PlaceNotFound(name));
        }

        let image_url = request
            .image
            .into_bytes()
            .and_then(|bytes| encode_data_uri(&bytes))
            .map_err(|e| AddPlaceError::InvalidImage(e.to_string()))?;

        let place = Place::new_pending(name.clone(), image_url, request.note, request.tags);
        let place_id = place.id;

        let country_name = country_name.to_string();
        let country_code = basic.country_code.trim().to_string();
        store::mutate(&self.store, {
            let country_name = country_name.clone();
            move |store| store.add_place(&country_name, &country_code, place)
        })
        .await??;

        info!(
            place_id = %place_id,
            place = %name,
            country = %country_name,
            stage = %Stage::OptimisticallySaved,
            "Place saved, fetching details in background"
        );

        let detail_task = self.spawn_detail_fetch(place_id, name);

        Ok(AddPlaceOutcome {
            place_id,
            country_name,
            detail_task,
        })
    }

    fn spawn_detail_fetch(&self, place_id: Uuid, place_name: String) -> JoinHandle<Settlement> {
        let shared_store = self.store.clone();
        let resolver = self.resolver.clone();
        let timeout = self.detail_timeout;

        tokio::spawn(async move {
            debug!(place_id = %place_id, stage = %Stage::DetailPending, "Detail fetch started");

            let result = fetch_details(resolver.as_ref(), &place_name, timeout).await;
            let settlement = match &result {
                DetailResult::Success(_) => Settlement::Enriched,
                DetailResult::Failure { reason } => {
                    warn!(
                        place_id = %place_id,
                        place = %place_name,
                        reason = %reason,
                        "Detail fetch failed"
                    );
                    Settlement::Failed {
                        reason: reason.clone(),
                    }
                }
            };

            let applied =
                store::mutate(&shared_store, move |store| store.reconcile_details(place_id, result))
                    .await;
            match applied {
                Ok(true) => {}
                Ok(false) => {
                    debug!(place_id = %place_id, "Detail result discarded");
                    return Settlement::Discarded;
                }
                Err(e) => {
                    warn!(place_id = %place_id, error = %e, "Detail result could not be applied");
                    return Settlement::Discarded;
                }
            }

            info!(
                place_id = %place_id,
                stage = %Stage::Settled,
                outcome = ?settlement,
                "Place details settled"
            );
            settlement
        })
    }
}

async fn fetch_details(
    resolver: &dyn PlaceResolver,
    place_name: &str,
    timeout: Option<Duration>,
) -> DetailResult {
    let lookup = resolver.resolve_details(place_name);

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, lookup).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return DetailResult::Failure {
                    reason: format!("detail lookup timed out after {:?}", limit),
                }
            }
        },
        None => lookup.await,
    };

    match outcome {
        Ok(details) => DetailResult::Success(details),
        Err(e) => DetailResult::Failure {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::OptimisticallySaved.to_string(), "optimistically_saved");
        assert_eq!(Stage::Settled.to_string(), "settled");
    }
}
