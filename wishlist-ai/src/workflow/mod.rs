//! Place enrichment workflow

pub mod enrichment;

pub use enrichment::{
    AddPlaceOutcome, AddPlaceRequest, EnrichmentWorkflow, Settlement, Stage,
};
