//! Securities module - domain models, provider fallback and price import.

mod price_importer;
mod securities_constants;
mod securities_model;
mod securities_service;
mod securities_traits;

#[cfg(test)]
mod securities_model_tests;
#[cfg(test)]
mod securities_service_tests;

pub use price_importer::{cached_range_complete, PriceImporter};
pub use securities_constants::*;
pub use securities_model::{Security, SecurityPrice};
pub use securities_service::SecurityService;
pub use securities_traits::{
    SecurityPriceRepositoryTrait, SecurityRepositoryTrait, SecurityServiceTrait,
};
