//! Maybe Market Data Crate
//!
//! This crate fetches security metadata and daily prices from external
//! financial-data vendors.
//!
//! # Overview
//!
//! - Two vendors: Synth Finance and Financial Modeling Prep (FMP)
//! - One HTTP client per vendor with exponential backoff on transient failures
//! - Malformed vendor records are skipped and sent to an [`ErrorReporter`]
//!
//! # Core Types
//!
//! - [`Security`] - A symbol search result
//! - [`SecurityInfo`] - Profile data (name, links, logo, kind)
//! - [`Price`] - Daily price for a security
//! - [`SecurityProvider`] - Trait every vendor adapter implements
//!
//! Choosing between vendors (primary first, fallback second) lives in
//! `maybe-core`.

pub mod errors;
pub mod models;
pub mod provider;
pub mod reporting;

pub use errors::MarketDataError;

pub use models::{
    Currency, Mic, Price, Security, SecurityInfo, SecurityKind, DEFAULT_CURRENCY,
};

pub use provider::fmp::FmpProvider;
pub use provider::synth::SynthProvider;
pub use provider::{RetryPolicy, SecurityProvider, USER_AGENT};

pub use reporting::{
    ErrorReport, ErrorReporter, LogErrorReporter, MockErrorReporter, ReportLevel,
};
