//! Filter-and-aggregate core of a customer churn dashboard.
//!
//! Loads a customer CSV once into an immutable table, filters it by contract
//! type and payment method, and computes headline KPIs plus one series per
//! declared chart. Rendering belongs to the caller; [`presentation`] hands it
//! a ready-to-serialize payload.

pub mod aggregation;
pub mod category;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod presentation;
pub mod schema;
pub mod session;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{ChartCatalog, ChartSpec, ChartVariant};
pub use config::DashboardConfig;
pub use dataset::{CustomerRecord, Dataset};
pub use engine::{AggregationEngine, AggregationResult, Kpis};
pub use error::ChurnError;
pub use filter::FilterSelection;
pub use presentation::{DashboardPayload, Locale};
pub use session::DashboardSession;
