//! finops-metrics: the exporter's gauge registry and its reconciler.
//!
//! # Architecture
//!
//! ```text
//! GaugeReconciler::reconcile(records)          (write lock for the whole pass)
//!   ├── value column: BilledCost (cost) │ index 3 (resource)
//!   ├── per row: LabelSet → SeriesIdentity
//!   │     ├── known   → set value, mark seen
//!   │     └── unknown → new Gauge, register, mark seen
//!   └── sweep: unregister + drop unseen, reset seen flags
//!
//! GaugeRegistry::render()                       (read lock, /metrics)
//! ```
//!
//! A series' identity is its name plus sorted labels; the value is not part
//! of it, so a changed value updates the existing gauge.

pub mod error;
pub mod identity;
pub mod reconciler;
pub mod registry;

pub use error::ReconcileError;
pub use identity::SeriesIdentity;
pub use reconciler::{COST_SERIES, COST_VALUE_COLUMN, GaugeReconciler, ReconcileReport};
pub use registry::GaugeRegistry;
