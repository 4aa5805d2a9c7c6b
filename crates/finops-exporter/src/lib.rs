//! finops-exporter: wires the FinOps crates into one running exporter.
//!
//! ```text
//!   config.yaml ─▶ load_config ─▶ CycleDriver ─────────────────────────────┐
//!                                  │ fetch ─▶ normalize ─▶ reconcile ─▶ spawn │
//!                                  └──────────── sleep(pollingInterval) ◀──┘
//!                                                   │
//!                                  GaugeRegistry ◀──┘──▶ GET /metrics
//! ```

pub mod cycle;
pub mod startup;

pub use cycle::{CycleDriver, CycleReport};
pub use startup::load_config;
