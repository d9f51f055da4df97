//! Discrete-event simulation of a pizzeria's order-fulfillment process:
//! phone intake, preparation, baking, packaging and delivery over shared
//! resources and threshold-replenished inventory, with antithetic-variate
//! support for variance-reduced replication.

pub mod core;
pub mod model;
pub mod variates;

pub use crate::model::config::SimConfig;
pub use crate::model::{get_metrics, run, run_with_config, FacilityReport, RunHandle};
pub use crate::variates::{
    antithetic_pair, interarrival_pair, pair_base_seeds, validate_pair_count, StreamBudgets,
    UniformStreams,
};
