//! Pizzeria semantics layered on the core kernel: configuration, the call
//! and order pipelines, inventory reviews, and the run entry point.
//!
//! A run owns everything: its kernel, its model state, its sampler. The
//! simulation clock starts at hour 0 of day 0 and the shop opens at 10:00,
//! so a run over `horizon_hours` of operation closes at `horizon + 10`.

pub mod arrivals;
pub mod config;
pub mod inventory;
pub mod metrics;
pub mod order;
pub mod pizza;

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::core::{BinId, KernelBuilder, ProcessId, ResourceId, RunOutcome};
use crate::variates::{Sampler, UniformStreams};

use self::arrivals::ArrivalProcess;
use self::config::{ArrivalRates, SimConfig};
use self::inventory::{Ingredient, ReviewScope, ReviewTimer};
use self::metrics::{MetricsSnapshot, Tally};
use self::pizza::PizzaKind;

/// Days 5 and 6 of each week are the weekend.
pub fn is_weekend(time_hours: f64) -> bool {
    let day = (time_hours / 24.0).floor() as i64;
    matches!(day.rem_euclid(7), 5 | 6)
}

/// Handles to the static facilities of one run.
pub struct Facilities {
    pub phone_lines: ResourceId,
    pub prep_stations: ResourceId,
    pub oven: ResourceId,
    pub packaging: ResourceId,
    pub workers: ResourceId,
    pub drivers: ResourceId,
    bins: [BinId; 4],
}

impl Facilities {
    pub fn bin(&self, ingredient: Ingredient) -> BinId {
        self.bins[ingredient.index()]
    }
}

/// Per-run model state, owned by the kernel and mutated only from process
/// resumes.
pub struct PizzeriaModel {
    pub cfg: SimConfig,
    pub sampler: Sampler,
    pub tally: Tally,
    pub fac: Facilities,
    /// Absolute closing time: no new calls at or after this instant.
    pub close_at: f64,
    /// Orders the drain sequence waits on at the horizon.
    pub active_orders: Vec<ProcessId>,
}

impl PizzeriaModel {
    pub fn pizza_price(&self, kind: PizzaKind) -> f64 {
        match kind {
            PizzaKind::Cheese => self.cfg.prices.cheese_pizza,
            PizzaKind::Pepperoni => self.cfg.prices.pepperoni_pizza,
            PizzaKind::AllMeat => self.cfg.prices.all_meat_pizza,
        }
    }

    /// Replenishment lead time for `ingredient`, hours.
    pub fn restock_hours(&mut self, ingredient: Ingredient) -> f64 {
        match ingredient {
            Ingredient::Sauce => self.sampler.sauce_restock_hours(),
            Ingredient::Cheese => self.sampler.cheese_restock_hours(),
            Ingredient::Pepperoni => self.sampler.pepperoni_restock_hours(),
            Ingredient::MeatMix => self.sampler.meat_restock_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceUsage {
    pub name: String,
    pub capacity: usize,
    pub peak_in_use: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinUsage {
    pub name: String,
    pub capacity: f64,
    pub min_level: f64,
    pub max_level: f64,
}

/// End-of-run facility watermarks, for invariant checks and capacity studies.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityReport {
    pub resources: Vec<ResourceUsage>,
    pub bins: Vec<BinUsage>,
}

/// The frozen outcome of one replication. Cheap to clone into result
/// collections; reading it never recomputes anything.
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub id: Uuid,
    pub outcome: RunOutcome,
    pub horizon_hours: f64,
    pub snapshot: MetricsSnapshot,
    pub facilities: FacilityReport,
    pub tally: Tally,
}

impl RunHandle {
    /// The name-keyed metric mapping the replication driver consumes.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        self.snapshot.to_map()
    }
}

/// Metric mapping for a completed run.
pub fn get_metrics(handle: &RunHandle) -> BTreeMap<String, f64> {
    handle.metrics()
}

/// One replication under the default configuration. `streams` carries the
/// substituted uniforms for antithetic runs; `None` draws everything from
/// the seeded base generator.
pub fn run(
    horizon_hours: f64,
    seed: u64,
    streams: Option<UniformStreams>,
) -> Result<RunHandle, String> {
    run_with_config(SimConfig::default(), horizon_hours, seed, streams)
}

/// One replication under an explicit configuration.
pub fn run_with_config(
    cfg: SimConfig,
    horizon_hours: f64,
    seed: u64,
    streams: Option<UniformStreams>,
) -> Result<RunHandle, String> {
    if !(horizon_hours > 0.0) || !horizon_hours.is_finite() {
        return Err(format!(
            "horizon must be a positive finite number of hours, got {}",
            horizon_hours
        ));
    }
    cfg.validate()?;

    let mut builder = KernelBuilder::new();
    let fac = Facilities {
        phone_lines: builder.add_resource("phone lines", cfg.resources.phone_lines)?,
        prep_stations: builder.add_resource("prep stations", cfg.resources.prep_stations)?,
        oven: builder.add_resource("oven slots", cfg.resources.oven_slots)?,
        packaging: builder.add_resource("packaging stations", cfg.resources.packaging_stations)?,
        workers: builder.add_resource("workers", cfg.resources.workers)?,
        drivers: builder.add_resource("drivers", cfg.resources.drivers)?,
        bins: [
            builder.add_container("sauce", cfg.inventory.sauce.capacity)?,
            builder.add_container("cheese", cfg.inventory.cheese.capacity)?,
            builder.add_container("pepperoni", cfg.inventory.pepperoni.capacity)?,
            builder.add_container("meat mix", cfg.inventory.meat_mix.capacity)?,
        ],
    };

    let sampler = Sampler::new(seed, streams.unwrap_or_else(UniformStreams::empty), &cfg)?;
    let close_at = ArrivalRates::OPENING_HOUR + horizon_hours;
    let model = PizzeriaModel {
        cfg,
        sampler,
        tally: Tally::new(),
        fac,
        close_at,
        active_orders: Vec::new(),
    };

    let mut kernel = builder.build(model);
    kernel.spawn(Box::new(ArrivalProcess::new()));
    kernel.spawn(Box::new(ReviewTimer::new(ReviewScope::Sauce)));
    kernel.spawn(Box::new(ReviewTimer::new(ReviewScope::Pantry)));

    let id = Uuid::new_v4();
    info!(
        "[run {}] t=0.0000 starting: horizon {:.1} h, seed {}",
        id, horizon_hours, seed
    );
    let outcome = kernel.run();

    let facilities = FacilityReport {
        resources: kernel
            .resources()
            .iter()
            .map(|pool| ResourceUsage {
                name: pool.name().to_string(),
                capacity: pool.capacity(),
                peak_in_use: pool.peak_in_use(),
            })
            .collect(),
        bins: kernel
            .bins()
            .iter()
            .map(|bin| BinUsage {
                name: bin.name().to_string(),
                capacity: bin.capacity(),
                min_level: bin.min_level(),
                max_level: bin.max_level(),
            })
            .collect(),
    };

    let finished_at = kernel.now();
    let model = kernel.into_model();
    let snapshot = MetricsSnapshot::compute(&model.tally, &model.cfg, horizon_hours);
    info!(
        "[run {}] t={:.4} finished ({:?}): {} calls, profit {:.0}",
        id, finished_at, outcome, model.tally.calls_total, snapshot.profit
    );

    Ok(RunHandle {
        id,
        outcome,
        horizon_hours,
        snapshot,
        facilities,
        tally: model.tally,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekend_flag_follows_day_index() {
        assert!(!is_weekend(0.0));
        assert!(!is_weekend(4.0 * 24.0 + 12.0));
        assert!(is_weekend(5.0 * 24.0));
        assert!(is_weekend(6.0 * 24.0 + 23.9));
        assert!(!is_weekend(7.0 * 24.0));
    }

    #[test]
    fn test_rejects_bad_horizon() {
        assert!(run(0.0, 1, None).is_err());
        assert!(run(-5.0, 1, None).is_err());
        assert!(run(f64::NAN, 1, None).is_err());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut cfg = SimConfig::default();
        cfg.resources.drivers = 0;
        assert!(run_with_config(cfg, 24.0, 1, None).is_err());
    }
}
