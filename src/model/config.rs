//! Canonical model parameters. Every distribution parameter, capacity,
//! price and rate the simulation uses lives here; model code reads the
//! config instead of scattering literals.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCapacities {
    pub phone_lines: usize,
    pub prep_stations: usize,
    pub oven_slots: usize,
    pub packaging_stations: usize,
    pub workers: usize,
    pub drivers: usize,
}

impl Default for ResourceCapacities {
    fn default() -> Self {
        Self {
            phone_lines: 3,
            prep_stations: 3,
            oven_slots: 10,
            packaging_stations: 3,
            workers: 5,
            drivers: 6,
        }
    }
}

/// Bounds for one inventory container. Sauce is millilitres, the rest are
/// discrete units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockSpec {
    pub capacity: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub sauce: StockSpec,
    pub cheese: StockSpec,
    pub pepperoni: StockSpec,
    pub meat_mix: StockSpec,
}

impl InventoryConfig {
    pub fn spec(&self, ingredient: super::inventory::Ingredient) -> StockSpec {
        use super::inventory::Ingredient;
        match ingredient {
            Ingredient::Sauce => self.sauce,
            Ingredient::Cheese => self.cheese,
            Ingredient::Pepperoni => self.pepperoni,
            Ingredient::MeatMix => self.meat_mix,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            sauce: StockSpec { capacity: 15_000.0, threshold: 3_000.0 },
            cheese: StockSpec { capacity: 1_000.0, threshold: 200.0 },
            pepperoni: StockSpec { capacity: 800.0, threshold: 300.0 },
            meat_mix: StockSpec { capacity: 600.0, threshold: 100.0 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceList {
    pub cheese_pizza: f64,
    pub pepperoni_pizza: f64,
    pub all_meat_pizza: f64,
    /// Ingredient cost as a fraction of the menu price.
    pub ingredient_cost_factor: f64,
    pub lost_call_penalty: f64,
    /// Fraction of the order value owed when a premium order runs late.
    pub compensation_factor: f64,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            cheese_pizza: 7_000.0,
            pepperoni_pizza: 9_000.0,
            all_meat_pizza: 12_000.0,
            ingredient_cost_factor: 0.3,
            lost_call_penalty: 10_000.0,
            compensation_factor: 0.2,
        }
    }
}

/// Weekly rent per unit of each stationary facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedCosts {
    pub phone_line: f64,
    pub prep_station: f64,
    pub oven_slot: f64,
    pub packaging_station: f64,
}

impl Default for FixedCosts {
    fn default() -> Self {
        Self {
            phone_line: 50_000.0,
            prep_station: 60_000.0,
            oven_slot: 40_000.0,
            packaging_station: 30_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborConfig {
    pub worker_wage: f64,
    pub driver_wage: f64,
    pub overtime_factor: f64,
    /// Scheduled shift length from the 10:00 opening, in hours.
    pub weekday_shift_hours: f64,
    pub weekend_shift_hours: f64,
}

impl Default for LaborConfig {
    fn default() -> Self {
        Self {
            worker_wage: 4_000.0,
            driver_wage: 3_000.0,
            overtime_factor: 1.4,
            weekday_shift_hours: 13.0,
            weekend_shift_hours: 15.0,
        }
    }
}

/// Hourly call rates from the 10:00 opening: 12 weekday slots (10..=21) and
/// 14 weekend slots (10..=23).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalRates {
    pub weekday: Vec<f64>,
    pub weekend: Vec<f64>,
}

impl ArrivalRates {
    pub const OPENING_HOUR: f64 = 10.0;

    /// Rate for an in-window hour-of-day, by calendar kind.
    pub fn rate_at(&self, hour: usize, weekend: bool) -> f64 {
        let table = if weekend { &self.weekend } else { &self.weekday };
        table
            .get(hour.saturating_sub(Self::OPENING_HOUR as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Last hour-of-day slot carrying a rate (21 weekday, 23 weekend).
    pub fn last_slot(&self, weekend: bool) -> usize {
        let table = if weekend { &self.weekend } else { &self.weekday };
        Self::OPENING_HOUR as usize + table.len().saturating_sub(1)
    }
}

impl Default for ArrivalRates {
    fn default() -> Self {
        Self {
            weekday: vec![2.0, 6.0, 12.0, 20.0, 12.0, 14.0, 12.0, 10.0, 9.0, 8.0, 6.0, 4.0],
            weekend: vec![
                2.0, 8.0, 18.0, 25.0, 25.0, 24.0, 18.0, 12.0, 11.0, 10.0, 9.0, 8.0, 6.0, 4.0,
            ],
        }
    }
}

/// Customer mix: premium share, pizzas-per-order and pizza-type weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMix {
    pub premium_probability: f64,
    pub count_weights_premium: [f64; 4],
    pub count_weights_regular: [f64; 4],
    pub type_weights_premium: [f64; 3],
    pub type_weights_regular: [f64; 3],
}

impl Default for OrderMix {
    fn default() -> Self {
        Self {
            premium_probability: 0.15,
            count_weights_premium: [0.3, 0.4, 0.2, 0.1],
            count_weights_regular: [0.6, 0.2, 0.15, 0.05],
            type_weights_premium: [0.3, 0.6, 0.1],
            type_weights_regular: [0.1, 0.4, 0.5],
        }
    }
}

/// Service-time and quantity distribution parameters. Durations are in
/// minutes unless noted; the sampler converts to hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTimes {
    /// Call handling: Gamma(shape, scale) minutes.
    pub call_gamma: (f64, f64),
    /// Sauce quantity: Exponential mean, millilitres.
    pub sauce_quantity_mean: f64,
    /// Sauce application: Beta(a, b) minutes.
    pub sauce_apply_beta: (f64, f64),
    /// Cheese quantity: NegBinomial(n, p) units.
    pub cheese_quantity_nb: (f64, f64),
    /// Cheese application: Triangular(min, mode, max) minutes.
    pub cheese_apply_tri: (f64, f64, f64),
    /// Pepperoni quantity: Poisson mean, units.
    pub pepperoni_quantity_mean: f64,
    /// Pepperoni application: Lognormal(mu, sigma) minutes.
    pub pepperoni_apply_lognormal: (f64, f64),
    /// Meat-mix quantity: Binomial(n, p) units.
    pub meat_quantity_binomial: (u64, f64),
    /// Meat-mix application: Uniform(low, high) minutes.
    pub meat_apply_uniform: (f64, f64),
    /// Baking: Lognormal(mu, sigma) minutes.
    pub bake_lognormal: (f64, f64),
    /// Packaging: Triangular(min, mode, max) minutes.
    pub pack_tri: (f64, f64, f64),
    /// Each dispatch leg: Gamma(shape, scale) minutes.
    pub dispatch_gamma: (f64, f64),
    /// Orders slower than this (hours, talk end to doorstep) are late.
    pub late_threshold_hours: f64,
}

impl Default for ServiceTimes {
    fn default() -> Self {
        Self {
            call_gamma: (4.0, 0.5),
            sauce_quantity_mean: 250.0,
            sauce_apply_beta: (5.0, 2.2),
            cheese_quantity_nb: (25.0, 0.52),
            cheese_apply_tri: (0.9, 1.0, 1.2),
            pepperoni_quantity_mean: 20.0,
            pepperoni_apply_lognormal: (0.5, 0.25),
            meat_quantity_binomial: (16, 0.42),
            meat_apply_uniform: (1.0, 1.8),
            bake_lognormal: (2.5, 0.2),
            pack_tri: (1.1, 2.0, 2.3),
            dispatch_gamma: (7.5, 0.9),
            late_threshold_hours: 1.0,
        }
    }
}

/// Replenishment lead-time distributions, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockTimes {
    /// Sauce: standard Weibull(shape) scaled by this many minutes.
    pub sauce_weibull_shape: f64,
    pub sauce_scale_minutes: f64,
    /// Cheese: Lognormal(mu, sigma) minutes.
    pub cheese_lognormal: (f64, f64),
    pub pepperoni_weibull_shape: f64,
    pub pepperoni_scale_minutes: f64,
    /// Meat mix: Exponential mean minutes.
    pub meat_exp_mean_minutes: f64,
}

impl Default for RestockTimes {
    fn default() -> Self {
        Self {
            sauce_weibull_shape: 1.2,
            sauce_scale_minutes: 10.0,
            cheese_lognormal: (1.58, 0.25),
            pepperoni_weibull_shape: 1.3,
            pepperoni_scale_minutes: 3.9,
            meat_exp_mean_minutes: 5.0,
        }
    }
}

/// Background inventory review cadence, in hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub sauce_interval: f64,
    pub pantry_interval: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            sauce_interval: 0.5,
            pantry_interval: 0.75,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    pub resources: ResourceCapacities,
    pub inventory: InventoryConfig,
    pub prices: PriceList,
    pub fixed_costs: FixedCosts,
    pub labor: LaborConfig,
    pub arrivals: ArrivalRates,
    pub order_mix: OrderMix,
    pub service: ServiceTimes,
    pub restock: RestockTimes,
    pub reviews: ReviewConfig,
}

fn check_probability(name: &str, p: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&p) {
        return Err(format!("{} must be a probability in [0, 1], got {}", name, p));
    }
    Ok(())
}

fn check_weights(name: &str, weights: &[f64]) -> Result<(), String> {
    if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(format!("{} weights must be finite and non-negative", name));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > 1e-9 {
        return Err(format!("{} weights must sum to 1, got {}", name, total));
    }
    Ok(())
}

impl SimConfig {
    /// Reject malformed parameter sets before any simulation starts.
    pub fn validate(&self) -> Result<(), String> {
        let caps = [
            ("phone lines", self.resources.phone_lines),
            ("prep stations", self.resources.prep_stations),
            ("oven slots", self.resources.oven_slots),
            ("packaging stations", self.resources.packaging_stations),
            ("workers", self.resources.workers),
            ("drivers", self.resources.drivers),
        ];
        for (name, cap) in caps {
            if cap == 0 {
                return Err(format!("capacity of {} must be positive", name));
            }
        }

        let stocks = [
            ("sauce", self.inventory.sauce),
            ("cheese", self.inventory.cheese),
            ("pepperoni", self.inventory.pepperoni),
            ("meat mix", self.inventory.meat_mix),
        ];
        for (name, spec) in stocks {
            if !(spec.capacity > 0.0) || !spec.capacity.is_finite() {
                return Err(format!("{} capacity must be positive and finite", name));
            }
            if spec.threshold < 0.0 || spec.threshold > spec.capacity {
                return Err(format!(
                    "{} threshold must lie in [0, capacity], got {}",
                    name, spec.threshold
                ));
            }
        }

        if self.arrivals.weekday.is_empty() || self.arrivals.weekend.is_empty() {
            return Err("arrival rate tables must not be empty".to_string());
        }
        for (name, table) in [
            ("weekday", &self.arrivals.weekday),
            ("weekend", &self.arrivals.weekend),
        ] {
            if table.iter().any(|r| *r < 0.0 || !r.is_finite()) {
                return Err(format!("{} arrival rates must be finite and non-negative", name));
            }
        }

        check_probability("premium probability", self.order_mix.premium_probability)?;
        check_probability("cheese NB p", self.service.cheese_quantity_nb.1)?;
        check_probability("meat binomial p", self.service.meat_quantity_binomial.1)?;
        check_probability("compensation factor", self.prices.compensation_factor)?;
        check_weights("pizza count (premium)", &self.order_mix.count_weights_premium)?;
        check_weights("pizza count (regular)", &self.order_mix.count_weights_regular)?;
        check_weights("pizza type (premium)", &self.order_mix.type_weights_premium)?;
        check_weights("pizza type (regular)", &self.order_mix.type_weights_regular)?;

        if !(self.service.late_threshold_hours > 0.0) {
            return Err("late threshold must be positive".to_string());
        }
        if self.labor.overtime_factor < 1.0 {
            return Err("overtime factor below straight pay makes no sense".to_string());
        }
        if !(self.reviews.sauce_interval > 0.0) || !(self.reviews.pantry_interval > 0.0) {
            return Err("review intervals must be positive".to_string());
        }

        Ok(())
    }

    /// Weekly rent across all declared facility units.
    pub fn weekly_fixed_cost(&self) -> f64 {
        self.fixed_costs.phone_line * self.resources.phone_lines as f64
            + self.fixed_costs.prep_station * self.resources.prep_stations as f64
            + self.fixed_costs.oven_slot * self.resources.oven_slots as f64
            + self.fixed_costs.packaging_station * self.resources.packaging_stations as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_weekly_fixed_cost() {
        let cfg = SimConfig::default();
        // 3*50k + 3*60k + 10*40k + 3*30k
        assert_eq!(cfg.weekly_fixed_cost(), 820_000.0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut cfg = SimConfig::default();
        cfg.resources.oven_slots = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_threshold_above_capacity_rejected() {
        let mut cfg = SimConfig::default();
        cfg.inventory.cheese.threshold = 2_000.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_weights_rejected() {
        let mut cfg = SimConfig::default();
        cfg.order_mix.count_weights_regular = [0.5, 0.2, 0.15, 0.05];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rate_lookup() {
        let rates = ArrivalRates::default();
        assert_eq!(rates.rate_at(10, false), 2.0);
        assert_eq!(rates.rate_at(13, false), 20.0);
        assert_eq!(rates.rate_at(21, false), 4.0);
        assert_eq!(rates.rate_at(23, true), 4.0);
        assert_eq!(rates.rate_at(23, false), 0.0, "weekday table ends at 21");
        assert_eq!(rates.last_slot(false), 21);
        assert_eq!(rates.last_slot(true), 23);
    }
}
