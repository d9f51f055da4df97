//! Run accumulators and the frozen metrics snapshot.
//!
//! The tally is mutated by the model processes while the run executes; the
//! snapshot is computed exactly once at run end and is a pure function of the
//! tally and the configuration, so reading it is idempotent.

use std::collections::BTreeMap;

use serde::Serialize;

use super::config::SimConfig;

/// Raw counters and lists accumulated over one run. Times are stored in the
/// units the downstream means want: stage times in minutes, processing times
/// and inter-arrival gaps in hours.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    pub calls_total: u64,
    pub calls_lost: u64,
    pub orders_normal: u64,
    pub orders_premium: u64,

    pub late_normal_weekday: u64,
    pub late_normal_weekend: u64,
    pub late_premium_weekday: u64,
    pub late_premium_weekend: u64,

    pub processing_normal_weekday: Vec<f64>,
    pub processing_normal_weekend: Vec<f64>,
    pub processing_premium_weekday: Vec<f64>,
    pub processing_premium_weekend: Vec<f64>,

    pub pizzas_cheese: u64,
    pub pizzas_pepperoni: u64,
    pub pizzas_all_meat: u64,

    pub revenue: f64,
    pub compensation: f64,

    /// Operating day -> latest settlement hour-of-day seen for that shift.
    /// Settlements before 10:00 belong to the previous day's shift.
    pub last_finish_hour_by_day: BTreeMap<u64, f64>,

    pub call_times_min: Vec<f64>,
    pub sauce_times_min: Vec<f64>,
    pub cheese_times_min: Vec<f64>,
    pub pepperoni_times_min: Vec<f64>,
    pub meat_times_min: Vec<f64>,
    pub bake_times_min: Vec<f64>,
    pub pack_times_min: Vec<f64>,
    pub dispatch_times_min: Vec<f64>,
    pub interarrival_hours: Vec<f64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processing(&mut self, premium: bool, weekend: bool, hours: f64) {
        match (premium, weekend) {
            (true, true) => self.processing_premium_weekend.push(hours),
            (true, false) => self.processing_premium_weekday.push(hours),
            (false, true) => self.processing_normal_weekend.push(hours),
            (false, false) => self.processing_normal_weekday.push(hours),
        }
    }

    pub fn record_late(&mut self, premium: bool, weekend: bool) {
        match (premium, weekend) {
            (true, true) => self.late_premium_weekend += 1,
            (true, false) => self.late_premium_weekday += 1,
            (false, true) => self.late_normal_weekend += 1,
            (false, false) => self.late_normal_weekday += 1,
        }
    }

    /// Note a settlement at absolute time `finish` for overtime accounting.
    /// Only the latest hour per shift survives.
    pub fn record_settlement_hour(&mut self, finish: f64) {
        let day = (finish / 24.0).floor() as u64;
        let hour = finish % 24.0;
        let shift_day = if hour >= 10.0 { day } else { day.saturating_sub(1) };
        let entry = self.last_finish_hour_by_day.entry(shift_day).or_insert(-1.0);
        if hour > *entry {
            *entry = hour;
        }
    }

    pub fn total_orders(&self) -> u64 {
        self.orders_normal + self.orders_premium
    }

    pub fn total_pizzas(&self) -> u64 {
        self.pizzas_cheese + self.pizzas_pepperoni + self.pizzas_all_meat
    }

    pub fn total_late(&self) -> u64 {
        self.late_normal_weekday
            + self.late_normal_weekend
            + self.late_premium_weekday
            + self.late_premium_weekend
    }
}

/// Scheduled weekday shift hours overlapping `[0, horizon)`, in the frame
/// where each day's shift starts at k*24 (the 10:00 opening).
pub fn scheduled_weekday_hours(horizon: f64, shift_hours: f64) -> f64 {
    scheduled_hours(horizon, shift_hours, false)
}

/// Scheduled weekend shift hours overlapping `[0, horizon)`.
pub fn scheduled_weekend_hours(horizon: f64, shift_hours: f64) -> f64 {
    scheduled_hours(horizon, shift_hours, true)
}

fn scheduled_hours(horizon: f64, shift_hours: f64, weekend: bool) -> f64 {
    if horizon <= 0.0 {
        return 0.0;
    }
    let mut hours = 0.0;
    let days = (horizon / 24.0).ceil() as u64;
    for k in 0..days {
        let is_weekend_day = matches!(k % 7, 5 | 6);
        if is_weekend_day != weekend {
            continue;
        }
        let start = k as f64 * 24.0;
        let end = (start + shift_hours).min(horizon);
        if end > start {
            hours += end - start;
        }
    }
    hours
}

fn mean_or(values: &[f64], empty: f64) -> f64 {
    if values.is_empty() {
        empty
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    num as f64 / den as f64
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CostBreakdown {
    pub lost_calls: f64,
    pub ingredients: f64,
    pub fixed: f64,
    pub compensation: f64,
    pub straight_labor: f64,
    pub overtime_labor: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.lost_calls
            + self.ingredients
            + self.fixed
            + self.compensation
            + self.straight_labor
            + self.overtime_labor
    }
}

/// The immutable KPI set produced once at run end.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub proportion_calls_lost: f64,
    pub proportion_orders_late: f64,
    pub proportion_late_normal: f64,
    pub proportion_late_premium: f64,
    pub mean_processing_min: f64,
    pub mean_processing_normal_min: f64,
    pub mean_processing_premium_min: f64,

    pub revenue: f64,
    pub cost: CostBreakdown,
    pub profit: f64,
    pub overtime_hours: f64,
    pub scheduled_hours: f64,

    pub total_pizzas: f64,
    pub mean_call_min: f64,
    pub mean_sauce_min: f64,
    pub mean_cheese_min: f64,
    pub mean_pepperoni_min: f64,
    pub mean_meat_min: f64,
    pub mean_bake_min: f64,
    pub mean_pack_min: f64,
    pub mean_dispatch_min: f64,
    pub mean_interarrival_h: f64,
    pub proportion_premium: f64,
}

impl MetricsSnapshot {
    pub fn compute(tally: &Tally, cfg: &SimConfig, horizon_hours: f64) -> Self {
        // Overtime from the last settlement per shift. Weekend shifts run to
        // 01:00, weekday shifts to 23:00.
        let mut overtime_hours = 0.0;
        for (day, hour) in &tally.last_finish_hour_by_day {
            let weekend = matches!(day % 7, 5 | 6);
            if weekend {
                if *hour > 1.0 && *hour < 10.0 {
                    overtime_hours += hour - 1.0;
                }
            } else if *hour > 23.0 {
                overtime_hours += hour - 23.0;
            } else if *hour < 10.0 {
                overtime_hours += hour + 1.0;
            }
        }

        let scheduled = scheduled_weekday_hours(horizon_hours, cfg.labor.weekday_shift_hours)
            + scheduled_weekend_hours(horizon_hours, cfg.labor.weekend_shift_hours);
        let weeks = if horizon_hours > 0.0 {
            (horizon_hours / 168.0).ceil()
        } else {
            0.0
        };

        let staff_rate = cfg.labor.worker_wage * cfg.resources.workers as f64
            + cfg.labor.driver_wage * cfg.resources.drivers as f64;
        let cost = CostBreakdown {
            lost_calls: cfg.prices.lost_call_penalty * tally.calls_lost as f64,
            ingredients: cfg.prices.ingredient_cost_factor
                * (cfg.prices.cheese_pizza * tally.pizzas_cheese as f64
                    + cfg.prices.pepperoni_pizza * tally.pizzas_pepperoni as f64
                    + cfg.prices.all_meat_pizza * tally.pizzas_all_meat as f64),
            fixed: cfg.weekly_fixed_cost() * weeks,
            compensation: tally.compensation,
            straight_labor: staff_rate * scheduled,
            overtime_labor: cfg.labor.overtime_factor * staff_rate * overtime_hours,
        };

        let all_processing: Vec<f64> = tally
            .processing_normal_weekday
            .iter()
            .chain(&tally.processing_normal_weekend)
            .chain(&tally.processing_premium_weekday)
            .chain(&tally.processing_premium_weekend)
            .copied()
            .collect();
        let normal_processing: Vec<f64> = tally
            .processing_normal_weekday
            .iter()
            .chain(&tally.processing_normal_weekend)
            .copied()
            .collect();
        let premium_processing: Vec<f64> = tally
            .processing_premium_weekday
            .iter()
            .chain(&tally.processing_premium_weekend)
            .copied()
            .collect();

        let late_normal = tally.late_normal_weekday + tally.late_normal_weekend;
        let late_premium = tally.late_premium_weekday + tally.late_premium_weekend;
        let total_orders = tally.total_orders();

        Self {
            proportion_calls_lost: ratio(tally.calls_lost, tally.calls_total),
            proportion_orders_late: ratio(tally.total_late(), total_orders),
            proportion_late_normal: ratio(late_normal, tally.orders_normal),
            proportion_late_premium: ratio(late_premium, tally.orders_premium),
            mean_processing_min: mean_or(&all_processing, f64::NAN) * 60.0,
            mean_processing_normal_min: mean_or(&normal_processing, f64::NAN) * 60.0,
            mean_processing_premium_min: mean_or(&premium_processing, f64::NAN) * 60.0,

            revenue: tally.revenue,
            cost,
            profit: tally.revenue - cost.total(),
            overtime_hours,
            scheduled_hours: scheduled,

            total_pizzas: tally.total_pizzas() as f64,
            mean_call_min: mean_or(&tally.call_times_min, 0.0),
            mean_sauce_min: mean_or(&tally.sauce_times_min, 0.0),
            mean_cheese_min: mean_or(&tally.cheese_times_min, 0.0),
            mean_pepperoni_min: mean_or(&tally.pepperoni_times_min, 0.0),
            mean_meat_min: mean_or(&tally.meat_times_min, 0.0),
            mean_bake_min: mean_or(&tally.bake_times_min, 0.0),
            mean_pack_min: mean_or(&tally.pack_times_min, 0.0),
            mean_dispatch_min: mean_or(&tally.dispatch_times_min, 0.0),
            mean_interarrival_h: mean_or(&tally.interarrival_hours, 0.0),
            proportion_premium: if total_orders > 0 {
                ratio(tally.orders_premium, total_orders)
            } else {
                0.0
            },
        }
    }

    /// The name-keyed mapping the replication/statistics layer consumes.
    /// Names must stay stable across engine versions for comparability.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        let mut put = |name: &str, value: f64| {
            map.insert(name.to_string(), value);
        };
        put("Proportion Calls Lost", self.proportion_calls_lost);
        put("Proportion Orders Late", self.proportion_orders_late);
        put("Proportion Late Normal", self.proportion_late_normal);
        put("Proportion Late Premium", self.proportion_late_premium);
        put("Mean Processing Time (min)", self.mean_processing_min);
        put("Mean Processing Time Normal (min)", self.mean_processing_normal_min);
        put("Mean Processing Time Premium (min)", self.mean_processing_premium_min);
        put("Profit", self.profit);

        put("Total Pizzas", self.total_pizzas);
        put("Mean Call Time (min)", self.mean_call_min);
        put("Mean Sauce Time (min)", self.mean_sauce_min);
        put("Mean Cheese Time (min)", self.mean_cheese_min);
        put("Mean Pepperoni Time (min)", self.mean_pepperoni_min);
        put("Mean Meat Time (min)", self.mean_meat_min);
        put("Mean Bake Time (min)", self.mean_bake_min);
        put("Mean Pack Time (min)", self.mean_pack_min);
        put("Mean Dispatch Time (min)", self.mean_dispatch_min);
        put("Mean Interarrival Time (h)", self.mean_interarrival_h);
        put("Proportion Premium", self.proportion_premium);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_hours_full_week() {
        // 5 weekday shifts of 13 h, 2 weekend shifts of 15 h.
        assert_eq!(scheduled_weekday_hours(168.0, 13.0), 65.0);
        assert_eq!(scheduled_weekend_hours(168.0, 15.0), 30.0);
    }

    #[test]
    fn test_scheduled_hours_partial_horizon() {
        // 30 h covers day 0's full 13 h shift and 6 h of day 1's.
        assert_eq!(scheduled_weekday_hours(30.0, 13.0), 19.0);
        assert_eq!(scheduled_weekend_hours(30.0, 15.0), 0.0);
        assert_eq!(scheduled_weekday_hours(0.0, 13.0), 0.0);
    }

    #[test]
    fn test_scheduled_hours_reach_weekend() {
        // 144 h = 6 days: 5 weekday shifts + Saturday's 15 h shift,
        // clipped at the horizon (day 5 starts at 120 h, shift fits fully).
        assert_eq!(scheduled_weekday_hours(144.0, 13.0), 65.0);
        assert_eq!(scheduled_weekend_hours(144.0, 15.0), 15.0);
    }

    #[test]
    fn test_settlement_hour_keeps_max_per_shift() {
        let mut tally = Tally::new();
        tally.record_settlement_hour(12.5); // day 0, 12:30
        tally.record_settlement_hour(22.0); // day 0, 22:00
        tally.record_settlement_hour(15.0); // day 0 again, earlier
        tally.record_settlement_hour(24.0 + 0.5); // 00:30 -> still day 0's shift

        assert_eq!(tally.last_finish_hour_by_day.len(), 1);
        assert_eq!(tally.last_finish_hour_by_day[&0], 22.0);
    }

    #[test]
    fn test_weekday_overtime_past_closing() {
        let mut tally = Tally::new();
        tally.calls_total = 1;
        // Day 0 (weekday) last settlement at 23:30.
        tally.last_finish_hour_by_day.insert(0, 23.5);
        let snap = MetricsSnapshot::compute(&tally, &SimConfig::default(), 24.0);
        assert!((snap.overtime_hours - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weekend_overtime_past_one_am() {
        let mut tally = Tally::new();
        tally.calls_total = 1;
        // Day 5 (Saturday) shift spilling to 02:30.
        tally.last_finish_hour_by_day.insert(5, 2.5);
        let snap = MetricsSnapshot::compute(&tally, &SimConfig::default(), 168.0);
        assert!((snap.overtime_hours - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_buckets_yield_sentinels() {
        let tally = Tally::new();
        let snap = MetricsSnapshot::compute(&tally, &SimConfig::default(), 168.0);

        assert!(snap.proportion_calls_lost.is_nan());
        assert!(snap.proportion_orders_late.is_nan());
        assert!(snap.mean_processing_min.is_nan());
        assert_eq!(snap.mean_bake_min, 0.0);
        assert_eq!(snap.proportion_premium, 0.0);
        assert_eq!(snap.revenue, 0.0);
    }

    #[test]
    fn test_profit_is_revenue_minus_cost_components() {
        let mut tally = Tally::new();
        tally.calls_total = 10;
        tally.calls_lost = 2;
        tally.orders_normal = 7;
        tally.orders_premium = 1;
        tally.pizzas_cheese = 5;
        tally.pizzas_pepperoni = 3;
        tally.pizzas_all_meat = 1;
        tally.revenue = 90_000.0;
        tally.compensation = 1_800.0;

        let cfg = SimConfig::default();
        let snap = MetricsSnapshot::compute(&tally, &cfg, 168.0);

        let expected_ingredients = 0.3 * (5.0 * 7_000.0 + 3.0 * 9_000.0 + 12_000.0);
        assert!((snap.cost.ingredients - expected_ingredients).abs() < 1e-9);
        assert_eq!(snap.cost.lost_calls, 20_000.0);
        assert_eq!(snap.cost.fixed, 820_000.0);
        assert_eq!(snap.cost.straight_labor, 95.0 * 38_000.0);
        assert_eq!(snap.cost.overtime_labor, 0.0);
        assert_eq!(snap.profit, snap.revenue - snap.cost.total());
    }

    #[test]
    fn test_metric_names_are_stable() {
        let tally = Tally::new();
        let map = MetricsSnapshot::compute(&tally, &SimConfig::default(), 168.0).to_map();
        for name in [
            "Proportion Calls Lost",
            "Proportion Orders Late",
            "Proportion Late Normal",
            "Proportion Late Premium",
            "Mean Processing Time (min)",
            "Mean Processing Time Normal (min)",
            "Mean Processing Time Premium (min)",
            "Profit",
            "Total Pizzas",
            "Mean Interarrival Time (h)",
            "Proportion Premium",
        ] {
            assert!(map.contains_key(name), "missing metric '{}'", name);
        }
    }
}
