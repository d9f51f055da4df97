//! Ingredient stock identities and the background review/replenishment
//! processes.
//!
//! Two timers tick through the operating window: sauce every 30 simulated
//! minutes, the pantry trio every 45. A tick spawns a check that proceeds
//! only when a worker is free, replenishes whatever sits below threshold,
//! and releases the worker when done. Replenishment refills to capacity
//! (amount fixed at its start), signals the container's one-shot restock
//! event and clears the in-progress flag.

use log::{debug, info};

use crate::core::{Flow, Priority, Process, Sim};

use super::config::ReviewConfig;
use super::{is_weekend, PizzeriaModel};

/// Reviews run ahead of customer orders in the worker queue.
const REVIEW_PRIORITY: Priority = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingredient {
    Sauce,
    Cheese,
    Pepperoni,
    MeatMix,
}

impl Ingredient {
    pub const ALL: [Ingredient; 4] = [
        Ingredient::Sauce,
        Ingredient::Cheese,
        Ingredient::Pepperoni,
        Ingredient::MeatMix,
    ];

    pub fn index(self) -> usize {
        match self {
            Ingredient::Sauce => 0,
            Ingredient::Cheese => 1,
            Ingredient::Pepperoni => 2,
            Ingredient::MeatMix => 3,
        }
    }

    /// Sauce is continuous millilitres; the rest are counted units whose
    /// refill amounts get rounded.
    pub fn is_discrete(self) -> bool {
        !matches!(self, Ingredient::Sauce)
    }

    pub fn name(self) -> &'static str {
        match self {
            Ingredient::Sauce => "sauce",
            Ingredient::Cheese => "cheese",
            Ingredient::Pepperoni => "pepperoni",
            Ingredient::MeatMix => "meat mix",
        }
    }
}

/// Which review timer this is: sauce alone, or the pantry trio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewScope {
    Sauce,
    Pantry,
}

impl ReviewScope {
    pub fn targets(self) -> &'static [Ingredient] {
        match self {
            ReviewScope::Sauce => &[Ingredient::Sauce],
            ReviewScope::Pantry => {
                &[Ingredient::Cheese, Ingredient::Pepperoni, Ingredient::MeatMix]
            }
        }
    }

    pub fn interval(self, cfg: &ReviewConfig) -> f64 {
        match self {
            ReviewScope::Sauce => cfg.sauce_interval,
            ReviewScope::Pantry => cfg.pantry_interval,
        }
    }
}

/// Hours until the next review tick from `now`.
///
/// Inside the operating window the timer ticks at its interval; outside it
/// jumps to one interval past the next 10:00 opening. The sauce timer treats
/// the weekend shift's small-hours spill (up to 01:00) as in-window; the
/// pantry timer does not.
pub fn next_review_gap(now: f64, scope: ReviewScope, cfg: &ReviewConfig) -> f64 {
    let interval = scope.interval(cfg);
    let hm = now.rem_euclid(24.0);
    let weekend = is_weekend(now);
    let restart = 10.0 + interval;

    if weekend {
        let in_window = match scope {
            ReviewScope::Sauce => hm >= 10.0 || hm < 1.0,
            ReviewScope::Pantry => hm >= 10.0,
        };
        if in_window {
            interval
        } else {
            restart - hm
        }
    } else if (10.0..23.0).contains(&hm) {
        if hm + interval <= 23.0 {
            interval
        } else {
            24.0 - hm + restart
        }
    } else if hm < 10.0 {
        restart - hm
    } else {
        24.0 - hm + restart
    }
}

enum TimerState {
    Start,
    Tick,
    AfterSleep,
}

/// Periodic review timer; each tick spawns an independent check so a slow
/// replenishment never delays the cadence.
pub struct ReviewTimer {
    scope: ReviewScope,
    state: TimerState,
}

impl ReviewTimer {
    pub fn new(scope: ReviewScope) -> Self {
        Self {
            scope,
            state: TimerState::Start,
        }
    }
}

impl Process<PizzeriaModel> for ReviewTimer {
    fn resume(&mut self, sim: &mut Sim<'_, PizzeriaModel>) -> Flow {
        loop {
            match self.state {
                TimerState::Start => {
                    self.state = TimerState::Tick;
                    return Flow::Hold(10.0);
                }
                TimerState::Tick => {
                    if sim.now() >= sim.model.close_at {
                        return Flow::Done;
                    }
                    let gap = next_review_gap(sim.now(), self.scope, &sim.model.cfg.reviews);
                    self.state = TimerState::AfterSleep;
                    return Flow::Hold(gap);
                }
                TimerState::AfterSleep => {
                    if sim.now() >= sim.model.close_at {
                        return Flow::Done;
                    }
                    debug!("[review {:?}] t={:.4} periodic check", self.scope, sim.now());
                    sim.spawn(Box::new(ReviewCheck::new(self.scope)));
                    self.state = TimerState::Tick;
                }
            }
        }
    }
}

enum CheckState {
    Gate,
    Scan,
    FinishRestock(Ingredient),
}

/// One review pass: worker gate, threshold scan, inline replenishments.
pub struct ReviewCheck {
    scope: ReviewScope,
    state: CheckState,
    pending: Vec<Ingredient>,
    refill_amount: f64,
}

impl ReviewCheck {
    pub fn new(scope: ReviewScope) -> Self {
        Self {
            scope,
            state: CheckState::Gate,
            pending: Vec::new(),
            refill_amount: 0.0,
        }
    }
}

impl Process<PizzeriaModel> for ReviewCheck {
    fn resume(&mut self, sim: &mut Sim<'_, PizzeriaModel>) -> Flow {
        loop {
            match self.state {
                CheckState::Gate => {
                    let workers = sim.model.fac.workers;
                    if sim.resource_in_use(workers) >= sim.resource_capacity(workers) {
                        debug!(
                            "[review {:?}] t={:.4} no free worker, skipping check",
                            self.scope,
                            sim.now()
                        );
                        return Flow::Done;
                    }
                    // Ordered so the scan walks the fixed ingredient order.
                    self.pending = self.scope.targets().to_vec();
                    self.pending.reverse();
                    self.state = CheckState::Scan;
                    return Flow::Acquire(workers, REVIEW_PRIORITY);
                }
                CheckState::Scan => {
                    let ingredient = loop {
                        let Some(candidate) = self.pending.pop() else {
                            sim.release(sim.model.fac.workers);
                            return Flow::Done;
                        };
                        let bin = sim.model.fac.bin(candidate);
                        let below = sim.stock_level(bin)
                            < sim.model.cfg.inventory.spec(candidate).threshold;
                        if below && !sim.is_refilling(bin) {
                            break candidate;
                        }
                    };

                    let bin = sim.model.fac.bin(ingredient);
                    let mut amount = sim.stock_capacity(bin) - sim.stock_level(bin);
                    if ingredient.is_discrete() {
                        amount = amount.round();
                    }
                    sim.set_refilling(bin, true);
                    self.refill_amount = amount;
                    let lead = sim.model.restock_hours(ingredient);
                    info!(
                        "[review {:?}] t={:.4} {} below threshold, restocking {:.1} (lead {:.3} h)",
                        self.scope,
                        sim.now(),
                        ingredient.name(),
                        amount,
                        lead
                    );
                    self.state = CheckState::FinishRestock(ingredient);
                    return Flow::Hold(lead);
                }
                CheckState::FinishRestock(ingredient) => {
                    let bin = sim.model.fac.bin(ingredient);
                    sim.put_stock(bin, self.refill_amount);
                    sim.signal_restocked(bin);
                    sim.set_refilling(bin, false);
                    info!(
                        "[review {:?}] t={:.4} {} replenished to {:.1}",
                        self.scope,
                        sim.now(),
                        ingredient.name(),
                        sim.stock_level(bin)
                    );
                    self.state = CheckState::Scan;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ReviewConfig {
        ReviewConfig::default()
    }

    #[test]
    fn test_sauce_gap_inside_weekday_window() {
        assert_eq!(next_review_gap(12.0, ReviewScope::Sauce, &cfg()), 0.5);
        assert_eq!(next_review_gap(22.5, ReviewScope::Sauce, &cfg()), 0.5);
    }

    #[test]
    fn test_weekday_gap_jumps_past_closing() {
        // 22:45 + 30 min would land past 23:00: jump to 10:30 next day.
        let gap = next_review_gap(22.75, ReviewScope::Sauce, &cfg());
        assert!((gap - (24.0 - 22.75 + 10.5)).abs() < 1e-12);
        // After 23:00 the jump is the same target.
        let gap = next_review_gap(23.5, ReviewScope::Sauce, &cfg());
        assert!((gap - (24.0 - 23.5 + 10.5)).abs() < 1e-12);
    }

    #[test]
    fn test_weekday_gap_before_opening() {
        let gap = next_review_gap(24.0 + 3.0, ReviewScope::Pantry, &cfg());
        assert!((gap - 7.75).abs() < 1e-12);
    }

    #[test]
    fn test_weekend_small_hours_asymmetry() {
        // Day 5 is Saturday. At 00:30 the sauce timer is still in-window,
        // the pantry timer waits for 10:45.
        let t = 5.0 * 24.0 + 0.5;
        assert_eq!(next_review_gap(t, ReviewScope::Sauce, &cfg()), 0.5);
        let pantry = next_review_gap(t, ReviewScope::Pantry, &cfg());
        assert!((pantry - 10.25).abs() < 1e-12);
    }

    #[test]
    fn test_weekend_evening_stays_in_window() {
        let t = 5.0 * 24.0 + 23.5;
        assert_eq!(next_review_gap(t, ReviewScope::Sauce, &cfg()), 0.5);
        assert_eq!(next_review_gap(t, ReviewScope::Pantry, &cfg()), 0.75);
    }

    #[test]
    fn test_ingredient_discreteness() {
        assert!(!Ingredient::Sauce.is_discrete());
        assert!(Ingredient::Cheese.is_discrete());
        assert!(Ingredient::Pepperoni.is_discrete());
        assert!(Ingredient::MeatMix.is_discrete());
    }

    #[test]
    fn test_scope_targets() {
        assert_eq!(ReviewScope::Sauce.targets(), &[Ingredient::Sauce]);
        assert_eq!(ReviewScope::Pantry.targets().len(), 3);
    }
}
