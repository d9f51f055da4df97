//! The per-pizza sub-pipeline: prepare (ingredient gates), bake, pack.
//!
//! Prepare holds one prep station plus one worker while each applicable
//! ingredient goes through quantity draw -> availability gate -> apply wait
//! -> stock take. A short container either gets replenished inline by this
//! process (when no replenishment is underway) or the process parks on the
//! container's one-shot restock signal.

use log::{debug, info};

use crate::core::{Flow, Priority, Process, Sim};

use super::inventory::Ingredient;
use super::PizzeriaModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PizzaKind {
    Cheese,
    Pepperoni,
    AllMeat,
}

impl PizzaKind {
    pub fn name(self) -> &'static str {
        match self {
            PizzaKind::Cheese => "cheese",
            PizzaKind::Pepperoni => "pepperoni",
            PizzaKind::AllMeat => "all-meat",
        }
    }

    /// The ingredient sequence this pizza consumes during Prepare.
    fn ingredients(self) -> Vec<Ingredient> {
        let mut steps = vec![Ingredient::Sauce, Ingredient::Cheese];
        if matches!(self, PizzaKind::Pepperoni | PizzaKind::AllMeat) {
            steps.push(Ingredient::Pepperoni);
        }
        if self == PizzaKind::AllMeat {
            steps.push(Ingredient::MeatMix);
        }
        steps
    }
}

enum PizzaState {
    Start,
    StationGranted,
    WorkerGranted,
    IngredientCheck,
    IngredientRefill,
    IngredientApply,
    IngredientTake,
    PrepDone,
    OvenGranted,
    Baked,
    PackGranted,
    PackWorkerGranted,
    Packed,
}

pub struct PizzaProcess {
    customer: u64,
    index: usize,
    kind: PizzaKind,
    priority: Priority,
    state: PizzaState,
    steps: Vec<Ingredient>,
    step: usize,
    quantity: f64,
    refill_amount: f64,
}

impl PizzaProcess {
    pub fn new(customer: u64, index: usize, kind: PizzaKind, priority: Priority) -> Self {
        Self {
            customer,
            index,
            kind,
            priority,
            state: PizzaState::Start,
            steps: kind.ingredients(),
            step: 0,
            quantity: 0.0,
            refill_amount: 0.0,
        }
    }

    fn draw_quantity(&self, model: &mut PizzeriaModel, ingredient: Ingredient) -> f64 {
        match ingredient {
            Ingredient::Sauce => model.sampler.sauce_quantity(),
            Ingredient::Cheese => model.sampler.cheese_quantity(),
            Ingredient::Pepperoni => model.sampler.pepperoni_quantity(),
            Ingredient::MeatMix => model.sampler.meat_quantity(),
        }
    }

    /// Apply-time draw for the current ingredient, recorded into the
    /// control-variate stage lists in minutes.
    fn draw_apply_hours(&self, model: &mut PizzeriaModel, ingredient: Ingredient) -> f64 {
        let hours = match ingredient {
            Ingredient::Sauce => model.sampler.sauce_apply_hours(),
            Ingredient::Cheese => model.sampler.cheese_apply_hours(),
            Ingredient::Pepperoni => model.sampler.pepperoni_apply_hours(),
            Ingredient::MeatMix => model.sampler.meat_apply_hours(),
        };
        let minutes = hours * 60.0;
        match ingredient {
            Ingredient::Sauce => model.tally.sauce_times_min.push(minutes),
            Ingredient::Cheese => model.tally.cheese_times_min.push(minutes),
            Ingredient::Pepperoni => model.tally.pepperoni_times_min.push(minutes),
            Ingredient::MeatMix => model.tally.meat_times_min.push(minutes),
        }
        hours
    }
}

impl Process<PizzeriaModel> for PizzaProcess {
    fn resume(&mut self, sim: &mut Sim<'_, PizzeriaModel>) -> Flow {
        loop {
            match self.state {
                PizzaState::Start => {
                    match self.kind {
                        PizzaKind::Cheese => sim.model.tally.pizzas_cheese += 1,
                        PizzaKind::Pepperoni => sim.model.tally.pizzas_pepperoni += 1,
                        PizzaKind::AllMeat => sim.model.tally.pizzas_all_meat += 1,
                    }
                    debug!(
                        "[pizza {}/{}] t={:.4} {} pizza requesting prep station",
                        self.customer,
                        self.index,
                        sim.now(),
                        self.kind.name()
                    );
                    self.state = PizzaState::StationGranted;
                    return Flow::Acquire(sim.model.fac.prep_stations, self.priority);
                }
                PizzaState::StationGranted => {
                    self.state = PizzaState::WorkerGranted;
                    return Flow::Acquire(sim.model.fac.workers, self.priority);
                }
                PizzaState::WorkerGranted => {
                    self.step = 0;
                    self.state = PizzaState::IngredientCheck;
                }
                PizzaState::IngredientCheck => {
                    if self.step >= self.steps.len() {
                        self.state = PizzaState::PrepDone;
                        continue;
                    }
                    let ingredient = self.steps[self.step];
                    self.quantity = self.draw_quantity(sim.model, ingredient);
                    let bin = sim.model.fac.bin(ingredient);
                    if self.quantity > sim.stock_level(bin) {
                        if !sim.is_refilling(bin) {
                            let mut amount = sim.stock_capacity(bin) - sim.stock_level(bin);
                            if ingredient.is_discrete() {
                                amount = amount.round();
                            }
                            sim.set_refilling(bin, true);
                            self.refill_amount = amount;
                            let lead = sim.model.restock_hours(ingredient);
                            info!(
                                "[pizza {}/{}] t={:.4} {} short, restocking {:.1} inline",
                                self.customer,
                                self.index,
                                sim.now(),
                                ingredient.name(),
                                amount
                            );
                            self.state = PizzaState::IngredientRefill;
                            return Flow::Hold(lead);
                        }
                        debug!(
                            "[pizza {}/{}] t={:.4} awaiting {} replenishment",
                            self.customer,
                            self.index,
                            sim.now(),
                            ingredient.name()
                        );
                        self.state = PizzaState::IngredientApply;
                        return Flow::AwaitRestock(bin);
                    }
                    self.state = PizzaState::IngredientApply;
                }
                PizzaState::IngredientRefill => {
                    let ingredient = self.steps[self.step];
                    let bin = sim.model.fac.bin(ingredient);
                    sim.put_stock(bin, self.refill_amount);
                    sim.signal_restocked(bin);
                    sim.set_refilling(bin, false);
                    info!(
                        "[pizza {}/{}] t={:.4} {} replenished to {:.1}",
                        self.customer,
                        self.index,
                        sim.now(),
                        ingredient.name(),
                        sim.stock_level(bin)
                    );
                    self.state = PizzaState::IngredientApply;
                }
                PizzaState::IngredientApply => {
                    let ingredient = self.steps[self.step];
                    let hours = self.draw_apply_hours(sim.model, ingredient);
                    self.state = PizzaState::IngredientTake;
                    return Flow::Hold(hours);
                }
                PizzaState::IngredientTake => {
                    let ingredient = self.steps[self.step];
                    let bin = sim.model.fac.bin(ingredient);
                    self.step += 1;
                    self.state = PizzaState::IngredientCheck;
                    // Zero-quantity draws complete immediately inside the bin.
                    return Flow::TakeStock(bin, self.quantity);
                }
                PizzaState::PrepDone => {
                    sim.release(sim.model.fac.workers);
                    sim.release(sim.model.fac.prep_stations);
                    debug!(
                        "[pizza {}/{}] t={:.4} prepared, requesting oven",
                        self.customer,
                        self.index,
                        sim.now()
                    );
                    self.state = PizzaState::OvenGranted;
                    return Flow::Acquire(sim.model.fac.oven, self.priority);
                }
                PizzaState::OvenGranted => {
                    let bake = sim.model.sampler.bake_hours();
                    sim.model.tally.bake_times_min.push(bake * 60.0);
                    self.state = PizzaState::Baked;
                    return Flow::Hold(bake);
                }
                PizzaState::Baked => {
                    sim.release(sim.model.fac.oven);
                    self.state = PizzaState::PackGranted;
                    return Flow::Acquire(sim.model.fac.packaging, self.priority);
                }
                PizzaState::PackGranted => {
                    self.state = PizzaState::PackWorkerGranted;
                    return Flow::Acquire(sim.model.fac.workers, self.priority);
                }
                PizzaState::PackWorkerGranted => {
                    let pack = sim.model.sampler.pack_hours();
                    sim.model.tally.pack_times_min.push(pack * 60.0);
                    self.state = PizzaState::Packed;
                    return Flow::Hold(pack);
                }
                PizzaState::Packed => {
                    sim.release(sim.model.fac.workers);
                    sim.release(sim.model.fac.packaging);
                    debug!(
                        "[pizza {}/{}] t={:.4} packed",
                        self.customer,
                        self.index,
                        sim.now()
                    );
                    return Flow::Done;
                }
            }
        }
    }
}
