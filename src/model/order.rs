//! The per-order state machine: ring, pizza fan-out, dispatch, settlement.

use log::{debug, warn};

use crate::core::{Flow, Priority, Process, ProcessId, Sim};

use super::pizza::{PizzaKind, PizzaProcess};
use super::{is_weekend, PizzeriaModel};

const PREMIUM_PRIORITY: Priority = 1;
const REGULAR_PRIORITY: Priority = 2;

enum OrderState {
    Start,
    LineGranted,
    TalkDone,
    PizzasReady,
    DriverGranted,
    AtDoorstep,
    Returning,
}

pub struct OrderProcess {
    customer: u64,
    state: OrderState,
    premium: bool,
    priority: Priority,
    talk_hours: f64,
    order_value: f64,
    order_start: f64,
    pizzas: Vec<ProcessId>,
}

impl OrderProcess {
    pub fn new(customer: u64) -> Self {
        Self {
            customer,
            state: OrderState::Start,
            premium: false,
            priority: REGULAR_PRIORITY,
            talk_hours: 0.0,
            order_value: 0.0,
            order_start: 0.0,
            pizzas: Vec::new(),
        }
    }
}

impl Process<PizzeriaModel> for OrderProcess {
    fn resume(&mut self, sim: &mut Sim<'_, PizzeriaModel>) -> Flow {
        loop {
            match self.state {
                OrderState::Start => {
                    self.premium = sim.model.sampler.premium();
                    self.priority = if self.premium {
                        sim.model.tally.orders_premium += 1;
                        PREMIUM_PRIORITY
                    } else {
                        sim.model.tally.orders_normal += 1;
                        REGULAR_PRIORITY
                    };
                    self.talk_hours = sim.model.sampler.call_hours();
                    sim.model.tally.call_times_min.push(self.talk_hours * 60.0);
                    debug!(
                        "[order {}] t={:.4} {} customer ringing",
                        self.customer,
                        sim.now(),
                        if self.premium { "premium" } else { "regular" }
                    );
                    self.state = OrderState::LineGranted;
                    return Flow::Acquire(sim.model.fac.phone_lines, self.priority);
                }
                OrderState::LineGranted => {
                    self.state = OrderState::TalkDone;
                    return Flow::Hold(self.talk_hours);
                }
                OrderState::TalkDone => {
                    sim.release(sim.model.fac.phone_lines);
                    self.order_start = sim.now();

                    let count = sim.model.sampler.pizza_count(self.premium);
                    for index in 0..count {
                        let kind = sim.model.sampler.pizza_kind(self.premium);
                        self.order_value += sim.model.pizza_price(kind);
                        let pizza =
                            Box::new(PizzaProcess::new(self.customer, index + 1, kind, self.priority));
                        let pid = sim.spawn(pizza);
                        self.pizzas.push(pid);
                    }
                    debug!(
                        "[order {}] t={:.4} ordered {} pizzas worth {:.0}",
                        self.customer,
                        sim.now(),
                        count,
                        self.order_value
                    );
                    self.state = OrderState::PizzasReady;
                    return Flow::JoinAll(self.pizzas.clone());
                }
                OrderState::PizzasReady => {
                    debug!(
                        "[order {}] t={:.4} all pizzas packed, requesting driver",
                        self.customer,
                        sim.now()
                    );
                    self.state = OrderState::DriverGranted;
                    return Flow::Acquire(sim.model.fac.drivers, self.priority);
                }
                OrderState::DriverGranted => {
                    let out = sim.model.sampler.dispatch_out_hours();
                    sim.model.tally.dispatch_times_min.push(out * 60.0);
                    self.state = OrderState::AtDoorstep;
                    return Flow::Hold(out);
                }
                OrderState::AtDoorstep => {
                    self.settle(sim);
                    let back = sim.model.sampler.dispatch_back_hours();
                    sim.model.tally.dispatch_times_min.push(back * 60.0);
                    self.state = OrderState::Returning;
                    return Flow::Hold(back);
                }
                OrderState::Returning => {
                    sim.release(sim.model.fac.drivers);
                    debug!("[order {}] t={:.4} driver back at the shop", self.customer, sim.now());
                    return Flow::Done;
                }
            }
        }
    }
}

impl OrderProcess {
    /// Settlement at arrival-at-doorstep: the customer-facing latency stops
    /// here, before the return leg.
    fn settle(&self, sim: &mut Sim<'_, PizzeriaModel>) {
        let finish = sim.now();
        let elapsed = finish - self.order_start;
        let weekend = is_weekend(self.order_start);

        let tally = &mut sim.model.tally;
        tally.record_processing(self.premium, weekend, elapsed);
        tally.record_settlement_hour(finish);

        if elapsed > sim.model.cfg.service.late_threshold_hours {
            if self.premium {
                let owed = sim.model.cfg.prices.compensation_factor * self.order_value;
                sim.model.tally.compensation += owed;
                warn!(
                    "[order {}] t={:.4} late premium delivery, compensating {:.0}",
                    self.customer, finish, owed
                );
            } else {
                warn!("[order {}] t={:.4} late delivery, no revenue", self.customer, finish);
            }
            sim.model.tally.record_late(self.premium, weekend);
        } else {
            sim.model.tally.revenue += self.order_value;
            debug!(
                "[order {}] t={:.4} delivered on time after {:.2} h",
                self.customer, finish, elapsed
            );
        }
    }
}
