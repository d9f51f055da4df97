//! Non-homogeneous call arrivals.
//!
//! Inter-arrival gaps are exponential at a rate looked up by hour-of-day and
//! calendar kind. A gap that would cross the closing boundary is redrawn
//! from the next day's opening instead of silently spanning the closed
//! period; a gap that would cross the horizon is clipped to it. At the
//! horizon the process stops accepting, waits for every in-flight order to
//! drain, and fires the terminal signal.

use log::{debug, info, warn};

use crate::core::{Flow, Process, Sim};

use super::config::ArrivalRates;
use super::order::OrderProcess;
use super::{is_weekend, PizzeriaModel};

/// Draw the next inter-arrival gap from `now`, skipping closed periods.
///
/// Pre-opening times draw at the opening rate after the wait-to-open; a draw
/// crossing the closing boundary (22:00 weekdays, 24:00 weekends) advances
/// to the next day's opening and redraws there. Zero-rate slots yield an
/// infinite gap, and the redraw loop cuts off once it passes the close time,
/// so a zeroed table terminates cleanly.
pub fn next_call_gap(model: &mut PizzeriaModel, now: f64) -> f64 {
    let opening = ArrivalRates::OPENING_HOUR;
    let mut offset = 0.0;
    let mut t = now;

    loop {
        if t >= model.close_at {
            return f64::INFINITY;
        }
        let hm = t.rem_euclid(24.0);
        let weekend = is_weekend(t);
        let hour = hm.floor() as usize;

        if hm < opening {
            let rate = model.cfg.arrivals.rate_at(opening as usize, weekend);
            return offset + (opening - hm) + model.sampler.interarrival_hours(rate);
        }

        let last_slot = model.cfg.arrivals.last_slot(weekend);
        if hour > last_slot {
            // Past the last rated hour: jump to the next day's opening and
            // draw there at that day's opening rate.
            let skip = 24.0 - hm + opening;
            let next_weekend = is_weekend(t + skip);
            let rate = model.cfg.arrivals.rate_at(opening as usize, next_weekend);
            return offset + skip + model.sampler.interarrival_hours(rate);
        }

        let closing = last_slot as f64 + 1.0;
        let rate = model.cfg.arrivals.rate_at(hour, weekend);
        let gap = model.sampler.interarrival_hours(rate);
        if hm + gap > closing {
            let skip = 24.0 - hm + opening;
            offset += skip;
            t += skip;
            continue;
        }
        return offset + gap;
    }
}

enum ArrivalState {
    Start,
    NextCall,
    CallLanded,
    Draining,
}

/// Root process generating the call stream and owning run termination.
pub struct ArrivalProcess {
    state: ArrivalState,
    customer: u64,
}

impl ArrivalProcess {
    pub fn new() -> Self {
        Self {
            state: ArrivalState::Start,
            customer: 0,
        }
    }
}

impl Default for ArrivalProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl Process<PizzeriaModel> for ArrivalProcess {
    fn resume(&mut self, sim: &mut Sim<'_, PizzeriaModel>) -> Flow {
        loop {
            match self.state {
                ArrivalState::Start => {
                    self.state = ArrivalState::NextCall;
                    return Flow::Hold(10.0);
                }
                ArrivalState::NextCall => {
                    if sim.now() >= sim.model.close_at {
                        let in_flight = sim.model.active_orders.clone();
                        info!(
                            "[arrivals] t={:.4} horizon reached, draining {} tracked orders",
                            sim.now(),
                            in_flight.len()
                        );
                        self.state = ArrivalState::Draining;
                        return Flow::JoinAll(in_flight);
                    }
                    let now = sim.now();
                    let gap = next_call_gap(sim.model, now);
                    if now + gap >= sim.model.close_at {
                        let remaining = sim.model.close_at - sim.now();
                        return Flow::Hold(remaining);
                    }
                    sim.model.tally.interarrival_hours.push(gap);
                    self.state = ArrivalState::CallLanded;
                    return Flow::Hold(gap);
                }
                ArrivalState::CallLanded => {
                    self.customer += 1;
                    sim.model.tally.calls_total += 1;

                    let lines = sim.model.fac.phone_lines;
                    if sim.resource_in_use(lines) < sim.resource_capacity(lines) {
                        let order = Box::new(OrderProcess::new(self.customer));
                        let pid = sim.spawn(order);
                        sim.model.active_orders.push(pid);
                        debug!(
                            "[arrivals] t={:.4} customer {} accepted as {}",
                            sim.now(),
                            self.customer,
                            pid
                        );
                    } else {
                        sim.model.tally.calls_lost += 1;
                        warn!(
                            "[arrivals] t={:.4} customer {} lost, all lines busy",
                            sim.now(),
                            self.customer
                        );
                    }
                    self.state = ArrivalState::NextCall;
                }
                ArrivalState::Draining => {
                    info!("[arrivals] t={:.4} all orders settled, run complete", sim.now());
                    sim.signal_terminal();
                    return Flow::Done;
                }
            }
        }
    }
}
