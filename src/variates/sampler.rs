//! Per-run random variate source.
//!
//! Owns the run's base generator, the cached forward distributions and the
//! optional synchronized uniform streams. Draws whose family participates in
//! the antithetic protocol consult their stream first and only fall back to
//! the base generator when the stream is absent or exhausted; either way the
//! stream cursor advances, keeping paired runs position-synchronized.

use log::warn;
use rand::distributions::{Bernoulli, Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Binomial, Exp, Gamma, LogNormal, Poisson, Triangular, Uniform, Weibull};

use crate::model::config::SimConfig;
use crate::model::pizza::PizzaKind;

use super::quantile;
use super::streams::{StreamKind, UniformStreams};

const MINUTES_PER_HOUR: f64 = 60.0;

pub struct Sampler {
    rng: StdRng,
    streams: UniformStreams,

    premium: Bernoulli,
    count_premium: WeightedIndex<f64>,
    count_regular: WeightedIndex<f64>,
    kind_premium: WeightedIndex<f64>,
    kind_regular: WeightedIndex<f64>,

    call_gamma: Gamma<f64>,
    call_params: (f64, f64),
    sauce_quantity: Exp<f64>,
    sauce_apply: Beta<f64>,
    cheese_nb_params: (f64, f64),
    cheese_apply: Triangular<f64>,
    cheese_tri_params: (f64, f64, f64),
    pepperoni_quantity: Poisson<f64>,
    pepperoni_apply: LogNormal<f64>,
    meat_quantity: Binomial,
    meat_apply: Uniform<f64>,
    bake: LogNormal<f64>,
    bake_params: (f64, f64),
    pack: Triangular<f64>,
    dispatch: Gamma<f64>,
    dispatch_params: (f64, f64),

    sauce_restock: Weibull<f64>,
    sauce_restock_scale: f64,
    cheese_restock: LogNormal<f64>,
    pepperoni_restock: Weibull<f64>,
    pepperoni_restock_scale: f64,
    meat_restock: Exp<f64>,
}

fn dist_err(name: &str, err: impl std::fmt::Display) -> String {
    format!("invalid {} distribution parameters: {}", name, err)
}

impl Sampler {
    pub fn new(seed: u64, streams: UniformStreams, cfg: &SimConfig) -> Result<Self, String> {
        let svc = &cfg.service;
        let mix = &cfg.order_mix;
        let restock = &cfg.restock;

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            streams,

            premium: Bernoulli::new(mix.premium_probability)
                .map_err(|e| dist_err("premium", e))?,
            count_premium: WeightedIndex::new(mix.count_weights_premium)
                .map_err(|e| dist_err("pizza count (premium)", e))?,
            count_regular: WeightedIndex::new(mix.count_weights_regular)
                .map_err(|e| dist_err("pizza count (regular)", e))?,
            kind_premium: WeightedIndex::new(mix.type_weights_premium)
                .map_err(|e| dist_err("pizza type (premium)", e))?,
            kind_regular: WeightedIndex::new(mix.type_weights_regular)
                .map_err(|e| dist_err("pizza type (regular)", e))?,

            call_gamma: Gamma::new(svc.call_gamma.0, svc.call_gamma.1)
                .map_err(|e| dist_err("call", e))?,
            call_params: svc.call_gamma,
            sauce_quantity: Exp::new(1.0 / svc.sauce_quantity_mean)
                .map_err(|e| dist_err("sauce quantity", e))?,
            sauce_apply: Beta::new(svc.sauce_apply_beta.0, svc.sauce_apply_beta.1)
                .map_err(|e| dist_err("sauce apply", e))?,
            cheese_nb_params: svc.cheese_quantity_nb,
            cheese_apply: Triangular::new(
                svc.cheese_apply_tri.0,
                svc.cheese_apply_tri.2,
                svc.cheese_apply_tri.1,
            )
            .map_err(|e| dist_err("cheese apply", e))?,
            cheese_tri_params: svc.cheese_apply_tri,
            pepperoni_quantity: Poisson::new(svc.pepperoni_quantity_mean)
                .map_err(|e| dist_err("pepperoni quantity", e))?,
            pepperoni_apply: LogNormal::new(
                svc.pepperoni_apply_lognormal.0,
                svc.pepperoni_apply_lognormal.1,
            )
            .map_err(|e| dist_err("pepperoni apply", e))?,
            meat_quantity: Binomial::new(svc.meat_quantity_binomial.0, svc.meat_quantity_binomial.1)
                .map_err(|e| dist_err("meat quantity", e))?,
            meat_apply: Uniform::new(svc.meat_apply_uniform.0, svc.meat_apply_uniform.1),
            bake: LogNormal::new(svc.bake_lognormal.0, svc.bake_lognormal.1)
                .map_err(|e| dist_err("bake", e))?,
            bake_params: svc.bake_lognormal,
            pack: Triangular::new(svc.pack_tri.0, svc.pack_tri.2, svc.pack_tri.1)
                .map_err(|e| dist_err("pack", e))?,
            dispatch: Gamma::new(svc.dispatch_gamma.0, svc.dispatch_gamma.1)
                .map_err(|e| dist_err("dispatch", e))?,
            dispatch_params: svc.dispatch_gamma,

            sauce_restock: Weibull::new(1.0, restock.sauce_weibull_shape)
                .map_err(|e| dist_err("sauce restock", e))?,
            sauce_restock_scale: restock.sauce_scale_minutes,
            cheese_restock: LogNormal::new(restock.cheese_lognormal.0, restock.cheese_lognormal.1)
                .map_err(|e| dist_err("cheese restock", e))?,
            pepperoni_restock: Weibull::new(1.0, restock.pepperoni_weibull_shape)
                .map_err(|e| dist_err("pepperoni restock", e))?,
            pepperoni_restock_scale: restock.pepperoni_scale_minutes,
            meat_restock: Exp::new(1.0 / restock.meat_exp_mean_minutes)
                .map_err(|e| dist_err("meat restock", e))?,
        })
    }

    /// Pull the next uniform of `kind`, noting the first overrun of a
    /// non-empty stream.
    fn stream_uniform(&mut self, kind: StreamKind) -> Option<f64> {
        let u = self.streams.next(kind);
        if u.is_none()
            && self.streams.len(kind) > 0
            && self.streams.cursor(kind) == self.streams.len(kind) + 1
        {
            warn!(
                "[sampler] {:?} stream exhausted after {} values; falling back to base generator",
                kind,
                self.streams.len(kind)
            );
        }
        u
    }

    pub fn premium(&mut self) -> bool {
        self.premium.sample(&mut self.rng)
    }

    pub fn pizza_count(&mut self, premium: bool) -> usize {
        let table = if premium { &self.count_premium } else { &self.count_regular };
        table.sample(&mut self.rng) + 1
    }

    pub fn pizza_kind(&mut self, premium: bool) -> PizzaKind {
        let table = if premium { &self.kind_premium } else { &self.kind_regular };
        match table.sample(&mut self.rng) {
            0 => PizzaKind::Cheese,
            1 => PizzaKind::Pepperoni,
            _ => PizzaKind::AllMeat,
        }
    }

    /// Call-handling talk time, hours. Substitutable (Gamma).
    pub fn call_hours(&mut self) -> f64 {
        let minutes = match self.stream_uniform(StreamKind::Call) {
            Some(u) => quantile::gamma(u, self.call_params.0, self.call_params.1),
            None => self.call_gamma.sample(&mut self.rng),
        };
        minutes / MINUTES_PER_HOUR
    }

    /// Sauce quantity for one pizza, millilitres (continuous).
    pub fn sauce_quantity(&mut self) -> f64 {
        self.sauce_quantity.sample(&mut self.rng)
    }

    pub fn sauce_apply_hours(&mut self) -> f64 {
        self.sauce_apply.sample(&mut self.rng) / MINUTES_PER_HOUR
    }

    /// Cheese units for one pizza. Substitutable (Negative-Binomial).
    pub fn cheese_quantity(&mut self) -> f64 {
        let u = match self.stream_uniform(StreamKind::CheeseQuantity) {
            Some(u) => u,
            None => self.rng.gen(),
        };
        quantile::neg_binomial(u, self.cheese_nb_params.0, self.cheese_nb_params.1)
    }

    /// Cheese application time, hours. Substitutable (Triangular).
    pub fn cheese_apply_hours(&mut self) -> f64 {
        let minutes = match self.stream_uniform(StreamKind::CheeseTime) {
            Some(u) => {
                let (min, mode, max) = self.cheese_tri_params;
                quantile::triangular(u, min, mode, max)
            }
            None => self.cheese_apply.sample(&mut self.rng),
        };
        minutes / MINUTES_PER_HOUR
    }

    pub fn pepperoni_quantity(&mut self) -> f64 {
        self.pepperoni_quantity.sample(&mut self.rng).round()
    }

    pub fn pepperoni_apply_hours(&mut self) -> f64 {
        self.pepperoni_apply.sample(&mut self.rng) / MINUTES_PER_HOUR
    }

    pub fn meat_quantity(&mut self) -> f64 {
        self.meat_quantity.sample(&mut self.rng) as f64
    }

    pub fn meat_apply_hours(&mut self) -> f64 {
        self.meat_apply.sample(&mut self.rng) / MINUTES_PER_HOUR
    }

    /// Oven time, hours. Substitutable (Lognormal).
    pub fn bake_hours(&mut self) -> f64 {
        let minutes = match self.stream_uniform(StreamKind::Bake) {
            Some(u) => quantile::lognormal(u, self.bake_params.0, self.bake_params.1),
            None => self.bake.sample(&mut self.rng),
        };
        minutes / MINUTES_PER_HOUR
    }

    pub fn pack_hours(&mut self) -> f64 {
        self.pack.sample(&mut self.rng) / MINUTES_PER_HOUR
    }

    /// Outbound delivery leg, hours. Substitutable (Gamma).
    pub fn dispatch_out_hours(&mut self) -> f64 {
        self.dispatch_leg(StreamKind::DispatchOut)
    }

    /// Return delivery leg, hours. Substitutable (Gamma).
    pub fn dispatch_back_hours(&mut self) -> f64 {
        self.dispatch_leg(StreamKind::DispatchBack)
    }

    fn dispatch_leg(&mut self, kind: StreamKind) -> f64 {
        let minutes = match self.stream_uniform(kind) {
            Some(u) => quantile::gamma(u, self.dispatch_params.0, self.dispatch_params.1),
            None => self.dispatch.sample(&mut self.rng),
        };
        minutes / MINUTES_PER_HOUR
    }

    /// Exponential inter-arrival gap at `rate` calls per hour, hours.
    /// Substitutable via the inverse CDF; a zero rate is an infinite gap.
    pub fn interarrival_hours(&mut self, rate: f64) -> f64 {
        if !(rate > 0.0) {
            return f64::INFINITY;
        }
        match self.stream_uniform(StreamKind::Interarrival) {
            Some(u) => quantile::exponential(u, rate),
            None => match Exp::new(rate) {
                Ok(dist) => dist.sample(&mut self.rng),
                Err(_) => f64::INFINITY,
            },
        }
    }

    pub fn sauce_restock_hours(&mut self) -> f64 {
        self.sauce_restock.sample(&mut self.rng) * self.sauce_restock_scale / MINUTES_PER_HOUR
    }

    pub fn cheese_restock_hours(&mut self) -> f64 {
        self.cheese_restock.sample(&mut self.rng) / MINUTES_PER_HOUR
    }

    pub fn pepperoni_restock_hours(&mut self) -> f64 {
        self.pepperoni_restock.sample(&mut self.rng) * self.pepperoni_restock_scale
            / MINUTES_PER_HOUR
    }

    pub fn meat_restock_hours(&mut self) -> f64 {
        self.meat_restock.sample(&mut self.rng) / MINUTES_PER_HOUR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler_with(streams: UniformStreams) -> Sampler {
        match Sampler::new(42, streams, &SimConfig::default()) {
            Ok(s) => s,
            Err(e) => panic!("default config must build a sampler: {}", e),
        }
    }

    #[test]
    fn test_substituted_call_time_uses_stream() {
        let mut streams = UniformStreams::empty();
        streams.set(StreamKind::Call, vec![0.5]);
        let mut sampler = sampler_with(streams);

        let drawn = sampler.call_hours() * 60.0;
        let expected = quantile::gamma(0.5, 4.0, 0.5);
        assert!((drawn - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_past_exhaustion_keeps_drawing() {
        let mut streams = UniformStreams::empty();
        streams.set(StreamKind::Bake, vec![0.5]);
        let mut sampler = sampler_with(streams);

        let first = sampler.bake_hours();
        assert!((first * 60.0 - quantile::lognormal(0.5, 2.5, 0.2)).abs() < 1e-12);
        for _ in 0..100 {
            let t = sampler.bake_hours();
            assert!(t > 0.0 && t.is_finite());
        }
    }

    #[test]
    fn test_antithetic_halves_mirror() {
        let mut u = UniformStreams::empty();
        u.set(StreamKind::DispatchOut, vec![0.2, 0.8]);
        let anti = u.complement();

        let mut a = sampler_with(u);
        let mut b = sampler_with(anti);

        // Same marginal family, perfectly negatively coupled uniforms: the
        // low draw of one half pairs with the high draw of the other.
        let (a1, a2) = (a.dispatch_out_hours(), a.dispatch_out_hours());
        let (b1, b2) = (b.dispatch_out_hours(), b.dispatch_out_hours());
        assert!(a1 < b1);
        assert!(a2 > b2);
    }

    #[test]
    fn test_zero_rate_interarrival_is_infinite() {
        let mut sampler = sampler_with(UniformStreams::empty());
        assert!(sampler.interarrival_hours(0.0).is_infinite());
    }

    #[test]
    fn test_substituted_interarrival_inverse_cdf() {
        let mut streams = UniformStreams::empty();
        streams.set(StreamKind::Interarrival, vec![0.5]);
        let mut sampler = sampler_with(streams);

        let gap = sampler.interarrival_hours(4.0);
        assert!((gap - (-(0.5f64).ln() / 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_pizza_count_in_range() {
        let mut sampler = sampler_with(UniformStreams::empty());
        for _ in 0..500 {
            let premium = sampler.premium();
            let n = sampler.pizza_count(premium);
            assert!((1..=4).contains(&n));
        }
    }

    #[test]
    fn test_quantities_are_non_negative() {
        let mut sampler = sampler_with(UniformStreams::empty());
        for _ in 0..200 {
            assert!(sampler.sauce_quantity() > 0.0);
            assert!(sampler.cheese_quantity() >= 0.0);
            assert!(sampler.pepperoni_quantity() >= 0.0);
            assert!(sampler.meat_quantity() >= 0.0);
        }
    }
}
