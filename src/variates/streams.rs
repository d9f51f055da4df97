//! Pre-generated synchronized uniform streams for antithetic sampling.
//!
//! A run may carry one array of Uniform(0,1) values per substituted draw
//! family. Each draw consumes one cursor position whether or not the array
//! still has values; past exhaustion the sampler falls back to its own
//! generator, so two paired runs stay position-synchronized even when their
//! realized draw counts differ.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The draw families that can be substituted with external uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Call,
    Bake,
    DispatchOut,
    DispatchBack,
    CheeseQuantity,
    CheeseTime,
    Interarrival,
}

impl StreamKind {
    pub const ALL: [StreamKind; 7] = [
        StreamKind::Call,
        StreamKind::Bake,
        StreamKind::DispatchOut,
        StreamKind::DispatchBack,
        StreamKind::CheeseQuantity,
        StreamKind::CheeseTime,
        StreamKind::Interarrival,
    ];

    fn index(self) -> usize {
        match self {
            StreamKind::Call => 0,
            StreamKind::Bake => 1,
            StreamKind::DispatchOut => 2,
            StreamKind::DispatchBack => 3,
            StreamKind::CheeseQuantity => 4,
            StreamKind::CheeseTime => 5,
            StreamKind::Interarrival => 6,
        }
    }
}

/// Per-stream array sizes, calibrated so a 168 h week stays inside the
/// arrays with room to spare.
#[derive(Debug, Clone)]
pub struct StreamBudgets {
    pub call: usize,
    pub bake: usize,
    pub dispatch_out: usize,
    pub dispatch_back: usize,
    pub cheese_quantity: usize,
    pub cheese_time: usize,
    pub interarrival: usize,
}

impl Default for StreamBudgets {
    fn default() -> Self {
        Self {
            call: 1000,
            bake: 1700,
            dispatch_out: 1000,
            dispatch_back: 1000,
            cheese_quantity: 1700,
            cheese_time: 1700,
            interarrival: 5000,
        }
    }
}

/// A set of position-indexed uniform arrays with always-advancing cursors.
#[derive(Debug, Clone, Default)]
pub struct UniformStreams {
    arrays: [Vec<f64>; 7],
    cursors: [usize; 7],
}

impl UniformStreams {
    /// A stream set with no arrays at all; every draw falls back to the
    /// run's own generator.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: StreamKind, values: Vec<f64>) {
        self.arrays[kind.index()] = values;
    }

    /// Consume one position of `kind`. The cursor advances unconditionally;
    /// `None` signals exhaustion (or an absent array).
    pub fn next(&mut self, kind: StreamKind) -> Option<f64> {
        let i = kind.index();
        let pos = self.cursors[i];
        self.cursors[i] += 1;
        self.arrays[i].get(pos).copied()
    }

    pub fn cursor(&self, kind: StreamKind) -> usize {
        self.cursors[kind.index()]
    }

    pub fn len(&self, kind: StreamKind) -> usize {
        self.arrays[kind.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.iter().all(|a| a.is_empty())
    }

    /// The `1 - U` counterpart of this stream set, cursors reset.
    pub fn complement(&self) -> Self {
        let mut out = Self::default();
        for (i, array) in self.arrays.iter().enumerate() {
            out.arrays[i] = array.iter().map(|u| 1.0 - u).collect();
        }
        out
    }
}

fn fill(rng: &mut StdRng, unit: &Uniform<f64>, n: usize) -> Vec<f64> {
    (0..n).map(|_| unit.sample(rng)).collect()
}

/// Build the (U, 1 - U) stream-set pair for the six-stream antithetic
/// protocol. The dedicated seed decouples the stream arrays from the
/// replications' base generators; the generation order within the seed is
/// fixed so a given pair index always produces the same arrays.
pub fn antithetic_pair(pair_index: u64, budgets: &StreamBudgets) -> (UniformStreams, UniformStreams) {
    let mut rng = StdRng::seed_from_u64(999_999 + pair_index);
    let unit = Uniform::new(0.0f64, 1.0);

    let mut streams = UniformStreams::empty();
    streams.set(StreamKind::Bake, fill(&mut rng, &unit, budgets.bake));
    streams.set(StreamKind::DispatchOut, fill(&mut rng, &unit, budgets.dispatch_out));
    streams.set(StreamKind::DispatchBack, fill(&mut rng, &unit, budgets.dispatch_back));
    streams.set(StreamKind::Call, fill(&mut rng, &unit, budgets.call));
    streams.set(StreamKind::CheeseQuantity, fill(&mut rng, &unit, budgets.cheese_quantity));
    streams.set(StreamKind::CheeseTime, fill(&mut rng, &unit, budgets.cheese_time));

    let anti = streams.complement();
    (streams, anti)
}

/// Build the (U, 1 - U) pair for the interarrival-only protocol. Unlike the
/// six-stream protocol, both halves of a pair share their base seed; only
/// the stream array flips.
pub fn interarrival_pair(pair_index: u64, budgets: &StreamBudgets) -> (UniformStreams, UniformStreams) {
    let mut rng = StdRng::seed_from_u64(123_456 + pair_index);
    let unit = Uniform::new(0.0f64, 1.0);

    let mut streams = UniformStreams::empty();
    streams.set(StreamKind::Interarrival, fill(&mut rng, &unit, budgets.interarrival));

    let anti = streams.complement();
    (streams, anti)
}

/// Base seeds for the two halves of pair `pair_index` under the six-stream
/// protocol: the non-substituted draws of each half stay independent.
pub fn pair_base_seeds(pair_index: u64) -> (u64, u64) {
    (2 * pair_index, 2 * pair_index + 1)
}

/// Antithetic mode pairs replications; an odd request cannot be paired.
pub fn validate_pair_count(replications: usize) -> Result<(), String> {
    if replications % 2 != 0 {
        Err(format!(
            "antithetic replication count must be even, got {}",
            replications
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advances_past_exhaustion() {
        let mut streams = UniformStreams::empty();
        streams.set(StreamKind::Bake, vec![0.25, 0.75]);

        assert_eq!(streams.next(StreamKind::Bake), Some(0.25));
        assert_eq!(streams.next(StreamKind::Bake), Some(0.75));
        assert_eq!(streams.next(StreamKind::Bake), None);
        assert_eq!(streams.next(StreamKind::Bake), None);
        assert_eq!(streams.cursor(StreamKind::Bake), 4);
    }

    #[test]
    fn test_streams_are_independent() {
        let mut streams = UniformStreams::empty();
        streams.set(StreamKind::Call, vec![0.5]);
        streams.set(StreamKind::CheeseTime, vec![0.9]);

        assert_eq!(streams.next(StreamKind::CheeseTime), Some(0.9));
        assert_eq!(streams.next(StreamKind::Call), Some(0.5));
        assert_eq!(streams.cursor(StreamKind::Bake), 0);
    }

    #[test]
    fn test_complement_flips_values() {
        let mut streams = UniformStreams::empty();
        streams.set(StreamKind::DispatchOut, vec![0.1, 0.6]);
        let mut anti = streams.complement();

        assert!((anti.next(StreamKind::DispatchOut).unwrap() - 0.9).abs() < 1e-12);
        assert!((anti.next(StreamKind::DispatchOut).unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_pair_is_reproducible() {
        let budgets = StreamBudgets::default();
        let (a1, _) = antithetic_pair(7, &budgets);
        let (a2, b2) = antithetic_pair(7, &budgets);

        for kind in StreamKind::ALL {
            assert_eq!(a1.arrays[kind.index()], a2.arrays[kind.index()]);
        }
        assert_eq!(a1.len(StreamKind::Bake), budgets.bake);
        assert_eq!(a1.len(StreamKind::Interarrival), 0);
        assert_eq!(b2.len(StreamKind::CheeseQuantity), budgets.cheese_quantity);
    }

    #[test]
    fn test_interarrival_pair_only_fills_one_stream() {
        let budgets = StreamBudgets::default();
        let (u, anti) = interarrival_pair(0, &budgets);
        assert_eq!(u.len(StreamKind::Interarrival), budgets.interarrival);
        assert_eq!(u.len(StreamKind::Call), 0);
        assert_eq!(anti.len(StreamKind::Interarrival), budgets.interarrival);
    }

    #[test]
    fn test_odd_pair_count_rejected() {
        assert!(validate_pair_count(10).is_ok());
        assert!(validate_pair_count(9).is_err());
    }
}
