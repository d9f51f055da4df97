//! Inverse cumulative distribution functions for the substituted draw
//! families. Each function maps a Uniform(0,1) value to the same marginal the
//! forward sampler produces, so a uniform and its complement yield perfectly
//! negatively correlated realizations.

/// Keep a uniform strictly inside (0, 1) before inversion.
fn clamp_unit(u: f64) -> f64 {
    u.clamp(1e-12, 1.0 - 1e-12)
}

/// Standard normal quantile (Acklam's rational approximation, |err| < 2e-9).
pub fn normal(u: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239e0,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838e0,
        -2.549732539343734e0,
        4.374664141464968e0,
        2.938163982698783e0,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996e0,
        3.754408661907416e0,
    ];
    const P_LOW: f64 = 0.02425;

    let p = clamp_unit(u);
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}

/// Lognormal quantile: exp of the scaled normal quantile.
pub fn lognormal(u: f64, mu: f64, sigma: f64) -> f64 {
    (mu + sigma * normal(u)).exp()
}

/// Exponential quantile for the given rate (events per unit time).
pub fn exponential(u: f64, rate: f64) -> f64 {
    -(1.0 - clamp_unit(u)).ln() / rate
}

/// Triangular quantile on [min, max] with the given mode.
pub fn triangular(u: f64, min: f64, mode: f64, max: f64) -> f64 {
    let p = clamp_unit(u);
    let span = max - min;
    let cut = (mode - min) / span;
    if p < cut {
        min + (p * span * (mode - min)).sqrt()
    } else {
        max - ((1.0 - p) * span * (max - mode)).sqrt()
    }
}

/// Gamma quantile for shape/scale parameterization, by Newton inversion of
/// the regularized lower incomplete gamma function.
pub fn gamma(u: f64, shape: f64, scale: f64) -> f64 {
    let p = clamp_unit(u);

    // Wilson-Hilferty starting point; falls back to the small-x expansion
    // when the cube goes non-positive deep in the left tail.
    let c = 1.0 / (9.0 * shape);
    let g = 1.0 - c + normal(p) * c.sqrt();
    let mut x = shape * g * g * g;
    if !(x > 0.0) {
        x = ((p.ln() + shape.ln() + ln_gamma(shape)) / shape).exp();
    }

    for _ in 0..60 {
        let f = reg_lower_gamma(shape, x) - p;
        let pdf = ((shape - 1.0) * x.ln() - x - ln_gamma(shape)).exp();
        if pdf <= 0.0 {
            break;
        }
        let mut step = f / pdf;
        // Damp steps that would leave the support.
        if x - step <= 0.0 {
            step = x / 2.0;
        }
        x -= step;
        if step.abs() < 1e-12 * x.max(1.0) {
            break;
        }
    }
    x * scale
}

/// Negative-binomial quantile: smallest k (failures before the n-th success)
/// whose CDF reaches `u`.
pub fn neg_binomial(u: f64, successes: f64, p_success: f64) -> f64 {
    let p = clamp_unit(u);
    let q = 1.0 - p_success;

    let mut pmf = p_success.powf(successes);
    let mut cdf = pmf;
    let mut k = 0.0;
    while cdf < p && k < 100_000.0 {
        pmf *= (k + successes) / (k + 1.0) * q;
        k += 1.0;
        cdf += pmf;
    }
    k
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const PI: f64 = std::f64::consts::PI;

    if x < 0.5 {
        // Reflection: Gamma(x) * Gamma(1-x) = pi / sin(pi x)
        (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut acc = COEFFS[0];
        for (i, coeff) in COEFFS.iter().enumerate().skip(1) {
            acc += coeff / (x + i as f64);
        }
        let t = x + 7.5;
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
    }
}

/// Regularized lower incomplete gamma P(a, x), by series expansion below
/// a + 1 and by continued fraction above it.
fn reg_lower_gamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let log_prefix = -x + a * x.ln() - ln_gamma(a);

    if x < a + 1.0 {
        // Series representation.
        let mut ap = a;
        let mut term = 1.0 / a;
        let mut sum = term;
        for _ in 0..300 {
            ap += 1.0;
            term *= x / ap;
            sum += term;
            if term.abs() < sum.abs() * 1e-15 {
                break;
            }
        }
        (sum * log_prefix.exp()).min(1.0)
    } else {
        // Lentz's continued fraction for Q(a, x).
        const TINY: f64 = 1e-300;
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / TINY;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..300 {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < TINY {
                d = TINY;
            }
            c = b + an / c;
            if c.abs() < TINY {
                c = TINY;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < 1e-15 {
                break;
            }
        }
        (1.0 - log_prefix.exp() * h).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Gamma, LogNormal, Poisson, Triangular};

    fn empirical_quantile(samples: &mut [f64], q: f64) -> f64 {
        samples.sort_by(|a, b| a.total_cmp(b));
        samples[((samples.len() as f64 - 1.0) * q) as usize]
    }

    #[test]
    fn test_normal_known_values() {
        assert!(normal(0.5).abs() < 1e-8);
        assert!((normal(0.975) - 1.959964).abs() < 1e-5);
        assert!((normal(0.025) + 1.959964).abs() < 1e-5);
        assert!((normal(0.995) - 2.575829).abs() < 1e-5);
    }

    #[test]
    fn test_normal_antithetic_symmetry() {
        for i in 1..200 {
            let u = i as f64 / 200.0;
            assert!(
                (normal(u) + normal(1.0 - u)).abs() < 1e-7,
                "normal quantile must be antisymmetric at u={}",
                u
            );
        }
    }

    #[test]
    fn test_gamma_matches_cdf_round_trip() {
        for &(shape, scale) in &[(4.0, 0.5), (7.5, 0.9), (1.2, 3.0)] {
            for i in 1..100 {
                let u = i as f64 / 100.0;
                let x = gamma(u, shape, scale);
                let back = reg_lower_gamma(shape, x / scale);
                assert!(
                    (back - u).abs() < 1e-7,
                    "P({}, ppf({})) = {} for shape {}",
                    shape,
                    u,
                    back,
                    shape
                );
            }
        }
    }

    #[test]
    fn test_gamma_matches_forward_sampler() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = match Gamma::new(4.0, 0.5) {
            Ok(d) => d,
            Err(e) => panic!("gamma params rejected: {:?}", e),
        };
        let mut samples: Vec<f64> = (0..200_000).map(|_| dist.sample(&mut rng)).collect();

        for &q in &[0.1, 0.25, 0.5, 0.75, 0.9] {
            let expected = gamma(q, 4.0, 0.5);
            let observed = empirical_quantile(&mut samples, q);
            assert!(
                (expected - observed).abs() < 0.05_f64.max(expected * 0.02),
                "gamma quantile at {}: ppf {} vs empirical {}",
                q,
                expected,
                observed
            );
        }
    }

    #[test]
    fn test_lognormal_matches_forward_sampler() {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = match LogNormal::new(2.5, 0.2) {
            Ok(d) => d,
            Err(e) => panic!("lognormal params rejected: {:?}", e),
        };
        let mut samples: Vec<f64> = (0..200_000).map(|_| dist.sample(&mut rng)).collect();

        assert!((lognormal(0.5, 2.5, 0.2) - 2.5_f64.exp()).abs() < 1e-6);
        for &q in &[0.1, 0.5, 0.9] {
            let expected = lognormal(q, 2.5, 0.2);
            let observed = empirical_quantile(&mut samples, q);
            assert!(
                (expected - observed).abs() < expected * 0.02,
                "lognormal quantile at {}: ppf {} vs empirical {}",
                q,
                expected,
                observed
            );
        }
    }

    #[test]
    fn test_triangular_closed_form() {
        // The mode sits at the CDF cut point.
        let cut = (1.0 - 0.9) / (1.2 - 0.9);
        assert!((triangular(cut, 0.9, 1.0, 1.2) - 1.0).abs() < 1e-12);
        assert!(triangular(0.0001, 0.9, 1.0, 1.2) > 0.9);
        assert!(triangular(0.9999, 0.9, 1.0, 1.2) < 1.2);

        let mut rng = StdRng::seed_from_u64(11);
        let dist = match Triangular::new(1.1, 2.3, 2.0) {
            Ok(d) => d,
            Err(e) => panic!("triangular params rejected: {:?}", e),
        };
        let mut samples: Vec<f64> = (0..200_000).map(|_| dist.sample(&mut rng)).collect();
        for &q in &[0.1, 0.5, 0.9] {
            let expected = triangular(q, 1.1, 2.0, 2.3);
            let observed = empirical_quantile(&mut samples, q);
            assert!(
                (expected - observed).abs() < 0.02,
                "triangular quantile at {}: ppf {} vs empirical {}",
                q,
                expected,
                observed
            );
        }
    }

    #[test]
    fn test_exponential_quantile() {
        // Quantile at 1 - 1/e is the mean.
        let u = 1.0 - (-1.0_f64).exp();
        assert!((exponential(u, 2.0) - 0.5).abs() < 1e-9);
        assert!(exponential(0.0, 2.0) >= 0.0);
    }

    #[test]
    fn test_neg_binomial_against_gamma_poisson_mixture() {
        // NB(n, p) is a Poisson mixed over Gamma(n, (1-p)/p).
        let mut rng = StdRng::seed_from_u64(3);
        let mixing = match Gamma::new(25.0, 0.48 / 0.52) {
            Ok(d) => d,
            Err(e) => panic!("gamma params rejected: {:?}", e),
        };
        let mut samples: Vec<f64> = (0..100_000)
            .map(|_| {
                let lambda: f64 = mixing.sample(&mut rng);
                match Poisson::new(lambda.max(1e-9)) {
                    Ok(d) => d.sample(&mut rng),
                    Err(e) => panic!("poisson lambda rejected: {:?}", e),
                }
            })
            .collect();

        for &q in &[0.25, 0.5, 0.75] {
            let expected = neg_binomial(q, 25.0, 0.52);
            let observed = empirical_quantile(&mut samples, q);
            assert!(
                (expected - observed).abs() <= 1.0,
                "neg-binomial quantile at {}: ppf {} vs empirical {}",
                q,
                expected,
                observed
            );
        }
    }

    #[test]
    fn test_neg_binomial_mean_over_grid() {
        let n = 20_000;
        let mean: f64 = (0..n)
            .map(|i| neg_binomial((i as f64 + 0.5) / n as f64, 25.0, 0.52))
            .sum::<f64>()
            / n as f64;
        let theoretical = 25.0 * 0.48 / 0.52;
        assert!(
            (mean - theoretical).abs() < 0.15,
            "grid mean {} vs theoretical {}",
            mean,
            theoretical
        );
    }

    #[test]
    fn test_antithetic_pairs_average_to_the_mean() {
        let n = 5_000;
        let pair_mean: f64 = (0..n)
            .map(|i| {
                let u = (i as f64 + 0.5) / n as f64;
                0.5 * (gamma(u, 4.0, 0.5) + gamma(1.0 - u, 4.0, 0.5))
            })
            .sum::<f64>()
            / n as f64;
        assert!(
            (pair_mean - 2.0).abs() < 0.02,
            "antithetic pair average {} vs mean 2.0",
            pair_mean
        );
    }

    #[test]
    fn test_quantiles_are_monotone() {
        let mut grid: Vec<f64> = (1..100).map(|i| i as f64 / 100.0).collect();
        grid.dedup();
        for pair in grid.windows(2) {
            assert!(gamma(pair[0], 7.5, 0.9) <= gamma(pair[1], 7.5, 0.9));
            assert!(lognormal(pair[0], 0.5, 0.25) <= lognormal(pair[1], 0.5, 0.25));
            assert!(triangular(pair[0], 0.9, 1.0, 1.2) <= triangular(pair[1], 0.9, 1.0, 1.2));
            assert!(neg_binomial(pair[0], 25.0, 0.52) <= neg_binomial(pair[1], 25.0, 0.52));
        }
    }
}
