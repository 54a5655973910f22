//! Random-variate capability: a small tagged set of distributions that a
//! station can sample from to decide inter-arrival times, service times,
//! patience, batch sizes, and the like.
//!
//! Builders are parameterized by the mean (and, where meaningful, the
//! standard deviation) of the resulting variate rather than by each
//! distribution's natural parameters, mirroring how the models this crate
//! is built for are usually specified ("mean service time 80s, std 40s")
//! rather than in terms of a distribution's shape/scale.

use std::fmt;

use rand_core::RngCore;
use rand_distr::{Beta, Distribution, Gamma, LogNormal, Normal, Triangular, Uniform};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The kind of distribution backing a [`Dist`], with its natural
/// (shape/scale) parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DistType {
    /// Always returns the same value.
    Deterministic { value: f64 },
    /// Exponential distribution with the given rate (1/mean).
    Exponential { rate: f64 },
    /// Uniformly random on `[low, high]`.
    Uniform { low: f64, high: f64 },
    /// Log-normal distribution with the given mu and sigma (of the
    /// underlying normal).
    LogNormal { mu: f64, sigma: f64 },
    /// Gamma distribution with the given shape and scale. Used directly
    /// for Erlang variates (integer shape).
    Gamma { shape: f64, scale: f64 },
    /// Triangular on `[low, high]` with the given mode.
    Triangular { low: f64, high: f64, mode: f64 },
    /// Trapezoidal: rises linearly on `[a, b]`, flat on `[b, c]`, falls
    /// linearly on `[c, d]`.
    Trapezoid { a: f64, b: f64, c: f64, d: f64 },
    /// Beta distribution with the given alpha/beta, rescaled onto
    /// `[low, high]`.
    Beta {
        alpha: f64,
        beta: f64,
        low: f64,
        high: f64,
    },
    /// Half-normal distribution: `low + |N(0, scale)|`.
    HalfNormal { low: f64, scale: f64 },
    /// Discrete empirical distribution over a finite, weighted value set.
    Empirical { values: Vec<f64>, weights: Vec<f64> },
}

impl fmt::Display for DistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A sampleable, serializable random-variate generator.
///
/// `Dist` is always both directly sampleable (given an RNG) and
/// round-trippable through a textual recipe via [`Dist::to_recipe`] /
/// [`Dist::from_recipe`], which is what lets a model description cross a
/// worker-thread boundary in the parallel driver without carrying a live
/// closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dist {
    kind: DistType,
}

impl fmt::Display for Dist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Dist {
    /// Wrap a raw [`DistType`], validating its parameters.
    pub fn new(kind: DistType) -> Result<Self, Error> {
        let d = Dist { kind };
        d.validate()?;
        Ok(d)
    }

    pub fn kind(&self) -> &DistType {
        &self.kind
    }

    /// Always returns `value`.
    pub fn deterministic(value: f64) -> Result<Self, Error> {
        Dist::new(DistType::Deterministic { value })
    }

    /// Exponential distribution with the given mean.
    pub fn exponential(mean: f64) -> Result<Self, Error> {
        if mean <= 0.0 {
            return Err(Error::Parameter(format!(
                "exponential mean must be > 0, got {mean}"
            )));
        }
        Dist::new(DistType::Exponential { rate: 1.0 / mean })
    }

    /// Uniform on `[low, high]`.
    pub fn uniform(low: f64, high: f64) -> Result<Self, Error> {
        Dist::new(DistType::Uniform { low, high })
    }

    /// Log-normal distribution with the given mean and standard deviation.
    pub fn log_normal(mean: f64, stdev: f64) -> Result<Self, Error> {
        if mean <= 0.0 {
            return Err(Error::Parameter(format!(
                "log_normal mean must be > 0, got {mean}"
            )));
        }
        let mu = (mean * mean / (stdev * stdev + mean * mean).sqrt()).ln();
        let sigma = (stdev * stdev / (mean * mean) + 1.0).ln().sqrt();
        Dist::new(DistType::LogNormal { mu, sigma })
    }

    /// Gamma distribution with the given mean and standard deviation.
    pub fn gamma(mean: f64, stdev: f64) -> Result<Self, Error> {
        if mean <= 0.0 || stdev <= 0.0 {
            return Err(Error::Parameter(
                "gamma mean and stdev must be > 0".to_string(),
            ));
        }
        let scale = stdev * stdev / mean;
        let shape = mean / scale;
        Dist::new(DistType::Gamma { shape, scale })
    }

    /// Erlang distribution (a Gamma with an integer shape) with the given
    /// mean and standard deviation.
    pub fn erlang(mean: f64, stdev: f64) -> Result<Self, Error> {
        if mean <= 0.0 || stdev <= 0.0 {
            return Err(Error::Parameter(
                "erlang mean and stdev must be > 0".to_string(),
            ));
        }
        let scale = stdev * stdev / mean;
        let shape = (mean / scale).round().max(1.0);
        Dist::new(DistType::Gamma { shape, scale })
    }

    /// Triangular on `[low, high]` with the given most-likely value.
    pub fn triangular(low: f64, mode: f64, high: f64) -> Result<Self, Error> {
        Dist::new(DistType::Triangular { low, high, mode })
    }

    /// Trapezoidal on `[a, d]`, rising to a plateau on `[b, c]`.
    pub fn trapezoid(a: f64, b: f64, c: f64, d: f64) -> Result<Self, Error> {
        Dist::new(DistType::Trapezoid { a, b, c, d })
    }

    /// Beta distribution rescaled onto `[low, high]`.
    pub fn beta(alpha: f64, beta: f64, low: f64, high: f64) -> Result<Self, Error> {
        Dist::new(DistType::Beta {
            alpha,
            beta,
            low,
            high,
        })
    }

    /// Half-normal distribution with the given lower bound and mean.
    pub fn half_normal(low: f64, mean: f64) -> Result<Self, Error> {
        if mean <= low {
            return Err(Error::Parameter(format!(
                "half_normal mean {mean} must be > low {low}"
            )));
        }
        let scale = (mean - low) * (std::f64::consts::PI / 2.0).sqrt();
        Dist::new(DistType::HalfNormal { low, scale })
    }

    /// Discrete empirical distribution over `(value, weight)` pairs.
    pub fn empirical(samples: &[(f64, f64)]) -> Result<Self, Error> {
        let values = samples.iter().map(|(v, _)| *v).collect();
        let weights = samples.iter().map(|(_, w)| *w).collect();
        Dist::new(DistType::Empirical { values, weights })
    }

    /// Validate that the parameters are sane for the chosen [`DistType`].
    pub fn validate(&self) -> Result<(), Error> {
        match &self.kind {
            DistType::Deterministic { value } => {
                if !value.is_finite() || *value < 0.0 {
                    return Err(Error::Parameter(format!(
                        "deterministic value must be finite and >= 0, got {value}"
                    )));
                }
            }
            DistType::Exponential { rate } => {
                if !(*rate > 0.0) || !rate.is_finite() {
                    return Err(Error::Parameter(format!(
                        "exponential rate must be finite and > 0, got {rate}"
                    )));
                }
            }
            DistType::Uniform { low, high } => {
                if low.is_nan() || high.is_nan() || low.is_infinite() || high.is_infinite() {
                    return Err(Error::Parameter(
                        "uniform low/high must be finite".to_string(),
                    ));
                }
                if low > high {
                    return Err(Error::Parameter("uniform low must be <= high".to_string()));
                }
            }
            DistType::LogNormal { sigma, .. } => {
                Normal::new(0.0, *sigma).map_err(|e| Error::Parameter(e.to_string()))?;
            }
            DistType::Gamma { shape, scale } => {
                Gamma::new(*shape, *scale).map_err(|e| Error::Parameter(e.to_string()))?;
            }
            DistType::Triangular { low, high, mode } => {
                Triangular::new(*low, *high, *mode).map_err(|e| Error::Parameter(e.to_string()))?;
            }
            DistType::Trapezoid { a, b, c, d } => {
                if !(a <= b && b <= c && c <= d) || a == d {
                    return Err(Error::Parameter(format!(
                        "trapezoid requires a <= b <= c <= d and a != d, got {a},{b},{c},{d}"
                    )));
                }
            }
            DistType::Beta {
                alpha,
                beta,
                low,
                high,
            } => {
                Beta::new(*alpha, *beta).map_err(|e| Error::Parameter(e.to_string()))?;
                if low > high {
                    return Err(Error::Parameter("beta low must be <= high".to_string()));
                }
            }
            DistType::HalfNormal { scale, .. } => {
                if !(*scale > 0.0) || !scale.is_finite() {
                    return Err(Error::Parameter(
                        "half_normal scale must be finite and > 0".to_string(),
                    ));
                }
            }
            DistType::Empirical { values, weights } => {
                if values.is_empty() || values.len() != weights.len() {
                    return Err(Error::Parameter(
                        "empirical values and weights must be non-empty and equal length"
                            .to_string(),
                    ));
                }
                if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
                    return Err(Error::Parameter(
                        "empirical weights must be finite and >= 0".to_string(),
                    ));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(Error::Parameter(
                        "empirical weights must sum to > 0".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Draw a sample. The result is never negative and never non-finite:
    /// out-of-range draws from unbounded distributions are clamped to 0.
    pub fn sample<R: RngCore>(&self, rng: &mut R) -> f64 {
        use rand::Rng;
        let x = match &self.kind {
            DistType::Deterministic { value } => *value,
            DistType::Exponential { rate } => -rng.r#gen::<f64>().ln() / rate,
            DistType::Uniform { low, high } => {
                if low == high {
                    *low
                } else {
                    Uniform::new_inclusive(*low, *high).sample(rng)
                }
            }
            DistType::LogNormal { mu, sigma } => LogNormal::new(*mu, *sigma).unwrap().sample(rng),
            DistType::Gamma { shape, scale } => Gamma::new(*shape, *scale).unwrap().sample(rng),
            DistType::Triangular { low, high, mode } => {
                Triangular::new(*low, *high, *mode).unwrap().sample(rng)
            }
            DistType::Trapezoid { a, b, c, d } => sample_trapezoid(*a, *b, *c, *d, rng),
            DistType::Beta {
                alpha,
                beta,
                low,
                high,
            } => {
                let u = Beta::new(*alpha, *beta).unwrap().sample(rng);
                low + u * (high - low)
            }
            DistType::HalfNormal { low, scale } => {
                low + Normal::new(0.0, *scale).unwrap().sample(rng).abs()
            }
            DistType::Empirical { values, weights } => sample_empirical(values, weights, rng),
        };
        if !x.is_finite() {
            0.0
        } else {
            x.max(0.0)
        }
    }

    /// Serialize this generator to a textual recipe (JSON) that can be
    /// rehydrated with [`Dist::from_recipe`], for crossing a worker
    /// boundary that a live value cannot cross (e.g. a persisted model
    /// description).
    pub fn to_recipe(&self) -> String {
        serde_json::to_string(self).expect("Dist is always serializable")
    }

    /// Rehydrate a generator previously produced by [`Dist::to_recipe`].
    pub fn from_recipe(recipe: &str) -> Result<Self, Error> {
        let d: Dist =
            serde_json::from_str(recipe).map_err(|e| Error::Parameter(e.to_string()))?;
        d.validate()?;
        Ok(d)
    }
}

/// Rejection sampling from the bounding box; efficient for any
/// well-conditioned trapezoid and avoids hand-deriving the inverse CDF.
fn sample_trapezoid<R: RngCore>(a: f64, b: f64, c: f64, d: f64, rng: &mut R) -> f64 {
    use rand::Rng;
    let height = 2.0 / ((b - a) + 2.0 * (c - b) + (d - c));
    for _ in 0..10_000 {
        let x = rng.gen_range(a..=d);
        let y = rng.gen_range(0.0..=height);
        let f = if x < b {
            if b > a {
                height * (x - a) / (b - a)
            } else {
                height
            }
        } else if x <= c {
            height
        } else if d > c {
            height * (d - x) / (d - c)
        } else {
            height
        };
        if y <= f {
            return x;
        }
    }
    (b + c) / 2.0
}

fn sample_empirical<R: RngCore>(values: &[f64], weights: &[f64], rng: &mut R) -> f64 {
    use rand::Rng;
    let total: f64 = weights.iter().sum();
    let mut draw = rng.gen_range(0.0..total);
    for (value, weight) in values.iter().zip(weights.iter()) {
        if draw < *weight {
            return *value;
        }
        draw -= *weight;
    }
    *values.last().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn deterministic_always_returns_value() {
        let d = Dist::deterministic(42.0).unwrap();
        let mut rng = thread_rng();
        for _ in 0..10 {
            assert_eq!(d.sample(&mut rng), 42.0);
        }
    }

    #[test]
    fn exponential_rejects_nonpositive_mean() {
        assert!(Dist::exponential(0.0).is_err());
        assert!(Dist::exponential(-1.0).is_err());
    }

    #[test]
    fn exponential_mean_matches_request() {
        let d = Dist::exponential(100.0).unwrap();
        let mut rng = thread_rng();
        let n = 200_000;
        let sum: f64 = (0..n).map(|_| d.sample(&mut rng)).sum();
        let mean = sum / n as f64;
        assert!((mean - 100.0).abs() / 100.0 < 0.03, "mean was {mean}");
    }

    #[test]
    fn uniform_low_equals_high_is_constant() {
        let d = Dist::uniform(5.0, 5.0).unwrap();
        let mut rng = thread_rng();
        assert_eq!(d.sample(&mut rng), 5.0);
    }

    #[test]
    fn uniform_rejects_low_above_high() {
        assert!(Dist::uniform(10.0, 1.0).is_err());
    }

    #[test]
    fn log_normal_mean_matches_request() {
        let d = Dist::log_normal(50.0, 10.0).unwrap();
        let mut rng = thread_rng();
        let n = 200_000;
        let sum: f64 = (0..n).map(|_| d.sample(&mut rng)).sum();
        let mean = sum / n as f64;
        assert!((mean - 50.0).abs() / 50.0 < 0.05, "mean was {mean}");
    }

    #[test]
    fn gamma_rejects_nonpositive_params() {
        assert!(Dist::gamma(0.0, 1.0).is_err());
        assert!(Dist::gamma(1.0, 0.0).is_err());
    }

    #[test]
    fn trapezoid_samples_within_bounds() {
        let d = Dist::trapezoid(1.0, 2.0, 4.0, 5.0).unwrap();
        let mut rng = thread_rng();
        for _ in 0..1000 {
            let x = d.sample(&mut rng);
            assert!((1.0..=5.0).contains(&x));
        }
    }

    #[test]
    fn trapezoid_rejects_out_of_order_bounds() {
        assert!(Dist::trapezoid(5.0, 4.0, 3.0, 2.0).is_err());
    }

    #[test]
    fn empirical_only_returns_known_values() {
        let d = Dist::empirical(&[(1.0, 1.0), (2.0, 3.0)]).unwrap();
        let mut rng = thread_rng();
        for _ in 0..1000 {
            let x = d.sample(&mut rng);
            assert!(x == 1.0 || x == 2.0);
        }
    }

    #[test]
    fn empirical_rejects_empty() {
        assert!(Dist::empirical(&[]).is_err());
    }

    #[test]
    fn recipe_round_trips() {
        let d = Dist::gamma(80.0, 30.0).unwrap();
        let recipe = d.to_recipe();
        let rehydrated = Dist::from_recipe(&recipe).unwrap();
        assert_eq!(d, rehydrated);
    }

    #[test]
    fn sample_never_negative_or_nonfinite() {
        let d = Dist::log_normal(1.0, 50.0).unwrap();
        let mut rng = thread_rng();
        for _ in 0..10_000 {
            let x = d.sample(&mut rng);
            assert!(x.is_finite());
            assert!(x >= 0.0);
        }
    }
}
