//! How a simulated oracle decides which status to report.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::flight::StatusCode;

pub trait StatusPolicy: Send {
    fn choose(&mut self) -> StatusCode;
}

/// Draws a standard normal sample and buckets its magnitude.
///
/// Roughly 45% on time, 28% late through airline fault, and a thin tail of
/// the other codes. Samples beyond two deviations report `Unknown`, which
/// the contract rejects, so those oracles effectively abstain.
pub struct NormalStatusPolicy {
    rng: StdRng,
}

impl NormalStatusPolicy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn standard_normal(&mut self) -> f64 {
        // Box-Muller; u1 must not be zero for the logarithm
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl Default for NormalStatusPolicy {
    fn default() -> Self {
        Self::new()
    }
}

pub fn bucket(sample: f64) -> StatusCode {
    match sample.abs() {
        z if z < 0.6 => StatusCode::OnTime,
        z if z < 1.1 => StatusCode::LateAirline,
        z if z < 1.3 => StatusCode::LateWeather,
        z if z < 1.5 => StatusCode::LateTechnical,
        z if z < 2.0 => StatusCode::LateOther,
        _ => StatusCode::Unknown,
    }
}

impl StatusPolicy for NormalStatusPolicy {
    fn choose(&mut self) -> StatusCode {
        bucket(self.standard_normal())
    }
}

/// Always reports the same status.
#[derive(Debug, Clone, Copy)]
pub struct FixedStatusPolicy(pub StatusCode);

impl StatusPolicy for FixedStatusPolicy {
    fn choose(&mut self) -> StatusCode {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(bucket(0.0), StatusCode::OnTime);
        assert_eq!(bucket(-0.59), StatusCode::OnTime);
        assert_eq!(bucket(0.6), StatusCode::LateAirline);
        assert_eq!(bucket(-1.2), StatusCode::LateWeather);
        assert_eq!(bucket(1.4), StatusCode::LateTechnical);
        assert_eq!(bucket(1.99), StatusCode::LateOther);
        assert_eq!(bucket(-2.5), StatusCode::Unknown);
    }

    #[test]
    fn test_normal_policy_distribution() {
        let mut policy = NormalStatusPolicy::from_seed(42);
        let draws: Vec<StatusCode> = (0..10_000).map(|_| policy.choose()).collect();
        let share = |status| draws.iter().filter(|&&s| s == status).count() as f64 / 10_000.0;

        assert!((share(StatusCode::OnTime) - 0.45).abs() < 0.03);
        assert!((share(StatusCode::LateAirline) - 0.28).abs() < 0.03);
        assert!(share(StatusCode::Unknown) < 0.07);
    }

    #[test]
    fn test_fixed_policy() {
        let mut policy = FixedStatusPolicy(StatusCode::LateAirline);
        assert_eq!(policy.choose(), StatusCode::LateAirline);
        assert_eq!(policy.choose(), StatusCode::LateAirline);
    }
}
