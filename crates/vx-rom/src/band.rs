//! Frequency grids and quadrature weights for Gramian integration.

use serde::{Deserialize, Serialize};

use crate::error::{RomError, RomResult};

/// Nyquist angular frequency for time step `dt`.
pub fn nyquist(dt: f64) -> f64 {
    std::f64::consts::PI / dt
}

/// Angular frequencies with integration weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub frequencies: Vec<f64>,
    pub weights: Vec<f64>,
}

impl FrequencyBand {
    pub fn new(frequencies: Vec<f64>, weights: Vec<f64>) -> RomResult<Self> {
        let band = Self {
            frequencies,
            weights,
        };
        band.validate()?;
        Ok(band)
    }

    /// `n` equally spaced points on `[w_min, w_max]` with trapezoidal weights.
    pub fn uniform(w_min: f64, w_max: f64, n: usize) -> RomResult<Self> {
        if n < 2 {
            return Err(RomError::config("a frequency band needs at least two points"));
        }
        if !(w_min.is_finite() && w_max.is_finite() && 0.0 <= w_min && w_min < w_max) {
            return Err(RomError::config(format!(
                "invalid frequency band [{w_min}, {w_max}]"
            )));
        }
        let h = (w_max - w_min) / (n - 1) as f64;
        let frequencies = (0..n).map(|i| w_min + h * i as f64).collect();
        let weights = (0..n)
            .map(|i| if i == 0 || i == n - 1 { 0.5 * h } else { h })
            .collect();
        Self::new(frequencies, weights)
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn validate(&self) -> RomResult<()> {
        if self.is_empty() {
            return Err(RomError::config("empty frequency band"));
        }
        if self.frequencies.len() != self.weights.len() {
            return Err(RomError::config(format!(
                "{} frequencies but {} weights",
                self.frequencies.len(),
                self.weights.len()
            )));
        }
        if self
            .iter()
            .any(|(w, q)| !(w.is_finite() && q.is_finite() && w >= 0.0 && q >= 0.0))
        {
            return Err(RomError::config(
                "frequencies and weights must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Settings for frequency-limited balancing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalancingSettings {
    /// Band where the reduced model should be accurate. Both Gramians.
    pub low: FrequencyBand,
    /// Remainder of the spectrum. Controllability Gramian only.
    pub high: FrequencyBand,
    /// Singular values below `rank_tolerance * max` are dropped.
    pub rank_tolerance: f64,
}

impl BalancingSettings {
    /// Low band `[0, cut * nyquist]` and high band `[cut * nyquist, nyquist]`.
    pub fn split_nyquist(dt: f64, cut: f64, n_low: usize, n_high: usize) -> RomResult<Self> {
        if !(cut > 0.0 && cut < 1.0) {
            return Err(RomError::config(format!(
                "band split must lie in (0, 1), got {cut}"
            )));
        }
        let w_nyq = nyquist(dt);
        Ok(Self {
            low: FrequencyBand::uniform(0.0, cut * w_nyq, n_low)?,
            high: FrequencyBand::uniform(cut * w_nyq, w_nyq, n_high)?,
            rank_tolerance: 1e-10,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapezoid_weights_integrate_constants() {
        let band = FrequencyBand::uniform(1.0, 3.0, 5).unwrap();
        let integral: f64 = band.weights.iter().sum();
        assert!((integral - 2.0).abs() < 1e-14);
        assert_eq!(band.frequencies[4], 3.0);
    }

    #[test]
    fn bad_bands_are_rejected() {
        assert!(FrequencyBand::uniform(0.0, 1.0, 1).is_err());
        assert!(FrequencyBand::uniform(2.0, 1.0, 4).is_err());
        assert!(FrequencyBand::new(vec![1.0], vec![]).is_err());
        assert!(FrequencyBand::new(vec![1.0], vec![-1.0]).is_err());
        assert!(BalancingSettings::split_nyquist(0.1, 1.5, 4, 4).is_err());
    }

    #[test]
    fn split_covers_nyquist_range() {
        let s = BalancingSettings::split_nyquist(0.1, 0.25, 5, 9).unwrap();
        assert_eq!(s.low.len(), 5);
        let last = *s.high.frequencies.last().unwrap();
        assert!((last - nyquist(0.1)).abs() < 1e-12);
        assert!((s.low.frequencies[4] - s.high.frequencies[0]).abs() < 1e-12);
    }
}
