//! Model settings: time step, wake integration order, predictor handling,
//! added mass and reference scales.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use vx_core::ensure_positive;
use vx_core::units::{Density, Length, Time, Velocity, kgpm3, m, mps};

use crate::error::{SimError, SimResult};

/// Finite-difference order used for the circulation derivative.
///
/// Parsed from an integer: `0` (exact, frequency models only), `1` or `2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IntegrationOrder {
    /// `dt * dGamma/dt` evaluated as `i w dt` in the frequency domain.
    Exact,
    /// Backward difference `Gamma(n+1) - Gamma(n)`.
    First,
    /// `1.5 Gamma(n+1) - 2 Gamma(n) + 0.5 Gamma(n-1)`.
    #[default]
    Second,
}

impl TryFrom<u8> for IntegrationOrder {
    type Error = SimError;

    fn try_from(value: u8) -> SimResult<Self> {
        match value {
            0 => Ok(IntegrationOrder::Exact),
            1 => Ok(IntegrationOrder::First),
            2 => Ok(IntegrationOrder::Second),
            other => Err(SimError::config(format!(
                "integration order {other} not supported (expected 0, 1 or 2)"
            ))),
        }
    }
}

impl From<IntegrationOrder> for u8 {
    fn from(order: IntegrationOrder) -> u8 {
        match order {
            IntegrationOrder::Exact => 0,
            IntegrationOrder::First => 1,
            IntegrationOrder::Second => 2,
        }
    }
}

/// Coefficients of `delta(n+1) = bp1 Gamma(n+1) + b0 Gamma(n) + bm1 Gamma(n-1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifferenceCoefficients {
    pub bp1: f64,
    pub b0: f64,
    pub bm1: f64,
}

impl IntegrationOrder {
    /// Time-domain difference coefficients; `None` for [`IntegrationOrder::Exact`].
    pub fn coefficients(self) -> Option<DifferenceCoefficients> {
        match self {
            IntegrationOrder::Exact => None,
            IntegrationOrder::First => Some(DifferenceCoefficients {
                bp1: 1.0,
                b0: -1.0,
                bm1: 0.0,
            }),
            IntegrationOrder::Second => Some(DifferenceCoefficients {
                bp1: 1.5,
                b0: -2.0,
                bm1: 0.5,
            }),
        }
    }

    /// Whether the lagged circulation `Gamma(n-1)` is a state.
    pub fn has_lag(self) -> bool {
        self == IntegrationOrder::Second
    }

    /// Frequency image of the derivative state relative to `Gamma`,
    /// at `z = exp(i w dt)`.
    pub fn derivative_factor(self, z: Complex64, w_dt: f64) -> Complex64 {
        let zinv = z.inv();
        match self {
            IntegrationOrder::Exact => Complex64::new(0.0, w_dt),
            IntegrationOrder::First => Complex64::new(1.0, 0.0) - zinv,
            IntegrationOrder::Second => 1.5 - 2.0 * zinv + 0.5 * zinv * zinv,
        }
    }
}

/// Reference scales used to non-dimensionalise a model, in SI units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingReference {
    pub length: f64,
    pub speed: f64,
    pub density: f64,
}

impl Default for ScalingReference {
    fn default() -> Self {
        Self {
            length: 1.0,
            speed: 1.0,
            density: 1.0,
        }
    }
}

impl ScalingReference {
    pub fn from_quantities(length: Length, speed: Velocity, density: Density) -> Self {
        Self {
            length: length.value,
            speed: speed.value,
            density: density.value,
        }
    }

    /// Derived scales. All reference values must be finite and positive.
    pub fn factors(&self) -> SimResult<ScalingFactors> {
        for (what, v) in [
            ("reference length", self.length),
            ("reference speed", self.speed),
            ("reference density", self.density),
        ] {
            ensure_positive(v, what)?;
        }
        let time: Time = m(self.length) / mps(self.speed);
        let dyn_pressure = 0.5 * kgpm3(self.density).value * self.speed * self.speed;
        Ok(ScalingFactors {
            length: self.length,
            speed: self.speed,
            density: self.density,
            time: time.value,
            circulation: self.speed * self.length,
            dyn_pressure,
            force: dyn_pressure * self.length * self.length,
        })
    }
}

/// Reference scales and their derived time, circulation, pressure and force scales.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScalingFactors {
    pub length: f64,
    pub speed: f64,
    pub density: f64,
    pub time: f64,
    pub circulation: f64,
    pub dyn_pressure: f64,
    pub force: f64,
}

/// Settings for the discrete-time model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicSettings {
    pub dt: f64,
    pub integration_order: IntegrationOrder,
    pub remove_predictor: bool,
    pub include_added_mass: bool,
    pub scaling: ScalingReference,
}

impl Default for DynamicSettings {
    fn default() -> Self {
        Self {
            dt: 0.1,
            integration_order: IntegrationOrder::Second,
            remove_predictor: true,
            include_added_mass: true,
            scaling: ScalingReference::default(),
        }
    }
}

impl DynamicSettings {
    pub(crate) fn validate(&self) -> SimResult<DifferenceCoefficients> {
        validate_dt(self.dt)?;
        self.scaling.factors()?;
        self.integration_order.coefficients().ok_or_else(|| {
            SimError::config("integration order 0 is only available for frequency models")
        })
    }
}

/// Settings for the frequency-domain model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencySettings {
    pub dt: f64,
    pub integration_order: IntegrationOrder,
    pub scaling: ScalingReference,
}

impl Default for FrequencySettings {
    fn default() -> Self {
        Self {
            dt: 0.1,
            integration_order: IntegrationOrder::Second,
            scaling: ScalingReference::default(),
        }
    }
}

impl FrequencySettings {
    pub(crate) fn validate(&self) -> SimResult<()> {
        validate_dt(self.dt)?;
        self.scaling.factors().map(|_| ())
    }
}

fn validate_dt(dt: f64) -> SimResult<()> {
    ensure_positive(dt, "time step")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vx_core::units::constants::rho_sea_level;

    #[test]
    fn order_parses_from_integer() {
        assert_eq!(IntegrationOrder::try_from(2).unwrap(), IntegrationOrder::Second);
        assert_eq!(u8::from(IntegrationOrder::First), 1);
        let err = IntegrationOrder::try_from(3).unwrap_err();
        assert!(matches!(err, SimError::Configuration { .. }));
    }

    #[test]
    fn second_order_difference_is_exact_for_linear_ramp() {
        let c = IntegrationOrder::Second.coefficients().unwrap();
        // Gamma(n) = n: delta = 1
        let delta = c.bp1 * 3.0 + c.b0 * 2.0 + c.bm1 * 1.0;
        assert!((delta - 1.0).abs() < 1e-15);
        assert!(IntegrationOrder::Exact.coefficients().is_none());
    }

    #[test]
    fn derivative_factor_vanishes_at_zero_frequency() {
        let one = Complex64::new(1.0, 0.0);
        for order in [IntegrationOrder::First, IntegrationOrder::Second, IntegrationOrder::Exact] {
            assert!(order.derivative_factor(one, 0.0).norm() < 1e-15);
        }
    }

    #[test]
    fn scaling_factors_from_quantities() {
        let r = ScalingReference::from_quantities(m(0.5), mps(20.0), rho_sea_level());
        let f = r.factors().unwrap();
        assert_relative_eq!(f.time, 0.025, epsilon = 1e-15);
        assert_relative_eq!(f.circulation, 10.0, epsilon = 1e-12);
        assert_relative_eq!(f.dyn_pressure, 245.0, epsilon = 1e-9);
        assert_relative_eq!(f.force, 61.25, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_reference_is_rejected() {
        let r = ScalingReference {
            speed: 0.0,
            ..ScalingReference::default()
        };
        let err = r.factors().unwrap_err();
        assert!(matches!(err, SimError::Configuration { .. }));
        assert!(err.to_string().contains("reference speed"));
    }

    #[test]
    fn settings_validation() {
        let s = DynamicSettings {
            integration_order: IntegrationOrder::Exact,
            ..DynamicSettings::default()
        };
        assert!(matches!(s.validate(), Err(SimError::Configuration { .. })));
        let s = DynamicSettings {
            dt: -1.0,
            ..DynamicSettings::default()
        };
        assert!(s.validate().is_err());
        assert!(FrequencySettings::default().validate().is_ok());
    }

    #[test]
    fn dynamic_settings_from_yaml() {
        let yaml = "dt: 0.05\nintegration_order: 1\nscaling:\n  length: 0.5\n";
        let s: DynamicSettings = serde_yaml::from_str(yaml).unwrap();
        assert_relative_eq!(s.dt, 0.05);
        assert_eq!(s.integration_order, IntegrationOrder::First);
        assert!(s.remove_predictor);
        assert_relative_eq!(s.scaling.length, 0.5);
        assert_relative_eq!(s.scaling.speed, 1.0);
        assert!(serde_yaml::from_str::<DynamicSettings>("integration_order: 3\n").is_err());
    }
}
