use crate::common::SPHERICAL_E;
use crate::error::ProjError;

/// Reference ellipsoid parameters.
#[derive(Clone, Copy, Debug)]
pub struct Ellipsoid {
    /// Semi-major (equatorial) axis (metres)
    pub a: f64,
    /// Semi-minor (polar) axis (metres)
    pub b: f64,
    /// First eccentricity squared: (a² - b²) / a²
    pub e2: f64,
    /// 1 - e²
    pub one_es: f64,
}

impl Ellipsoid {
    /// Validating constructor from semi-axes in metres.
    ///
    /// Requires both axes finite and positive, with `a >= b`.
    pub fn new(a: f64, b: f64) -> Result<Self, ProjError> {
        if !a.is_finite() || !b.is_finite() {
            return Err(ProjError::InvalidParameter(format!(
                "non-finite semi-axes: a={a}, b={b}"
            )));
        }
        if a <= 0.0 || b <= 0.0 {
            return Err(ProjError::InvalidParameter(format!(
                "semi-axes must be positive: a={a}, b={b}"
            )));
        }
        if b > a {
            return Err(ProjError::InvalidParameter(format!(
                "semi-minor axis {b} exceeds semi-major axis {a}"
            )));
        }
        Ok(Self::from_axes(a, b))
    }

    /// Spherical model of the given radius.
    pub fn sphere(radius: f64) -> Result<Self, ProjError> {
        Self::new(radius, radius)
    }

    const fn from_axes(a: f64, b: f64) -> Self {
        let e2 = (a * a - b * b) / (a * a);
        Self {
            a,
            b,
            e2,
            one_es: 1.0 - e2,
        }
    }

    /// First eccentricity, clamped to [0, 1].
    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt().min(1.0)
    }

    /// Flattening: (a - b) / a.
    pub fn flattening(&self) -> f64 {
        (self.a - self.b) / self.a
    }

    /// True when the eccentricity is below the spherical limit, so the
    /// trig-only projection formulas apply.
    pub fn is_sphere(&self) -> bool {
        self.e2 < SPHERICAL_E * SPHERICAL_E
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::from_axes(6_378_137.0, 6_356_752.314_245_179);
pub const GRS80: Ellipsoid = Ellipsoid::from_axes(6_378_137.0, 6_356_752.314_140_356);
