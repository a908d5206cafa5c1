//! Lambert Conformal Conic projection.
//!
//! Conformal conic with one (tangent) or two (secant) standard parallels.
//! A single set of formulas serves both planet models: `tsfn` and `msfn`
//! degrade to their trig-only forms at zero eccentricity, and the
//! `phi_from_ts` solver converges immediately on a sphere.

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, warn};

use crate::common::{
    self, msfn, normalize_dlam, normalize_lon_deg, nudge_geographic, phi_from_ts, tsfn,
};
use crate::ellipsoid::Ellipsoid;
use crate::error::ProjError;
use crate::Projection;

/// Derived terms, recomputed whenever the ellipsoid changes. Radial terms
/// are dimensionless; the semi-major axis scales the final coordinates.
#[derive(Clone, Copy, Debug)]
struct LambertCore {
    e: f64,
    /// Cone constant
    n: f64,
    /// F = m₁ / (n·t₁ⁿ)
    f: f64,
    /// ρ₀ = F·t₀ⁿ
    rho0: f64,
}

#[derive(Clone, Debug)]
pub struct LambertConformalConic {
    ellipsoid: Ellipsoid,
    /// Central meridian (radians)
    lon0: f64,
    /// Latitude of origin (radians)
    lat0: f64,
    /// Lower standard parallel (radians)
    lat1: f64,
    /// Upper standard parallel (radians)
    lat2: f64,
    false_easting: f64,
    false_northing: f64,
    core: LambertCore,
}

impl LambertConformalConic {
    /// Validating constructor. Angles in degrees, offsets in metres.
    ///
    /// The standard parallels obey the same constraints as Albers:
    /// `lower <= upper`, same hemisphere, magnitude within [1, 89] degrees.
    pub fn new(
        ellipsoid: Ellipsoid,
        central_longitude: f64,
        central_latitude: f64,
        lower_parallel: f64,
        upper_parallel: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self, ProjError> {
        common::check_lon_deg("central_longitude", central_longitude)?;
        common::check_lat_deg("central_latitude", central_latitude)?;
        common::check_standard_parallels(lower_parallel, upper_parallel)?;
        common::check_finite("false_easting", false_easting)?;
        common::check_finite("false_northing", false_northing)?;

        let lat0 = central_latitude.to_radians();
        let lat1 = lower_parallel.to_radians();
        let lat2 = upper_parallel.to_radians();
        let core = Self::compute_core(&ellipsoid, lat0, lat1, lat2);

        Ok(Self {
            ellipsoid,
            lon0: central_longitude.to_radians(),
            lat0,
            lat1,
            lat2,
            false_easting,
            false_northing,
            core,
        })
    }

    fn compute_core(ellipsoid: &Ellipsoid, lat0: f64, lat1: f64, lat2: f64) -> LambertCore {
        let e = ellipsoid.eccentricity();
        let es = ellipsoid.e2;

        let sinphi1 = lat1.sin();
        let m1 = msfn(sinphi1, lat1.cos(), es);
        let t1 = tsfn(lat1, sinphi1, e);

        let n = if (lat1 - lat2).abs() >= common::TOL {
            let sinphi2 = lat2.sin();
            let m2 = msfn(sinphi2, lat2.cos(), es);
            let t2 = tsfn(lat2, sinphi2, e);
            (m1 / m2).ln() / (t1 / t2).ln()
        } else {
            sinphi1
        };

        let f = m1 / (n * t1.powf(n));
        let t0 = tsfn(lat0, lat0.sin(), e);
        let rho0 = f * t0.powf(n);

        LambertCore { e, n, f, rho0 }
    }

    /// Replace the planet model and recompute the derived terms.
    pub fn set_ellipsoid(&mut self, ellipsoid: Ellipsoid) {
        self.ellipsoid = ellipsoid;
        self.core = Self::compute_core(&ellipsoid, self.lat0, self.lat1, self.lat2);
        debug!(a = ellipsoid.a, b = ellipsoid.b, "recomputed lambert terms");
    }

    /// Offsets are additive after the core transform; no recomputation.
    pub fn set_false_easting(&mut self, false_easting: f64) -> Result<(), ProjError> {
        common::check_finite("false_easting", false_easting)?;
        self.false_easting = false_easting;
        Ok(())
    }

    pub fn set_false_northing(&mut self, false_northing: f64) -> Result<(), ProjError> {
        common::check_finite("false_northing", false_northing)?;
        self.false_northing = false_northing;
        Ok(())
    }

    /// Lower standard parallel in degrees.
    pub fn lower_parallel(&self) -> f64 {
        self.lat1.to_degrees()
    }

    /// Upper standard parallel in degrees.
    pub fn upper_parallel(&self) -> f64 {
        self.lat2.to_degrees()
    }

    /// True when the cone touches the planet at a single standard parallel.
    pub fn is_tangent(&self) -> bool {
        (self.lat1 - self.lat2).abs() < common::TOL
    }

    /// Tolerance-based structural comparison of all parameters.
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.ellipsoid.a - other.ellipsoid.a).abs() < common::TOL
            && (self.ellipsoid.b - other.ellipsoid.b).abs() < common::TOL
            && (self.lon0 - other.lon0).abs() < common::TOL
            && (self.lat0 - other.lat0).abs() < common::TOL
            && (self.lat1 - other.lat1).abs() < common::TOL
            && (self.lat2 - other.lat2).abs() < common::TOL
            && (self.false_easting - other.false_easting).abs() < common::TOL
            && (self.false_northing - other.false_northing).abs() < common::TOL
    }
}

impl Projection for LambertConformalConic {
    fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        common::check_finite("longitude", lon)?;
        common::check_finite("latitude", lat)?;

        let (lam, phi) = nudge_geographic(lon.to_radians(), lat.to_radians());
        let dlam = normalize_dlam(lam - self.lon0);

        let LambertCore { e, n, f, rho0 } = self.core;
        let rho = f * tsfn(phi, phi.sin(), e).powf(n);
        let theta = n * dlam;

        let x = rho * theta.sin() * self.ellipsoid.a + self.false_easting;
        let y = (rho0 - rho * theta.cos()) * self.ellipsoid.a + self.false_northing;
        Ok((x, y))
    }

    fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        common::check_finite("x", x)?;
        common::check_finite("y", y)?;

        let LambertCore { e, n, f, rho0 } = self.core;
        let mut xp = (x - self.false_easting) / self.ellipsoid.a;
        let mut yp = rho0 - (y - self.false_northing) / self.ellipsoid.a;
        let mut rho = xp.hypot(yp);

        if rho == 0.0 {
            let phi = if n > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
            return Ok((
                normalize_lon_deg(self.lon0.to_degrees()),
                phi.to_degrees(),
            ));
        }
        if n < 0.0 {
            rho = -rho;
            xp = -xp;
            yp = -yp;
        }

        let ts = (rho / f).powf(1.0 / n);
        let phi = match phi_from_ts(ts, e) {
            Some(phi) => phi,
            None => {
                warn!(ts, "conformal latitude iteration exhausted");
                return Err(ProjError::NotConverged);
            }
        };

        let lam = xp.atan2(yp) / n + self.lon0;
        Ok((normalize_lon_deg(lam.to_degrees()), phi.to_degrees()))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn central_longitude(&self) -> f64 {
        self.lon0.to_degrees()
    }

    fn central_latitude(&self) -> f64 {
        self.lat0.to_degrees()
    }

    fn false_easting(&self) -> f64 {
        self.false_easting
    }

    fn false_northing(&self) -> f64 {
        self.false_northing
    }

    fn name(&self) -> &'static str {
        "lambert_conformal_conic"
    }
}
