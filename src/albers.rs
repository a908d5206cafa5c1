//! Albers equal-area conic projection.
//!
//! Conic with one (tangent) or two (secant) standard parallels. The
//! ellipsoidal form works in the authalic latitude via `qsfn`; its inverse
//! recovers the geodetic latitude with the bounded `phi1` solver.

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, warn};

use crate::common::{
    self, msfn, normalize_dlam, normalize_lon_deg, nudge_geographic, phi1, qsfn,
};
use crate::ellipsoid::Ellipsoid;
use crate::error::ProjError;
use crate::Projection;

/// The inverse clamps to the pole when |q| is this close to the authalic
/// polar extreme `ec`.
const EC_TOL: f64 = 1.0e-7;

/// Derived terms, recomputed whenever the ellipsoid changes. The radial
/// terms are dimensionless (unit sphere); the semi-major axis scales the
/// final coordinates.
#[derive(Clone, Copy, Debug)]
enum AlbersCore {
    Sphere {
        n: f64,
        n2: f64,
        c: f64,
        dd: f64,
        rho0: f64,
    },
    Ellipsoid {
        e: f64,
        one_es: f64,
        n: f64,
        c: f64,
        dd: f64,
        rho0: f64,
        /// Authalic q at the pole.
        ec: f64,
    },
}

#[derive(Clone, Debug)]
pub struct Albers {
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
    core: AlbersCore,
}

/// Conic radius from the radicand `c - n·q`. Geometrically the radicand is
/// non-negative for any latitude when the standard parallels are valid;
/// floating-point noise may graze zero.
fn conic_rho(dd: f64, radicand: f64) -> f64 {
    debug_assert!(
        radicand > -common::TOL,
        "conic radicand went negative: {radicand}"
    );
    dd * radicand.max(0.0).sqrt()
}

impl Albers {
    /// Validating constructor. Angles in degrees, offsets in metres.
    ///
    /// The standard parallels must satisfy `lower <= upper`, lie in the same
    /// hemisphere, and have magnitude within [1, 89] degrees.
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

    fn compute_core(ellipsoid: &Ellipsoid, lat0: f64, lat1: f64, lat2: f64) -> AlbersCore {
        let sinphi = lat1.sin();
        let cosphi = lat1.cos();
        let secant = (lat1 - lat2).abs() >= common::TOL;

        if ellipsoid.is_sphere() {
            let n = if secant {
                0.5 * (sinphi + lat2.sin())
            } else {
                sinphi
            };
            let n2 = n + n;
            let c = cosphi * cosphi + n2 * sinphi;
            let dd = 1.0 / n;
            let rho0 = conic_rho(dd, c - n2 * lat0.sin());
            AlbersCore::Sphere { n, n2, c, dd, rho0 }
        } else {
            let e = ellipsoid.eccentricity();
            let es = ellipsoid.e2;
            let one_es = ellipsoid.one_es;
            let m1 = msfn(sinphi, cosphi, es);
            let ql1 = qsfn(sinphi, e, one_es);
            let n = if secant {
                let sinphi2 = lat2.sin();
                let m2 = msfn(sinphi2, lat2.cos(), es);
                let ql2 = qsfn(sinphi2, e, one_es);
                (m1 * m1 - m2 * m2) / (ql2 - ql1)
            } else {
                sinphi
            };
            let ec = 1.0 - 0.5 * one_es * ((1.0 - e) / (1.0 + e)).ln() / e;
            let c = m1 * m1 + n * ql1;
            let dd = 1.0 / n;
            let rho0 = conic_rho(dd, c - n * qsfn(lat0.sin(), e, one_es));
            AlbersCore::Ellipsoid {
                e,
                one_es,
                n,
                c,
                dd,
                rho0,
                ec,
            }
        }
    }

    /// (n, dd, rho0) regardless of the planet model.
    fn cone(&self) -> (f64, f64, f64) {
        match self.core {
            AlbersCore::Sphere { n, dd, rho0, .. } => (n, dd, rho0),
            AlbersCore::Ellipsoid { n, dd, rho0, .. } => (n, dd, rho0),
        }
    }

    /// Replace the planet model and recompute the derived terms.
    pub fn set_ellipsoid(&mut self, ellipsoid: Ellipsoid) {
        self.ellipsoid = ellipsoid;
        self.core = Self::compute_core(&ellipsoid, self.lat0, self.lat1, self.lat2);
        debug!(a = ellipsoid.a, b = ellipsoid.b, "recomputed albers terms");
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

impl Projection for Albers {
    fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        common::check_finite("longitude", lon)?;
        common::check_finite("latitude", lat)?;

        let (lam, phi) = nudge_geographic(lon.to_radians(), lat.to_radians());
        let dlam = normalize_dlam(lam - self.lon0);

        let (n, rho, rho0) = match self.core {
            AlbersCore::Sphere { n, n2, c, dd, rho0 } => {
                (n, conic_rho(dd, c - n2 * phi.sin()), rho0)
            }
            AlbersCore::Ellipsoid {
                e,
                one_es,
                n,
                c,
                dd,
                rho0,
                ..
            } => (n, conic_rho(dd, c - n * qsfn(phi.sin(), e, one_es)), rho0),
        };
        let theta = n * dlam;

        let x = rho * theta.sin() * self.ellipsoid.a + self.false_easting;
        let y = (rho0 - rho * theta.cos()) * self.ellipsoid.a + self.false_northing;
        Ok((x, y))
    }

    fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        common::check_finite("x", x)?;
        common::check_finite("y", y)?;

        let (n, dd, rho0) = self.cone();
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
        let rho_n = rho / dd;

        let phi = match self.core {
            AlbersCore::Sphere { n2, c, .. } => {
                common::asin_clamped((c - rho_n * rho_n) / n2)
            }
            AlbersCore::Ellipsoid {
                e, one_es, c, ec, ..
            } => {
                let q = (c - rho_n * rho_n) / n;
                if (ec - q.abs()).abs() <= EC_TOL {
                    if q < 0.0 {
                        -FRAC_PI_2
                    } else {
                        FRAC_PI_2
                    }
                } else {
                    match phi1(q, e, one_es) {
                        Some(phi) => phi,
                        None => {
                            warn!(q, "authalic latitude iteration exhausted");
                            return Err(ProjError::NotConverged);
                        }
                    }
                }
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
        "albers"
    }
}
