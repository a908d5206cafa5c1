//! Stereographic projection — north-polar, south-polar, oblique, and
//! equatorial subtypes, picked from the central latitude at construction.
//!
//! The ellipsoidal form works in the conformal latitude via `ssfn`/`tsfn`;
//! its inverse iterates the conformal-to-geodetic recurrence with a bounded
//! budget. The spherical forms are closed both ways.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use tracing::{debug, warn};

use crate::common::{self, normalize_dlam, normalize_lon_deg, nudge_geographic, ssfn, tsfn};
use crate::ellipsoid::Ellipsoid;
use crate::error::ProjError;
use crate::Projection;

/// Projection subtype, fixed by the central latitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    NorthPole,
    SouthPole,
    Oblique,
    Equatorial,
}

/// Derived terms, recomputed whenever the ellipsoid changes. Radial terms
/// are dimensionless; the semi-major axis scales the final coordinates.
#[derive(Clone, Copy, Debug)]
enum StereCore {
    Sphere {
        akm1: f64,
        sinph0: f64,
        cosph0: f64,
    },
    Ellipsoid {
        e: f64,
        akm1: f64,
        /// sin/cos of the conformal latitude of the center (oblique and
        /// equatorial subtypes; zero for the polar ones).
        sin_x1: f64,
        cos_x1: f64,
    },
}

#[derive(Clone, Debug)]
pub struct Stereographic {
    ellipsoid: Ellipsoid,
    /// Central meridian (radians)
    lon0: f64,
    /// Latitude of origin (radians)
    lat0: f64,
    /// Latitude of true scale (radians)
    lat_ts: f64,
    false_easting: f64,
    false_northing: f64,
    mode: Mode,
    core: StereCore,
}

impl Stereographic {
    /// Validating constructor. Angles in degrees, offsets in metres.
    ///
    /// `secant_latitude` is the latitude of true scale; the projection
    /// scale is `k0 = (1 + sin|secant_latitude|) / 2`.
    pub fn new(
        ellipsoid: Ellipsoid,
        central_longitude: f64,
        central_latitude: f64,
        secant_latitude: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self, ProjError> {
        common::check_lon_deg("central_longitude", central_longitude)?;
        common::check_lat_deg("central_latitude", central_latitude)?;
        common::check_lat_deg("secant_latitude", secant_latitude)?;
        common::check_finite("false_easting", false_easting)?;
        common::check_finite("false_northing", false_northing)?;

        let lat0 = central_latitude.to_radians();
        let lat_ts = secant_latitude.to_radians();
        let mode = Self::classify(lat0);
        let core = Self::compute_core(&ellipsoid, mode, lat0, lat_ts);

        Ok(Self {
            ellipsoid,
            lon0: central_longitude.to_radians(),
            lat0,
            lat_ts,
            false_easting,
            false_northing,
            mode,
            core,
        })
    }

    fn classify(lat0: f64) -> Mode {
        let t = lat0.abs();
        if (t - FRAC_PI_2).abs() < common::TOL {
            if lat0 < 0.0 {
                Mode::SouthPole
            } else {
                Mode::NorthPole
            }
        } else if t < common::TOL {
            Mode::Equatorial
        } else {
            Mode::Oblique
        }
    }

    fn compute_core(ellipsoid: &Ellipsoid, mode: Mode, lat0: f64, lat_ts: f64) -> StereCore {
        let phits = lat_ts.abs();
        let k0 = 0.5 * (1.0 + phits.sin());

        if ellipsoid.is_sphere() {
            // k0 already encodes the secant latitude: 2·k0 = 1 + sin(phits)
            // is the polar true-scale identity cos(phits)/tan(π/4 - phits/2).
            StereCore::Sphere {
                akm1: 2.0 * k0,
                sinph0: lat0.sin(),
                cosph0: lat0.cos(),
            }
        } else {
            let e = ellipsoid.eccentricity();
            let es = ellipsoid.e2;
            match mode {
                Mode::NorthPole | Mode::SouthPole => {
                    let akm1 =
                        2.0 * k0 / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt();
                    StereCore::Ellipsoid {
                        e,
                        akm1,
                        sin_x1: 0.0,
                        cos_x1: 0.0,
                    }
                }
                Mode::Oblique | Mode::Equatorial => {
                    let sinphi0 = lat0.sin();
                    let x1 = 2.0 * ssfn(lat0, sinphi0, e).atan() - FRAC_PI_2;
                    let akm1 = 2.0 * k0 * lat0.cos() / (1.0 - es * sinphi0 * sinphi0).sqrt();
                    StereCore::Ellipsoid {
                        e,
                        akm1,
                        sin_x1: x1.sin(),
                        cos_x1: x1.cos(),
                    }
                }
            }
        }
    }

    /// Replace the planet model and recompute the derived terms.
    pub fn set_ellipsoid(&mut self, ellipsoid: Ellipsoid) {
        self.ellipsoid = ellipsoid;
        self.core = Self::compute_core(&ellipsoid, self.mode, self.lat0, self.lat_ts);
        debug!(a = ellipsoid.a, b = ellipsoid.b, "recomputed stereographic terms");
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

    /// Latitude of true scale in degrees.
    pub fn secant_latitude(&self) -> f64 {
        self.lat_ts.to_degrees()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Tolerance-based structural comparison of all parameters.
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.ellipsoid.a - other.ellipsoid.a).abs() < common::TOL
            && (self.ellipsoid.b - other.ellipsoid.b).abs() < common::TOL
            && (self.lon0 - other.lon0).abs() < common::TOL
            && (self.lat0 - other.lat0).abs() < common::TOL
            && (self.lat_ts - other.lat_ts).abs() < common::TOL
            && (self.false_easting - other.false_easting).abs() < common::TOL
            && (self.false_northing - other.false_northing).abs() < common::TOL
    }

    /// Dimensionless forward transform, spherical model.
    fn forward_sphere(
        &self,
        lam: f64,
        phi: f64,
        akm1: f64,
        sinph0: f64,
        cosph0: f64,
    ) -> Result<(f64, f64), ProjError> {
        let sinphi = phi.sin();
        let cosphi = phi.cos();
        let coslam = lam.cos();
        let sinlam = lam.sin();

        match self.mode {
            Mode::Oblique => {
                let denom = 1.0 + sinph0 * sinphi + cosph0 * cosphi * coslam;
                if denom <= common::TOL {
                    return Err(ProjError::TransformFailed(
                        "point is antipodal to the projection center".into(),
                    ));
                }
                let a = akm1 / denom;
                Ok((
                    a * cosphi * sinlam,
                    a * (cosph0 * sinphi - sinph0 * cosphi * coslam),
                ))
            }
            Mode::Equatorial => {
                let denom = 1.0 + cosphi * coslam;
                if denom <= common::TOL {
                    return Err(ProjError::TransformFailed(
                        "point is antipodal to the projection center".into(),
                    ));
                }
                let a = akm1 / denom;
                Ok((a * cosphi * sinlam, a * sinphi))
            }
            Mode::NorthPole => {
                let rho = akm1 * (FRAC_PI_4 - 0.5 * phi).tan();
                Ok((rho * sinlam, -rho * coslam))
            }
            Mode::SouthPole => {
                let rho = akm1 * (FRAC_PI_4 + 0.5 * phi).tan();
                Ok((rho * sinlam, rho * coslam))
            }
        }
    }

    /// Dimensionless forward transform, ellipsoidal model.
    fn forward_ellipsoid(
        &self,
        lam: f64,
        phi: f64,
        e: f64,
        akm1: f64,
        sin_x1: f64,
        cos_x1: f64,
    ) -> Result<(f64, f64), ProjError> {
        let sinphi = phi.sin();
        let coslam = lam.cos();
        let sinlam = lam.sin();

        match self.mode {
            Mode::Oblique | Mode::Equatorial => {
                let x_chi = 2.0 * ssfn(phi, sinphi, e).atan() - FRAC_PI_2;
                let sin_x = x_chi.sin();
                let cos_x = x_chi.cos();
                let denom = if self.mode == Mode::Equatorial {
                    1.0 + cos_x * coslam
                } else {
                    cos_x1 * (1.0 + sin_x1 * sin_x + cos_x1 * cos_x * coslam)
                };
                if denom <= common::TOL {
                    return Err(ProjError::TransformFailed(
                        "point is antipodal to the projection center".into(),
                    ));
                }
                let a = akm1 / denom;
                let y = if self.mode == Mode::Equatorial {
                    a * sin_x
                } else {
                    a * (cos_x1 * sin_x - sin_x1 * cos_x * coslam)
                };
                Ok((a * cos_x * sinlam, y))
            }
            Mode::NorthPole => {
                let rho = akm1 * tsfn(phi, sinphi, e);
                Ok((rho * sinlam, -rho * coslam))
            }
            Mode::SouthPole => {
                let rho = akm1 * tsfn(-phi, -sinphi, e);
                Ok((rho * sinlam, rho * coslam))
            }
        }
    }

    /// Dimensionless inverse transform, spherical model. Closed-form.
    fn inverse_sphere(
        &self,
        xp: f64,
        yp: f64,
        akm1: f64,
        sinph0: f64,
        cosph0: f64,
    ) -> (f64, f64) {
        let rho = xp.hypot(yp);
        let c = 2.0 * (rho / akm1).atan();
        let sinc = c.sin();
        let cosc = c.cos();

        match self.mode {
            Mode::Oblique => {
                let phi = if rho <= common::TOL {
                    self.lat0
                } else {
                    common::asin_clamped(cosc * sinph0 + yp * sinc * cosph0 / rho)
                };
                let cb = cosc - sinph0 * phi.sin();
                let lam = if cb != 0.0 || xp != 0.0 {
                    (xp * sinc * cosph0).atan2(cb * rho)
                } else {
                    0.0
                };
                (lam, phi)
            }
            Mode::Equatorial => {
                let phi = if rho <= common::TOL {
                    0.0
                } else {
                    common::asin_clamped(yp * sinc / rho)
                };
                let lam = if cosc != 0.0 || xp != 0.0 {
                    (xp * sinc).atan2(cosc * rho)
                } else {
                    0.0
                };
                (lam, phi)
            }
            Mode::NorthPole => {
                let yp = -yp;
                let phi = if rho <= common::TOL {
                    self.lat0
                } else {
                    common::asin_clamped(cosc)
                };
                let lam = if xp == 0.0 && yp == 0.0 {
                    0.0
                } else {
                    xp.atan2(yp)
                };
                (lam, phi)
            }
            Mode::SouthPole => {
                let phi = if rho <= common::TOL {
                    self.lat0
                } else {
                    common::asin_clamped(-cosc)
                };
                let lam = if xp == 0.0 && yp == 0.0 {
                    0.0
                } else {
                    xp.atan2(yp)
                };
                (lam, phi)
            }
        }
    }

    /// Dimensionless inverse transform, ellipsoidal model. Iterates the
    /// conformal-to-geodetic recurrence with a bounded budget.
    fn inverse_ellipsoid(
        &self,
        mut xp: f64,
        mut yp: f64,
        e: f64,
        akm1: f64,
        sin_x1: f64,
        cos_x1: f64,
    ) -> Result<(f64, f64), ProjError> {
        let rho = xp.hypot(yp);
        let tp;
        let halfpi;
        let halfe;
        let mut phi_l;

        match self.mode {
            Mode::Oblique | Mode::Equatorial => {
                let c = 2.0 * (rho * cos_x1).atan2(akm1);
                let cosc = c.cos();
                let sinc = c.sin();
                phi_l = if rho == 0.0 {
                    common::asin_clamped(cosc * sin_x1)
                } else {
                    common::asin_clamped(cosc * sin_x1 + yp * sinc * cos_x1 / rho)
                };
                tp = (0.5 * (FRAC_PI_2 + phi_l)).tan();
                xp *= sinc;
                yp = rho * cosc * cos_x1 - yp * sin_x1 * sinc;
                halfpi = FRAC_PI_2;
                halfe = 0.5 * e;
            }
            Mode::NorthPole | Mode::SouthPole => {
                if self.mode == Mode::NorthPole {
                    yp = -yp;
                }
                tp = -rho / akm1;
                phi_l = FRAC_PI_2 - 2.0 * tp.atan();
                halfpi = -FRAC_PI_2;
                halfe = -0.5 * e;
            }
        }

        for _ in 0..common::MAX_ITER {
            let con = e * phi_l.sin();
            let phi =
                2.0 * (tp * ((1.0 + con) / (1.0 - con)).powf(halfe)).atan() - halfpi;
            if (phi_l - phi).abs() < common::CONV_TOL {
                let phi = if self.mode == Mode::SouthPole { -phi } else { phi };
                let lam = if xp == 0.0 && yp == 0.0 {
                    0.0
                } else {
                    xp.atan2(yp)
                };
                return Ok((lam, phi));
            }
            phi_l = phi;
        }
        warn!("conformal latitude iteration exhausted");
        Err(ProjError::NotConverged)
    }
}

impl Projection for Stereographic {
    fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        common::check_finite("longitude", lon)?;
        common::check_finite("latitude", lat)?;

        let (lam, phi) = nudge_geographic(lon.to_radians(), lat.to_radians());
        let lam = normalize_dlam(lam - self.lon0);

        let (x, y) = match self.core {
            StereCore::Sphere {
                akm1,
                sinph0,
                cosph0,
            } => self.forward_sphere(lam, phi, akm1, sinph0, cosph0)?,
            StereCore::Ellipsoid {
                e,
                akm1,
                sin_x1,
                cos_x1,
            } => self.forward_ellipsoid(lam, phi, e, akm1, sin_x1, cos_x1)?,
        };

        Ok((
            x * self.ellipsoid.a + self.false_easting,
            y * self.ellipsoid.a + self.false_northing,
        ))
    }

    fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        common::check_finite("x", x)?;
        common::check_finite("y", y)?;

        let xp = (x - self.false_easting) / self.ellipsoid.a;
        let yp = (y - self.false_northing) / self.ellipsoid.a;

        let (lam, phi) = match self.core {
            StereCore::Sphere {
                akm1,
                sinph0,
                cosph0,
            } => self.inverse_sphere(xp, yp, akm1, sinph0, cosph0),
            StereCore::Ellipsoid {
                e,
                akm1,
                sin_x1,
                cos_x1,
            } => self.inverse_ellipsoid(xp, yp, e, akm1, sin_x1, cos_x1)?,
        };

        Ok((
            normalize_lon_deg((lam + self.lon0).to_degrees()),
            phi.to_degrees(),
        ))
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
        "stereographic"
    }
}
