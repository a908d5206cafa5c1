//! Shared helpers for projection math: tolerance constants, the
//! pole/antimeridian nudge, longitude normalization, and the
//! auxiliary-latitude functions (`msfn`/`qsfn`/`tsfn`/`ssfn`) with their
//! bounded iterative inverses.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::error::ProjError;

/// Singularity-detection tolerance (radians).
pub const TOL: f64 = 1.0e-10;

/// Nudge applied to inputs within `TOL` of a pole or the antimeridian:
/// `sqrt(TOL)`, sign-preserving.
pub const NUDGE: f64 = 1.0e-5;

/// Convergence criterion for the iterative latitude solvers (radians).
pub const CONV_TOL: f64 = 1.0e-10;

/// Iteration budget for the latitude solvers.
pub const MAX_ITER: usize = 15;

/// Eccentricities below this use the spherical limit of `qsfn`.
pub const SPHERICAL_E: f64 = 1.0e-7;

/// Pull geographic coordinates (radians) off the projection singularities.
///
/// A latitude within `TOL` of ±π/2, or a longitude within `TOL` of ±π, is
/// moved `NUDGE` radians toward the interior, keeping its sign. The nudged
/// point stays invertible where the exact pole/antimeridian would collapse
/// onto the projection origin or wrap ambiguously.
pub fn nudge_geographic(lam: f64, phi: f64) -> (f64, f64) {
    let phi = if FRAC_PI_2 - phi.abs() < TOL {
        (FRAC_PI_2 - NUDGE).copysign(phi)
    } else {
        phi
    };
    let lam = if PI - lam.abs() < TOL {
        (PI - NUDGE).copysign(lam)
    } else {
        lam
    };
    (lam, phi)
}

/// Fold a longitude in degrees into [-180, 180].
pub fn normalize_lon_deg(mut lon: f64) -> f64 {
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Fold a longitude difference in radians into (-π, π].
pub fn normalize_dlam(mut dlam: f64) -> f64 {
    while dlam > PI {
        dlam -= 2.0 * PI;
    }
    while dlam <= -PI {
        dlam += 2.0 * PI;
    }
    dlam
}

/// Conformal-latitude factor m(φ) = cos φ / sqrt(1 - e²·sin²φ).
pub fn msfn(sinphi: f64, cosphi: f64, es: f64) -> f64 {
    let m = cosphi / (1.0 - es * sinphi * sinphi).sqrt();
    debug_assert!(m.is_finite(), "msfn produced {m}");
    m
}

/// Authalic-latitude factor q(φ). Reduces to 2·sin φ in the spherical limit.
pub fn qsfn(sinphi: f64, e: f64, one_es: f64) -> f64 {
    if e < SPHERICAL_E {
        return 2.0 * sinphi;
    }
    let con = e * sinphi;
    let q = one_es
        * (sinphi / (1.0 - con * con) - (0.5 / e) * ((1.0 - con) / (1.0 + con)).ln());
    debug_assert!(q.is_finite(), "qsfn produced {q}");
    q
}

/// Polar auxiliary function
/// t(φ) = tan(π/4 - φ/2) / ((1 - e·sin φ)/(1 + e·sin φ))^(e/2).
pub fn tsfn(phi: f64, sinphi: f64, e: f64) -> f64 {
    let con = e * sinphi;
    let t = (FRAC_PI_4 - 0.5 * phi).tan() / ((1.0 - con) / (1.0 + con)).powf(0.5 * e);
    debug_assert!(t.is_finite(), "tsfn produced {t}");
    t
}

/// Oblique/equatorial auxiliary function
/// s(φ) = tan(π/4 + φ/2) · ((1 - e·sin φ)/(1 + e·sin φ))^(e/2).
pub fn ssfn(phi: f64, sinphi: f64, e: f64) -> f64 {
    let con = e * sinphi;
    let s = (FRAC_PI_4 + 0.5 * phi).tan() * ((1.0 - con) / (1.0 + con)).powf(0.5 * e);
    debug_assert!(s.is_finite(), "ssfn produced {s}");
    s
}

/// Invert the authalic latitude: find φ with qsfn(sin φ, e, 1-e²) = q.
///
/// Newton iteration seeded with asin(q/2); at most `MAX_ITER` rounds,
/// converged when the correction drops below `CONV_TOL`. `None` when the
/// budget is exhausted or an estimate goes non-finite (pathological q).
pub fn phi1(q: f64, e: f64, one_es: f64) -> Option<f64> {
    let mut phi = (0.5 * q).asin();
    if e < SPHERICAL_E {
        return phi.is_finite().then_some(phi);
    }
    for _ in 0..MAX_ITER {
        let sinphi = phi.sin();
        let cosphi = phi.cos();
        let con = e * sinphi;
        let com = 1.0 - con * con;
        let dphi = 0.5 * com * com / cosphi
            * (q / one_es - sinphi / com + (0.5 / e) * ((1.0 - con) / (1.0 + con)).ln());
        phi += dphi;
        if !phi.is_finite() {
            return None;
        }
        if dphi.abs() < CONV_TOL {
            return Some(phi);
        }
    }
    None
}

/// Invert the polar auxiliary function: find φ with tsfn(φ, sin φ, e) = ts.
///
/// Fixed-point iteration
/// φ ← π/2 - 2·atan(ts·((1 - e·sin φ)/(1 + e·sin φ))^(e/2)),
/// same budget and failure reporting as [`phi1`].
pub fn phi_from_ts(ts: f64, e: f64) -> Option<f64> {
    let eccnth = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..MAX_ITER {
        let con = e * phi.sin();
        let dphi =
            FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(eccnth)).atan() - phi;
        phi += dphi;
        if !phi.is_finite() {
            return None;
        }
        if dphi.abs() < CONV_TOL {
            return Some(phi);
        }
    }
    None
}

/// asin with the argument clamped to [-1, 1]; floating-point noise may push
/// a geometrically valid argument just past the domain edge.
pub(crate) fn asin_clamped(v: f64) -> f64 {
    debug_assert!(v.abs() <= 1.0 + 1e-12, "asin argument out of domain: {v}");
    v.clamp(-1.0, 1.0).asin()
}

/// Reject non-finite values at the API boundary.
pub(crate) fn check_finite(name: &str, v: f64) -> Result<(), ProjError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ProjError::InvalidParameter(format!(
            "{name} is not finite: {v}"
        )))
    }
}

/// Longitude parameter in [-180, 180] degrees.
pub(crate) fn check_lon_deg(name: &str, v: f64) -> Result<(), ProjError> {
    check_finite(name, v)?;
    if (-180.0..=180.0).contains(&v) {
        Ok(())
    } else {
        Err(ProjError::InvalidParameter(format!(
            "{name} must be within [-180, 180] degrees, got {v}"
        )))
    }
}

/// Latitude parameter in [-90, 90] degrees.
pub(crate) fn check_lat_deg(name: &str, v: f64) -> Result<(), ProjError> {
    check_finite(name, v)?;
    if (-90.0..=90.0).contains(&v) {
        Ok(())
    } else {
        Err(ProjError::InvalidParameter(format!(
            "{name} must be within [-90, 90] degrees, got {v}"
        )))
    }
}

/// Standard-parallel pair for the conic projections: lower ≤ upper, same
/// hemisphere, magnitudes within [1, 89] degrees (excludes the exact
/// equator and poles).
pub(crate) fn check_standard_parallels(lower: f64, upper: f64) -> Result<(), ProjError> {
    check_finite("lower_parallel", lower)?;
    check_finite("upper_parallel", upper)?;
    if lower > upper {
        return Err(ProjError::InvalidParameter(format!(
            "lower parallel {lower} exceeds upper parallel {upper}"
        )));
    }
    for (name, v) in [("lower_parallel", lower), ("upper_parallel", upper)] {
        if !(1.0..=89.0).contains(&v.abs()) {
            return Err(ProjError::InvalidParameter(format!(
                "{name} magnitude must be within [1, 89] degrees, got {v}"
            )));
        }
    }
    if (lower > 0.0) != (upper > 0.0) {
        return Err(ProjError::InvalidParameter(format!(
            "standard parallels must share a hemisphere: {lower}, {upper}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const E_WGS84: f64 = 0.081_819_190_842_622;
    const ONE_ES_WGS84: f64 = 1.0 - E_WGS84 * E_WGS84;

    #[test]
    fn test_msfn_equator_and_pole() {
        assert_relative_eq!(msfn(0.0, 1.0, E_WGS84 * E_WGS84), 1.0);
        assert_relative_eq!(msfn(1.0, 0.0, E_WGS84 * E_WGS84), 0.0);
    }

    #[test]
    fn test_qsfn_odd_and_zero_at_equator() {
        assert_relative_eq!(qsfn(0.0, E_WGS84, ONE_ES_WGS84), 0.0);
        let q = qsfn(0.5, E_WGS84, ONE_ES_WGS84);
        assert_relative_eq!(qsfn(-0.5, E_WGS84, ONE_ES_WGS84), -q, epsilon = 1e-14);
    }

    #[test]
    fn test_qsfn_spherical_limit() {
        // Below the spherical-eccentricity cutoff, q = 2 sin φ
        assert_relative_eq!(qsfn(0.5, 0.0, 1.0), 1.0);
        assert_relative_eq!(qsfn(-1.0, 0.0, 1.0), -2.0);
    }

    #[test]
    fn test_tsfn_ssfn_at_equator() {
        assert_relative_eq!(tsfn(0.0, 0.0, E_WGS84), 1.0);
        assert_relative_eq!(ssfn(0.0, 0.0, E_WGS84), 1.0);
    }

    #[test]
    fn test_tsfn_ssfn_reciprocal_on_sphere() {
        // With e = 0, t(φ) = tan(π/4 - φ/2) and s(φ) = tan(π/4 + φ/2)
        let phi = 0.7_f64;
        assert_relative_eq!(
            tsfn(phi, phi.sin(), 0.0) * ssfn(phi, phi.sin(), 0.0),
            1.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_phi1_inverts_qsfn() {
        for lat_deg in [-80.0, -45.5, -10.0, 0.0, 23.0, 45.5, 60.0, 80.0_f64] {
            let phi = lat_deg.to_radians();
            let q = qsfn(phi.sin(), E_WGS84, ONE_ES_WGS84);
            let back = phi1(q, E_WGS84, ONE_ES_WGS84).unwrap();
            assert_relative_eq!(back, phi, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_phi1_rejects_pathological_q() {
        // |q| far beyond the authalic polar extreme has no real latitude
        assert!(phi1(1.0e6, E_WGS84, ONE_ES_WGS84).is_none());
        assert!(phi1(-1.0e6, E_WGS84, ONE_ES_WGS84).is_none());
    }

    #[test]
    fn test_phi_from_ts_inverts_tsfn() {
        for lat_deg in [-85.0, -45.0, 0.0, 30.0, 60.0, 85.0_f64] {
            let phi = lat_deg.to_radians();
            let ts = tsfn(phi, phi.sin(), E_WGS84);
            let back = phi_from_ts(ts, E_WGS84).unwrap();
            assert_relative_eq!(back, phi, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_phi_from_ts_spherical_immediate() {
        let phi: f64 = 0.5;
        let ts = (std::f64::consts::FRAC_PI_4 - 0.5 * phi).tan();
        assert_relative_eq!(phi_from_ts(ts, 0.0).unwrap(), phi, epsilon = 1e-12);
    }

    #[test]
    fn test_nudge_pulls_off_pole_and_antimeridian() {
        let (lam, phi) = nudge_geographic(PI, FRAC_PI_2);
        assert_relative_eq!(phi, FRAC_PI_2 - NUDGE);
        assert_relative_eq!(lam, PI - NUDGE);

        let (lam, phi) = nudge_geographic(-PI, -FRAC_PI_2);
        assert_relative_eq!(phi, -(FRAC_PI_2 - NUDGE));
        assert_relative_eq!(lam, -(PI - NUDGE));
    }

    #[test]
    fn test_nudge_leaves_interior_points_alone() {
        let (lam, phi) = nudge_geographic(1.0, 0.5);
        assert_relative_eq!(lam, 1.0);
        assert_relative_eq!(phi, 0.5);
        // Near but outside TOL of the singularity: untouched
        let (_, phi) = nudge_geographic(0.0, FRAC_PI_2 - 1.0e-8);
        assert_relative_eq!(phi, FRAC_PI_2 - 1.0e-8);
    }

    #[test]
    fn test_normalize_lon_deg() {
        assert_relative_eq!(normalize_lon_deg(190.0), -170.0);
        assert_relative_eq!(normalize_lon_deg(-190.0), 170.0);
        assert_relative_eq!(normalize_lon_deg(540.0), 180.0);
        assert_relative_eq!(normalize_lon_deg(-96.0), -96.0);
    }

    #[test]
    fn test_check_standard_parallels() {
        assert!(check_standard_parallels(29.5, 45.5).is_ok());
        assert!(check_standard_parallels(-60.0, -30.0).is_ok());
        assert!(check_standard_parallels(45.5, 29.5).is_err()); // order
        assert!(check_standard_parallels(-30.0, 30.0).is_err()); // hemispheres
        assert!(check_standard_parallels(0.5, 45.0).is_err()); // below 1°
        assert!(check_standard_parallels(30.0, 89.5).is_err()); // above 89°
        assert!(check_standard_parallels(f64::NAN, 45.0).is_err());
    }
}
