//! Forward/inverse map projections for spherical and ellipsoidal earth
//! models: Albers (equal-area conic), Stereographic (azimuthal), and
//! Lambert Conformal Conic.
//!
//! Geographic coordinates cross the API in degrees; projected coordinates
//! are metres. Each projector is built by a validating constructor, owns
//! its precomputed derived terms by value, and recomputes them only when
//! the ellipsoid changes — false-offset mutation is a pure additive shift.

pub mod albers;
pub mod common;
pub mod ellipsoid;
pub mod error;
pub mod lambert;
pub mod stereographic;

pub use crate::albers::Albers;
pub use crate::ellipsoid::Ellipsoid;
pub use crate::error::ProjError;
pub use crate::lambert::LambertConformalConic;
pub use crate::stereographic::Stereographic;

/// Trait for map projections supporting forward and inverse transforms.
pub trait Projection: Send + Sync {
    /// Forward: (lon_deg, lat_deg) -> (easting, northing) in metres.
    fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError>;

    /// Inverse: (easting, northing) -> (lon_deg, lat_deg).
    fn unproject(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError>;

    /// Batch forward transform (default: loop).
    fn project_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        for c in coords.iter_mut() {
            *c = self.project(c.0, c.1)?;
        }
        Ok(())
    }

    /// Batch inverse transform.
    fn unproject_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        for c in coords.iter_mut() {
            *c = self.unproject(c.0, c.1)?;
        }
        Ok(())
    }

    fn ellipsoid(&self) -> &Ellipsoid;

    /// Central meridian in degrees.
    fn central_longitude(&self) -> f64;

    /// Latitude of origin in degrees.
    fn central_latitude(&self) -> f64;

    fn false_easting(&self) -> f64;

    fn false_northing(&self) -> f64;

    /// Short identifier of the projection family.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::ellipsoid::WGS84;

    fn all_variants() -> Vec<Box<dyn Projection>> {
        vec![
            Box::new(Albers::new(WGS84, -96.0, 23.0, 29.5, 45.5, 0.0, 0.0).unwrap()),
            Box::new(Stereographic::new(WGS84, -45.0, 90.0, 70.0, 0.0, 0.0).unwrap()),
            Box::new(
                LambertConformalConic::new(WGS84, -96.0, 39.0, 33.0, 45.0, 0.0, 0.0).unwrap(),
            ),
        ]
    }

    #[test]
    fn test_trait_object_roundtrip() {
        for proj in all_variants() {
            let (lon, lat) = match proj.name() {
                "stereographic" => (-60.0, 75.0),
                _ => (-90.0, 38.0),
            };
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert_abs_diff_eq!(lon2, lon, epsilon = 1e-6);
            assert_abs_diff_eq!(lat2, lat, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_center_fixpoint_through_trait() {
        for proj in all_variants() {
            let (x, y) = proj
                .project(proj.central_longitude(), proj.central_latitude())
                .unwrap();
            // Polar-centered variants land within the deliberate pole-nudge
            // radius of the origin; the rest hit it to rounding error.
            let tol = if proj.central_latitude().abs() > 89.0 {
                common::NUDGE * proj.ellipsoid().a * 2.0
            } else {
                1e-6
            };
            assert_abs_diff_eq!(x, proj.false_easting(), epsilon = tol);
            assert_abs_diff_eq!(y, proj.false_northing(), epsilon = tol);
        }
    }

    #[test]
    fn test_batch_matches_pointwise() {
        for proj in all_variants() {
            let pts: &[(f64, f64)] = match proj.name() {
                "stereographic" => &[(-45.0, 75.0), (0.0, 80.0), (-90.0, 70.0)],
                _ => &[(-96.0, 39.0), (-90.0, 35.0), (-104.0, 42.0)],
            };
            let mut batch: Vec<(f64, f64)> = pts.to_vec();
            proj.project_batch(&mut batch).unwrap();
            for (i, &(lon, lat)) in pts.iter().enumerate() {
                let (x, y) = proj.project(lon, lat).unwrap();
                assert_abs_diff_eq!(batch[i].0, x);
                assert_abs_diff_eq!(batch[i].1, y);
            }
            proj.unproject_batch(&mut batch).unwrap();
            for (i, &(lon, lat)) in pts.iter().enumerate() {
                assert_abs_diff_eq!(batch[i].0, lon, epsilon = 1e-6);
                assert_abs_diff_eq!(batch[i].1, lat, epsilon = 1e-6);
            }
        }
    }
}
