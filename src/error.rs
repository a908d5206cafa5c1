use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjError {
    /// A construction-time parameter violated its precondition. The
    /// validating constructors return this instead of a partially built
    /// projector.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The forward transform has no finite image for the given point
    /// (e.g. the antipode of an oblique stereographic center).
    #[error("Transform failed: {0}")]
    TransformFailed(String),

    /// The ellipsoidal inverse exhausted its iteration budget. Reported
    /// explicitly so it can never be mistaken for a point at the origin.
    #[error("Inverse latitude iteration did not converge")]
    NotConverged,
}
