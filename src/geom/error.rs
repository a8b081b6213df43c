/// Errors raised by the geometry engine.
///
/// Every operation validates its inputs before producing positions, so an
/// error always means no vertex was touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeomError {
    /// A parameter is out of range or names an unknown enum value.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// An operation needs a captured baseline and none exists yet.
    #[error("no baseline snapshot captured; load a mesh first")]
    MissingBaseline,

    /// The mesh itself cannot be used (empty, NaN/Inf, bad indices, ...).
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

impl GeomError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type GeomResult<T> = Result<T, GeomError>;

/// Reject non-finite or non-positive values for a strictly positive parameter.
pub(crate) fn require_positive(name: &'static str, value: f64) -> GeomResult<()> {
    if !value.is_finite() {
        return Err(GeomError::invalid(name, format!("must be finite, got {value}")));
    }
    if value <= 0.0 {
        return Err(GeomError::invalid(name, format!("must be > 0, got {value}")));
    }
    Ok(())
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> GeomResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeomError::invalid(name, format!("must be finite, got {value}")))
    }
}
