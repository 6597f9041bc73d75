//! Crate error type.

use thiserror::Error;

/// The unified error type for the `price_index` crate.
///
/// Noisy source data never ends up here: unparseable days, bad prices and
/// missing weights degrade to *unknown* values instead. These variants cover
/// caller mistakes that make an analysis request meaningless.
#[derive(Debug, Error)]
pub enum Error {
    /// Exponential smoothing factor outside `(0, 1]`.
    #[error("smoothing factor must be in (0, 1], got {0}")]
    InvalidSmoothing(f64),

    /// A trailing window was configured with zero days.
    #[error("{0} window must be at least one day")]
    ZeroWindow(&'static str),
}

/// Result alias used by the analysis entry points.
pub type Result<T> = std::result::Result<T, Error>;
