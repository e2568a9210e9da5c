use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The errors surfaced by this crate.
///
/// Arithmetic, linear algebra and serialization fail locally by returning
/// one of these to the caller. The simulator catches everything at the top
/// of a protocol run: [`Error::Cancelled`] becomes a CANCELLED event in the
/// party's trace, anything else becomes a KILLED event carrying the error
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The caller violated a contract, e.g. shares for zero parties or
    /// division by the zero polynomial. The payload says which.
    InvalidInput(&'static str),
    /// Data failed a cryptographic consistency check, e.g. Shamir
    /// reconstruction saw an inconsistent share.
    IntegrityFailure(&'static str),
    /// Affine coordinates that do not satisfy the curve equation.
    NotOnCurve,
    /// The operation does not apply to the given value, e.g. inverting a
    /// non-square matrix.
    Unsupported(&'static str),
    /// The current party cancelled itself. Unwinds the protocol.
    Cancelled,
    /// Serialized input is truncated or carries an impossible length.
    Malformed(&'static str),
}

/// Result alias with the error fixed to [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::IntegrityFailure(what) => write!(f, "integrity failure: {what}"),
            Self::NotOnCurve => write!(f, "provided (x, y) not on curve"),
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Malformed(what) => write!(f, "malformed data: {what}"),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            Error::InvalidInput("threshold cannot be 0").to_string(),
            "invalid input: threshold cannot be 0"
        );
        assert_eq!(Error::Cancelled.to_string(), "cancelled");
        assert_eq!(Error::NotOnCurve.to_string(), "provided (x, y) not on curve");
    }
}
