// region -- SyncError

use core::num::ParseIntError;

pub type SyncResult<T> = core::result::Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum SyncError {
    /// A constructor argument was outside its valid range.
    #[from(ignore)]
    InvalidArgument(&'static str),

    /// A policy name did not match any known scheduling policy.
    #[from(ignore)]
    UnknownPolicy(String),

    /// The batch width of an `n_way:<width>` policy was not a number.
    InvalidWidth(ParseIntError),
}

// --- region: Custom methods

impl SyncError {
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SyncError::InvalidArgument(_))
    }
}

// --- end region: Custom methods

// --- region: Error & Display boilerplate

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::InvalidWidth(err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for SyncError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SyncError::InvalidArgument(reason) => write!(f, "SyncError::InvalidArgument({reason})"),
            SyncError::UnknownPolicy(name) => write!(f, "SyncError::UnknownPolicy({name})"),
            SyncError::InvalidWidth(err) => write!(f, "SyncError::InvalidWidth({err})"),
        }
    }
}

// --- end region: Error & Display boilerplate

// --- end region: SyncError

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: Width parse failures should convert through `?` without mapping
    /// WHAT: `From<ParseIntError>` must produce `InvalidWidth` and expose the source
    #[test]
    fn test_parse_int_error_converts_into_invalid_width() {
        fn parse(raw: &str) -> SyncResult<usize> {
            Ok(raw.parse::<usize>()?)
        }

        let err = parse("three").unwrap_err();
        assert!(matches!(err, SyncError::InvalidWidth(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_display_names_variant() {
        let err = SyncError::InvalidArgument("capacity must be at least 1");
        assert_eq!(
            err.to_string(),
            "SyncError::InvalidArgument(capacity must be at least 1)"
        );
        assert!(err.is_invalid_argument());
    }
}
