//! Scheduling policies for [`PolicyRwLock`](super::PolicyRwLock).

use core::fmt;
use core::num::NonZeroUsize;
use core::str::FromStr;

use crate::errors::{SyncError, SyncResult};

/// Which class of waiters a [`PolicyRwLock`](super::PolicyRwLock) favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Readers are admitted whenever no writer holds the lock. Writers may
    /// starve under sustained read load.
    Readers,

    /// A waiting writer blocks every new reader. Readers may starve while
    /// writers keep arriving.
    Writers,

    /// When a writer releases the lock while another writer waits, at most
    /// `width` readers are admitted before that writer gets its turn.
    NWay { width: NonZeroUsize },
}

/// The policy tag without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Readers,
    Writers,
    NWay,
}

impl Policy {
    /// Builds an [`Policy::NWay`] policy with batch width `width`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidArgument`] when `width` is 0, since a
    /// zero-width batch would never admit a reader nor hand off to the writer.
    pub fn n_way(width: usize) -> SyncResult<Self> {
        NonZeroUsize::new(width)
            .map(|width| Policy::NWay { width })
            .ok_or(SyncError::InvalidArgument("n-way batch width must be at least 1"))
    }

    /// Builds a policy from a tag and a width; `width` is ignored unless
    /// `kind` is [`PolicyKind::NWay`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidArgument`] for an `NWay` width of 0.
    pub fn from_parts(kind: PolicyKind, width: usize) -> SyncResult<Self> {
        match kind {
            PolicyKind::Readers => Ok(Policy::Readers),
            PolicyKind::Writers => Ok(Policy::Writers),
            PolicyKind::NWay => Policy::n_way(width),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PolicyKind {
        match self {
            Policy::Readers => PolicyKind::Readers,
            Policy::Writers => PolicyKind::Writers,
            Policy::NWay { .. } => PolicyKind::NWay,
        }
    }

    /// Batch width for [`Policy::NWay`], `None` otherwise.
    #[must_use]
    pub const fn width(&self) -> Option<NonZeroUsize> {
        match self {
            Policy::NWay { width } => Some(*width),
            _ => None,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Readers => write!(f, "readers"),
            Policy::Writers => write!(f, "writers"),
            Policy::NWay { width } => write!(f, "n_way:{width}"),
        }
    }
}

/// Parses `readers`, `writers` and `n_way:<width>` (also `nway:<width>`),
/// case-insensitively.
impl FromStr for Policy {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.split_once(':') {
            Some(("n_way" | "nway", width)) => Policy::n_way(width.trim().parse::<usize>()?),
            None if normalized == "readers" => Ok(Policy::Readers),
            None if normalized == "writers" => Ok(Policy::Writers),
            _ => Err(SyncError::UnknownPolicy(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: A zero-width batch would deadlock the handoff
    /// WHAT: `n_way(0)` must be rejected while positive widths are accepted
    #[test]
    fn test_n_way_requires_positive_width() {
        assert!(Policy::n_way(0).unwrap_err().is_invalid_argument());
        assert_eq!(Policy::n_way(3).unwrap().width().map(NonZeroUsize::get), Some(3));
    }

    /// WHY: The width only matters for the n-way policy
    /// WHAT: `from_parts` ignores `width` for Readers and Writers, even when 0
    #[test]
    fn test_from_parts_ignores_width_for_priority_policies() {
        assert_eq!(Policy::from_parts(PolicyKind::Readers, 0).unwrap(), Policy::Readers);
        assert_eq!(Policy::from_parts(PolicyKind::Writers, 17).unwrap(), Policy::Writers);
        assert_eq!(Policy::from_parts(PolicyKind::NWay, 2).unwrap().kind(), PolicyKind::NWay);
        assert!(Policy::from_parts(PolicyKind::NWay, 0).is_err());
    }

    #[test]
    fn test_parse_and_display_agree() {
        for policy in [Policy::Readers, Policy::Writers, Policy::n_way(4).unwrap()] {
            assert_eq!(policy.to_string().parse::<Policy>().unwrap(), policy);
        }
        assert_eq!(" NWay:2 ".parse::<Policy>().unwrap(), Policy::n_way(2).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("fifo".parse::<Policy>(), Err(SyncError::UnknownPolicy(_))));
        assert!(matches!("n_way:lots".parse::<Policy>(), Err(SyncError::InvalidWidth(_))));
        assert!(matches!("n_way:0".parse::<Policy>(), Err(SyncError::InvalidArgument(_))));
        assert!(matches!("readers:2".parse::<Policy>(), Err(SyncError::UnknownPolicy(_))));
    }
}
