//! Caller capability checks for organizer-only operations.
//!
//! # Responsibility
//! - Decide whether a caller id may run checker operations.
//!
//! # Invariants
//! - The predicate is injected into `api::CompetitionApi`; no global list.
//! - Task toggles are open to every caller and never consult it.

use log::warn;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// External caller identifier (chat user id or similar).
pub type CallerId = i64;

/// Capability predicate for checker-only operations.
pub trait CapabilityCheck {
    fn is_checker(&self, caller: CallerId) -> bool;
}

/// Static allow-list of checker ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerAllowList {
    ids: BTreeSet<CallerId>,
}

impl CheckerAllowList {
    pub fn new(ids: impl IntoIterator<Item = CallerId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl CapabilityCheck for CheckerAllowList {
    fn is_checker(&self, caller: CallerId) -> bool {
        self.ids.contains(&caller)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    NotChecker { caller: CallerId, action: &'static str },
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotChecker { caller, action } => {
                write!(f, "caller {caller} is not a checker and cannot {action}")
            }
        }
    }
}

impl Error for AccessError {}

/// Fails with `AccessError::NotChecker` unless `caller` passes `check`.
///
/// # Side effects
/// - Emits an `access_denied` warning on rejection.
pub fn require_checker(
    check: &dyn CapabilityCheck,
    caller: CallerId,
    action: &'static str,
) -> Result<(), AccessError> {
    if check.is_checker(caller) {
        return Ok(());
    }
    warn!(
        "event=access_denied module=access status=rejected caller={} action={}",
        caller, action
    );
    Err(AccessError::NotChecker { caller, action })
}
