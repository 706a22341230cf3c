use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MonitorError;
use crate::target::{Method, Slot, Target};

/// One method replaced by an installation.
pub(crate) struct Replaced {
    pub name: String,
    pub original: Slot,
    pub wrapper: Method,
}

impl fmt::Debug for Replaced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replaced")
            .field("name", &self.name)
            .field("original", &self.original)
            .finish_non_exhaustive()
    }
}

/// Record of one `apply_in_place`: the slots it replaced, so they can be put back.
#[derive(Debug)]
pub struct Installation {
    id: Uuid,
    target: String,
    replaced: Vec<Replaced>,
}

impl Installation {
    pub(crate) fn new(target: &str, replaced: Vec<Replaced>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.to_string(),
            replaced,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Names of the methods this installation wrapped.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.replaced.iter().map(|r| r.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty()
    }

    /// Restore the original slots.
    ///
    /// Every slot must still hold the wrapper this installation put there,
    /// otherwise nothing is restored. That is the case for a target that was
    /// never instrumented by this installation, a later layer still sitting on
    /// top, or an installation already reverted.
    pub fn revert<T: Target>(&self, target: &mut T) -> Result<(), MonitorError> {
        if self.replaced.is_empty() {
            return Ok(());
        }

        let owner = target.owner();
        let stale = self.replaced.iter().find(|r| match owner.own(&r.name) {
            Some(Slot::Method(current)) => !Arc::ptr_eq(current, &r.wrapper),
            _ => true,
        });
        if let Some(stale) = stale {
            warn!(
                installation = %self.id,
                subject = %target.label(),
                method = %stale.name,
                "slot does not hold this installation's wrapper, revert refused"
            );
            return Err(MonitorError::NotInstalled {
                name: stale.name.clone(),
                target: target.label().to_string(),
            });
        }

        let owner = target.owner_mut();
        for r in self.replaced.iter().rev() {
            owner.define(&r.name, r.original.clone());
        }
        debug!(installation = %self.id, subject = %self.target, "instrumentation reverted");
        Ok(())
    }
}
