use dashmap::DashSet;
use tracing::trace;

use crate::ActionTarget;

/// Set of targets with a write currently outstanding.
#[derive(Default)]
pub(crate) struct InFlightActions {
    targets: DashSet<ActionTarget>,
}

impl InFlightActions {
    /// Atomically checks and claims `target`. Returns `None` when another
    /// action already holds it.
    pub(crate) fn try_acquire(
        &self,
        target: ActionTarget,
    ) -> Option<ActionGuard<'_>> {
        if !self.targets.insert(target.clone()) {
            return None;
        }
        trace!(%target, "action guard acquired");
        Some(ActionGuard {
            targets: &self.targets,
            target,
        })
    }

    pub(crate) fn contains(
        &self,
        target: &ActionTarget,
    ) -> bool {
        self.targets.contains(target)
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }
}

/// Releases its target when dropped, including when the owning future is
/// cancelled mid-write.
pub(crate) struct ActionGuard<'a> {
    targets: &'a DashSet<ActionTarget>,
    target: ActionTarget,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        let target = &self.target;
        self.targets.remove(target);
        trace!(%target, "action guard released");
    }
}
