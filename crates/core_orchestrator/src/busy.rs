use std::sync::atomic::{AtomicBool, Ordering};

use core_types::Control;
use tracing::debug;

use crate::InteractionController;

/// Advisory busy marker for one action control. Setting it twice is allowed;
/// re-entry is only prevented by the disabled control on the UI path.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    /// Returns whether the flag was already set.
    pub(crate) fn set(&self) -> bool {
        self.busy.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_set(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Clears the busy flag of `control` and restores its control state on drop,
/// whichever way the owning flow exits.
pub(crate) struct BusyGuard<'a> {
    controller: &'a InteractionController,
    control: Control,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(controller: &'a InteractionController, control: Control) -> Self {
        if controller.busy_flag(control).set() {
            debug!(?control, "flow re-entered while busy");
        }
        controller.sync_control(control);
        Self {
            controller,
            control,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.controller.busy_flag(self.control).clear();
        self.controller.sync_control(self.control);
    }
}
