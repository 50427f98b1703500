use std::sync::atomic::{AtomicBool, Ordering};

use facemark_types::{FacemarkError, Result};

/// A control that stays disabled while its action runs. A second activation
/// during that time is refused instead of starting a parallel run.
#[derive(Debug)]
pub struct Trigger {
    label: &'static str,
    busy: AtomicBool,
}

impl Trigger {
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            busy: AtomicBool::new(false),
        }
    }

    pub fn try_acquire(&self) -> Result<TriggerGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| TriggerGuard { trigger: self })
            .map_err(|_| FacemarkError::Busy(self.label))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Re-enables the trigger when dropped, on success and failure alike.
#[must_use]
pub struct TriggerGuard<'a> {
    trigger: &'a Trigger,
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.trigger.busy.store(false, Ordering::Release);
    }
}
