//! Scriptable AWDL control used by the IPC and observer tests.

use super::{AwdlControl, PlatformError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct MockState {
    up: bool,
    applied: Vec<bool>,
}

pub struct MockAwdlControl {
    present: AtomicBool,
    fail_sets: AtomicBool,
    inner: Mutex<MockState>,
}

impl MockAwdlControl {
    pub fn new(up: bool) -> Self {
        Self {
            present: AtomicBool::new(true),
            fail_sets: AtomicBool::new(false),
            inner: Mutex::new(MockState {
                up,
                applied: Vec::new(),
            }),
        }
    }

    /// Simulate the interface appearing or disappearing.
    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    /// Make subsequent `set_awdl` calls fail.
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Change the observed state without recording an apply, as if some
    /// other process had reconfigured the interface.
    pub fn force_state(&self, up: bool) {
        self.inner.lock().unwrap().up = up;
    }

    /// Every value successfully applied, in order.
    pub fn applied(&self) -> Vec<bool> {
        self.inner.lock().unwrap().applied.clone()
    }

    pub fn state(&self) -> bool {
        self.inner.lock().unwrap().up
    }
}

impl AwdlControl for MockAwdlControl {
    fn set_awdl(&self, up: bool) -> Result<(), PlatformError> {
        if !self.present.load(Ordering::SeqCst) {
            return Err(PlatformError::InterfaceMissing);
        }
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(PlatformError::SetError("injected failure".to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.up = up;
        inner.applied.push(up);
        Ok(())
    }

    fn is_awdl_up(&self) -> Result<bool, PlatformError> {
        if !self.present.load(Ordering::SeqCst) {
            return Err(PlatformError::InterfaceMissing);
        }
        Ok(self.inner.lock().unwrap().up)
    }

    fn has_awdl(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }
}
