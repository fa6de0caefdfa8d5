//! Doctor-side record of whether the patient is burning CPU.
//!
//! Start and stop are forwarded to the patient under one mutex, so only
//! one control call is in flight at a time. The recorded state flips only
//! after the remote call succeeds; a failed call leaves it unchanged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use triage_state::LoadState;

use crate::error::ControlError;
use crate::source::LoadControl;

pub struct LoadSwitch {
    control: Arc<dyn LoadControl>,
    lock: Mutex<()>,
    active: AtomicBool,
}

impl LoadSwitch {
    pub fn new(control: Arc<dyn LoadControl>) -> Self {
        Self {
            control,
            lock: Mutex::new(()),
            active: AtomicBool::new(false),
        }
    }

    pub async fn start(&self) -> Result<(), ControlError> {
        let _guard = self.lock.lock().await;
        self.control.start().await.inspect_err(|e| {
            warn!(error = %e, "failed to start patient load");
        })?;
        self.active.store(true, Ordering::Release);
        info!("patient load started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), ControlError> {
        let _guard = self.lock.lock().await;
        self.control.stop().await.inspect_err(|e| {
            warn!(error = %e, "failed to stop patient load");
        })?;
        self.active.store(false, Ordering::Release);
        info!("patient load stopped");
        Ok(())
    }
}

impl LoadState for LoadSwitch {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
