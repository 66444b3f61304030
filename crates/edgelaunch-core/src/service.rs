//! Long-lived owner of the controller and its broadcast receivers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use edgelaunch_types::{Command, LifecycleState, SystemBroadcast};
use tracing::{debug, info};

use crate::Result;
use crate::controller::OverlayController;
use crate::events::{EventBus, OrientationAdapter, ScreenStateAdapter, Subscription};
use crate::host::Host;

pub struct OverlayService {
    host: Host,
    controller: Arc<OverlayController>,
    bus: EventBus,
    receivers: Mutex<Vec<Subscription>>,
}

impl OverlayService {
    #[must_use]
    pub fn new(host: Host, bus: EventBus) -> Self {
        Self {
            controller: Arc::new(OverlayController::new(host.clone())),
            host,
            bus,
            receivers: Mutex::new(Vec::new()),
        }
    }

    fn receivers(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.receivers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn controller(&self) -> &Arc<OverlayController> {
        &self.controller
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe the screen and orientation adapters. Calling this again
    /// replaces the existing receivers.
    pub fn register_receivers(&self) {
        let orientation = self.host.windows.display().orientation();
        let screen = ScreenStateAdapter::new(Arc::clone(&self.controller)).subscribe(&self.bus);
        let config = OrientationAdapter::new(Arc::clone(&self.controller), orientation)
            .subscribe(&self.bus);

        let old = std::mem::replace(&mut *self.receivers(), vec![screen, config]);
        debug!("Registered broadcast receivers (replaced {})", old.len());
    }

    pub fn unregister_receivers(&self) {
        let old = std::mem::take(&mut *self.receivers());
        if !old.is_empty() {
            debug!("Unregistered {} broadcast receivers", old.len());
        }
    }

    /// Start the service: receivers up, then the first launch.
    ///
    /// # Errors
    ///
    /// Returns the error of the initial launch. Receivers stay registered so
    /// later broadcasts and commands can recover.
    pub fn start(&self) -> Result<LifecycleState> {
        self.register_receivers();
        self.controller.launch()
    }

    /// # Errors
    ///
    /// Returns the error of the controller trigger.
    pub fn handle_command(&self, command: Command) -> Result<LifecycleState> {
        info!("Command {command}");
        self.controller.dispatch(command)
    }

    pub fn broadcast(&self, broadcast: &SystemBroadcast) -> usize {
        self.bus.publish(broadcast)
    }

    /// Drop every receiver and remove both windows.
    pub fn shutdown(&self) {
        self.unregister_receivers();
        self.controller.shutdown();
    }
}
