//! The tick loop.
//!
//! One `tick` runs the fixed sequence: parameter refresh, message poll,
//! scene reduce, status classify, lifecycle gate, vision pull, device
//! update — strictly in that order, on one thread. Rendering reads the
//! resulting state between ticks; it never runs concurrently with one.

use crate::device::{Device, DisplayHardware};
use crate::lifecycle::{LifecycleGate, Transition, refresh_cadenced_params};
use crate::params::ParamsStore;
use crate::state::{UiState, reducer, status};
use crate::telemetry::{TelemetryBus, Topic};
use crate::vision::{CameraFeed, VisionStream};

/// Owns every component of the core and drives them once per tick.
pub struct App<B, P, F, H> {
    bus: B,
    params: P,
    vision: VisionStream<F>,
    device: Device<H>,
    gate: LifecycleGate,
    pub state: UiState,
}

impl<B, P, F, H> App<B, P, F, H>
where
    B: TelemetryBus,
    P: ParamsStore,
    F: CameraFeed,
    H: DisplayHardware,
{
    pub fn new(bus: B, params: P, vision: VisionStream<F>, device: Device<H>) -> Self {
        Self {
            bus,
            params,
            vision,
            device,
            gate: LifecycleGate::new(),
            state: UiState::new(),
        }
    }

    /// Run one tick. Returns the lifecycle edge taken, if any.
    pub fn tick(&mut self) -> Option<Transition> {
        refresh_cadenced_params(&mut self.state, &self.params, self.bus.frame());
        self.bus.poll();
        reducer::reduce(&mut self.state, &self.bus);
        status::update_status(&mut self.state, self.bus.updated(Topic::ControlsState));
        let transition =
            self.gate
                .step(&mut self.state, &self.params, &mut self.vision, self.bus.frame());
        self.vision.poll(&mut self.state.scene);
        self.device.update(&self.state);
        transition
    }

    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[inline]
    pub fn vision(&self) -> &VisionStream<F> {
        &self.vision
    }

    #[inline]
    pub fn device(&self) -> &Device<H> {
        &self.device
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
