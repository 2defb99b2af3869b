//! Onroad/offroad lifecycle gate.
//!
//! A two-state machine keyed on `scene.started`. The only transitions are
//! the two edges; steady-state ticks perform no reinitialization. The
//! configuration snapshotted on the rising edge is intentionally frozen for
//! the duration of the drive — a toggle flipped mid-drive takes effect on
//! the next onroad transition.

use tracing::info;

use crate::config::{FB_HEIGHT, FB_WIDTH, PARAM_REFRESH_TICKS};
use crate::params::ParamsStore;
use crate::projection::ViewTransform;
use crate::state::scene::DriveConfig;
use crate::state::{UiState, UiStatus};
use crate::vision::{CameraFeed, VisionStream};

/// Edge taken by the gate this tick, if any.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    Onroad,
    Offroad,
}

/// Detects lifecycle edges and runs their one-time side effects.
pub struct LifecycleGate {
    started_prev: bool,
}

impl LifecycleGate {
    pub const fn new() -> Self {
        Self { started_prev: false }
    }

    /// Run the gate for one tick. Returns the edge taken, if any.
    pub fn step<P, F>(
        &mut self,
        state: &mut UiState,
        params: &P,
        vision: &mut VisionStream<F>,
        frame: u64,
    ) -> Option<Transition>
    where
        P: ParamsStore + ?Sized,
        F: CameraFeed,
    {
        let started = state.scene.started;
        let transition = if started == self.started_prev {
            None
        } else if started {
            enter_onroad(state, params, vision, frame);
            Some(Transition::Onroad)
        } else {
            vision.teardown();
            info!("offroad transition");
            Some(Transition::Offroad)
        };
        self.started_prev = started;
        transition
    }
}

fn enter_onroad<P, F>(
    state: &mut UiState,
    params: &P,
    vision: &mut VisionStream<F>,
    frame: u64,
) where
    P: ParamsStore + ?Sized,
    F: CameraFeed,
{
    state.status = UiStatus::Disengaged;
    state.scene.started_frame = frame;

    // The wide toggle may have changed while offroad, so the intrinsics
    // and the screen mapping are rebuilt before any projection runs.
    state.wide_camera = params.get_bool("EnableWideCamera", false);
    state.view = ViewTransform::new(state.camera_kind(), FB_WIDTH, FB_HEIGHT);
    vision.select(state.camera_kind());

    state.scene.drive_cfg = DriveConfig::load(params);
    info!(frame, wide_camera = state.wide_camera, "onroad transition");
}

impl Default for LifecycleGate {
    fn default() -> Self { Self::new() }
}

/// Fixed-cadence refresh of the cheap display params (every 5 seconds).
pub fn refresh_cadenced_params<P: ParamsStore + ?Sized>(
    state: &mut UiState,
    params: &P,
    frame: u64,
) {
    if frame % PARAM_REFRESH_TICKS == 0 {
        state.scene.is_metric = params.get_bool("IsMetric", true);
        state.scene.driver_view_enabled = params.get_bool("DriverViewEnabled", false);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MemParams;
    use crate::projection::CameraKind;
    use crate::vision::CameraFrame;
    use std::time::Duration;

    #[derive(Default)]
    struct NullFeed;

    impl CameraFeed for NullFeed {
        fn connect(&mut self) -> bool { true }
        fn recv(&mut self, _timeout: Duration) -> Option<CameraFrame> { None }
        fn disconnect(&mut self) {}
    }

    fn harness() -> (UiState, MemParams, VisionStream<NullFeed>, LifecycleGate) {
        (
            UiState::new(),
            MemParams::new(),
            VisionStream::new(NullFeed::default(), NullFeed::default()),
            LifecycleGate::new(),
        )
    }

    #[test]
    fn test_reinit_fires_exactly_once_per_rising_edge() {
        let (mut state, mut params, mut vision, mut gate) = harness();
        params.put("UiBrightness", "40");

        let mut transitions = Vec::new();
        for started in [false, false, true, true, true] {
            state.scene.started = started;
            transitions.push(gate.step(&mut state, &params, &mut vision, 10));
        }
        let onroad_edges = transitions
            .iter()
            .filter(|t| **t == Some(Transition::Onroad))
            .count();
        assert_eq!(onroad_edges, 1, "reinit must fire exactly once");
        assert_eq!(transitions[2], Some(Transition::Onroad));
        assert_eq!(state.scene.drive_cfg.brightness, 40);
    }

    #[test]
    fn test_config_frozen_between_edges() {
        let (mut state, mut params, mut vision, mut gate) = harness();
        params.put("UiBrightness", "40");

        state.scene.started = true;
        gate.step(&mut state, &params, &mut vision, 0);
        assert_eq!(state.scene.drive_cfg.brightness, 40);

        // A mid-drive change must not be picked up...
        params.put("UiBrightness", "90");
        gate.step(&mut state, &params, &mut vision, 1);
        assert_eq!(state.scene.drive_cfg.brightness, 40);

        // ...until the next drive starts.
        state.scene.started = false;
        gate.step(&mut state, &params, &mut vision, 2);
        state.scene.started = true;
        gate.step(&mut state, &params, &mut vision, 3);
        assert_eq!(state.scene.drive_cfg.brightness, 90);
    }

    #[test]
    fn test_onroad_edge_resets_status_and_frame() {
        let (mut state, params, mut vision, mut gate) = harness();
        state.status = UiStatus::Alert;
        state.scene.started = true;
        gate.step(&mut state, &params, &mut vision, 1234);
        assert_eq!(state.status, UiStatus::Disengaged);
        assert_eq!(state.scene.started_frame, 1234);
    }

    #[test]
    fn test_wide_toggle_selects_stream_and_view() {
        let (mut state, mut params, mut vision, mut gate) = harness();
        params.put("EnableWideCamera", "1");
        state.scene.started = true;
        gate.step(&mut state, &params, &mut vision, 0);
        assert!(state.wide_camera);
        assert_eq!(vision.active(), CameraKind::Wide);
        assert_eq!(
            state.view,
            ViewTransform::new(CameraKind::Wide, FB_WIDTH, FB_HEIGHT)
        );
    }

    #[test]
    fn test_falling_edge_tears_down_stream() {
        let (mut state, params, mut vision, mut gate) = harness();
        state.scene.started = true;
        gate.step(&mut state, &params, &mut vision, 0);
        let mut scene = state.scene.clone();
        vision.poll(&mut scene); // connect

        state.scene.started = false;
        let t = gate.step(&mut state, &params, &mut vision, 1);
        assert_eq!(t, Some(Transition::Offroad));
        assert!(!vision.connected());
    }

    #[test]
    fn test_cadenced_param_refresh() {
        let (mut state, mut params, _, _) = harness();
        params.put("IsMetric", "0");

        refresh_cadenced_params(&mut state, &params, 1);
        assert!(!state.scene.is_metric, "default holds off-cadence");

        refresh_cadenced_params(&mut state, &params, PARAM_REFRESH_TICKS);
        assert!(!state.scene.is_metric);

        params.put("IsMetric", "1");
        refresh_cadenced_params(&mut state, &params, 7);
        assert!(!state.scene.is_metric, "off-cadence tick must not read");
        refresh_cadenced_params(&mut state, &params, 2 * PARAM_REFRESH_TICKS);
        assert!(state.scene.is_metric);
    }
}
