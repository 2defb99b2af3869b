//! UI status classification.
//!
//! The status drives the border color and sidebar accents. It is derived
//! from the control-state alert flag and a few scene booleans with a fixed
//! precedence, and it is only recomputed on ticks where control-state
//! actually updated — otherwise the previous value carries forward.
//! Downstream rendering relies on that last-known-value behavior.

use crate::state::UiState;
use crate::telemetry::AlertStatus;

/// Enumerated UI status, ordered by visual priority: comparing two statuses
/// with `<`/`>` compares their precedence.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum UiStatus {
    Disengaged,
    Engaged,
    Cruising,
    Braking,
    Warning,
    Alert,
}

/// Classify the scene into a status. Pure function of the current scene.
pub fn classify(state: &UiState) -> UiStatus {
    let scene = &state.scene;
    match scene.controls.alert_status {
        AlertStatus::Critical => UiStatus::Alert,
        AlertStatus::UserPrompt => UiStatus::Warning,
        AlertStatus::Normal => {
            if scene.vehicle.brake_pressed {
                UiStatus::Braking
            } else if scene.vehicle.cruise_acc_active {
                UiStatus::Cruising
            } else if scene.controls.enabled {
                UiStatus::Engaged
            } else {
                UiStatus::Disengaged
            }
        }
    }
}

/// Recompute the status when onroad and control-state updated this tick;
/// carry the previous value forward otherwise.
pub fn update_status(state: &mut UiState, controls_updated: bool) {
    if state.scene.started && controls_updated {
        state.status = classify(state);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
