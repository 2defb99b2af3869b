//! Typed per-topic message snapshots.
//!
//! Each struct mirrors the latest value of one pub/sub topic. Fields are
//! assumed validated upstream; the reducer copies them wholesale and never
//! inspects them for errors.

use crate::config::TRAJECTORY_SIZE;

// =============================================================================
// Vehicle Kinematics
// =============================================================================

/// Transmission gear selector position.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Drive,
    Neutral,
    Reverse,
    Sport,
    Low,
    Brake,
}

/// Tire pressures for all four corners, in psi.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct TirePressure {
    pub front_left: f32,
    pub front_right: f32,
    pub rear_left: f32,
    pub rear_right: f32,
}

/// Latest vehicle kinematics snapshot.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CarStateMsg {
    /// Ego speed in m/s.
    pub v_ego: f32,
    /// Steering wheel angle in degrees.
    pub steering_angle_deg: f32,
    pub gear: GearShifter,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub brake_pressed: bool,
    pub brake_lights: bool,
    pub stand_still: bool,
    /// Cruise set speed as shown on the cluster.
    pub cruise_set_speed: f32,
    /// Whether adaptive cruise is actively controlling.
    pub cruise_acc_active: bool,
    /// Selected following-gap setting.
    pub cruise_gap: f32,
    pub tpms: TirePressure,
}

// =============================================================================
// Longitudinal / Lateral Control State
// =============================================================================

/// Alert severity reported by the controls process.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum AlertStatus {
    #[default]
    Normal,
    UserPrompt,
    Critical,
}

/// Active lateral-control method with its per-method state.
///
/// Exactly one variant is valid per tick; the controls process reports the
/// selector and the matching state in the same snapshot.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LateralControlState {
    /// Proportional-integral controller.
    Pid { output: f32 },
    /// Incremental nonlinear dynamic inversion (model-based).
    Indi { output: f32 },
    /// Linear-quadratic regulator (state feedback).
    Lqr { output: f32 },
}

impl LateralControlState {
    /// Control output of whichever method is active.
    #[inline]
    pub const fn output(&self) -> f32 {
        match self {
            Self::Pid { output } | Self::Indi { output } | Self::Lqr { output } => *output,
        }
    }
}

impl Default for LateralControlState {
    fn default() -> Self { Self::Pid { output: 0.0 } }
}

/// Latest longitudinal/lateral control snapshot.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct ControlsStateMsg {
    pub enabled: bool,
    pub engageable: bool,
    pub alert_status: AlertStatus,
    pub alert_text_1: String,
    pub alert_text_2: String,
    pub lateral: LateralControlState,
    pub steer_ratio: f32,
    /// Speed-camera advisory limit, 0 when none ahead.
    pub speed_camera_limit: f32,
    pub speed_camera_dist: f32,
}

// =============================================================================
// Model Inference Output
// =============================================================================

/// One model line: `TRAJECTORY_SIZE` samples in calibrated vehicle space.
/// `x` is longitudinal (forward), `y` lateral (left negative), `z` up.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LineData {
    pub x: [f32; TRAJECTORY_SIZE],
    pub y: [f32; TRAJECTORY_SIZE],
    pub z: [f32; TRAJECTORY_SIZE],
}

impl Default for LineData {
    fn default() -> Self {
        Self {
            x: [0.0; TRAJECTORY_SIZE],
            y: [0.0; TRAJECTORY_SIZE],
            z: [0.0; TRAJECTORY_SIZE],
        }
    }
}

/// One lead-vehicle candidate.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct LeadMsg {
    /// Longitudinal distance in meters.
    pub x: f32,
    /// Lateral offset in meters.
    pub y: f32,
    /// Relative velocity in m/s.
    pub v_rel: f32,
    /// Detection confidence in 0..1.
    pub prob: f32,
}

/// Latest model-inference snapshot.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct ModelMsg {
    /// Predicted driving path.
    pub position: LineData,
    pub lane_lines: [LineData; 4],
    pub lane_line_probs: [f32; 4],
    pub road_edges: [LineData; 2],
    pub road_edge_stds: [f32; 2],
    pub leads: [LeadMsg; 2],
}

// =============================================================================
// Calibration
// =============================================================================

/// Camera extrinsic calibration as roll/pitch/yaw, in radians.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CalibrationMsg {
    pub rpy: [f32; 3],
}

// =============================================================================
// Device Telemetry
// =============================================================================

/// Latest device health snapshot. Also carries the onroad flag.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct DeviceStateMsg {
    pub started: bool,
    pub cpu_usage_percent: f32,
    pub cpu_temp_c: [f32; 4],
    pub battery_temp_c: f32,
    pub ambient_temp_c: f32,
    pub fan_speed_percent: f32,
    pub battery_percent: f32,
}

// =============================================================================
// GPS
// =============================================================================

/// Latest GNSS fix snapshot.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct GpsMsg {
    /// Horizontal accuracy in meters.
    pub accuracy: f32,
    pub altitude: f32,
    pub bearing_deg: f32,
    pub satellite_count: u32,
}

// =============================================================================
// Vehicle Interface (Panda)
// =============================================================================

/// Hardware revision of the vehicle-interface board.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum PandaType {
    /// No update received recently, or never connected.
    #[default]
    Unknown,
    White,
    Grey,
    Black,
    Uno,
    Dos,
}

/// Latest vehicle-interface snapshot.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct PandaMsg {
    pub panda_type: PandaType,
    pub ignition_line: bool,
    pub ignition_can: bool,
}

// =============================================================================
// Static Vehicle Parameters
// =============================================================================

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CarParamsMsg {
    /// Whether longitudinal control is handled by this system.
    pub longitudinal_control: bool,
    pub steer_max: f32,
    pub steer_actuator_delay: f32,
}

// =============================================================================
// Raw Sensor Events
// =============================================================================

/// One raw IMU event. Axes are device-frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SensorEvent {
    Acceleration([f32; 3]),
    GyroUncalibrated([f32; 3]),
}

/// Batch of sensor events delivered in one topic update.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct SensorEventsMsg {
    pub events: heapless::Vec<SensorEvent, 8>,
}

// =============================================================================
// Road Camera Exposure
// =============================================================================

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CameraStateMsg {
    /// Analog gain currently applied by the sensor.
    pub gain: f32,
    /// Exposure integration line count.
    pub integ_lines: f32,
}

// =============================================================================
// Lateral Plan
// =============================================================================

/// Lane-keeping mode selected by the planner.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum LanelessMode {
    /// Follow detected lane lines.
    #[default]
    LaneFollow,
    /// Pure end-to-end path, ignore lane lines.
    Laneless,
    /// Planner switches automatically on lane confidence.
    Auto,
}

impl LanelessMode {
    /// Decode the integer code used on the wire and in the settings store.
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Laneless,
            2 => Self::Auto,
            _ => Self::LaneFollow,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct LateralPlanMsg {
    pub lane_width: f32,
    pub d_prob: f32,
    pub l_prob: f32,
    pub r_prob: f32,
    pub standstill_elapsed: f32,
    pub laneless_mode: LanelessMode,
}

// =============================================================================
// Map Advisory Data
// =============================================================================

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct MapDataMsg {
    /// Posted speed limit in km/h, 0 when unknown.
    pub speed_limit: f32,
    /// Distance to the point where the limit applies, in meters.
    pub speed_limit_dist: f32,
    /// Safety-sign code ahead, 0 when none.
    pub safety_sign: f32,
    pub road_curvature: f32,
    /// Upcoming turn classification code.
    pub turn_info: i32,
    pub dist_to_turn: f32,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lateral_control_output_selection() {
        assert_eq!(LateralControlState::Pid { output: 0.25 }.output(), 0.25);
        assert_eq!(LateralControlState::Indi { output: -0.5 }.output(), -0.5);
        assert_eq!(LateralControlState::Lqr { output: 1.0 }.output(), 1.0);
    }

    #[test]
    fn test_panda_type_defaults_to_unknown() {
        assert_eq!(PandaType::default(), PandaType::Unknown);
    }

    #[test]
    fn test_line_data_default_is_zeroed() {
        let line = LineData::default();
        assert!(line.x.iter().all(|&v| v == 0.0));
        assert!(line.z.iter().all(|&v| v == 0.0));
    }
}
