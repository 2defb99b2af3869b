//! The scene record: one flat snapshot of everything the renderer needs.
//!
//! Fields fall into independent groups, one per telemetry topic. A group is
//! only ever written by its topic's reducer arm, so a topic that did not
//! update this tick leaves its group untouched. Overlay vertex buffers are
//! fully overwritten on every model update, never appended to.

use crate::config::timing::UI_FREQ;
use crate::params::ParamsStore;
use crate::projection::{Calibration, ScreenPoint};
use crate::telemetry::{GearShifter, LanelessMode, LateralControlState, PandaType, TirePressure};

// =============================================================================
// Vertex Buffer
// =============================================================================

/// Fixed-capacity polygon buffer in display pixel space.
///
/// Projected vertices that fall off screen or behind the camera are simply
/// not pushed, so `len()` can be smaller than the number of requested
/// samples. Capacity covers a full out-and-back trajectory.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct VertexBuffer {
    pts: heapless::Vec<ScreenPoint, { crate::config::POLYGON_CAPACITY }>,
}

impl VertexBuffer {
    pub const fn new() -> Self {
        Self { pts: heapless::Vec::new() }
    }

    /// Drop all vertices. Called before every rebuild.
    #[inline]
    pub fn clear(&mut self) {
        self.pts.clear();
    }

    /// Append one vertex. By construction the caller never pushes more than
    /// the capacity (one forward and one return vertex per trajectory
    /// sample), so overflow cannot occur.
    #[inline]
    pub fn push(&mut self, p: ScreenPoint) {
        let _ = self.pts.push(p);
    }

    #[inline]
    pub fn len(&self) -> usize { self.pts.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.pts.is_empty() }

    #[inline]
    pub fn points(&self) -> &[ScreenPoint] { &self.pts }
}

// =============================================================================
// Field Groups
// =============================================================================

/// Vehicle kinematics group (vehicle-state topic).
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct VehicleScene {
    pub v_ego: f32,
    pub steering_angle_deg: f32,
    pub gear: GearShifter,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub brake_pressed: bool,
    pub brake_lights: bool,
    pub stand_still: bool,
    pub cruise_set_speed: f32,
    pub cruise_acc_active: bool,
    pub cruise_gap: f32,
    pub tpms: TirePressure,
    /// Blink-animation countdown; reloaded whenever a blinker flips, counted
    /// down by the renderer.
    pub blink_countdown: u32,
}

/// Longitudinal/lateral control group (control-state topic).
#[derive(Clone, PartialEq, Default, Debug)]
pub struct ControlsScene {
    pub enabled: bool,
    pub engageable: bool,
    pub alert_status: crate::telemetry::AlertStatus,
    pub alert_text_1: String,
    pub alert_text_2: String,
    pub lateral: LateralControlState,
    /// Control output of the active lateral method, for the torque bar.
    pub output_scale: f32,
    pub steer_ratio: f32,
    pub speed_camera_limit: f32,
    pub speed_camera_dist: f32,
}

/// Overlay geometry group (model-inference topic).
#[derive(Clone, PartialEq, Debug)]
pub struct ModelScene {
    pub lane_line_vertices: [VertexBuffer; 4],
    pub lane_line_probs: [f32; 4],
    pub road_edge_vertices: [VertexBuffer; 2],
    pub road_edge_stds: [f32; 2],
    /// Driving-path polygon.
    pub track_vertices: VertexBuffer,
    /// Marker positions for up to two lead candidates. A slot keeps its last
    /// value while its candidate's confidence is below threshold.
    pub lead_vertices: [ScreenPoint; 2],
}

impl Default for ModelScene {
    fn default() -> Self {
        Self {
            lane_line_vertices: Default::default(),
            lane_line_probs: [0.0; 4],
            road_edge_vertices: Default::default(),
            road_edge_stds: [0.0; 2],
            track_vertices: VertexBuffer::new(),
            lead_vertices: [ScreenPoint::origin(); 2],
        }
    }
}

/// Device telemetry group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct DeviceScene {
    pub cpu_usage_percent: f32,
    /// Average over all CPU temperature sensors, in Celsius.
    pub cpu_temp_c: f32,
    pub battery_temp_c: f32,
    pub ambient_temp_c: f32,
    pub fan_speed_percent: f32,
    pub battery_percent: f32,
}

/// GNSS fix group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct GpsScene {
    pub accuracy: f32,
    pub altitude: f32,
    pub bearing_deg: f32,
    pub satellite_count: u32,
}

/// Vehicle-interface group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct PandaScene {
    pub panda_type: PandaType,
    pub ignition: bool,
}

/// Static vehicle parameters group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CarParamsScene {
    pub longitudinal_control: bool,
    pub steer_max: f32,
    pub steer_actuator_delay: f32,
}

/// Raw IMU group, split by lifecycle: the offroad values drive tap-to-wake,
/// the onroad value feeds ride diagnostics.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct SensorScene {
    /// Vertical acceleration while offroad.
    pub accel: f32,
    /// Yaw-axis gyro while offroad.
    pub gyro: f32,
    /// Vertical acceleration while onroad.
    pub accel_onroad: f32,
}

/// Road-camera exposure group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct CameraScene {
    /// Normalized ambient light estimate in 0..1, derived from exposure.
    pub light_sensor: f32,
}

/// Lateral-plan group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct LateralPlanScene {
    pub lane_width: f32,
    pub d_prob: f32,
    pub l_prob: f32,
    pub r_prob: f32,
    pub standstill_elapsed: f32,
    pub laneless_mode: LanelessMode,
}

/// Map advisory group.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct MapScene {
    pub speed_limit: f32,
    pub speed_limit_dist: f32,
    pub safety_sign: f32,
    pub road_curvature: f32,
    pub turn_info: i32,
    pub dist_to_turn: f32,
}

// =============================================================================
// Per-Drive Configuration
// =============================================================================

/// Scaled-integer PI(D) gains as stored in the key-value store.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct PidTuning {
    pub kp: i32,
    pub ki: i32,
    pub kd: i32,
    pub kf: i32,
}

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct IndiTuning {
    pub inner_gain: i32,
    pub outer_gain: i32,
    pub time_constant: i32,
    pub actuator_effectiveness: i32,
}

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct LqrTuning {
    pub scale: i32,
    pub ki: i32,
    pub dc_gain: i32,
}

/// Gains for all three lateral-control methods, snapshotted so the live
/// tuning panel shows the values this drive actually started with.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct LateralTuning {
    pub pid: PidTuning,
    pub indi: IndiTuning,
    pub lqr: LqrTuning,
}

/// Configuration snapshotted once per onroad transition and frozen for the
/// duration of the drive. A toggle changed mid-drive takes effect on the
/// next transition, not immediately.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DriveConfig {
    pub end_to_end: bool,
    pub driving_record: bool,
    pub debug_ui_1: bool,
    pub debug_ui_2: bool,
    pub force_gear_d: bool,
    pub blindspot_detect: bool,
    pub laneless_setting: LanelessMode,
    pub recording_count: i32,
    pub recording_quality: i32,
    pub speed_limit_offset: i32,
    pub monitoring_mode: bool,
    /// Manual backlight percentage; 0 selects automatic brightness.
    pub brightness: i32,
    pub volume_boost: i32,
    /// Minutes until screen dim; 0 = 30 s, -1 = 15 s, -2 = never.
    pub auto_screen_off: i32,
    /// Backlight percentage once the screen-off countdown expires.
    pub brightness_off: i32,
    pub camera_offset: i32,
    pub tuning: LateralTuning,
    pub live_tune_panel: bool,
    pub stock_ui: bool,
    pub battery_less: bool,
    /// Screen-off countdown in ticks, derived from `auto_screen_off`;
    /// -1 disables the countdown.
    pub screen_off_ticks: i32,
}

impl DriveConfig {
    /// Snapshot every per-drive key from the store, falling back to defaults
    /// for missing or malformed values.
    pub fn load<P: ParamsStore + ?Sized>(params: &P) -> Self {
        let auto_screen_off = params.get_i32("AutoScreenOff", 0);
        Self {
            end_to_end: params.get_bool("EndToEndToggle", false),
            driving_record: params.get_bool("DrivingRecord", false),
            debug_ui_1: params.get_bool("DebugUi1", false),
            debug_ui_2: params.get_bool("DebugUi2", false),
            force_gear_d: params.get_bool("ForceGearD", false),
            blindspot_detect: params.get_bool("BlindSpotDetect", true),
            laneless_setting: LanelessMode::from_code(params.get_i32("LanelessMode", 0)),
            recording_count: params.get_i32("RecordingCount", 100),
            recording_quality: params.get_i32("RecordingQuality", 1),
            speed_limit_offset: params.get_i32("SpeedLimitOffset", 0),
            monitoring_mode: params.get_bool("MonitoringMode", false),
            brightness: params.get_i32("UiBrightness", 0),
            volume_boost: params.get_i32("UiVolumeBoost", 0),
            auto_screen_off,
            brightness_off: params.get_i32("UiBrightnessOff", 10),
            camera_offset: params.get_i32("CameraOffset", 0),
            tuning: LateralTuning {
                pid: PidTuning {
                    kp: params.get_i32("PidKp", 0),
                    ki: params.get_i32("PidKi", 0),
                    kd: params.get_i32("PidKd", 0),
                    kf: params.get_i32("PidKf", 0),
                },
                indi: IndiTuning {
                    inner_gain: params.get_i32("InnerLoopGain", 0),
                    outer_gain: params.get_i32("OuterLoopGain", 0),
                    time_constant: params.get_i32("TimeConstant", 0),
                    actuator_effectiveness: params.get_i32("ActuatorEffectiveness", 0),
                },
                lqr: LqrTuning {
                    scale: params.get_i32("LqrScale", 0),
                    ki: params.get_i32("LqrKi", 0),
                    dc_gain: params.get_i32("LqrDcGain", 0),
                },
            },
            live_tune_panel: params.get_bool("LiveTunePanelEnable", false),
            stock_ui: params.get_bool("StockUi", false),
            battery_less: params.get_bool("BatteryLess", false),
            screen_off_ticks: Self::screen_off_ticks(auto_screen_off),
        }
    }

    fn screen_off_ticks(auto_screen_off: i32) -> i32 {
        match auto_screen_off {
            n if n > 0 => n * 60 * UI_FREQ as i32,
            0 => 30 * UI_FREQ as i32,
            -1 => 15 * UI_FREQ as i32,
            _ => -1,
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::load(&crate::params::MemParams::new())
    }
}

// =============================================================================
// Scene
// =============================================================================

/// The flat scene record owned by the reducer, read by rendering and status.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Scene {
    /// Onroad flag, tracked from the latest device snapshot every tick.
    pub started: bool,
    /// Tick at which the current drive started.
    pub started_frame: u64,
    /// False from init until the first calibration message arrives; overlay
    /// geometry is not drawn before that. Intentional, not a bug.
    pub world_objects_visible: bool,
    pub is_metric: bool,
    pub driver_view_enabled: bool,
    pub calibration: Calibration,
    pub vehicle: VehicleScene,
    pub controls: ControlsScene,
    pub model: ModelScene,
    pub device: DeviceScene,
    pub gps: GpsScene,
    pub panda: PandaScene,
    pub car_params: CarParamsScene,
    pub sensors: SensorScene,
    pub camera: CameraScene,
    pub lateral_plan: LateralPlanScene,
    pub map_data: MapScene,
    pub drive_cfg: DriveConfig,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::POLYGON_CAPACITY;
    use crate::params::MemParams;

    #[test]
    fn test_vertex_buffer_starts_empty() {
        let buf = VertexBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_vertex_buffer_push_and_clear() {
        let mut buf = VertexBuffer::new();
        buf.push(ScreenPoint::new(1.0, 2.0));
        buf.push(ScreenPoint::new(3.0, 4.0));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.points()[1], ScreenPoint::new(3.0, 4.0));
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_vertex_buffer_never_exceeds_capacity() {
        let mut buf = VertexBuffer::new();
        for i in 0..POLYGON_CAPACITY + 10 {
            buf.push(ScreenPoint::new(i as f32, 0.0));
        }
        assert_eq!(buf.len(), POLYGON_CAPACITY);
    }

    #[test]
    fn test_scene_starts_with_world_objects_hidden() {
        let scene = Scene::default();
        assert!(!scene.world_objects_visible);
        assert!(!scene.started);
        assert_eq!(scene.panda.panda_type, crate::telemetry::PandaType::Unknown);
    }

    #[test]
    fn test_screen_off_ticks_mapping() {
        assert_eq!(DriveConfig::screen_off_ticks(2), 2 * 60 * UI_FREQ as i32);
        assert_eq!(DriveConfig::screen_off_ticks(0), 30 * UI_FREQ as i32);
        assert_eq!(DriveConfig::screen_off_ticks(-1), 15 * UI_FREQ as i32);
        assert_eq!(DriveConfig::screen_off_ticks(-2), -1);
    }

    #[test]
    fn test_drive_config_load_reads_store() {
        let mut params = MemParams::new();
        params.put("EndToEndToggle", "1");
        params.put("UiBrightness", "55");
        params.put("LanelessMode", "2");
        params.put("AutoScreenOff", "-1");
        let cfg = DriveConfig::load(&params);
        assert!(cfg.end_to_end);
        assert_eq!(cfg.brightness, 55);
        assert_eq!(cfg.laneless_setting, LanelessMode::Auto);
        assert_eq!(cfg.screen_off_ticks, 15 * UI_FREQ as i32);
    }

    #[test]
    fn test_drive_config_malformed_value_falls_back() {
        let mut params = MemParams::new();
        params.put("RecordingCount", "not-a-number");
        let cfg = DriveConfig::load(&params);
        assert_eq!(cfg.recording_count, 100);
    }
}
