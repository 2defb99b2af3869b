//! Synthetic telemetry source for the demo binary.
//!
//! Generates a plausible drive using micromath sine waves: the device goes
//! onroad after a second, calibration arrives shortly after, and the model
//! paints a gently weaving two-lane road with a lead car breathing in and
//! out of range. Topic cadences are staggered the way a real bus behaves —
//! fast topics every tick, device health and GPS at a few Hz, map data
//! rarely.

use micromath::F32;

use crate::config::{TRAJECTORY_SIZE, UI_FREQ};
use crate::telemetry::{
    CalibrationMsg,
    CameraStateMsg,
    CarParamsMsg,
    CarStateMsg,
    ControlsStateMsg,
    DeviceStateMsg,
    GearShifter,
    GpsMsg,
    LanelessMode,
    LateralControlState,
    LateralPlanMsg,
    LeadMsg,
    LineData,
    MapDataMsg,
    ModelMsg,
    PandaMsg,
    PandaType,
    SensorEvent,
    SensorEventsMsg,
    TelemetryBus,
    TOPIC_COUNT,
    Topic,
    TirePressure,
};

#[inline]
fn sin(x: f32) -> f32 {
    F32(x).sin().0
}

/// Ticks before the demo drive starts.
const ONROAD_DELAY_TICKS: u64 = UI_FREQ as u64;

/// Ticks before calibration arrives after going onroad.
const CALIB_DELAY_TICKS: u64 = ONROAD_DELAY_TICKS + UI_FREQ as u64 / 2;

/// Scripted snapshot bus driven entirely by the tick counter.
pub struct DemoBus {
    frame: u64,
    updated: [bool; TOPIC_COUNT],
    rcv_frames: [u64; TOPIC_COUNT],
    car_state: CarStateMsg,
    controls_state: ControlsStateMsg,
    model: ModelMsg,
    calibration: CalibrationMsg,
    device_state: DeviceStateMsg,
    gps: GpsMsg,
    panda: PandaMsg,
    car_params: CarParamsMsg,
    sensors: SensorEventsMsg,
    road_camera: CameraStateMsg,
    lateral_plan: LateralPlanMsg,
    map_data: MapDataMsg,
}

impl DemoBus {
    pub fn new() -> Self {
        Self {
            frame: 0,
            updated: [false; TOPIC_COUNT],
            rcv_frames: [0; TOPIC_COUNT],
            car_state: CarStateMsg::default(),
            controls_state: ControlsStateMsg::default(),
            model: ModelMsg::default(),
            calibration: CalibrationMsg::default(),
            device_state: DeviceStateMsg::default(),
            gps: GpsMsg::default(),
            panda: PandaMsg::default(),
            car_params: CarParamsMsg::default(),
            sensors: SensorEventsMsg::default(),
            road_camera: CameraStateMsg::default(),
            lateral_plan: LateralPlanMsg::default(),
            map_data: MapDataMsg::default(),
        }
    }

    fn mark(&mut self, topic: Topic) {
        self.updated[topic.index()] = true;
        self.rcv_frames[topic.index()] = self.frame;
    }

    /// Gently weaving line at a fixed lateral offset.
    fn demo_line(t: f32, y_offset: f32) -> LineData {
        let mut line = LineData::default();
        for i in 0..TRAJECTORY_SIZE {
            let x = i as f32 * 3.0;
            line.x[i] = x;
            line.y[i] = y_offset + 0.5 * sin(t * 0.3) * (x / 100.0) * (x / 100.0);
            line.z[i] = 0.0;
        }
        line
    }

    fn generate(&mut self) {
        let t = self.frame as f32 / UI_FREQ as f32;
        let started = self.frame >= ONROAD_DELAY_TICKS;
        let engaged = self.frame >= 3 * ONROAD_DELAY_TICKS;

        // Fast topics: every tick.
        self.car_state = CarStateMsg {
            v_ego: if started { 20.0 + 6.0 * sin(t * 0.2) } else { 0.0 },
            steering_angle_deg: 12.0 * sin(t * 0.5),
            gear: if started { GearShifter::Drive } else { GearShifter::Park },
            left_blinker: started && sin(t * 0.1) > 0.95,
            right_blinker: false,
            left_blindspot: false,
            right_blindspot: false,
            brake_pressed: false,
            brake_lights: false,
            stand_still: !started,
            cruise_set_speed: 28.0,
            cruise_acc_active: engaged,
            cruise_gap: 2.0,
            tpms: TirePressure {
                front_left: 35.0,
                front_right: 35.0,
                rear_left: 34.5,
                rear_right: 34.5,
            },
        };
        self.mark(Topic::CarState);

        self.controls_state = ControlsStateMsg {
            enabled: engaged,
            engageable: started,
            alert_status: Default::default(),
            alert_text_1: String::new(),
            alert_text_2: String::new(),
            lateral: LateralControlState::Pid { output: 0.4 * sin(t * 0.5) },
            steer_ratio: 13.5,
            speed_camera_limit: 0.0,
            speed_camera_dist: 0.0,
        };
        self.mark(Topic::ControlsState);

        if started {
            let lead_prob = (0.75 + 0.3 * sin(t * 0.15)).clamp(0.0, 1.0);
            self.model = ModelMsg {
                position: Self::demo_line(t, 0.0),
                lane_lines: [
                    Self::demo_line(t, -3.6),
                    Self::demo_line(t, -1.8),
                    Self::demo_line(t, 1.8),
                    Self::demo_line(t, 3.6),
                ],
                lane_line_probs: [0.3, 0.9, 0.9, 0.3],
                road_edges: [Self::demo_line(t, -5.4), Self::demo_line(t, 5.4)],
                road_edge_stds: [0.2, 0.2],
                leads: [
                    LeadMsg {
                        x: 35.0 + 15.0 * sin(t * 0.1),
                        y: 0.0,
                        v_rel: -1.5 * sin(t * 0.1),
                        prob: lead_prob,
                    },
                    LeadMsg::default(),
                ],
            };
            self.mark(Topic::Model);

            self.lateral_plan = LateralPlanMsg {
                lane_width: 3.6,
                d_prob: 0.9,
                l_prob: 0.9,
                r_prob: 0.9,
                standstill_elapsed: 0.0,
                laneless_mode: LanelessMode::Auto,
            };
            self.mark(Topic::LateralPlan);
        }

        // Calibration: once, shortly after the drive starts.
        if self.frame == CALIB_DELAY_TICKS {
            self.calibration = CalibrationMsg { rpy: [0.0, 0.016, -0.004] };
            self.mark(Topic::Calibration);
        }

        // Device health at 2 Hz.
        if self.frame % (UI_FREQ as u64 / 2) == 0 {
            self.device_state = DeviceStateMsg {
                started,
                cpu_usage_percent: 35.0 + 10.0 * sin(t * 0.7),
                cpu_temp_c: [55.0, 56.0, 54.0, 57.0],
                battery_temp_c: 31.0,
                ambient_temp_c: 24.0 + sin(t * 0.05),
                fan_speed_percent: 40.0,
                battery_percent: 78.0,
            };
            self.mark(Topic::DeviceState);
        }

        // Panda heartbeat at 2 Hz.
        if self.frame % (UI_FREQ as u64 / 2) == 0 {
            self.panda = PandaMsg {
                panda_type: PandaType::Dos,
                ignition_line: started,
                ignition_can: false,
            };
            self.mark(Topic::Panda);
        }

        // GPS at 1 Hz once started.
        if started && self.frame % UI_FREQ as u64 == 0 {
            self.gps = GpsMsg {
                accuracy: 0.8 + 0.3 * sin(t * 0.2),
                altitude: 120.0,
                bearing_deg: 90.0 + 20.0 * sin(t * 0.05),
                satellite_count: 14,
            };
            self.mark(Topic::Gps);
        }

        // Static vehicle params: once on the first tick.
        if self.frame == 1 {
            self.car_params = CarParamsMsg {
                longitudinal_control: true,
                steer_max: 1.2,
                steer_actuator_delay: 0.2,
            };
            self.mark(Topic::CarParams);
        }

        // Raw IMU every tick.
        self.sensors = SensorEventsMsg::default();
        let _ = self
            .sensors
            .events
            .push(SensorEvent::Acceleration([0.0, 0.0, 9.81 + 0.05 * sin(t * 3.0)]));
        let _ = self
            .sensors
            .events
            .push(SensorEvent::GyroUncalibrated([0.0, 0.01 * sin(t * 2.0), 0.0]));
        self.mark(Topic::Sensors);

        // Exposure at 4 Hz: one slow day/night cycle.
        if self.frame % (UI_FREQ as u64 / 4) == 0 {
            self.road_camera = CameraStateMsg {
                gain: 1.0 + 4.0 * (0.5 + 0.5 * sin(t * 0.02)),
                integ_lines: 400.0 + 300.0 * (0.5 + 0.5 * sin(t * 0.02)),
            };
            self.mark(Topic::RoadCamera);
        }

        // Map advisories every few seconds.
        if started && self.frame % (5 * UI_FREQ as u64) == 0 {
            self.map_data = MapDataMsg {
                speed_limit: 100.0,
                speed_limit_dist: 800.0,
                safety_sign: 0.0,
                road_curvature: 0.002,
                turn_info: 0,
                dist_to_turn: 1500.0,
            };
            self.mark(Topic::MapData);
        }
    }
}

impl Default for DemoBus {
    fn default() -> Self { Self::new() }
}

impl TelemetryBus for DemoBus {
    fn poll(&mut self) {
        self.frame += 1;
        self.updated = [false; TOPIC_COUNT];
        self.generate();
    }

    fn frame(&self) -> u64 { self.frame }

    fn updated(&self, topic: Topic) -> bool {
        self.updated[topic.index()]
    }

    fn rcv_frame(&self, topic: Topic) -> u64 {
        self.rcv_frames[topic.index()]
    }

    fn car_state(&self) -> &CarStateMsg { &self.car_state }
    fn controls_state(&self) -> &ControlsStateMsg { &self.controls_state }
    fn model(&self) -> &ModelMsg { &self.model }
    fn calibration(&self) -> &CalibrationMsg { &self.calibration }
    fn device_state(&self) -> &DeviceStateMsg { &self.device_state }
    fn gps(&self) -> &GpsMsg { &self.gps }
    fn panda(&self) -> &PandaMsg { &self.panda }
    fn car_params(&self) -> &CarParamsMsg { &self.car_params }
    fn sensors(&self) -> &SensorEventsMsg { &self.sensors }
    fn road_camera(&self) -> &CameraStateMsg { &self.road_camera }
    fn lateral_plan(&self) -> &LateralPlanMsg { &self.lateral_plan }
    fn map_data(&self) -> &MapDataMsg { &self.map_data }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_bus_goes_onroad_after_delay() {
        let mut bus = DemoBus::new();
        bus.poll();
        assert!(!bus.device_state().started);

        while bus.frame() < ONROAD_DELAY_TICKS {
            bus.poll();
        }
        assert!(bus.device_state().started);
    }

    #[test]
    fn test_demo_bus_calibrates_once() {
        let mut bus = DemoBus::new();
        let mut calibrations = 0;
        for _ in 0..(10 * UI_FREQ as u64) {
            bus.poll();
            if bus.updated(Topic::Calibration) {
                calibrations += 1;
            }
        }
        assert_eq!(calibrations, 1);
    }

    #[test]
    fn test_demo_bus_staggered_cadences() {
        let mut bus = DemoBus::new();
        let mut device_updates = 0;
        let mut car_updates = 0;
        let ticks = 10 * UI_FREQ as u64;
        for _ in 0..ticks {
            bus.poll();
            if bus.updated(Topic::DeviceState) {
                device_updates += 1;
            }
            if bus.updated(Topic::CarState) {
                car_updates += 1;
            }
        }
        assert_eq!(car_updates, ticks);
        assert!(device_updates < car_updates);
        assert!(device_updates > 0);
    }

    #[test]
    fn test_demo_lead_is_always_plausible() {
        let mut bus = DemoBus::new();
        for _ in 0..(30 * UI_FREQ as u64) {
            bus.poll();
            let lead = &bus.model().leads[0];
            assert!((0.0..=1.0).contains(&lead.prob));
            assert!(lead.x >= 0.0);
        }
    }
}
