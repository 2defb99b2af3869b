//! The per-tick scene reducer.
//!
//! Consumes the batch of per-topic deltas for this tick and folds each one
//! into its scene field group with an exhaustive match. Topics that did not
//! update leave their groups byte-identical; nothing in here ever fails —
//! stale data is skipped and degenerate vertices are dropped.

use nalgebra::Vector3;

use crate::config::{
    BLINKER_RESET_TICKS,
    ENGAGEABILITY_REFRESH_TICKS,
    LANE_LINE_OFFSET,
    LEAD_CONF_THRESHOLD,
    MAX_DRAW_DISTANCE,
    MAX_EXPOSURE_GAIN,
    MAX_EXPOSURE_LINES,
    MIN_DRAW_DISTANCE,
    NIGHT_GAIN_HEADROOM,
    PANDA_STALE_TICKS,
    PATH_EDGE_OFFSET,
    PATH_HEIGHT,
    TRAJECTORY_SIZE,
};
use crate::projection::{Calibration, CameraKind, ViewTransform, car_space_to_screen};
use crate::state::UiState;
use crate::state::scene::{Scene, VertexBuffer};
use crate::telemetry::{
    CarStateMsg,
    ControlsStateMsg,
    LineData,
    ModelMsg,
    PandaType,
    SensorEvent,
    SensorEventsMsg,
    TelemetryBus,
    Topic,
    TopicUpdate,
    collect_updates,
};

// =============================================================================
// Tick Entry Point
// =============================================================================

/// Fold one tick's worth of topic updates into the scene.
pub fn reduce<B: TelemetryBus + ?Sized>(state: &mut UiState, bus: &B) {
    for update in collect_updates(bus) {
        apply(state, &update);
    }

    // Vehicle-interface staleness: silence longer than the window means the
    // board state is unknown, not that the last value still holds.
    if !bus.updated(Topic::Panda)
        && bus.frame().saturating_sub(bus.rcv_frame(Topic::Panda)) > PANDA_STALE_TICKS
    {
        state.scene.panda.panda_type = PandaType::Unknown;
    }

    // Engageability is cheap to show and annoying when stale, so it tracks
    // the latest snapshot at 2 Hz regardless of the updated flag.
    if bus.frame() % ENGAGEABILITY_REFRESH_TICKS == 0 {
        state.scene.controls.engageable = bus.controls_state().engageable;
    }

    // The onroad flag follows the latest device snapshot every tick.
    state.scene.started = bus.device_state().started;
}

/// Apply a single topic delta. Each arm touches exactly one field group.
pub fn apply(state: &mut UiState, update: &TopicUpdate) {
    match update {
        TopicUpdate::ControlsState(msg) => apply_controls(&mut state.scene, msg),
        TopicUpdate::CarState(msg) => apply_car_state(&mut state.scene, msg),
        TopicUpdate::Model(msg) => apply_model(state, msg),
        TopicUpdate::Calibration(msg) => {
            state.scene.calibration = Calibration::from_rpy(msg.rpy);
            state.scene.world_objects_visible = true;
        }
        TopicUpdate::DeviceState(msg) => {
            let device = &mut state.scene.device;
            device.cpu_usage_percent = msg.cpu_usage_percent;
            device.cpu_temp_c = msg.cpu_temp_c.iter().sum::<f32>() / msg.cpu_temp_c.len() as f32;
            device.battery_temp_c = msg.battery_temp_c;
            device.ambient_temp_c = msg.ambient_temp_c;
            device.fan_speed_percent = msg.fan_speed_percent;
            device.battery_percent = msg.battery_percent;
        }
        TopicUpdate::Gps(msg) => {
            let gps = &mut state.scene.gps;
            gps.accuracy = msg.accuracy;
            gps.altitude = msg.altitude;
            gps.bearing_deg = msg.bearing_deg;
            gps.satellite_count = msg.satellite_count;
        }
        TopicUpdate::Panda(msg) => {
            state.scene.panda.panda_type = msg.panda_type;
            state.scene.panda.ignition = msg.ignition_line || msg.ignition_can;
        }
        TopicUpdate::CarParams(msg) => {
            let params = &mut state.scene.car_params;
            params.longitudinal_control = msg.longitudinal_control;
            params.steer_max = msg.steer_max;
            params.steer_actuator_delay = msg.steer_actuator_delay;
        }
        TopicUpdate::Sensors(msg) => apply_sensors(&mut state.scene, msg),
        TopicUpdate::RoadCamera(msg) => {
            let max_ev = MAX_EXPOSURE_LINES * MAX_EXPOSURE_GAIN / NIGHT_GAIN_HEADROOM;
            let ev = msg.gain * msg.integ_lines;
            state.scene.camera.light_sensor = (1.0 - ev / max_ev).clamp(0.0, 1.0);
        }
        TopicUpdate::LateralPlan(msg) => {
            let plan = &mut state.scene.lateral_plan;
            plan.lane_width = msg.lane_width;
            plan.d_prob = msg.d_prob;
            plan.l_prob = msg.l_prob;
            plan.r_prob = msg.r_prob;
            plan.standstill_elapsed = msg.standstill_elapsed;
            plan.laneless_mode = msg.laneless_mode;
        }
        TopicUpdate::MapData(msg) => {
            let map = &mut state.scene.map_data;
            map.speed_limit = msg.speed_limit;
            map.speed_limit_dist = msg.speed_limit_dist;
            map.safety_sign = msg.safety_sign;
            map.road_curvature = msg.road_curvature;
            map.turn_info = msg.turn_info;
            map.dist_to_turn = msg.dist_to_turn;
        }
    }
}

// =============================================================================
// Per-Topic Arms
// =============================================================================

fn apply_controls(scene: &mut Scene, msg: &ControlsStateMsg) {
    // Control state is only meaningful while onroad.
    if !scene.started {
        return;
    }
    let controls = &mut scene.controls;
    controls.enabled = msg.enabled;
    controls.engageable = msg.engageable;
    controls.alert_status = msg.alert_status;
    controls.alert_text_1 = msg.alert_text_1.clone();
    controls.alert_text_2 = msg.alert_text_2.clone();
    controls.lateral = msg.lateral;
    controls.output_scale = msg.lateral.output();
    controls.steer_ratio = msg.steer_ratio;
    controls.speed_camera_limit = msg.speed_camera_limit;
    controls.speed_camera_dist = msg.speed_camera_dist;
}

fn apply_car_state(scene: &mut Scene, msg: &CarStateMsg) {
    let vehicle = &mut scene.vehicle;

    // Any blinker flip restarts the blink animation.
    if vehicle.left_blinker != msg.left_blinker || vehicle.right_blinker != msg.right_blinker {
        vehicle.blink_countdown = BLINKER_RESET_TICKS;
    }

    vehicle.v_ego = msg.v_ego;
    vehicle.steering_angle_deg = msg.steering_angle_deg;
    vehicle.gear = msg.gear;
    vehicle.left_blinker = msg.left_blinker;
    vehicle.right_blinker = msg.right_blinker;
    vehicle.left_blindspot = msg.left_blindspot;
    vehicle.right_blindspot = msg.right_blindspot;
    vehicle.brake_pressed = msg.brake_pressed;
    vehicle.brake_lights = msg.brake_lights;
    vehicle.stand_still = msg.stand_still;
    vehicle.cruise_set_speed = msg.cruise_set_speed;
    vehicle.cruise_acc_active = msg.cruise_acc_active;
    vehicle.cruise_gap = msg.cruise_gap;
    vehicle.tpms = msg.tpms;
}

fn apply_sensors(scene: &mut Scene, msg: &SensorEventsMsg) {
    for event in &msg.events {
        match event {
            SensorEvent::Acceleration(v) => {
                if scene.started {
                    scene.sensors.accel_onroad = v[2];
                } else {
                    scene.sensors.accel = v[2];
                }
            }
            SensorEvent::GyroUncalibrated(v) => {
                if !scene.started {
                    scene.sensors.gyro = v[1];
                }
            }
        }
    }
}

// =============================================================================
// Overlay Geometry
// =============================================================================

/// Index of the last trajectory sample closer than `horizon`.
pub fn path_length_idx(xs: &[f32; TRAJECTORY_SIZE], horizon: f32) -> usize {
    let mut max_idx = 0;
    for (i, &x) in xs.iter().enumerate() {
        if x >= horizon {
            break;
        }
        max_idx = i;
    }
    max_idx
}

/// Clamp the raw model horizon into `[min, max]`, then shrink it toward a
/// confidently detected lead so the path polygon ends at the lead's bumper
/// rather than being painted through it.
pub fn clamped_draw_distance(raw_horizon: f32, lead_x: Option<f32>, min: f32, max: f32) -> f32 {
    let mut dist = raw_horizon.clamp(min, max);
    if let Some(x) = lead_x {
        let lead_d = x * 2.0;
        dist = (lead_d - (lead_d * 0.35).min(10.0)).clamp(0.0, dist);
    }
    dist
}

/// Rebuild one overlay polygon: out along `y - y_off`, back along
/// `y + y_off`. Vertices that project behind the camera or off screen are
/// dropped, shrinking the count, never erroring.
#[allow(clippy::too_many_arguments)]
fn project_line(
    line: &LineData,
    y_off: f32,
    z_off: f32,
    max_idx: usize,
    calib: &Calibration,
    camera: CameraKind,
    view: &ViewTransform,
    out: &mut VertexBuffer,
) {
    out.clear();
    for i in 0..=max_idx {
        let pt = Vector3::new(line.x[i], line.y[i] - y_off, line.z[i] + z_off);
        if let Some(p) = car_space_to_screen(pt, calib, camera, view) {
            out.push(p);
        }
    }
    for i in (0..=max_idx).rev() {
        let pt = Vector3::new(line.x[i], line.y[i] + y_off, line.z[i] + z_off);
        if let Some(p) = car_space_to_screen(pt, calib, camera, view) {
            out.push(p);
        }
    }
}

fn apply_model(state: &mut UiState, msg: &ModelMsg) {
    let camera = state.camera_kind();
    let calib = state.scene.calibration;
    let view = state.view;
    let model = &mut state.scene.model;

    let raw_horizon = msg.position.x[TRAJECTORY_SIZE - 1];
    let max_distance =
        clamped_draw_distance(raw_horizon, None, MIN_DRAW_DISTANCE, MAX_DRAW_DISTANCE);

    // Lane lines and road edges share one cutoff index.
    let max_idx = path_length_idx(&msg.lane_lines[0].x, max_distance);
    for i in 0..model.lane_line_vertices.len() {
        model.lane_line_probs[i] = msg.lane_line_probs[i];
        project_line(
            &msg.lane_lines[i],
            LANE_LINE_OFFSET * msg.lane_line_probs[i],
            0.0,
            max_idx,
            &calib,
            camera,
            &view,
            &mut model.lane_line_vertices[i],
        );
    }
    for i in 0..model.road_edge_vertices.len() {
        model.road_edge_stds[i] = msg.road_edge_stds[i];
        project_line(
            &msg.road_edges[i],
            LANE_LINE_OFFSET,
            0.0,
            max_idx,
            &calib,
            camera,
            &view,
            &mut model.road_edge_vertices[i],
        );
    }

    // Path polygon, shortened when a lead is confidently detected.
    let lead_x = (msg.leads[0].prob > LEAD_CONF_THRESHOLD).then_some(msg.leads[0].x);
    let path_distance =
        clamped_draw_distance(raw_horizon, lead_x, MIN_DRAW_DISTANCE, MAX_DRAW_DISTANCE);
    let path_idx = path_length_idx(&msg.position.x, path_distance);
    project_line(
        &msg.position,
        PATH_EDGE_OFFSET,
        PATH_HEIGHT,
        path_idx,
        &calib,
        camera,
        &view,
        &mut model.track_vertices,
    );

    // Lead markers: below-threshold candidates keep their previous slot.
    for i in 0..model.lead_vertices.len() {
        let lead = &msg.leads[i];
        if lead.prob <= LEAD_CONF_THRESHOLD {
            continue;
        }
        let z = msg.position.z[path_length_idx(&msg.position.x, lead.x)];
        let pt = Vector3::new(lead.x, lead.y, z + PATH_HEIGHT);
        if let Some(p) = car_space_to_screen(pt, &calib, camera, &view) {
            model.lead_vertices[i] = p;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
