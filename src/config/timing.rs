//! Tick rate, cadences, countdowns and filter constants.
//!
//! The core is frame-based: one tick is one iteration of the control loop,
//! and every cadence below is expressed in ticks rather than wall-clock
//! time. This keeps replay and tests deterministic.

use std::time::Duration;

// =============================================================================
// Tick Rate
// =============================================================================

/// Nominal tick rate of the control loop, in Hz.
pub const UI_FREQ: u32 = 20;

/// Wall-clock duration of one tick at the nominal rate.
pub const FRAME_TIME: Duration = Duration::from_millis(1000 / UI_FREQ as u64);

// =============================================================================
// Topic Cadences
// =============================================================================

/// Engageability is refreshed from the latest control-state snapshot at 2 Hz
/// regardless of the topic's updated flag.
pub const ENGAGEABILITY_REFRESH_TICKS: u64 = (UI_FREQ / 2) as u64;

/// Vehicle-interface state is treated as unknown after this many ticks
/// without an update. A staleness timeout, not an error.
pub const PANDA_STALE_TICKS: u64 = 5 * UI_FREQ as u64;

/// Cadence of the key-value store refresh while running (5 seconds).
pub const PARAM_REFRESH_TICKS: u64 = 5 * UI_FREQ as u64;

const _: () = assert!(ENGAGEABILITY_REFRESH_TICKS > 0);
const _: () = assert!(PANDA_STALE_TICKS > ENGAGEABILITY_REFRESH_TICKS);

// =============================================================================
// Blinker Animation
// =============================================================================

/// Blink-animation countdown value loaded whenever a blinker state flips.
/// The countdown is decremented by the renderer, one tick at a time.
pub const BLINKER_RESET_TICKS: u32 = 120;

// =============================================================================
// Vision Stream
// =============================================================================

/// Receive timeout for one camera frame. Exceeding it is logged and the
/// frame is skipped; it is never fatal.
pub const VISION_RECV_TIMEOUT: Duration = Duration::from_millis(100);

// =============================================================================
// Backlight / Wakefulness
// =============================================================================

/// Fixed backlight percentage while offroad.
pub const BACKLIGHT_OFFROAD: i32 = 75;

/// Time constant of the backlight low-pass filter, in seconds.
pub const BACKLIGHT_TS: f32 = 10.0;

/// Update interval of the backlight low-pass filter, in seconds.
pub const BACKLIGHT_DT: f32 = 0.05;

/// Baseline backlight percentage added to the scaled light-sensor value.
pub const BACKLIGHT_B: f32 = 10.0;

/// Scale applied to the normalized light-sensor value.
pub const BACKLIGHT_M: f32 = 0.1;

/// Ticks the display stays awake after the last wake condition.
pub const AWAKE_TIMEOUT_TICKS: u32 = 30 * UI_FREQ;

/// Samples in the running accelerometer average used for tap detection.
pub const ACCEL_SAMPLES: f32 = 5.0 * UI_FREQ as f32;

/// Accelerometer delta that counts as a tap while the display is off.
pub const ACCEL_TAP_THRESHOLD: f32 = 0.2;

/// Gyro delta that counts as a tap while the display is off.
pub const GYRO_TAP_THRESHOLD: f32 = 0.15;

const _: () = assert!(BACKLIGHT_DT < BACKLIGHT_TS);

// =============================================================================
// Unit Tests
// =============================================================================
