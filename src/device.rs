//! Display brightness and wakefulness.
//!
//! Brightness follows the road camera's ambient-light estimate through a
//! first-order low-pass filter, with a fixed level while offroad and an
//! optional screen-off countdown per the drive configuration. The hardware
//! write is dispatched on a detached thread; the reducer never observes its
//! result. Wakefulness keeps the panel on while driving or on ignition and
//! wakes it on a tap (simultaneous accel and gyro deltas) otherwise.

use std::thread;

use tracing::debug;

use crate::config::{
    ACCEL_SAMPLES,
    ACCEL_TAP_THRESHOLD,
    AWAKE_TIMEOUT_TICKS,
    BACKLIGHT_B,
    BACKLIGHT_DT,
    BACKLIGHT_M,
    BACKLIGHT_OFFROAD,
    BACKLIGHT_TS,
    GYRO_TAP_THRESHOLD,
};
use crate::state::UiState;
use crate::telemetry::AlertStatus;

// =============================================================================
// First-Order Filter
// =============================================================================

/// Discrete first-order low-pass filter.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FirstOrderFilter {
    x: f32,
    k: f32,
}

impl FirstOrderFilter {
    pub fn new(x0: f32, rc: f32, dt: f32) -> Self {
        Self { x: x0, k: dt / (rc + dt) }
    }

    pub fn update(&mut self, sample: f32) -> f32 {
        self.x += self.k * (sample - self.x);
        self.x
    }

    #[inline]
    pub const fn value(&self) -> f32 {
        self.x
    }
}

// =============================================================================
// Display Hardware
// =============================================================================

/// Backlight and panel-power control.
///
/// Implementations must be cheap to clone: the brightness write runs on a
/// detached best-effort thread holding its own handle.
pub trait DisplayHardware: Clone + Send + 'static {
    fn set_brightness(&self, percent: i32);
    fn set_display_power(&self, on: bool);
}

/// sysfs-backed backlight on the target device. Writes are best-effort;
/// a missing sysfs node is silently ignored.
#[derive(Clone)]
pub struct SysfsBacklight {
    brightness_path: &'static str,
    power_path: &'static str,
}

impl SysfsBacklight {
    pub const fn new() -> Self {
        Self {
            brightness_path: "/sys/class/backlight/panel0-backlight/brightness",
            power_path: "/sys/class/backlight/panel0-backlight/bl_power",
        }
    }
}

impl Default for SysfsBacklight {
    fn default() -> Self { Self::new() }
}

impl DisplayHardware for SysfsBacklight {
    fn set_brightness(&self, percent: i32) {
        // Panel expects a raw value out of 1023.
        let raw = percent * (1023 / 100);
        let _ = std::fs::write(self.brightness_path, format!("{raw}\n"));
    }

    fn set_display_power(&self, on: bool) {
        let _ = std::fs::write(self.power_path, if on { "0\n" } else { "4\n" });
    }
}

/// Hardware stub for tests and the demo binary.
#[derive(Clone, Copy, Default)]
pub struct NoopHardware;

impl DisplayHardware for NoopHardware {
    fn set_brightness(&self, _percent: i32) {}
    fn set_display_power(&self, _on: bool) {}
}

// =============================================================================
// Device State Machine
// =============================================================================

pub struct Device<H> {
    hw: H,
    awake: bool,
    awake_timeout: u32,
    brightness_filter: FirstOrderFilter,
    last_brightness: i32,
    /// Screen-off countdown in ticks; -1 means uninitialized.
    sleep_time: i32,
    accel_prev: f32,
    gyro_prev: f32,
}

impl<H: DisplayHardware> Device<H> {
    pub fn new(hw: H) -> Self {
        Self {
            hw,
            awake: false,
            awake_timeout: 0,
            brightness_filter: FirstOrderFilter::new(
                BACKLIGHT_OFFROAD as f32,
                BACKLIGHT_TS,
                BACKLIGHT_DT,
            ),
            last_brightness: BACKLIGHT_OFFROAD,
            sleep_time: -1,
            accel_prev: 0.0,
            gyro_prev: 0.0,
        }
    }

    #[inline]
    pub const fn awake(&self) -> bool {
        self.awake
    }

    #[inline]
    pub const fn brightness(&self) -> i32 {
        self.last_brightness
    }

    /// Run one device tick: wakefulness first, then the brightness write.
    pub fn update(&mut self, state: &UiState) {
        self.update_wakefulness(state);
        self.update_brightness(state);
    }

    fn update_brightness(&mut self, state: &UiState) {
        let scene = &state.scene;
        let cfg = &scene.drive_cfg;

        let mut clipped = 100.0f32.min(scene.camera.light_sensor * BACKLIGHT_M + BACKLIGHT_B);
        if !scene.started {
            clipped = BACKLIGHT_OFFROAD as f32;
        } else if scene.controls.alert_status != AlertStatus::Normal && cfg.screen_off_ticks >= 0 {
            // An active alert restarts the screen-off countdown.
            self.sleep_time = cfg.screen_off_ticks;
        } else if self.sleep_time > 0 && cfg.screen_off_ticks >= 0 {
            self.sleep_time -= 1;
        } else if self.sleep_time == -1 && cfg.screen_off_ticks >= 0 {
            self.sleep_time = cfg.screen_off_ticks;
        }

        let mut brightness = self.brightness_filter.update(clipped) as i32;
        if !self.awake {
            brightness = 0;
        } else if scene.started && self.sleep_time == 0 && cfg.screen_off_ticks >= 0 {
            brightness = (cfg.brightness_off as f32 * 0.01 * brightness as f32) as i32;
        } else if cfg.brightness > 0 {
            brightness = (cfg.brightness as f32 * 0.99) as i32;
        }

        if brightness != self.last_brightness {
            debug!(brightness, "backlight update");
            let hw = self.hw.clone();
            // Fire and forget; the sysfs write may be slow and its result
            // is never observed.
            thread::spawn(move || hw.set_brightness(brightness));
        }
        self.last_brightness = brightness;
    }

    fn update_wakefulness(&mut self, state: &UiState) {
        let scene = &state.scene;
        self.awake_timeout = self.awake_timeout.saturating_sub(1);

        let mut should_wake = scene.started || scene.panda.ignition;
        if !should_wake {
            // Tap detection while the display is off: both sensors have to
            // move at once, a bump in the trunk is not a tap.
            let accel_trigger = (scene.sensors.accel - self.accel_prev).abs() > ACCEL_TAP_THRESHOLD;
            let gyro_trigger = (scene.sensors.gyro - self.gyro_prev).abs() > GYRO_TAP_THRESHOLD;
            should_wake = accel_trigger && gyro_trigger;
            self.gyro_prev = scene.sensors.gyro;
            self.accel_prev =
                (self.accel_prev * (ACCEL_SAMPLES - 1.0) + scene.sensors.accel) / ACCEL_SAMPLES;
        }

        self.set_awake(self.awake_timeout > 0, should_wake);
    }

    fn set_awake(&mut self, on: bool, reset: bool) {
        if on != self.awake {
            self.awake = on;
            self.hw.set_display_power(on);
            debug!(awake = on, "display power");
        }
        if reset {
            self.awake_timeout = AWAKE_TIMEOUT_TICKS;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn awake_device() -> Device<NoopHardware> {
        let mut device = Device::new(NoopHardware);
        device.awake = true;
        device.awake_timeout = AWAKE_TIMEOUT_TICKS;
        device
    }

    #[test]
    fn test_filter_converges_to_input() {
        let mut filter = FirstOrderFilter::new(0.0, BACKLIGHT_TS, BACKLIGHT_DT);
        let mut out = 0.0;
        for _ in 0..10_000 {
            out = filter.update(80.0);
        }
        assert!((out - 80.0).abs() < 0.5);
    }

    #[test]
    fn test_filter_moves_toward_sample() {
        let mut filter = FirstOrderFilter::new(0.0, 1.0, 0.5);
        let first = filter.update(30.0);
        assert!(first > 0.0 && first < 30.0);
        assert!(filter.update(30.0) > first);
    }

    #[test]
    fn test_offroad_brightness_is_fixed() {
        let mut device = awake_device();
        let state = UiState::new();
        for _ in 0..50 {
            device.update(&state);
        }
        // Filter seeded at the offroad level, so it must hold there.
        assert_eq!(device.brightness(), BACKLIGHT_OFFROAD);
    }

    #[test]
    fn test_asleep_display_is_dark() {
        let mut device = Device::new(NoopHardware);
        let state = UiState::new();
        device.update(&state);
        assert!(!device.awake());
        assert_eq!(device.brightness(), 0);
    }

    #[test]
    fn test_started_keeps_display_awake() {
        let mut device = Device::new(NoopHardware);
        let mut state = UiState::new();
        state.scene.started = true;
        // First tick arms the timeout, second tick powers the panel.
        device.update(&state);
        device.update(&state);
        assert!(device.awake());

        // Wake holds across many ticks while onroad.
        for _ in 0..(AWAKE_TIMEOUT_TICKS * 2) {
            device.update(&state);
        }
        assert!(device.awake());
    }

    #[test]
    fn test_awake_times_out_when_idle() {
        let mut device = Device::new(NoopHardware);
        let mut state = UiState::new();
        state.scene.started = true;
        device.update(&state);
        device.update(&state);
        assert!(device.awake());

        state.scene.started = false;
        for _ in 0..(AWAKE_TIMEOUT_TICKS + 1) {
            device.update(&state);
        }
        assert!(!device.awake());
    }

    #[test]
    fn test_tap_wakes_display() {
        let mut device = Device::new(NoopHardware);
        let mut state = UiState::new();
        device.update(&state);
        assert!(!device.awake());

        // Accel alone is not a tap.
        state.scene.sensors.accel = 1.0;
        device.update(&state);
        assert!(!device.awake());

        // Accel and gyro together are. The accel average has absorbed some
        // of the earlier delta, so move it well past the threshold.
        state.scene.sensors.accel = 3.0;
        state.scene.sensors.gyro = 0.5;
        device.update(&state);
        // The tap arms the timeout; the panel powers on next tick.
        device.update(&state);
        assert!(device.awake());
    }

    #[test]
    fn test_manual_brightness_override() {
        let mut device = awake_device();
        let mut state = UiState::new();
        state.scene.started = true;
        state.scene.drive_cfg.brightness = 80;
        device.update(&state);
        assert_eq!(device.brightness(), 79); // 80 * 0.99
    }

    #[test]
    fn test_screen_off_countdown_dims_display() {
        let mut device = awake_device();
        let mut state = UiState::new();
        state.scene.started = true;
        state.scene.drive_cfg.screen_off_ticks = 3;
        state.scene.drive_cfg.brightness_off = 0;

        for _ in 0..10 {
            device.update(&state);
        }
        assert_eq!(device.brightness(), 0, "countdown expired, screen dimmed");

        // An alert restores the countdown and with it the backlight.
        state.scene.controls.alert_status = AlertStatus::Critical;
        device.update(&state);
        assert!(device.brightness() > 0);
    }
}
