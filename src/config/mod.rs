//! Application configuration.
//!
//! - `display`: Framebuffer, camera and overlay-geometry constants
//! - `timing`: Tick rate, cadences, countdowns and filter constants

pub mod display;
pub mod timing;

// Re-export display constants at config level for convenience
pub use display::{
    CAM_FRAME_HEIGHT,
    CAM_FRAME_WIDTH,
    CLIP_MARGIN,
    FB_HEIGHT,
    FB_WIDTH,
    LANE_LINE_OFFSET,
    LEAD_CONF_THRESHOLD,
    MAX_DRAW_DISTANCE,
    MAX_EXPOSURE_GAIN,
    MAX_EXPOSURE_LINES,
    MIN_DRAW_DISTANCE,
    NIGHT_GAIN_HEADROOM,
    PATH_EDGE_OFFSET,
    PATH_HEIGHT,
    POLYGON_CAPACITY,
    ROAD_CAM_FOCAL,
    ROAD_VIEW_Y_OFFSET,
    TRAJECTORY_SIZE,
    VIEW_ZOOM,
    WIDE_CAM_FOCAL,
};
// Re-export timing constants at config level for convenience
pub use timing::{
    ACCEL_SAMPLES,
    ACCEL_TAP_THRESHOLD,
    AWAKE_TIMEOUT_TICKS,
    BACKLIGHT_B,
    BACKLIGHT_DT,
    BACKLIGHT_M,
    BACKLIGHT_OFFROAD,
    BACKLIGHT_TS,
    BLINKER_RESET_TICKS,
    ENGAGEABILITY_REFRESH_TICKS,
    FRAME_TIME,
    GYRO_TAP_THRESHOLD,
    PANDA_STALE_TICKS,
    PARAM_REFRESH_TICKS,
    UI_FREQ,
    VISION_RECV_TIMEOUT,
};
