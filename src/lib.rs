//! Scene-state core for a driver-assistance onroad display.
//!
//! This library contains everything testable on any host: the telemetry
//! intake, the per-tick scene reducer with its calibrated-space projection,
//! the UI status classifier, the onroad/offroad lifecycle gate, and the
//! display brightness/wakefulness machine. The binary (`main.rs`) wires the
//! tick loop to a demo telemetry source; a real deployment swaps in live
//! bus, params and camera implementations behind the same traits.
//!
//! # Architecture
//!
//! One thread, one loop. Each tick runs, in order: parameter refresh,
//! message poll, scene reduce, status classify, lifecycle gate, vision
//! pull, device update. The scene record is owned by that thread; anything
//! else treats it as a read-only snapshot between ticks. The only spawned
//! work is the detached best-effort backlight write.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod app;
pub mod config;
pub mod device;
pub mod lifecycle;
pub mod params;
pub mod projection;
pub mod state;
pub mod telemetry;
pub mod vision;

// Re-export the core surface at the crate root for existing imports
pub use app::App;
pub use lifecycle::{LifecycleGate, Transition};
pub use projection::{Calibration, CameraKind, ScreenPoint, ViewTransform, car_space_to_screen};
pub use state::{Scene, UiState, UiStatus, VertexBuffer};
pub use telemetry::{TelemetryBus, Topic, TopicUpdate};
