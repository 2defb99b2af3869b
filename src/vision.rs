//! Camera stream management.
//!
//! The vision layer owns two camera feeds (narrow road and wide road) and
//! keeps at most one connected. Connection is lazy: nothing happens until
//! the scene goes onroad, and the active feed is dropped on the offroad
//! edge. A receive timeout is logged and the frame skipped; it is never a
//! failure the rest of the core sees.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{FRAME_TIME, VISION_RECV_TIMEOUT};
use crate::projection::CameraKind;
use crate::state::scene::Scene;

/// One received camera frame. The pixel data itself lives with the
/// renderer; the core only tracks identity and geometry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CameraFrame {
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
}

/// A connectable camera stream.
pub trait CameraFeed {
    /// Attempt to connect. Non-blocking; returns whether it succeeded.
    fn connect(&mut self) -> bool;

    /// Receive the next frame, waiting at most `timeout`.
    fn recv(&mut self, timeout: Duration) -> Option<CameraFrame>;

    fn disconnect(&mut self);
}

/// Manages stream selection, lazy connection and the per-tick frame pull.
pub struct VisionStream<F> {
    road: F,
    wide: F,
    active: CameraKind,
    connected: bool,
    /// Most recently received frame, kept across short receive gaps so the
    /// renderer always has something to paint.
    pub last_frame: Option<CameraFrame>,
}

impl<F: CameraFeed> VisionStream<F> {
    pub fn new(road: F, wide: F) -> Self {
        Self {
            road,
            wide,
            active: CameraKind::Road,
            connected: false,
            last_frame: None,
        }
    }

    /// Choose which camera the next connection uses. Called by the
    /// lifecycle gate on the onroad edge, after the wide toggle is read.
    pub fn select(&mut self, camera: CameraKind) {
        self.active = camera;
    }

    #[inline]
    pub fn connected(&self) -> bool {
        self.connected
    }

    #[inline]
    pub fn active(&self) -> CameraKind {
        self.active
    }

    /// Drop the connection. Called on the offroad edge.
    pub fn teardown(&mut self) {
        if self.connected {
            self.feed_mut().disconnect();
        }
        self.connected = false;
        self.last_frame = None;
    }

    fn feed_mut(&mut self) -> &mut F {
        match self.active {
            CameraKind::Road => &mut self.road,
            CameraKind::Wide => &mut self.wide,
        }
    }

    /// Per-tick frame pull.
    ///
    /// Connects lazily while onroad; a fresh connection hides overlay
    /// geometry again until the next calibration message arrives. While
    /// waiting for a camera that is not up yet, sleeps one frame time so
    /// the loop does not spin.
    pub fn poll(&mut self, scene: &mut Scene) {
        if !self.connected && scene.started {
            if self.feed_mut().connect() {
                self.connected = true;
                // Invisible until we receive a calibration message.
                scene.world_objects_visible = false;
                debug!(camera = ?self.active, "camera stream connected");
            }
        }

        if self.connected {
            match self.feed_mut().recv(VISION_RECV_TIMEOUT) {
                Some(frame) => self.last_frame = Some(frame),
                None => warn!("camera frame receive timeout"),
            }
        } else if scene.started {
            std::thread::sleep(FRAME_TIME);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
