//! Per-tick UI state: the scene record, its reducer and the status value.

pub mod reducer;
pub mod scene;
pub mod status;

pub use scene::{DriveConfig, Scene, VertexBuffer};
pub use status::UiStatus;

use crate::projection::{CameraKind, ViewTransform};

/// Everything the tick loop owns and the renderer reads.
///
/// Passed explicitly to each component's entry point; there is no global
/// application state.
#[derive(Clone, PartialEq, Debug)]
pub struct UiState {
    pub scene: Scene,
    pub status: UiStatus,
    /// Whether the wide camera was selected for this drive.
    pub wide_camera: bool,
    /// Screen mapping for the active camera, rebuilt per onroad transition.
    pub view: ViewTransform,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            scene: Scene::default(),
            status: UiStatus::Disengaged,
            wide_camera: false,
            view: ViewTransform::default(),
        }
    }

    /// Camera selected for the current drive.
    #[inline]
    pub fn camera_kind(&self) -> CameraKind {
        if self.wide_camera { CameraKind::Wide } else { CameraKind::Road }
    }
}

impl Default for UiState {
    fn default() -> Self { Self::new() }
}
