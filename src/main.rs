//! Demo driver for the onroad scene core.
//!
//! Runs the tick loop against the scripted telemetry source and logs a
//! one-line scene summary every second. Pass an optional tick count to run
//! a bounded session:
//!
//! ```bash
//! onroad 600    # run 30 seconds of simulated driving, then exit
//! ```

use std::time::Instant;

use tracing::info;

use onroad_ui::app::App;
use onroad_ui::config::{FRAME_TIME, UI_FREQ};
use onroad_ui::device::{Device, NoopHardware};
use onroad_ui::params::MemParams;
use onroad_ui::projection::CameraKind;
use onroad_ui::telemetry::TelemetryBus;
use onroad_ui::telemetry::demo::DemoBus;
use onroad_ui::vision::{CameraFeed, CameraFrame, VisionStream};

/// Camera feed producing synthetic frame handles at the loop rate.
struct DemoFeed {
    camera: CameraKind,
    next_frame: u64,
}

impl DemoFeed {
    const fn new(camera: CameraKind) -> Self {
        Self { camera, next_frame: 0 }
    }
}

impl CameraFeed for DemoFeed {
    fn connect(&mut self) -> bool {
        true
    }

    fn recv(&mut self, _timeout: std::time::Duration) -> Option<CameraFrame> {
        self.next_frame += 1;
        Some(CameraFrame { frame_id: self.next_frame, width: 1928, height: 1208 })
    }

    fn disconnect(&mut self) {
        info!(camera = ?self.camera, "camera stream closed");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let max_ticks: Option<u64> = std::env::args().nth(1).and_then(|arg| arg.parse().ok());

    let mut params = MemParams::new();
    params.put("IsMetric", "1");
    params.put("LanelessMode", "2");

    let mut app = App::new(
        DemoBus::new(),
        params,
        VisionStream::new(DemoFeed::new(CameraKind::Road), DemoFeed::new(CameraKind::Wide)),
        Device::new(NoopHardware),
    );

    info!("onroad demo loop starting");
    loop {
        let tick_start = Instant::now();
        app.tick();

        let frame = app.bus().frame();
        if frame % UI_FREQ as u64 == 0 {
            let scene = &app.state.scene;
            info!(
                frame,
                started = scene.started,
                status = ?app.state.status,
                v_ego = format!("{:.1}", scene.vehicle.v_ego),
                path_verts = scene.model.track_vertices.len(),
                lead_x = format!("{:.1}", app.bus().model().leads[0].x),
                brightness = app.device().brightness(),
                "scene"
            );
        }

        if let Some(max) = max_ticks {
            if frame >= max {
                info!(frame, "tick budget reached, exiting");
                break;
            }
        }

        // Hold the loop to the nominal tick rate.
        if let Some(remaining) = FRAME_TIME.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
