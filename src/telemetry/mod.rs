//! Telemetry intake: topics, snapshot bus and per-topic deltas.
//!
//! The bus is a snapshot provider, not a queue: it always exposes the
//! latest value of every topic plus a per-tick "was updated" flag and the
//! tick at which each topic last updated. The reducer turns the updated
//! flags into explicit [`TopicUpdate`] deltas so that the "never partially
//! write a field group" invariant is carried by the type system instead of
//! by convention.

pub mod demo;
pub mod messages;

pub use messages::{
    AlertStatus,
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
    TirePressure,
};

/// The independently-updating topics consumed by the core.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Topic {
    CarState,
    ControlsState,
    Model,
    Calibration,
    DeviceState,
    Gps,
    Panda,
    CarParams,
    Sensors,
    RoadCamera,
    LateralPlan,
    MapData,
}

impl Topic {
    /// All topics, in the order the reducer applies them.
    pub const ALL: [Topic; 12] = [
        Topic::ControlsState,
        Topic::CarState,
        Topic::Model,
        Topic::Calibration,
        Topic::DeviceState,
        Topic::Gps,
        Topic::Panda,
        Topic::CarParams,
        Topic::Sensors,
        Topic::RoadCamera,
        Topic::LateralPlan,
        Topic::MapData,
    ];

    /// Position of this topic in [`Topic::ALL`]; buses use it to index
    /// their per-topic bookkeeping arrays.
    pub const fn index(self) -> usize {
        match self {
            Topic::ControlsState => 0,
            Topic::CarState => 1,
            Topic::Model => 2,
            Topic::Calibration => 3,
            Topic::DeviceState => 4,
            Topic::Gps => 5,
            Topic::Panda => 6,
            Topic::CarParams => 7,
            Topic::Sensors => 8,
            Topic::RoadCamera => 9,
            Topic::LateralPlan => 10,
            Topic::MapData => 11,
        }
    }
}

/// Number of topics; also the capacity of one tick's delta batch.
pub const TOPIC_COUNT: usize = Topic::ALL.len();

/// Latest-value snapshot provider for all consumed topics.
///
/// `poll` advances one tick: it refreshes the updated flags and bumps the
/// frame counter. It may block briefly waiting for fresh data; everything
/// else is non-blocking reads of the held snapshots.
pub trait TelemetryBus {
    fn poll(&mut self);

    /// Monotonic tick counter.
    fn frame(&self) -> u64;

    /// Whether `topic` received fresh data during the last `poll`.
    fn updated(&self, topic: Topic) -> bool;

    /// Tick at which `topic` last received fresh data.
    fn rcv_frame(&self, topic: Topic) -> u64;

    fn car_state(&self) -> &CarStateMsg;
    fn controls_state(&self) -> &ControlsStateMsg;
    fn model(&self) -> &ModelMsg;
    fn calibration(&self) -> &CalibrationMsg;
    fn device_state(&self) -> &DeviceStateMsg;
    fn gps(&self) -> &GpsMsg;
    fn panda(&self) -> &PandaMsg;
    fn car_params(&self) -> &CarParamsMsg;
    fn sensors(&self) -> &SensorEventsMsg;
    fn road_camera(&self) -> &CameraStateMsg;
    fn lateral_plan(&self) -> &LateralPlanMsg;
    fn map_data(&self) -> &MapDataMsg;
}

/// One topic's worth of fresh data for this tick.
///
/// A delta carries the entire snapshot of exactly one topic, so applying it
/// can only ever touch that topic's field group in the scene.
#[derive(Clone, PartialEq, Debug)]
pub enum TopicUpdate {
    ControlsState(ControlsStateMsg),
    CarState(CarStateMsg),
    Model(ModelMsg),
    Calibration(CalibrationMsg),
    DeviceState(DeviceStateMsg),
    Gps(GpsMsg),
    Panda(PandaMsg),
    CarParams(CarParamsMsg),
    Sensors(SensorEventsMsg),
    RoadCamera(CameraStateMsg),
    LateralPlan(LateralPlanMsg),
    MapData(MapDataMsg),
}

/// Batch of deltas for one tick, at most one per topic.
pub type UpdateBatch = heapless::Vec<TopicUpdate, TOPIC_COUNT>;

/// Snapshot every topic that updated this tick into an explicit delta.
pub fn collect_updates<B: TelemetryBus + ?Sized>(bus: &B) -> UpdateBatch {
    let mut batch = UpdateBatch::new();
    for topic in Topic::ALL {
        if !bus.updated(topic) {
            continue;
        }
        let update = match topic {
            Topic::ControlsState => TopicUpdate::ControlsState(bus.controls_state().clone()),
            Topic::CarState => TopicUpdate::CarState(*bus.car_state()),
            Topic::Model => TopicUpdate::Model(bus.model().clone()),
            Topic::Calibration => TopicUpdate::Calibration(*bus.calibration()),
            Topic::DeviceState => TopicUpdate::DeviceState(*bus.device_state()),
            Topic::Gps => TopicUpdate::Gps(*bus.gps()),
            Topic::Panda => TopicUpdate::Panda(*bus.panda()),
            Topic::CarParams => TopicUpdate::CarParams(*bus.car_params()),
            Topic::Sensors => TopicUpdate::Sensors(bus.sensors().clone()),
            Topic::RoadCamera => TopicUpdate::RoadCamera(*bus.road_camera()),
            Topic::LateralPlan => TopicUpdate::LateralPlan(*bus.lateral_plan()),
            Topic::MapData => TopicUpdate::MapData(*bus.map_data()),
        };
        // Cannot overflow: at most one delta per topic.
        let _ = batch.push(update);
    }
    batch
}

// =============================================================================
// Test Bus
// =============================================================================

/// Scriptable bus for unit tests: set snapshots and updated flags by hand,
/// then `poll` to advance the frame counter.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Default)]
    pub struct TestBus {
        pub frame: u64,
        pub updated: [bool; TOPIC_COUNT],
        pub rcv_frames: [u64; TOPIC_COUNT],
        pub car_state: CarStateMsg,
        pub controls_state: ControlsStateMsg,
        pub model: ModelMsg,
        pub calibration: CalibrationMsg,
        pub device_state: DeviceStateMsg,
        pub gps: GpsMsg,
        pub panda: PandaMsg,
        pub car_params: CarParamsMsg,
        pub sensors: SensorEventsMsg,
        pub road_camera: CameraStateMsg,
        pub lateral_plan: LateralPlanMsg,
        pub map_data: MapDataMsg,
    }

    impl TestBus {
        pub fn mark_updated(&mut self, topic: Topic) {
            self.updated[topic.index()] = true;
            self.rcv_frames[topic.index()] = self.frame;
        }

        pub fn clear_updated(&mut self) {
            self.updated = [false; TOPIC_COUNT];
        }
    }

    impl TelemetryBus for TestBus {
        fn poll(&mut self) {
            self.frame += 1;
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
}

#[cfg(test)]
mod tests {
    use super::testing::TestBus;
    use super::*;

    #[test]
    fn test_collect_updates_empty_when_nothing_updated() {
        let bus = TestBus::default();
        assert!(collect_updates(&bus).is_empty());
    }

    #[test]
    fn test_collect_updates_one_delta_per_updated_topic() {
        let mut bus = TestBus::default();
        bus.mark_updated(Topic::CarState);
        bus.mark_updated(Topic::Gps);
        let batch = collect_updates(&bus);
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().any(|u| matches!(u, TopicUpdate::CarState(_))));
        assert!(batch.iter().any(|u| matches!(u, TopicUpdate::Gps(_))));
    }

    #[test]
    fn test_collect_updates_never_exceeds_topic_count() {
        let mut bus = TestBus::default();
        for topic in Topic::ALL {
            bus.mark_updated(topic);
        }
        assert_eq!(collect_updates(&bus).len(), TOPIC_COUNT);
    }
}
