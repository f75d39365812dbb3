use serde::Serialize;
use transect::{
    PlanResult,
    mobility::MobilityMode,
    planner::{Journey, Segment, SegmentKind},
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKindDto {
    Walk,
    Mobility {
        mode: MobilityMode,
    },
    Transit {
        route_id: String,
        line_label: String,
        board_stop: String,
        alight_stop: String,
    },
}

impl From<&SegmentKind> for SegmentKindDto {
    fn from(value: &SegmentKind) -> Self {
        match value {
            SegmentKind::Walk => SegmentKindDto::Walk,
            SegmentKind::Mobility(mode) => SegmentKindDto::Mobility { mode: *mode },
            SegmentKind::Transit {
                route_id,
                line_label,
                board_stop,
                alight_stop,
            } => SegmentKindDto::Transit {
                route_id: route_id.to_string(),
                line_label: line_label.clone(),
                board_stop: board_stop.to_string(),
                alight_stop: alight_stop.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentDto {
    pub kind: SegmentKindDto,
    pub departure_time: u32,
    pub arrival_time: u32,
    pub distance_meters: f32,
    pub cost: u32,
}

impl From<&Segment> for SegmentDto {
    fn from(value: &Segment) -> Self {
        Self {
            kind: (&value.kind).into(),
            departure_time: value.departure_time.as_seconds(),
            arrival_time: value.arrival_time.as_seconds(),
            distance_meters: value.distance.as_meters(),
            cost: value.cost,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyDto {
    pub segments: Vec<SegmentDto>,
    pub travel_seconds: u32,
    pub walk_meters: f32,
    pub transfer_count: u32,
    pub cost: u32,
    pub strategy: &'static str,
}

impl From<&Journey> for JourneyDto {
    fn from(value: &Journey) -> Self {
        Self {
            segments: value.segments.iter().map(SegmentDto::from).collect(),
            travel_seconds: value.travel_seconds,
            walk_meters: value.walk_meters.as_meters(),
            transfer_count: value.transfer_count,
            cost: value.cost,
            strategy: value.strategy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResultDto {
    pub strategy: &'static str,
    pub journeys: Vec<JourneyDto>,
    pub timed_out: bool,
}

impl From<&PlanResult> for PlanResultDto {
    fn from(value: &PlanResult) -> Self {
        Self {
            strategy: value.strategy,
            journeys: value.journeys.iter().map(JourneyDto::from).collect(),
            timed_out: value.timed_out,
        }
    }
}
