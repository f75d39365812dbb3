//! Step 5 (scoring) and step 6 (deduplication) of the planning pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use crate::zone::Strategy;

use super::{Journey, RoutePreference};

const ALPHA: f32 = 1.0;
const BETA: f32 = 0.2;
const GAMMA: f32 = 0.3;

/// `x / max_x`, clamped to `[0, 1]`. A `max_x` of zero means every candidate
/// is tied on that axis, so every candidate normalizes to zero.
fn normalize(x: f32, max_x: f32) -> f32 {
    if max_x <= f32::EPSILON {
        0.0
    } else {
        (x / max_x).clamp(0.0, 1.0)
    }
}

struct Maxima {
    travel_seconds: f32,
    transfer_count: f32,
    walk_meters: f32,
    cost: f32,
}

fn maxima(journeys: &[Journey]) -> Maxima {
    let mut maxima = Maxima {
        travel_seconds: 0.0,
        transfer_count: 0.0,
        walk_meters: 0.0,
        cost: 0.0,
    };
    for journey in journeys {
        maxima.travel_seconds = maxima.travel_seconds.max(journey.travel_seconds as f32);
        maxima.transfer_count = maxima.transfer_count.max(journey.transfer_count as f32);
        maxima.walk_meters = maxima.walk_meters.max(journey.walk_meters.as_meters());
        maxima.cost = maxima.cost.max(journey.cost as f32);
    }
    maxima
}

fn mobility_bonus(journey: &Journey, preference: &RoutePreference) -> f32 {
    let mobility_segments: Vec<_> = journey
        .segments
        .iter()
        .filter_map(|segment| match &segment.kind {
            crate::planner::journey::SegmentKind::Mobility(mode) => Some(*mode),
            _ => None,
        })
        .collect();
    if mobility_segments.is_empty() {
        return 0.0;
    }
    let sum: f32 = mobility_segments.iter().map(|mode| preference.mobility_weight(*mode)).sum();
    sum / mobility_segments.len() as f32
}

fn strategy_bonus(journey: &Journey, strategy: &Strategy) -> f32 {
    let total = journey.travel_seconds as f32;
    if total <= f32::EPSILON {
        return 0.0;
    }
    let mobility_fraction = journey.mobility_seconds() as f32 / total;
    let transit_fraction = journey.transit_seconds() as f32 / total;
    strategy.mobility_weight * mobility_fraction + strategy.transit_weight * transit_fraction
}

/// Lower is better. See the multimodal planner's scoring step.
pub(crate) fn score(journey: &Journey, preference: &RoutePreference, strategy: &Strategy, maxima: &Maxima) -> f32 {
    let (time_weight, transfer_weight, walk_weight, cost_weight) = preference.normalized_weights();
    ALPHA * time_weight * normalize(journey.travel_seconds as f32, maxima.travel_seconds)
        + ALPHA * transfer_weight * normalize(journey.transfer_count as f32, maxima.transfer_count)
        + ALPHA * walk_weight * normalize(journey.walk_meters.as_meters(), maxima.walk_meters)
        + ALPHA * cost_weight * normalize(journey.cost as f32, maxima.cost)
        - BETA * mobility_bonus(journey, preference)
        - GAMMA * strategy_bonus(journey, strategy)
}

/// A journey dominates another when it is no worse on every one of
/// (time, transfers, walk, cost) and strictly better on at least one, the
/// same four-axis definition RAPTOR labels use for their own domination
/// check, applied here across the whole candidate set rather than within
/// one target stop's label set.
fn dominates_journey(a: &Journey, b: &Journey) -> bool {
    let le = a.travel_seconds <= b.travel_seconds
        && a.transfer_count <= b.transfer_count
        && a.walk_meters <= b.walk_meters
        && a.cost <= b.cost;
    let lt = a.travel_seconds < b.travel_seconds
        || a.transfer_count < b.transfer_count
        || a.walk_meters < b.walk_meters
        || a.cost < b.cost;
    le && lt
}

/// Drops any candidate dominated by another candidate in the same set.
/// Mirrors `raptor::dominant_labels`'s keep-scan, but over scored journeys
/// drawn from every candidate source (direct mobility, pure walk, transit,
/// hybrid) rather than one RAPTOR target stop's labels.
fn drop_dominated(scored: Vec<(f32, Journey)>) -> Vec<(f32, Journey)> {
    let mut kept: Vec<(f32, Journey)> = Vec::new();
    'outer: for (s, journey) in scored {
        for (_, kept_journey) in &kept {
            if dominates_journey(kept_journey, &journey) {
                continue 'outer;
            }
        }
        kept.retain(|(_, kept_journey)| !dominates_journey(&journey, kept_journey));
        kept.push((s, journey));
    }
    kept
}

/// Scores every candidate, drops any journey dominated by another candidate
/// (§4.4's dominated-label definition, applied across the full candidate
/// set), sorts ascending, then drops duplicates: two journeys sharing the
/// same ordered sequence of transit route ids whose total times differ by at
/// most 30 seconds are the same itinerary, and the lower-scoring one wins.
pub(crate) fn rank(journeys: Vec<Journey>, preference: &RoutePreference, strategy: &Strategy) -> Vec<Journey> {
    if journeys.is_empty() {
        return journeys;
    }
    let bounds = maxima(&journeys);
    let scored: Vec<(f32, Journey)> = journeys
        .into_iter()
        .map(|journey| {
            let s = score(&journey, preference, strategy, &bounds);
            (s, journey)
        })
        .collect();

    let mut non_dominated = drop_dominated(scored);
    non_dominated.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut kept: Vec<(f32, Journey, Vec<Arc<str>>)> = Vec::new();
    'outer: for (s, journey) in non_dominated {
        let route_key: Vec<Arc<str>> = journey.segments.iter().filter_map(|seg| seg.transit_route_id().cloned()).collect();
        for (_, kept_journey, kept_key) in &kept {
            if *kept_key == route_key && journey.travel_seconds.abs_diff(kept_journey.travel_seconds) <= 30 {
                continue 'outer;
            }
        }
        kept.push((s, journey, route_key));
    }

    kept.into_iter().map(|(_, journey, _)| journey).take(5).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::journey::{Segment, SegmentKind};
    use crate::shared::{geo::Distance, time::Time};

    fn walk_journey(travel_seconds: u32, strategy: &'static str) -> Journey {
        let segments = vec![Segment::walk(
            Time::from_seconds(0),
            Time::from_seconds(travel_seconds),
            Distance::from_meters(travel_seconds as f32),
        )];
        Journey {
            segments,
            travel_seconds,
            walk_meters: Distance::from_meters(travel_seconds as f32),
            transfer_count: 0,
            cost: 0,
            strategy,
        }
    }

    #[test]
    fn shorter_walk_scores_lower() {
        let preference = RoutePreference::default();
        let strategy = crate::zone::strategy_for(0);
        let short = walk_journey(100, strategy.name);
        let long = walk_journey(900, strategy.name);
        let bounds = maxima(&[short.clone(), long.clone()]);
        let short_score = score(&short, &preference, &strategy, &bounds);
        let long_score = score(&long, &preference, &strategy, &bounds);
        assert!(short_score < long_score);
    }

    #[test]
    fn dedup_keeps_lower_scoring_near_duplicate() {
        let preference = RoutePreference::default();
        let strategy = crate::zone::strategy_for(0);
        let a = walk_journey(300, strategy.name);
        let mut b = walk_journey(310, strategy.name);
        b.cost = 500;
        let ranked = rank(vec![a, b], &preference, &strategy);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].cost, 0);
    }

    #[test]
    fn unrelated_near_duration_journeys_both_survive() {
        let preference = RoutePreference::default();
        let strategy = crate::zone::strategy_for(0);
        // Faster but pricier (transit fare) vs free but slower: neither
        // dominates the other, and their route keys differ, so both should
        // survive rank()'s domination and dedup passes.
        let mut a = walk_journey(300, strategy.name);
        a.cost = 50;
        a.segments.push(Segment {
            kind: SegmentKind::Transit {
                route_id: Arc::from("r1"),
                line_label: "Bus 1".into(),
                board_stop: Arc::from("s1"),
                alight_stop: Arc::from("s2"),
            },
            departure_time: Time::from_seconds(0),
            arrival_time: Time::from_seconds(300),
            distance: Distance::from_meters(0.0),
            cost: 0,
        });
        let b = walk_journey(305, strategy.name);
        let ranked = rank(vec![a, b], &preference, &strategy);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn strictly_worse_candidate_is_dropped_as_dominated() {
        // `worse` carries a different route key than `better` (one has a
        // transit leg, the other is pure walk) so the dedup pass's same-key
        // check can't be what removes it; only the domination pass can.
        let preference = RoutePreference::default();
        let strategy = crate::zone::strategy_for(0);
        let better = walk_journey(100, strategy.name);
        let mut worse = walk_journey(150, strategy.name);
        worse.cost = 500;
        worse.segments.push(Segment {
            kind: SegmentKind::Transit {
                route_id: Arc::from("r9"),
                line_label: "Bus 9".into(),
                board_stop: Arc::from("s1"),
                alight_stop: Arc::from("s2"),
            },
            departure_time: Time::from_seconds(0),
            arrival_time: Time::from_seconds(150),
            distance: Distance::from_meters(0.0),
            cost: 0,
        });
        let ranked = rank(vec![better, worse], &preference, &strategy);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].cost, 0);
    }
}
