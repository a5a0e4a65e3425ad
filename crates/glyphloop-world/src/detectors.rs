//! Read-only loop and cluster detection, and world-event narration.
//!
//! Nothing here mutates the world. The driver may call [`narrate`] at any
//! cadence; the core feedback loop does not depend on it.

use std::cmp::Ordering;
use std::fmt;

use glyphloop_types::{InkQuantum, Stroke, StrokePoint};
use serde::{Deserialize, Serialize};

use crate::observe::compute_instant;
use crate::spatial_hash::{SpatialHash, cell_index};
use crate::state::WorldState;

/// Endpoint distance under which two strokes are considered linked.
pub const DEFAULT_LOOP_TOLERANCE: f64 = 0.02;

/// Longest stroke chain followed when looking for a loop.
const MAX_CHAIN: usize = 16;

/// Fewest strokes that make a loop.
const MIN_CHAIN: usize = 3;

/// Side length of the cluster grid.
const CLUSTER_GRID: usize = 8;

/// Mean coherence a cell needs to count as a cluster.
const CLUSTER_COHERENCE: f64 = 0.7;

/// Recent-event count reported as a splatter burst.
const SPLATTER_EVENTS: f64 = 3.0;

/// Sync index reported as a phase lock.
const PHASE_LOCK_SYNC: f64 = 0.85;

/// A closed chain of strokes, each starting where the previous one ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeLoop {
    /// Stroke indices in chain order.
    pub stroke_indices: Vec<usize>,
    /// Centroid of all points in the loop.
    pub x: f64,
    /// Centroid of all points in the loop.
    pub y: f64,
}

/// A dense, coherent patch of quanta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Centroid x.
    pub x: f64,
    /// Centroid y.
    pub y: f64,
    /// Quanta in the cell.
    pub size: usize,
    /// Mean coherence of those quanta.
    pub coherence: f64,
}

/// Something notable that happened in the world, for narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    /// Strokes closed into a loop.
    LoopClosed {
        /// Strokes in the loop.
        strokes: usize,
        /// Loop centroid x.
        x: f64,
        /// Loop centroid y.
        y: f64,
    },
    /// A dense coherent cluster is present.
    ClusterFormed(Cluster),
    /// Scribes have been splattering ink.
    SplatterBurst {
        /// Decayed recent-event count.
        recent_events: f64,
    },
    /// Phases have locked across the population.
    PhaseLock {
        /// Current sync index.
        sync: f64,
    },
}

impl fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoopClosed { strokes, x, y } => write!(
                f,
                "a loop of {strokes} strokes closed {}",
                region(*x, *y)
            ),
            Self::ClusterFormed(c) => write!(
                f,
                "{} quanta gathered {} at coherence {:.2}",
                c.size,
                region(c.x, c.y),
                c.coherence
            ),
            Self::SplatterBurst { recent_events } => {
                write!(f, "ink splattered ({recent_events:.1} recent bursts)")
            }
            Self::PhaseLock { sync } => write!(f, "the rings pulse as one (sync {sync:.2})"),
        }
    }
}

/// Find closed chains of strokes by endpoint proximity.
///
/// A chain links stroke `a` to stroke `b` when `b` starts within
/// `tolerance` of where `a` ends; the nearest start wins. A loop is a chain
/// of at least three strokes whose last end returns to its first start.
/// Each stroke belongs to at most one reported loop.
pub fn detect_loops(strokes: &[Stroke], tolerance: f64) -> Vec<StrokeLoop> {
    let tolerance = tolerance.max(0.0);
    let mut starts = SpatialHash::new();
    starts.rebuild(strokes.iter().map(|s| first(s).map_or((-1.0, -1.0), |p| (p.x, p.y))));

    let mut claimed = vec![false; strokes.len()];
    let mut loops = Vec::new();

    for origin in 0..strokes.len() {
        if claimed.get(origin).copied().unwrap_or(true) {
            continue;
        }
        let Some(home) = strokes.get(origin).and_then(first) else {
            continue;
        };

        let mut chain = vec![origin];
        let mut current = origin;
        while chain.len() <= MAX_CHAIN {
            let Some(end) = strokes.get(current).and_then(last) else {
                break;
            };
            if chain.len() >= MIN_CHAIN && dist(end, home) <= tolerance {
                loops.push(close_loop(strokes, &chain));
                for &i in &chain {
                    if let Some(c) = claimed.get_mut(i) {
                        *c = true;
                    }
                }
                break;
            }
            let Some(next) = nearest_start(strokes, &starts, end, tolerance, &chain, &claimed)
            else {
                break;
            };
            chain.push(next);
            current = next;
        }
    }
    loops
}

/// Find grid cells holding many coherent quanta.
///
/// A cell qualifies with at least `max(8, n / 32)` quanta and a mean
/// coherence of 0.7 or more.
pub fn detect_clusters(quanta: &[InkQuantum]) -> Vec<Cluster> {
    let min_size = (quanta.len() / 32).max(8);
    let mut cells = vec![(0_usize, 0.0_f64, 0.0_f64, 0.0_f64); CLUSTER_GRID * CLUSTER_GRID];
    for q in quanta {
        let cell = cell_index(q.x, q.y, CLUSTER_GRID);
        if let Some((count, sx, sy, coh)) = cells.get_mut(cell) {
            *count += 1;
            *sx += q.x;
            *sy += q.y;
            *coh += q.coherence;
        }
    }
    cells
        .into_iter()
        .filter(|&(count, ..)| count >= min_size)
        .map(|(count, sx, sy, coh)| {
            let n = count as f64;
            Cluster {
                x: sx / n,
                y: sy / n,
                size: count,
                coherence: coh / n,
            }
        })
        .filter(|c| c.coherence >= CLUSTER_COHERENCE)
        .collect()
}

/// Collect the notable events of the current world state.
pub fn narrate(state: &WorldState) -> Vec<WorldEvent> {
    let mut events: Vec<WorldEvent> = detect_loops(&state.strokes, DEFAULT_LOOP_TOLERANCE)
        .into_iter()
        .map(|l| WorldEvent::LoopClosed {
            strokes: l.stroke_indices.len(),
            x: l.x,
            y: l.y,
        })
        .collect();
    events.extend(
        detect_clusters(&state.quanta)
            .into_iter()
            .map(WorldEvent::ClusterFormed),
    );
    if state.recent_events >= SPLATTER_EVENTS {
        events.push(WorldEvent::SplatterBurst {
            recent_events: state.recent_events,
        });
    }
    let sync = compute_instant(state).sync_index;
    if !state.quanta.is_empty() && sync >= PHASE_LOCK_SYNC {
        events.push(WorldEvent::PhaseLock { sync });
    }
    events
}

fn nearest_start(
    strokes: &[Stroke],
    starts: &SpatialHash,
    end: StrokePoint,
    tolerance: f64,
    chain: &[usize],
    claimed: &[bool],
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    starts.for_each_candidate(end.x, end.y, tolerance, |i| {
        if chain.contains(&i) || claimed.get(i).copied().unwrap_or(true) {
            return;
        }
        let Some(start) = strokes.get(i).and_then(first) else {
            return;
        };
        let d = dist(start, end);
        if d > tolerance {
            return;
        }
        // Ties go to the lower index so results do not depend on bucket order.
        let better = best.is_none_or(|(bi, bd)| match d.total_cmp(&bd) {
            Ordering::Less => true,
            Ordering::Equal => i < bi,
            Ordering::Greater => false,
        });
        if better {
            best = Some((i, d));
        }
    });
    best.map(|(i, _)| i)
}

fn close_loop(strokes: &[Stroke], chain: &[usize]) -> StrokeLoop {
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut n = 0_usize;
    for p in chain
        .iter()
        .filter_map(|&i| strokes.get(i))
        .flat_map(|s| s.points.iter())
    {
        sx += p.x;
        sy += p.y;
        n += 1;
    }
    let n = n.max(1) as f64;
    StrokeLoop {
        stroke_indices: chain.to_vec(),
        x: sx / n,
        y: sy / n,
    }
}

fn first(stroke: &Stroke) -> Option<StrokePoint> {
    stroke.points.first().copied()
}

fn last(stroke: &Stroke) -> Option<StrokePoint> {
    stroke.points.last().copied()
}

fn dist(a: StrokePoint, b: StrokePoint) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Coarse compass description of a position.
fn region(x: f64, y: f64) -> &'static str {
    let dx = x - 0.5;
    let dy = y - 0.5;
    if dx.hypot(dy) < 0.1 {
        return "at the center";
    }
    match (dy > dx.abs() * 0.5, dy < -dx.abs() * 0.5, dx > 0.0) {
        (true, _, _) => "in the north",
        (_, true, _) => "in the south",
        (_, _, true) => "in the east",
        _ => "in the west",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glyphloop_types::{RingBand, SessionParams};

    use super::*;
    use crate::state::create;

    fn segment(from: (f64, f64), to: (f64, f64)) -> Stroke {
        Stroke {
            points: vec![
                StrokePoint {
                    x: from.0,
                    y: from.1,
                },
                StrokePoint { x: to.0, y: to.1 },
            ],
            thickness: 0.002,
            initial_alpha: 0.5,
            alpha: 0.5,
            age: 0.0,
            max_age: 40.0,
        }
    }

    fn quantum(x: f64, y: f64, coherence: f64) -> InkQuantum {
        InkQuantum {
            id: 0,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            phase: 0.0,
            phase_vel: 1.0,
            charge: 0.5,
            coherence,
            intent: 0.0,
            ink: 0.5,
            scribe_affinity: 0.5,
            band: RingBand::Outer,
        }
    }

    #[test]
    fn triangle_of_strokes_is_a_loop() {
        let strokes = vec![
            segment((0.4, 0.4), (0.6, 0.4)),
            segment((0.6, 0.4), (0.5, 0.6)),
            segment((0.5, 0.6), (0.4, 0.4)),
        ];
        let loops = detect_loops(&strokes, 0.01);
        assert_eq!(loops.len(), 1);
        let l = loops.first().cloned().unwrap_or(StrokeLoop {
            stroke_indices: Vec::new(),
            x: 0.0,
            y: 0.0,
        });
        assert_eq!(l.stroke_indices, vec![0, 1, 2]);
        assert!((l.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn open_chain_is_not_a_loop() {
        let strokes = vec![
            segment((0.1, 0.1), (0.2, 0.1)),
            segment((0.2, 0.1), (0.3, 0.1)),
            segment((0.3, 0.1), (0.4, 0.1)),
        ];
        assert!(detect_loops(&strokes, 0.01).is_empty());
    }

    #[test]
    fn two_strokes_never_close_a_loop() {
        let strokes = vec![
            segment((0.4, 0.4), (0.6, 0.4)),
            segment((0.6, 0.4), (0.4, 0.4)),
        ];
        assert!(detect_loops(&strokes, 0.01).is_empty());
    }

    #[test]
    fn dense_coherent_cell_is_a_cluster() {
        let mut quanta: Vec<InkQuantum> = (0..12).map(|_| quantum(0.31, 0.31, 0.9)).collect();
        quanta.extend((0..12).map(|_| quantum(0.81, 0.81, 0.2)));
        let clusters = detect_clusters(&quanta);
        assert_eq!(clusters.len(), 1);
        let c = clusters.first().copied();
        assert_eq!(c.map(|c| c.size), Some(12));
    }

    #[test]
    fn sparse_cells_are_ignored() {
        let quanta: Vec<InkQuantum> = (0..7).map(|_| quantum(0.5, 0.5, 1.0)).collect();
        assert!(detect_clusters(&quanta).is_empty());
    }

    #[test]
    fn narration_reports_phase_lock_and_serializes() {
        let params = SessionParams {
            agent_count: 40,
            ..SessionParams::default()
        };
        let mut world = create(&params);
        for q in &mut world.quanta {
            q.phase = 0.3;
        }
        world.recent_events = 4.0;
        let events = narrate(&world);
        assert!(events.iter().any(|e| matches!(e, WorldEvent::PhaseLock { .. })));
        assert!(events.iter().any(|e| matches!(e, WorldEvent::SplatterBurst { .. })));
        let json = serde_json::to_string(&events).unwrap();
        assert!(json.contains("phase_lock"));
        let text: Vec<String> = events.iter().map(ToString::to_string).collect();
        assert!(text.iter().any(|t| t.contains("pulse as one")));
    }

    #[test]
    fn regions_read_like_a_compass() {
        assert_eq!(region(0.5, 0.5), "at the center");
        assert_eq!(region(0.5, 0.9), "in the north");
        assert_eq!(region(0.5, 0.1), "in the south");
        assert_eq!(region(0.9, 0.5), "in the east");
        assert_eq!(region(0.1, 0.5), "in the west");
    }
}
