//! Ring conversion
//!
//! Runs immediately after a blue sphere is converted to red. A
//! best-first search looks for the cheapest closed walk of red spheres
//! through the converted cell that encloses at least one blue sphere;
//! on success the enclosed blue region is flood-filled to rings and the
//! walk itself is recolored to rings.
//!
//! Walk legality: steps are unit cardinals, u-turns are never candidates,
//! and after a quarter turn the step that would complete a 2x2 box is
//! forbidden at the next node. Cells whose eight neighbors are all red
//! are dead ends, and author-flagged avoid-search cells generate no
//! children.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use glam::IVec2;

use crate::stage::{AvoidSearch, ObjectKind, Stage};
use crate::{rotate_ccw, rotate_cw};

const CARDINALS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

const NEIGHBORS8: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// One node on the search frontier. Positions are stored wrapped.
#[derive(Debug, Clone)]
struct SearchState {
    path: Vec<IVec2>,
    direction: IVec2,
    forbidden_turn: IVec2,
    score: i32,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.path.len() == other.path.len()
    }
}

impl Eq for SearchState {}

impl Ord for SearchState {
    // Reversed so the BinaryHeap pops the lowest score; shorter walks
    // break ties
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.path.len().cmp(&self.path.len()))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest per-axis distance on an `n`-sided torus
fn torus_delta(a: i32, b: i32, n: i32) -> i32 {
    let d = (a - b).rem_euclid(n);
    d.min(n - d)
}

fn torus_manhattan(a: IVec2, b: IVec2, n: i32) -> i32 {
    torus_delta(a.x, b.x, n) + torus_delta(a.y, b.y, n)
}

/// Unit direction of a single step between adjacent wrapped cells
fn step_dir(from: IVec2, to: IVec2, n: i32) -> IVec2 {
    let axis = |d: i32| {
        let m = d.rem_euclid(n);
        if m > n / 2 { m - n } else { m }
    };
    IVec2::new(axis(to.x - from.x), axis(to.y - from.y))
}

fn score_of(path_len: usize, endpoint: IVec2, root: IVec2, n: i32) -> i32 {
    path_len as i32 + torus_manhattan(endpoint, root, n)
}

/// True when every cell of the eight-neighborhood holds a red sphere.
/// Such a cell cannot lie on a walk that bounds a blue interior.
fn is_dead_end(stage: &Stage, pos: IVec2) -> bool {
    NEIGHBORS8
        .iter()
        .all(|&off| stage.value_at(pos + off) == ObjectKind::RedSphere)
}

/// Scanline parity test, bounded by the walk's bounding box. Cells on
/// the walk are not inside; positions outside the box are not inside.
fn is_strictly_inside(
    walk: &HashSet<IVec2>,
    min: IVec2,
    max: IVec2,
    p: IVec2,
) -> bool {
    if p.x <= min.x || p.x >= max.x || p.y <= min.y || p.y >= max.y {
        return false;
    }
    if walk.contains(&p) {
        return false;
    }
    let mut inside = false;
    let mut in_run = false;
    for x in min.x..p.x {
        if walk.contains(&IVec2::new(x, p.y)) {
            in_run = true;
        } else if in_run {
            inside = !inside;
            in_run = false;
        }
    }
    if in_run {
        inside = !inside;
    }
    inside
}

/// Flood-fill the 8-connected blue region at `seed` into rings
fn flood_fill_blue(stage: &mut Stage, seed: IVec2) -> usize {
    let mut converted = 0;
    let mut pending = vec![seed];
    while let Some(pos) = pending.pop() {
        if stage.value_at(pos) != ObjectKind::BlueSphere {
            continue;
        }
        stage.set_value_at(pos, ObjectKind::Ring);
        converted += 1;
        for &off in &NEIGHBORS8 {
            pending.push(stage.wrap(pos + off));
        }
    }
    converted
}

/// Search for a minimal enclosing walk through `root` and convert it.
///
/// Returns the number of cells turned into rings (interior plus walk),
/// or 0 when no qualifying walk exists. The root must already hold a
/// red sphere; anything else is a no-op.
pub fn convert_loop(stage: &mut Stage, root: IVec2) -> usize {
    let root = stage.wrap(root);
    if stage.value_at(root) != ObjectKind::RedSphere {
        return 0;
    }
    let n = stage.side();

    let mut open = BinaryHeap::new();
    // Keyed on (endpoint, direction, forbidden turn): keying on the
    // endpoint alone lets the two frontiers of a loop block each other
    // where they meet, so no closure would ever be found
    let mut closed: HashSet<(IVec2, IVec2, IVec2)> = HashSet::new();
    open.push(SearchState {
        path: vec![root],
        direction: IVec2::ZERO,
        forbidden_turn: IVec2::ZERO,
        score: score_of(1, root, root, n),
    });

    while let Some(state) = open.pop() {
        let endpoint = *state.path.last().expect("path is never empty");

        // Closure test: back at the root, and the closing turn leaves
        // the walk's first step legal
        if state.path.len() > 1 && endpoint == root {
            let first_step = step_dir(state.path[0], state.path[1], n);
            if state.forbidden_turn != first_step {
                if let Some(total) = try_convert(stage, &state.path) {
                    log::debug!(
                        "Ring conversion at ({}, {}): {} cells became rings",
                        root.x,
                        root.y,
                        total
                    );
                    return total;
                }
            }
            // Walk closed but enclosed nothing useful; keep searching
            continue;
        }

        if !closed.insert((endpoint, state.direction, state.forbidden_turn)) {
            continue;
        }
        if stage.avoid_search_at(endpoint) == AvoidSearch::Yes {
            continue;
        }
        if is_dead_end(stage, endpoint) {
            continue;
        }

        let candidates: &[IVec2] = if state.direction == IVec2::ZERO {
            &CARDINALS
        } else {
            &[
                state.direction,
                rotate_ccw(state.direction),
                rotate_cw(state.direction),
            ]
        };
        for &dir in candidates {
            if dir == state.forbidden_turn {
                continue;
            }
            let target = stage.wrap(endpoint + dir);
            if stage.value_at(target) != ObjectKind::RedSphere {
                continue;
            }
            // Revisiting any walk cell is illegal except closing at the root
            if target != root && state.path.contains(&target) {
                continue;
            }
            let forbidden_turn = if dir == state.direction {
                IVec2::ZERO
            } else {
                // A turn bans the step completing a 2x2 box at the next node
                -state.direction
            };
            if closed.contains(&(target, dir, forbidden_turn)) {
                continue;
            }
            let mut path = state.path.clone();
            path.push(target);
            let score = score_of(path.len(), target, root, n);
            open.push(SearchState {
                path,
                direction: dir,
                forbidden_turn,
                score,
            });
        }
    }

    0
}

/// Accept a closed walk if a blue seed lies strictly inside it. On
/// success the interior is flooded and the walk recolored; the total
/// number of cells that became rings is returned.
fn try_convert(stage: &mut Stage, path: &[IVec2]) -> Option<usize> {
    let walk: HashSet<IVec2> = path.iter().copied().collect();
    let mut min = path[0];
    let mut max = path[0];
    for &p in path {
        min = min.min(p);
        max = max.max(p);
    }

    let root = path[0];
    for &off in &NEIGHBORS8 {
        let seed = stage.wrap(root + off);
        if stage.value_at(seed) == ObjectKind::BlueSphere
            && is_strictly_inside(&walk, min, max, seed)
        {
            let converted = flood_fill_blue(stage, seed);
            // The walk is recolored only when the interior produced rings
            if converted > 0 {
                for &p in &walk {
                    stage.set_value_at(p, ObjectKind::Ring);
                }
                return Some(converted + walk.len());
            }
            return None;
        }
    }
    None
}
