//! Backtracking search over the remaining cells
//!
//! Recursion is linearized into an explicit stack of frames so large regions
//! cannot overflow the call stack. Variables follow a least-remaining-value
//! order biased toward high-priority border cells and toward cells where the
//! engine has a usable preference; values follow a least-constraining-value
//! order with the preferred (or originally requested) values pinned first.

use log::debug;

use crate::algorithm::revision::{RevisionContext, UndoTrail};
use crate::math::IndexSet;

/// Key offset that pins a value to the front of the ordering
const PIN_BONUS: f64 = 1.0e9;

/// Key offset that makes border cells win high-priority ties
const BORDER_BONUS: f64 = 1.0e6;

/// A border cell whose preexisting tiles constrained its candidates
///
/// Carries the original candidate set so the search can keep favoring the
/// user's tiles even after forceful repair discards the hard constraint.
#[derive(Clone, Debug)]
pub struct HighPriorityCell {
    /// Cell index in the generation region
    pub cell: usize,
    /// Candidates consistent with the preexisting tiles across all layers
    pub candidates: IndexSet,
}

/// Mutable search state for one generation run
pub struct SearchState {
    /// Per-cell candidate domains
    pub domains: Vec<IndexSet>,
    /// Per-cell committed tile index
    pub committed: Vec<Option<usize>>,
    /// Engine's non-binding preferred collapse per cell
    pub preferred: Vec<Option<usize>>,
    /// Deterministic per-cell tie-breaking noise
    pub noise: Vec<f64>,
    /// Constrained border cells, assigned before the general pool
    pub high_priority: Vec<HighPriorityCell>,
    /// Liveness of each high-priority slot
    pub hp_active: Vec<bool>,
    /// Removal trail shared by establishment and search
    pub trail: UndoTrail,
}

struct Frame {
    cell: usize,
    values: Vec<usize>,
    cursor: usize,
    trial_mark: usize,
    hp_slot: Option<usize>,
}

/// Run the search to completion
///
/// Returns true with every cell committed, or false when the candidate tree
/// is exhausted; in the failure case the trail has been fully reverted back
/// to the state at entry.
pub fn search(ctx: &RevisionContext<'_>, state: &mut SearchState) -> bool {
    let mut stack: Vec<Frame> = Vec::new();
    let mut backtracks = 0usize;

    match select_cell(ctx, state) {
        None => return true,
        Some((cell, hp_slot)) => push_frame(ctx, state, &mut stack, cell, hp_slot),
    }

    loop {
        let Some(top) = stack.last() else {
            debug!("search exhausted after {backtracks} backtracks");
            return false;
        };

        if top.cursor >= top.values.len() {
            // This cell has no workable value under the current prefix:
            // return it to the pool and retry the parent's next value.
            let Some(frame) = stack.pop() else {
                return false;
            };
            if let Some(cell) = state.committed.get_mut(frame.cell) {
                *cell = None;
            }
            if let Some(slot) = frame.hp_slot {
                if let Some(active) = state.hp_active.get_mut(slot) {
                    *active = true;
                }
            }
            backtracks += 1;
            if let Some(parent) = stack.last_mut() {
                state
                    .trail
                    .revert_to(parent.trial_mark, &mut state.domains);
                if let Some(cell) = state.committed.get_mut(parent.cell) {
                    *cell = None;
                }
                parent.cursor += 1;
            } else {
                debug!("search exhausted after {backtracks} backtracks");
                return false;
            }
            continue;
        }

        let cell = top.cell;
        let value = top.values.get(top.cursor).copied().unwrap_or(0);
        let mark = state.trail.mark();
        if let Some(frame) = stack.last_mut() {
            frame.trial_mark = mark;
        }
        if let Some(slot) = state.committed.get_mut(cell) {
            *slot = Some(value);
        }

        if ctx.propagate_from(cell, &mut state.domains, &state.committed, &mut state.trail) {
            match select_cell(ctx, state) {
                None => {
                    debug!("search succeeded after {backtracks} backtracks");
                    return true;
                }
                Some((next, hp_slot)) => push_frame(ctx, state, &mut stack, next, hp_slot),
            }
        } else {
            state.trail.revert_to(mark, &mut state.domains);
            if let Some(slot) = state.committed.get_mut(cell) {
                *slot = None;
            }
            if let Some(frame) = stack.last_mut() {
                frame.cursor += 1;
            }
        }
    }
}

/// Pick the next cell: live high-priority cells first, then the pool
///
/// Both pools minimize domain size plus per-cell noise; high-priority border
/// cells get a large negative offset, pool cells a unit bonus when the
/// engine's preferred value is still available.
fn select_cell(ctx: &RevisionContext<'_>, state: &SearchState) -> Option<(usize, Option<usize>)> {
    let mut best: Option<(f64, usize, usize)> = None;
    for (slot, hp) in state.high_priority.iter().enumerate() {
        let live = state.hp_active.get(slot).copied().unwrap_or(false)
            && state.committed.get(hp.cell).copied().flatten().is_none();
        if !live {
            continue;
        }
        let (x, y) = ctx.region.position(hp.cell);
        let mut key = domain_size(state, hp.cell) + cell_noise(state, hp.cell);
        if ctx.region.on_border(x, y) {
            key -= BORDER_BONUS;
        }
        if best.is_none_or(|(best_key, _, _)| key < best_key) {
            best = Some((key, hp.cell, slot));
        }
    }
    if let Some((_, cell, slot)) = best {
        return Some((cell, Some(slot)));
    }

    let mut best: Option<(f64, usize)> = None;
    for cell in 0..ctx.region.area() {
        if state.committed.get(cell).copied().flatten().is_some() {
            continue;
        }
        let mut key = domain_size(state, cell) + cell_noise(state, cell);
        let preferred_available = state
            .preferred
            .get(cell)
            .copied()
            .flatten()
            .is_some_and(|p| state.domains.get(cell).is_some_and(|d| d.contains(p)));
        if preferred_available {
            key -= 1.0;
        }
        if best.is_none_or(|(best_key, _)| key < best_key) {
            best = Some((key, cell));
        }
    }
    best.map(|(_, cell)| (cell, None))
}

fn push_frame(
    ctx: &RevisionContext<'_>,
    state: &mut SearchState,
    stack: &mut Vec<Frame>,
    cell: usize,
    hp_slot: Option<usize>,
) {
    if let Some(slot) = hp_slot {
        if let Some(active) = state.hp_active.get_mut(slot) {
            *active = false;
        }
    }
    let values = order_values(ctx, state, cell, hp_slot);
    stack.push(Frame {
        cell,
        values,
        cursor: 0,
        trial_mark: state.trail.mark(),
        hp_slot,
    });
}

/// Order a cell's candidates by ascending elimination count
///
/// The engine's preferred value is pinned first for pool cells; for
/// high-priority cells the whole original candidate set is pinned instead.
fn order_values(
    ctx: &RevisionContext<'_>,
    state: &SearchState,
    cell: usize,
    hp_slot: Option<usize>,
) -> Vec<usize> {
    let Some(domain) = state.domains.get(cell) else {
        return Vec::new();
    };
    let pinned = hp_slot.and_then(|slot| state.high_priority.get(slot).map(|hp| &hp.candidates));
    let preferred = state.preferred.get(cell).copied().flatten();

    let mut scored: Vec<(f64, usize)> = domain
        .iter()
        .map(|value| {
            let mut key = lcv_score(ctx, state, cell, value) as f64;
            let pin = match pinned {
                Some(candidates) => candidates.contains(value),
                None => preferred == Some(value),
            };
            if pin {
                key -= PIN_BONUS;
            }
            (key, value)
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, value)| value).collect()
}

/// Candidates eliminated from uncommitted in-region neighbor domains by
/// placing `value` at `cell`
fn lcv_score(ctx: &RevisionContext<'_>, state: &SearchState, cell: usize, value: usize) -> usize {
    let (x, y) = ctx.region.position(cell);
    let kind = ctx.connectivity.kind();
    let mut eliminated = 0;
    for &direction in kind.directions() {
        let offset = direction.offset(kind, y as i32);
        let nx = x as i32 + offset[0];
        let ny = y as i32 + offset[1];
        if !ctx.region.contains_local(nx, ny) {
            continue;
        }
        let neighbor = ctx.region.index(nx as usize, ny as usize);
        if state.committed.get(neighbor).copied().flatten().is_some() {
            continue;
        }
        if let Some(domain) = state.domains.get(neighbor) {
            eliminated += ctx.connectivity.eliminated(direction, value, domain);
        }
    }
    eliminated
}

fn domain_size(state: &SearchState, cell: usize) -> f64 {
    state.domains.get(cell).map_or(0.0, |d| d.count() as f64)
}

fn cell_noise(state: &SearchState, cell: usize) -> f64 {
    state.noise.get(cell).copied().unwrap_or(0.0)
}
