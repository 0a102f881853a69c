//! Survivor selection over the combined offspring/incumbent pool.
//!
//! Two elite seats go to the best non-NaN candidates; remaining seats are
//! filled by fitness-proportional sampling without replacement. The winners
//! are then mapped onto the population slots that were put at risk.

use super::rng::EvoRng;
use crate::schema::ELITE_COUNT;

/// One competitor in a generation's selection pool.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEntry {
    /// A freshly evaluated offspring.
    Offspring {
        params: Vec<f64>,
        fitness: f64,
        job_id: u64,
    },
    /// An existing individual defending its own slot.
    Incumbent { slot: usize, fitness: f64 },
}

impl PoolEntry {
    pub fn fitness(&self) -> f64 {
        match self {
            PoolEntry::Offspring { fitness, .. } | PoolEntry::Incumbent { fitness, .. } => *fitness,
        }
    }
}

/// A committed move of pool entry `pool_index` into population `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    pub slot: usize,
    pub pool_index: usize,
}

/// Pick up to `num_select` pool indices, returned in ascending order.
///
/// NaN entries never win. Fewer than `num_select` indices come back only when
/// the pool has fewer valid entries than seats.
pub fn select_survivors(fitness: &[f64], num_select: usize, rng: &mut EvoRng) -> Vec<usize> {
    let mut candidates: Vec<usize> = (0..fitness.len()).collect();
    let mut winners = Vec::with_capacity(num_select);

    for _ in 0..ELITE_COUNT.min(num_select) {
        let Some(pos) = argmax_valid(&candidates, fitness) else {
            break;
        };
        winners.push(candidates.remove(pos));
    }

    candidates.retain(|&i| !fitness[i].is_nan());
    let mut weights: Vec<f64> = candidates.iter().map(|&i| fitness[i]).collect();
    let floor = weights.iter().copied().fold(f64::INFINITY, f64::min);
    if floor < 0.0 {
        let shift = floor.abs();
        weights.iter_mut().for_each(|w| *w += shift);
    }

    while winners.len() < num_select && !candidates.is_empty() {
        let pos = spin_wheel(&weights, rng);
        winners.push(candidates.remove(pos));
        weights.remove(pos);
    }

    winners.sort_unstable();
    winners
}

/// Position in `candidates` of the highest non-NaN fitness; first wins ties.
fn argmax_valid(candidates: &[usize], fitness: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (pos, &i) in candidates.iter().enumerate() {
        let f = fitness[i];
        if f.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, b)| f > b) {
            best = Some((pos, f));
        }
    }
    best.map(|(pos, _)| pos)
}

/// Roulette-wheel draw over non-negative weights.
///
/// Degenerate wheels (all zero or non-finite total) fall back to a uniform draw.
fn spin_wheel(weights: &[f64], rng: &mut EvoRng) -> usize {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.index(weights.len());
    }

    let target = rng.unit();
    let mut cumulative = 0.0;
    for (pos, w) in weights.iter().enumerate() {
        cumulative += w / total;
        if cumulative > target {
            return pos;
        }
    }
    // Rounding left the cumulative sum just short of the target.
    weights
        .iter()
        .rposition(|&w| w > 0.0)
        .unwrap_or(weights.len() - 1)
}

/// Map selection winners onto the at-risk population slots.
///
/// An incumbent that wins keeps its own slot, which is withdrawn from the
/// targets. Winning offspring then fill the remaining targets in order.
pub fn plan_replacements(
    pool: &[PoolEntry],
    winners: &[usize],
    at_risk: &[usize],
) -> Vec<Replacement> {
    let mut targets = at_risk.to_vec();
    let mut incoming = Vec::with_capacity(winners.len());

    for &pool_index in winners {
        match pool[pool_index] {
            PoolEntry::Incumbent { slot, .. } => targets.retain(|&t| t != slot),
            PoolEntry::Offspring { .. } => incoming.push(pool_index),
        }
    }

    incoming
        .into_iter()
        .zip(targets)
        .map(|(pool_index, slot)| Replacement { slot, pool_index })
        .collect()
}
