//! Barbell plate loading.
//!
//! Plates are chosen greedily, largest first, and always in pairs. The greedy
//! pass is deterministic but not globally optimal: it can miss an exact load
//! that would need skipping a large plate in favour of two smaller ones.
//! Tests pin the greedy answers.

use crate::types::{PlateCount, PlateInventoryEntry, PlateLoadPlan, Units};
use crate::weight::format_weight;
use once_cell::sync::Lazy;

/// Tolerance for comparing plate sums against the target
const WEIGHT_EPSILON: f64 = 1e-6;

static IMPERIAL_INVENTORY: Lazy<Vec<(f64, u32)>> = Lazy::new(|| {
    vec![(45.0, 4), (35.0, 4), (25.0, 4), (10.0, 4), (5.0, 4), (2.5, 4)]
});

static METRIC_INVENTORY: Lazy<Vec<(f64, u32)>> = Lazy::new(|| {
    vec![
        (25.0, 4),
        (20.0, 4),
        (15.0, 4),
        (10.0, 4),
        (5.0, 4),
        (2.5, 4),
        (1.25, 4),
    ]
});

/// Typical home/commercial gym plate set for the unit system
pub fn default_inventory(units: Units) -> Vec<PlateInventoryEntry> {
    let table = match units {
        Units::Imperial => &*IMPERIAL_INVENTORY,
        Units::Metric => &*METRIC_INVENTORY,
    };
    table
        .iter()
        .map(|&(weight, count)| PlateInventoryEntry::new(weight, count))
        .collect()
}

/// Usable plate sizes: pairable, positive, merged by weight, heaviest first
fn usable_plates(inventory: &[PlateInventoryEntry]) -> Vec<(f64, u32)> {
    let mut plates: Vec<(f64, u32)> = inventory
        .iter()
        .filter(|e| e.plate_weight > 0.0)
        .map(|e| (e.plate_weight, e.count))
        .collect();

    plates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut merged: Vec<(f64, u32)> = Vec::with_capacity(plates.len());
    for (weight, count) in plates {
        match merged.last_mut() {
            Some(last) if (last.0 - weight).abs() < WEIGHT_EPSILON => last.1 += count,
            _ => merged.push((weight, count)),
        }
    }

    merged.retain(|&(_, count)| count >= 2);
    merged
}

/// Decompose `target_weight` into plates per side of a `bar_weight` bar
pub fn calculate_plates(
    target_weight: f64,
    bar_weight: f64,
    inventory: &[PlateInventoryEntry],
) -> PlateLoadPlan {
    if target_weight <= bar_weight {
        return PlateLoadPlan {
            plates_per_side: Vec::new(),
            achievable_weight: bar_weight,
            is_exact: (target_weight - bar_weight).abs() < WEIGHT_EPSILON,
            bar_weight,
        };
    }

    let mut remaining_per_side = (target_weight - bar_weight) / 2.0;
    let mut plates_per_side = Vec::new();
    let mut loaded_per_side = 0.0;

    for (weight, available) in usable_plates(inventory) {
        let fits = ((remaining_per_side + WEIGHT_EPSILON) / weight).floor().max(0.0) as u32;
        let pairs = fits.min(available / 2);
        if pairs == 0 {
            continue;
        }

        let consumed = weight * pairs as f64;
        remaining_per_side -= consumed;
        loaded_per_side += consumed;
        plates_per_side.push(PlateCount {
            weight,
            count: pairs,
        });
    }

    let achievable_weight = bar_weight + 2.0 * loaded_per_side;
    let is_exact = (achievable_weight - target_weight).abs() < WEIGHT_EPSILON;

    if !is_exact {
        tracing::debug!(
            "Plate load for {} short by {} (bar {})",
            target_weight,
            target_weight - achievable_weight,
            bar_weight
        );
    }

    PlateLoadPlan {
        plates_per_side,
        achievable_weight,
        is_exact,
        bar_weight,
    }
}

impl PlateLoadPlan {
    /// Plate weights for one side in the order they go on the bar
    pub fn loading_order(&self) -> impl Iterator<Item = f64> + '_ {
        self.plates_per_side
            .iter()
            .flat_map(|p| std::iter::repeat(p.weight).take(p.count as usize))
    }

    /// Total number of plates on one side
    pub fn plates_per_side_count(&self) -> u32 {
        self.plates_per_side.iter().map(|p| p.count).sum()
    }
}

/// Flattened loading order, largest plate first
pub fn plate_loading_order(plan: &PlateLoadPlan) -> Vec<f64> {
    plan.loading_order().collect()
}

/// Human readable plate summary, e.g. "2x45 + 1x10 per side"
pub fn format_plate_calculation(plan: &PlateLoadPlan) -> String {
    if plan.plates_per_side.is_empty() {
        return "Just the bar".to_string();
    }

    let parts: Vec<String> = plan
        .plates_per_side
        .iter()
        .map(|p| format!("{}x{}", p.count, format_weight(p.weight)))
        .collect();

    format!("{} per side", parts.join(" + "))
}
