//! Percentage-of-max weight resolution.
//!
//! These functions never fail: degenerate inputs (zero increment, zero max)
//! are clamped to a usable answer instead.

/// Default floor for a resolved weight: an empty imperial bar
pub const DEFAULT_MIN_WEIGHT: f64 = 45.0;

/// Percentages used to build a warm-up ladder
const WARMUP_PERCENTAGES: [f64; 6] = [0.0, 60.0, 70.0, 80.0, 90.0, 100.0];

/// Strip float noise from a weight or quotient (0.1 * 3 -> 0.3, 0.35 / 0.1 -> 3.5)
fn normalize(weight: f64) -> f64 {
    (weight * 1_000_000.0).round() / 1_000_000.0
}

/// Round a weight to the nearest multiple of `increment`
///
/// Ties round away from zero, so 133 with increment 5 becomes 135.
/// A non-positive increment means "no rounding".
pub fn round_to_increment(weight: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return weight;
    }
    normalize(normalize(weight / increment).round() * increment)
}

/// Resolve a percentage of `max_weight` into a loadable weight
///
/// - `percentage <= 0` returns `min_weight` as-is
/// - `percentage >= 100` returns the rounded max
/// - the result never drops below `min_weight`
pub fn calculate_weight_from_percentage(
    max_weight: f64,
    percentage: f64,
    increment: f64,
    min_weight: f64,
) -> f64 {
    if percentage <= 0.0 {
        return min_weight;
    }

    let raw = if percentage >= 100.0 {
        max_weight
    } else {
        max_weight * percentage / 100.0
    };

    round_to_increment(raw, increment).max(min_weight)
}

/// Express `weight` as a percentage of `max_weight`
///
/// Not clamped: loads above the max report more than 100%.
pub fn calculate_percentage(weight: f64, max_weight: f64) -> f64 {
    if max_weight <= 0.0 {
        return 0.0;
    }
    weight / max_weight * 100.0
}

/// Build a warm-up ladder from the empty bar up to the working max
///
/// Percentages that round to the same load are collapsed, so the result is
/// strictly ascending.
pub fn generate_warmup_sets(max_weight: f64, increment: f64, bar_weight: f64) -> Vec<f64> {
    let mut ladder: Vec<f64> = Vec::with_capacity(WARMUP_PERCENTAGES.len());

    for percentage in WARMUP_PERCENTAGES {
        let weight = if percentage <= 0.0 {
            bar_weight
        } else {
            calculate_weight_from_percentage(max_weight, percentage, increment, bar_weight)
        };

        match ladder.last() {
            Some(&previous) if (previous - weight).abs() < f64::EPSILON => {}
            _ => ladder.push(weight),
        }
    }

    tracing::debug!("Warm-up ladder for max {}: {:?}", max_weight, ladder);
    ladder
}

/// Render a weight without a trailing ".0" (45 -> "45", 2.5 -> "2.5")
pub fn format_weight(weight: f64) -> String {
    let rounded = normalize(weight);
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}
