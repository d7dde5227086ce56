//! Auto-progression of exercise maximums.
//!
//! An exercise moves up by one increment when every set programmed at 100%
//! of its max was completed for the target reps. Sub-maximal sets never
//! block progression.

use crate::{ExerciseProfile, ProgressionReason, ProgressionResult, ResolvedSet};

/// Tolerance when checking whether a set was programmed at 100%
const FULL_PERCENTAGE_EPSILON: f64 = 1e-6;

fn is_max_set(set: &ResolvedSet) -> bool {
    set.percentage_of_max
        .is_some_and(|p| (p - 100.0).abs() < FULL_PERCENTAGE_EPSILON)
}

fn hold(profile: &ExerciseProfile, reason: ProgressionReason) -> ProgressionResult {
    ProgressionResult {
        exercise_id: profile.id,
        should_progress: false,
        previous_max_weight: profile.max_weight,
        new_max_weight: profile.max_weight,
        increment_applied: 0.0,
        reason,
    }
}

/// Decide whether an exercise's max should increase after a workout
///
/// Checks, in order:
/// 1. auto-progression enabled
/// 2. at least one set at 100%
/// 3. every 100% set completed
/// 4. every 100% set met its target reps
pub fn evaluate_progression(profile: &ExerciseProfile, sets: &[ResolvedSet]) -> ProgressionResult {
    if !profile.auto_progression_enabled {
        return hold(profile, ProgressionReason::Disabled);
    }

    let max_sets: Vec<&ResolvedSet> = sets.iter().filter(|s| is_max_set(s)).collect();

    if max_sets.is_empty() {
        return hold(profile, ProgressionReason::NoMaxSets);
    }

    if max_sets.iter().any(|s| !s.completed) {
        return hold(profile, ProgressionReason::MaxSetsIncomplete);
    }

    let reps_met = max_sets
        .iter()
        .all(|s| s.actual_reps.is_some_and(|reps| reps >= s.target_reps));
    if !reps_met {
        return hold(profile, ProgressionReason::TargetRepsNotMet);
    }

    let new_max_weight = profile.max_weight + profile.weight_increment;

    tracing::info!(
        "Progressing {}: {} -> {}",
        profile.name,
        profile.max_weight,
        new_max_weight
    );

    ProgressionResult {
        exercise_id: profile.id,
        should_progress: true,
        previous_max_weight: profile.max_weight,
        new_max_weight,
        increment_applied: profile.weight_increment,
        reason: ProgressionReason::AllTargetsMet,
    }
}

/// Apply a progression result to the matching profile
///
/// Returns true when the profile was changed.
pub fn apply_progression(profile: &mut ExerciseProfile, result: &ProgressionResult) -> bool {
    if !result.should_progress || result.exercise_id != profile.id {
        return false;
    }
    profile.max_weight = result.new_max_weight;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(auto: bool) -> ExerciseProfile {
        let mut p = ExerciseProfile::new("Squat", 225.0, 5.0);
        p.auto_progression_enabled = auto;
        p
    }

    fn set(pct: Option<f64>, target: u32, actual: Option<u32>, completed: bool) -> ResolvedSet {
        let mut s = ResolvedSet::new(0.0, target, pct, 0);
        s.actual_reps = actual;
        s.completed = completed;
        s
    }

    #[test]
    fn test_progresses_when_all_max_sets_hit() {
        let sets = vec![
            set(Some(100.0), 5, Some(5), true),
            set(Some(100.0), 5, Some(5), true),
        ];
        let result = evaluate_progression(&profile(true), &sets);
        assert!(result.should_progress);
        assert_eq!(result.new_max_weight, 230.0);
        assert_eq!(result.increment_applied, 5.0);
        assert_eq!(result.reason, ProgressionReason::AllTargetsMet);
    }

    #[test]
    fn test_disabled_never_progresses() {
        let sets = vec![set(Some(100.0), 5, Some(8), true)];
        let result = evaluate_progression(&profile(false), &sets);
        assert!(!result.should_progress);
        assert_eq!(result.new_max_weight, 225.0);
        assert_eq!(result.reason, ProgressionReason::Disabled);
    }

    #[test]
    fn test_empty_and_submaximal_only() {
        let result = evaluate_progression(&profile(true), &[]);
        assert_eq!(result.reason, ProgressionReason::NoMaxSets);

        let sets = vec![set(Some(80.0), 5, Some(5), true), set(None, 5, Some(5), true)];
        let result = evaluate_progression(&profile(true), &sets);
        assert!(!result.should_progress);
        assert_eq!(result.reason, ProgressionReason::NoMaxSets);
    }

    #[test]
    fn test_incomplete_max_set_blocks() {
        let sets = vec![
            set(Some(100.0), 5, Some(5), true),
            set(Some(100.0), 5, None, false),
        ];
        let result = evaluate_progression(&profile(true), &sets);
        assert_eq!(result.reason, ProgressionReason::MaxSetsIncomplete);
    }

    #[test]
    fn test_short_reps_block() {
        let sets = vec![
            set(Some(100.0), 5, Some(5), true),
            set(Some(100.0), 5, Some(4), true),
        ];
        let result = evaluate_progression(&profile(true), &sets);
        assert_eq!(result.reason, ProgressionReason::TargetRepsNotMet);

        let sets = vec![set(Some(100.0), 5, None, true)];
        let result = evaluate_progression(&profile(true), &sets);
        assert_eq!(result.reason, ProgressionReason::TargetRepsNotMet);
    }

    #[test]
    fn test_failed_warmups_do_not_block() {
        let sets = vec![
            set(Some(60.0), 5, Some(2), true),
            set(Some(80.0), 5, None, false),
            set(Some(100.0), 3, Some(4), true),
        ];
        let result = evaluate_progression(&profile(true), &sets);
        assert!(result.should_progress);
    }

    #[test]
    fn test_apply_progression() {
        let mut p = profile(true);
        let sets = vec![set(Some(100.0), 5, Some(5), true)];
        let result = evaluate_progression(&p, &sets);
        assert!(apply_progression(&mut p, &result));
        assert_eq!(p.max_weight, 230.0);

        let held = hold(&p, ProgressionReason::Disabled);
        assert!(!apply_progression(&mut p, &held));
        assert_eq!(p.max_weight, 230.0);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ProgressionReason::NoMaxSets.to_string(), "No sets at 100%");
        assert_eq!(
            ProgressionReason::MaxSetsIncomplete.to_string(),
            "Not all 100% sets completed"
        );
    }
}
