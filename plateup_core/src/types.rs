//! Core domain types for the Plateup system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and their programmed maximums
//! - Routines made of percentage-based set plans
//! - Resolved sets and workout sessions
//! - Plate inventory and loading plans
//! - Progression results and body composition records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Units
// ============================================================================

/// Weight unit system used for display and equipment defaults
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Standard barbell weight for the unit system
    pub fn default_bar_weight(self) -> f64 {
        match self {
            Units::Imperial => crate::weight::DEFAULT_MIN_WEIGHT,
            Units::Metric => 20.0,
        }
    }

    /// Smallest usual jump between loads (a pair of the smallest common plates)
    pub fn default_increment(self) -> f64 {
        match self {
            Units::Imperial => 5.0,
            Units::Metric => 2.5,
        }
    }

    /// Short label appended to weights ("lb" / "kg")
    pub fn label(self) -> &'static str {
        match self {
            Units::Imperial => "lb",
            Units::Metric => "kg",
        }
    }
}

// ============================================================================
// Exercises and Routines
// ============================================================================

/// An exercise in the library, programmed around a known maximum
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseProfile {
    pub id: Uuid,
    pub name: String,
    pub max_weight: f64,
    pub weight_increment: f64,
    pub auto_progression_enabled: bool,
    pub default_rest_seconds: u32,
    /// Bar or implement weight; falls back to the configured bar when absent
    #[serde(default)]
    pub equipment_baseline: Option<f64>,
}

impl ExerciseProfile {
    pub fn new(name: impl Into<String>, max_weight: f64, weight_increment: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            max_weight,
            weight_increment,
            auto_progression_enabled: true,
            default_rest_seconds: 90,
            equipment_baseline: None,
        }
    }
}

/// How a planned set expresses its load
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    /// `weight_value` is a percentage of the exercise max
    Percentage,
    /// `weight_value` is an absolute load
    Fixed,
    /// Just the bar (or implement baseline)
    BarOnly,
}

/// One planned set inside a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetPlan {
    pub weight_kind: WeightKind,
    pub weight_value: f64,
    pub target_reps: u32,
    #[serde(default)]
    pub rest_seconds_override: Option<u32>,
}

impl SetPlan {
    pub fn percentage(percent: f64, target_reps: u32) -> Self {
        Self {
            weight_kind: WeightKind::Percentage,
            weight_value: percent,
            target_reps,
            rest_seconds_override: None,
        }
    }

    pub fn fixed(weight: f64, target_reps: u32) -> Self {
        Self {
            weight_kind: WeightKind::Fixed,
            weight_value: weight,
            target_reps,
            rest_seconds_override: None,
        }
    }

    pub fn bar_only(target_reps: u32) -> Self {
        Self {
            weight_kind: WeightKind::BarOnly,
            weight_value: 0.0,
            target_reps,
            rest_seconds_override: None,
        }
    }

    pub fn with_rest(mut self, seconds: u32) -> Self {
        self.rest_seconds_override = Some(seconds);
        self
    }
}

/// The planned sets for one exercise of a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineExercise {
    pub exercise_id: Uuid,
    pub sets: Vec<SetPlan>,
}

/// An authored workout template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Routine {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<RoutineExercise>,
}

// ============================================================================
// Session Types
// ============================================================================

/// A planned set after its load has been resolved for this session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResolvedSet {
    pub id: Uuid,
    pub target_weight: f64,
    pub target_reps: u32,
    /// None for fixed and bar-only sets
    pub percentage_of_max: Option<f64>,
    pub rest_seconds: u32,
    pub actual_weight: Option<f64>,
    pub actual_reps: Option<u32>,
    pub completed: bool,
}

impl ResolvedSet {
    pub fn new(
        target_weight: f64,
        target_reps: u32,
        percentage_of_max: Option<f64>,
        rest_seconds: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_weight,
            target_reps,
            percentage_of_max,
            rest_seconds,
            actual_weight: None,
            actual_reps: None,
            completed: false,
        }
    }
}

/// One exercise inside a running or finished workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionExercise {
    pub exercise_id: Uuid,
    pub name: String,
    pub sets: Vec<ResolvedSet>,
}

/// Lifecycle of a persisted workout record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutLifecycle {
    Active,
    Completing,
    Finalized,
    Cancelled,
}

/// A workout built from a routine, in progress or finished
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub routine_name: String,
    pub exercises: Vec<SessionExercise>,
    pub current_exercise_index: usize,
    pub current_set_index: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub lifecycle: WorkoutLifecycle,
}

impl WorkoutSession {
    /// Look up a set by position
    pub fn set(&self, exercise_index: usize, set_index: usize) -> Option<&ResolvedSet> {
        self.exercises
            .get(exercise_index)
            .and_then(|e| e.sets.get(set_index))
    }
}

/// Per-set persistence row written as sets are completed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSetRecord {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_index: usize,
    pub set_index: usize,
    pub set: ResolvedSet,
}

// ============================================================================
// Plates
// ============================================================================

/// Physical plates available in the gym (always loaded in pairs)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlateInventoryEntry {
    pub id: Uuid,
    pub plate_weight: f64,
    pub count: u32,
}

impl PlateInventoryEntry {
    pub fn new(plate_weight: f64, count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            plate_weight,
            count,
        }
    }
}

/// Number of plates of one weight loaded on each side
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlateCount {
    pub weight: f64,
    pub count: u32,
}

/// Result of decomposing a target load into plates
#[derive(Clone, Debug, PartialEq)]
pub struct PlateLoadPlan {
    /// Largest plate first
    pub plates_per_side: Vec<PlateCount>,
    pub achievable_weight: f64,
    pub is_exact: bool,
    pub bar_weight: f64,
}

// ============================================================================
// Progression
// ============================================================================

/// Why the evaluator did or did not raise an exercise max
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionReason {
    Disabled,
    NoMaxSets,
    MaxSetsIncomplete,
    TargetRepsNotMet,
    AllTargetsMet,
}

impl fmt::Display for ProgressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProgressionReason::Disabled => "Auto-progression disabled",
            ProgressionReason::NoMaxSets => "No sets at 100%",
            ProgressionReason::MaxSetsIncomplete => "Not all 100% sets completed",
            ProgressionReason::TargetRepsNotMet => "Target reps not met",
            ProgressionReason::AllTargetsMet => "All 100% sets completed at target reps",
        };
        f.write_str(text)
    }
}

/// Outcome of evaluating one exercise after a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionResult {
    pub exercise_id: Uuid,
    pub should_progress: bool,
    pub previous_max_weight: f64,
    pub new_max_weight: f64,
    pub increment_applied: f64,
    pub reason: ProgressionReason,
}

// ============================================================================
// Body Composition
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Circumference measurements for the US Navy method (inches / pounds)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyMeasurements {
    pub gender: Gender,
    pub height_inches: f64,
    pub weight_lbs: f64,
    pub waist_inches: f64,
    pub neck_inches: f64,
    #[serde(default)]
    pub hip_inches: Option<f64>,
}

/// Derived body composition, each value rounded to one decimal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyMetrics {
    pub body_fat_percentage: f64,
    pub fat_mass: f64,
    pub lean_mass: f64,
    pub bmi: f64,
}

/// A saved body composition measurement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyCompositionEntry {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub measurements: BodyMeasurements,
    pub metrics: BodyMetrics,
}
