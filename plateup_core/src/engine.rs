//! Workout session engine.
//!
//! Owns one in-progress workout at a time and guards every transition:
//!
//! ```text
//! NotStarted -> Active <-> Resting -> Completing -> Finalized
//!                  \_________\______ cancel ______/-> NotStarted
//! ```
//!
//! ## Persistence
//!
//! Every mutating call writes to the record store before touching in-memory
//! state. A store failure therefore leaves the session exactly as it was and
//! the caller can retry the same action.
//!
//! ## Completion write-back
//!
//! `complete_workout` evaluates progression once per distinct exercise first
//! and only then writes: the workout marked completing, raised maximums, then
//! the finalized workout. If any write fails, maximums already written are
//! restored and the workout record is reopened, so progression is never
//! reported without being saved (or saved without being reported).
//!
//! ## Cancellation
//!
//! The workout row is removed before its set rows. If a set row cannot be
//! removed, everything already removed is put back and the session stays
//! active.

use crate::config::SettingsProvider;
use crate::feedback::Feedback;
use crate::plates::{calculate_plates, default_inventory};
use crate::progression::{apply_progression, evaluate_progression};
use crate::store::RecordStore;
use crate::timer::{Clock, RestTimer, SystemClock};
use crate::weight::{calculate_weight_from_percentage, generate_warmup_sets, round_to_increment};
use crate::{
    Error, ExerciseProfile, PlateInventoryEntry, PlateLoadPlan, ProgressionResult, ResolvedSet,
    Result, Routine, SessionExercise, SetPlan, Units, WeightKind, WorkoutLifecycle,
    WorkoutSession, WorkoutSetRecord,
};
use std::fmt;
use uuid::Uuid;

/// Externally visible engine state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Active,
    /// Active with the rest timer running
    Resting,
    Completing,
    Finalized,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::NotStarted => "not started",
            SessionState::Active => "active",
            SessionState::Resting => "resting",
            SessionState::Completing => "completing",
            SessionState::Finalized => "finalized",
        })
    }
}

/// Resolve one planned set against an exercise profile
///
/// `bar_weight` is the floor when the exercise has no equipment baseline.
pub fn resolve_set(profile: &ExerciseProfile, plan: &SetPlan, bar_weight: f64) -> ResolvedSet {
    let floor = profile.equipment_baseline.unwrap_or(bar_weight);

    let (target_weight, percentage_of_max) = match plan.weight_kind {
        WeightKind::Percentage => (
            calculate_weight_from_percentage(
                profile.max_weight,
                plan.weight_value,
                profile.weight_increment,
                floor,
            ),
            Some(plan.weight_value),
        ),
        WeightKind::Fixed => (
            round_to_increment(plan.weight_value, profile.weight_increment),
            None,
        ),
        WeightKind::BarOnly => (floor, None),
    };

    let rest_seconds = plan
        .rest_seconds_override
        .unwrap_or(profile.default_rest_seconds);

    ResolvedSet::new(target_weight, plan.target_reps, percentage_of_max, rest_seconds)
}

/// State machine for a single workout session
pub struct SessionEngine<S, F, C = SystemClock> {
    store: S,
    feedback: F,
    clock: C,
    units: Units,
    bar_weight: f64,
    state: SessionState,
    session: Option<WorkoutSession>,
    /// Profiles as loaded at start, parallel to `session.exercises`
    profiles: Vec<ExerciseProfile>,
    timer: RestTimer,
}

impl<S: RecordStore, F: Feedback> SessionEngine<S, F, SystemClock> {
    pub fn new(store: S, feedback: F, settings: &dyn SettingsProvider) -> Self {
        Self::with_clock(store, feedback, settings, SystemClock)
    }
}

impl<S: RecordStore, F: Feedback, C: Clock> SessionEngine<S, F, C> {
    /// Build an engine; settings are read once here, not per call
    pub fn with_clock(store: S, feedback: F, settings: &dyn SettingsProvider, clock: C) -> Self {
        Self {
            store,
            feedback,
            clock,
            units: settings.units(),
            bar_weight: settings.bar_weight(),
            state: SessionState::NotStarted,
            session: None,
            profiles: Vec::new(),
            timer: RestTimer::default(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        if self.state == SessionState::Active && self.timer.is_running {
            SessionState::Resting
        } else {
            self.state
        }
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    pub fn rest_timer(&self) -> &RestTimer {
        &self.timer
    }

    pub fn current_exercise(&self) -> Option<&SessionExercise> {
        let session = self.session.as_ref()?;
        session.exercises.get(session.current_exercise_index)
    }

    pub fn current_set(&self) -> Option<&ResolvedSet> {
        let session = self.session.as_ref()?;
        session.set(session.current_exercise_index, session.current_set_index)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    fn require_active(&self, action: &str) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "cannot {} while session is {}",
                action,
                self.state()
            )))
        }
    }

    fn active_session(&self, action: &str) -> Result<&WorkoutSession> {
        self.require_active(action)?;
        self.session
            .as_ref()
            .ok_or_else(|| Error::InvalidState(format!("cannot {}: no session loaded", action)))
    }

    // ------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------

    /// Resolve a routine into a new session and persist it
    pub fn start(&mut self, routine: &Routine) -> Result<&WorkoutSession> {
        match self.state {
            SessionState::NotStarted | SessionState::Finalized => {}
            _ => {
                return Err(Error::InvalidState(format!(
                    "cannot start a workout while another is {}",
                    self.state()
                )))
            }
        }

        let mut profiles = Vec::with_capacity(routine.exercises.len());
        let mut exercises = Vec::with_capacity(routine.exercises.len());

        for planned in &routine.exercises {
            let profile: ExerciseProfile = self.store.require(planned.exercise_id)?;
            let sets = planned
                .sets
                .iter()
                .map(|plan| resolve_set(&profile, plan, self.bar_weight))
                .collect();

            exercises.push(SessionExercise {
                exercise_id: profile.id,
                name: profile.name.clone(),
                sets,
            });
            profiles.push(profile);
        }

        let session = WorkoutSession {
            id: Uuid::new_v4(),
            routine_id: routine.id,
            routine_name: routine.name.clone(),
            exercises,
            current_exercise_index: 0,
            current_set_index: 0,
            started_at: self.clock.now(),
            completed_at: None,
            lifecycle: WorkoutLifecycle::Active,
        };

        self.persist_new_session(&session)?;

        tracing::info!(
            "Started workout {} from routine '{}' ({} exercises)",
            session.id,
            routine.name,
            session.exercises.len()
        );

        self.profiles = profiles;
        self.timer = RestTimer::default();
        self.state = SessionState::Active;
        Ok(self.session.insert(session))
    }

    fn persist_new_session(&mut self, session: &WorkoutSession) -> Result<()> {
        self.store.insert(session)?;

        let mut written: Vec<Uuid> = Vec::new();
        for record in set_records(session) {
            if let Err(e) = self.store.insert(&record) {
                tracing::warn!("Failed to persist set rows for workout {}: {}", session.id, e);
                for id in written {
                    if let Err(cleanup) = self.store.delete::<WorkoutSetRecord>(id) {
                        tracing::warn!("Could not remove set row {}: {}", id, cleanup);
                    }
                }
                if let Err(cleanup) = self.store.delete::<WorkoutSession>(session.id) {
                    tracing::warn!("Could not remove workout {}: {}", session.id, cleanup);
                }
                return Err(e);
            }
            written.push(record.id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sets and navigation
    // ------------------------------------------------------------------

    /// Log a set and start the rest timer if it prescribes rest
    pub fn complete_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        actual_weight: f64,
        actual_reps: u32,
    ) -> Result<ResolvedSet> {
        let session = self.active_session("complete a set")?;

        let exercise = session.exercises.get(exercise_index).ok_or_else(|| {
            Error::InvalidState(format!("exercise index {} out of range", exercise_index))
        })?;
        let mut set = exercise.sets.get(set_index).cloned().ok_or_else(|| {
            Error::InvalidState(format!(
                "set index {} out of range for exercise {}",
                set_index, exercise_index
            ))
        })?;

        set.actual_weight = Some(actual_weight);
        set.actual_reps = Some(actual_reps);
        set.completed = true;

        let record = WorkoutSetRecord {
            id: set.id,
            workout_id: session.id,
            exercise_id: exercise.exercise_id,
            exercise_index,
            set_index,
            set: set.clone(),
        };
        let set_count = exercise.sets.len();

        self.store.update(&record)?;

        if let Some(session) = self.session.as_mut() {
            session.exercises[exercise_index].sets[set_index] = set.clone();
            session.current_exercise_index = exercise_index;
            if set_index + 1 < set_count {
                session.current_set_index = set_index + 1;
            }
        }

        tracing::debug!(
            "Completed set {}/{}: {} x {}",
            exercise_index,
            set_index,
            actual_weight,
            actual_reps
        );

        if set.rest_seconds > 0 {
            self.timer.start(set.rest_seconds, self.clock.now());
        }

        Ok(set)
    }

    /// Jump to an exercise; earlier exercises need not be complete
    pub fn set_current_exercise(&mut self, index: usize) -> Result<()> {
        let session = self.active_session("change exercise")?;
        if index >= session.exercises.len() {
            return Err(Error::InvalidState(format!(
                "exercise index {} out of range",
                index
            )));
        }

        if let Some(session) = self.session.as_mut() {
            session.current_exercise_index = index;
            session.current_set_index = 0;
        }
        Ok(())
    }

    /// Jump to a set of the current exercise
    pub fn set_current_set(&mut self, index: usize) -> Result<()> {
        let session = self.active_session("change set")?;
        let set_count = session
            .exercises
            .get(session.current_exercise_index)
            .map_or(0, |e| e.sets.len());
        if index >= set_count {
            return Err(Error::InvalidState(format!("set index {} out of range", index)));
        }

        if let Some(session) = self.session.as_mut() {
            session.current_set_index = index;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rest timer
    // ------------------------------------------------------------------

    /// Advance the rest timer from the clock
    ///
    /// Returns true on the one tick that finishes the rest, after notifying
    /// feedback.
    pub fn tick(&mut self) -> bool {
        if self.timer.tick(self.clock.now()) {
            self.feedback.rest_timer_finished();
            return true;
        }
        false
    }

    /// Stop the rest timer now; safe to call repeatedly
    pub fn skip_rest_timer(&mut self) {
        self.timer.skip();
    }

    // ------------------------------------------------------------------
    // Equipment helpers
    // ------------------------------------------------------------------

    fn bar_for(&self, exercise_index: usize) -> f64 {
        self.profiles
            .get(exercise_index)
            .and_then(|p| p.equipment_baseline)
            .unwrap_or(self.bar_weight)
    }

    /// Plates needed for a set's target weight
    ///
    /// Uses the stored plate inventory, or the unit default when the store
    /// has none.
    pub fn plate_plan(&self, exercise_index: usize, set_index: usize) -> Result<PlateLoadPlan> {
        let set = self
            .session
            .as_ref()
            .and_then(|s| s.set(exercise_index, set_index))
            .ok_or_else(|| {
                Error::InvalidState(format!(
                    "no set {} for exercise {} in this session",
                    set_index, exercise_index
                ))
            })?;

        let mut inventory: Vec<PlateInventoryEntry> = self.store.list()?;
        if inventory.is_empty() {
            inventory = default_inventory(self.units);
        }

        Ok(calculate_plates(
            set.target_weight,
            self.bar_for(exercise_index),
            &inventory,
        ))
    }

    /// Warm-up ladder for an exercise of the session
    pub fn warmup_sets(&self, exercise_index: usize) -> Result<Vec<f64>> {
        let profile = self.profiles.get(exercise_index).ok_or_else(|| {
            Error::InvalidState(format!("exercise index {} out of range", exercise_index))
        })?;
        Ok(generate_warmup_sets(
            profile.max_weight,
            profile.weight_increment,
            self.bar_for(exercise_index),
        ))
    }

    // ------------------------------------------------------------------
    // Completion and cancellation
    // ------------------------------------------------------------------

    /// Evaluate progression, write it back and finalize the workout
    pub fn complete_workout(&mut self) -> Result<Vec<ProgressionResult>> {
        let session = self.active_session("complete the workout")?.clone();

        let timer = self.timer.clone();
        self.timer.skip();
        self.state = SessionState::Completing;

        match self.finalize(session) {
            Ok((finalized, results)) => {
                let progressed = results.iter().filter(|r| r.should_progress).count();
                tracing::info!(
                    "Finalized workout {}: {} of {} exercises progressed",
                    finalized.id,
                    progressed,
                    results.len()
                );
                self.session = Some(finalized);
                self.state = SessionState::Finalized;
                self.feedback.workout_completed(progressed);
                Ok(results)
            }
            Err(e) => {
                tracing::warn!("Workout completion failed, session left active: {}", e);
                self.timer = timer;
                self.state = SessionState::Active;
                Err(e)
            }
        }
    }

    fn finalize(
        &mut self,
        session: WorkoutSession,
    ) -> Result<(WorkoutSession, Vec<ProgressionResult>)> {
        let mut results = Vec::with_capacity(session.exercises.len());
        let mut raised: Vec<ExerciseProfile> = Vec::new();

        for (exercise_id, sets) in sets_by_exercise(&session) {
            let profile: ExerciseProfile = self.store.require(exercise_id)?;
            let result = evaluate_progression(&profile, &sets);
            if result.should_progress {
                raised.push(profile);
            }
            results.push(result);
        }

        let mut marked = session.clone();
        marked.lifecycle = WorkoutLifecycle::Completing;
        self.store.update(&marked)?;

        let mut written: Vec<&ExerciseProfile> = Vec::new();
        for (original, result) in raised
            .iter()
            .zip(results.iter().filter(|r| r.should_progress))
        {
            let mut updated = original.clone();
            apply_progression(&mut updated, result);
            if let Err(e) = self.store.update(&updated) {
                self.roll_back_completion(&session, &written);
                return Err(e);
            }
            written.push(original);
        }

        let mut finalized = marked;
        finalized.completed_at = Some(self.clock.now());
        finalized.lifecycle = WorkoutLifecycle::Finalized;

        if let Err(e) = self.store.update(&finalized) {
            self.roll_back_completion(&session, &written);
            return Err(e);
        }

        Ok((finalized, results))
    }

    /// Put back the maxes already raised and reopen the workout record
    fn roll_back_completion(&mut self, session: &WorkoutSession, originals: &[&ExerciseProfile]) {
        for profile in originals {
            if let Err(e) = self.store.update(*profile) {
                tracing::warn!(
                    "Could not restore max for {} after failed completion: {}",
                    profile.name,
                    e
                );
            }
        }
        if let Err(e) = self.store.update(session) {
            tracing::warn!("Could not reopen workout {}: {}", session.id, e);
        }
    }

    /// Discard the in-progress workout without evaluating progression
    ///
    /// Returns the discarded session, or None if nothing was started.
    pub fn cancel_workout(&mut self) -> Result<Option<WorkoutSession>> {
        match self.state {
            SessionState::Finalized => {
                return Err(Error::InvalidState(
                    "cannot cancel a finalized workout".into(),
                ))
            }
            SessionState::NotStarted => return Ok(None),
            _ => {}
        }

        let Some(session) = self.session.as_ref() else {
            self.state = SessionState::NotStarted;
            return Ok(None);
        };

        let rows = set_records(session);
        self.store.delete::<WorkoutSession>(session.id)?;

        let mut removed: Vec<&WorkoutSetRecord> = Vec::new();
        for record in &rows {
            if let Err(e) = self.store.delete::<WorkoutSetRecord>(record.id) {
                tracing::warn!("Failed to cancel workout {}: {}", session.id, e);
                for restored in removed {
                    if let Err(cleanup) = self.store.insert(restored) {
                        tracing::warn!("Could not restore set row {}: {}", restored.id, cleanup);
                    }
                }
                if let Err(cleanup) = self.store.insert(session) {
                    tracing::warn!("Could not restore workout {}: {}", session.id, cleanup);
                }
                return Err(e);
            }
            removed.push(record);
        }

        let mut discarded = self.session.take();
        if let Some(session) = discarded.as_mut() {
            session.lifecycle = WorkoutLifecycle::Cancelled;
            tracing::info!("Cancelled workout {}", session.id);
        }

        self.profiles.clear();
        self.timer = RestTimer::default();
        self.state = SessionState::NotStarted;
        Ok(discarded)
    }
}

/// Sets grouped per distinct exercise, in first-appearance order
///
/// A routine may list the same exercise more than once; progression is
/// judged once over all of its sets.
fn sets_by_exercise(session: &WorkoutSession) -> Vec<(Uuid, Vec<ResolvedSet>)> {
    let mut grouped: Vec<(Uuid, Vec<ResolvedSet>)> = Vec::new();
    for exercise in &session.exercises {
        match grouped.iter_mut().find(|(id, _)| *id == exercise.exercise_id) {
            Some((_, sets)) => sets.extend(exercise.sets.iter().cloned()),
            None => grouped.push((exercise.exercise_id, exercise.sets.clone())),
        }
    }
    grouped
}

/// Per-set rows for every set of a session
fn set_records(session: &WorkoutSession) -> Vec<WorkoutSetRecord> {
    session
        .exercises
        .iter()
        .enumerate()
        .flat_map(|(exercise_index, exercise)| {
            exercise
                .sets
                .iter()
                .enumerate()
                .map(move |(set_index, set)| WorkoutSetRecord {
                    id: set.id,
                    workout_id: session.id,
                    exercise_id: exercise.exercise_id,
                    exercise_index,
                    set_index,
                    set: set.clone(),
                })
        })
        .collect()
}
