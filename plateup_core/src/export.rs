//! CSV export of finished workouts.
//!
//! One row per set, appended to the target file. Headers are written only
//! when the file is new or empty so repeated exports build a single sheet.

use crate::{Result, WorkoutLifecycle, WorkoutSession};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: String,
    routine: &'a str,
    completed_at: String,
    exercise: &'a str,
    set_number: usize,
    target_weight: f64,
    target_reps: u32,
    percentage_of_max: Option<f64>,
    actual_weight: Option<f64>,
    actual_reps: Option<u32>,
    completed: bool,
}

fn rows(workout: &WorkoutSession) -> impl Iterator<Item = CsvRow<'_>> {
    let completed_at = workout
        .completed_at
        .unwrap_or(workout.started_at)
        .to_rfc3339();

    workout.exercises.iter().flat_map(move |exercise| {
        let completed_at = completed_at.clone();
        exercise
            .sets
            .iter()
            .enumerate()
            .map(move |(index, set)| CsvRow {
                workout_id: workout.id.to_string(),
                routine: &workout.routine_name,
                completed_at: completed_at.clone(),
                exercise: &exercise.name,
                set_number: index + 1,
                target_weight: set.target_weight,
                target_reps: set.target_reps,
                percentage_of_max: set.percentage_of_max,
                actual_weight: set.actual_weight,
                actual_reps: set.actual_reps,
                completed: set.completed,
            })
    })
}

/// Append every set of the finalized workouts to `csv_path`
///
/// Workouts that are not finalized are skipped. Returns the number of rows
/// written.
pub fn export_workouts_csv(workouts: &[WorkoutSession], csv_path: &Path) -> Result<usize> {
    let finalized: Vec<&WorkoutSession> = workouts
        .iter()
        .filter(|w| w.lifecycle == WorkoutLifecycle::Finalized)
        .collect();

    if finalized.is_empty() {
        tracing::info!("No finalized workouts to export");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut count = 0;
    for workout in finalized {
        for row in rows(workout) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} set rows to {:?}", count, csv_path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResolvedSet, SessionExercise};
    use chrono::Utc;
    use uuid::Uuid;

    fn workout(lifecycle: WorkoutLifecycle) -> WorkoutSession {
        let mut done = ResolvedSet::new(225.0, 5, Some(100.0), 90);
        done.actual_weight = Some(225.0);
        done.actual_reps = Some(5);
        done.completed = true;

        WorkoutSession {
            id: Uuid::new_v4(),
            routine_id: Uuid::new_v4(),
            routine_name: "Day A".into(),
            exercises: vec![SessionExercise {
                exercise_id: Uuid::new_v4(),
                name: "Squat".into(),
                sets: vec![ResolvedSet::new(135.0, 5, None, 0), done],
            }],
            current_exercise_index: 0,
            current_set_index: 0,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            lifecycle,
        }
    }

    #[test]
    fn test_export_writes_rows_with_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out/workouts.csv");

        let workouts = [workout(WorkoutLifecycle::Finalized)];
        let count = export_workouts_csv(&workouts, &csv_path).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "workout_id");
        assert_eq!(&headers[4], "set_number");

        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[1][3], "Squat");
        assert_eq!(&records[1][9], "5");
        assert_eq!(&records[1][10], "true");
    }

    #[test]
    fn test_export_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("workouts.csv");

        export_workouts_csv(&[workout(WorkoutLifecycle::Finalized)], &csv_path).unwrap();
        export_workouts_csv(&[workout(WorkoutLifecycle::Finalized)], &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 4);
    }

    #[test]
    fn test_export_skips_unfinished() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("workouts.csv");

        let count = export_workouts_csv(
            &[
                workout(WorkoutLifecycle::Active),
                workout(WorkoutLifecycle::Cancelled),
            ],
            &csv_path,
        )
        .unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }
}
