#![forbid(unsafe_code)]

//! Core domain model and business logic for Plateup.
//!
//! This crate provides:
//! - Domain types (exercises, routines, resolved sets, workouts)
//! - Weight resolution and warm-up ladders
//! - Plate loading
//! - Auto-progression and body composition calculators
//! - The workout session engine and its rest timer
//! - Persistence (record store, CSV export) and configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod weight;
pub mod plates;
pub mod progression;
pub mod body_metrics;
pub mod timer;
pub mod feedback;
pub mod store;
pub mod export;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, SettingKey, SettingValue, SettingsProvider};
pub use weight::{
    calculate_percentage, calculate_weight_from_percentage, format_weight, generate_warmup_sets,
    round_to_increment, DEFAULT_MIN_WEIGHT,
};
pub use plates::{calculate_plates, format_plate_calculation, plate_loading_order};
pub use progression::{apply_progression, evaluate_progression};
pub use body_metrics::{bmi_category, body_fat_category, calculate_body_metrics};
pub use timer::{Clock, ManualClock, RestTimer, SystemClock};
pub use feedback::{Feedback, LogFeedback, NoopFeedback, RecordedFeedback};
pub use store::{JsonFileStore, MemoryStore, Record, RecordKind, RecordStore};
pub use export::export_workouts_csv;
pub use engine::{resolve_set, SessionEngine, SessionState};
