//! Session feedback events (haptics, sound, notifications).
//!
//! The core only raises events; hosts decide how to buzz, beep or notify.
//! Which channels are enabled is fixed when the sink is constructed.

use crate::config::FeedbackConfig;

/// Receiver for fire-and-forget session events
pub trait Feedback {
    /// The rest timer reached zero
    fn rest_timer_finished(&mut self);

    /// A workout was finalized; `progressed` exercises had their max raised
    fn workout_completed(&mut self, progressed: usize);
}

/// Ignores every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFeedback;

impl Feedback for NoopFeedback {
    fn rest_timer_finished(&mut self) {}

    fn workout_completed(&mut self, _progressed: usize) {}
}

/// Reports enabled channels through tracing
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFeedback {
    config: FeedbackConfig,
}

impl LogFeedback {
    pub fn new(config: FeedbackConfig) -> Self {
        Self { config }
    }

    fn emit(&self, message: &str) {
        if self.config.haptics {
            tracing::info!(channel = "haptics", "{}", message);
        }
        if self.config.sound {
            tracing::info!(channel = "sound", "{}", message);
        }
        if self.config.notifications {
            tracing::info!(channel = "notification", "{}", message);
        }
    }
}

impl Feedback for LogFeedback {
    fn rest_timer_finished(&mut self) {
        self.emit("Rest complete");
    }

    fn workout_completed(&mut self, progressed: usize) {
        self.emit(&format!(
            "Workout complete, {} exercise(s) progressed",
            progressed
        ));
    }
}

/// Records events in memory; handy for hosts that poll
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordedFeedback {
    pub rest_finished: usize,
    pub workouts_completed: Vec<usize>,
}

impl Feedback for RecordedFeedback {
    fn rest_timer_finished(&mut self) {
        self.rest_finished += 1;
    }

    fn workout_completed(&mut self, progressed: usize) {
        self.workouts_completed.push(progressed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_feedback() {
        let mut feedback = RecordedFeedback::default();
        feedback.rest_timer_finished();
        feedback.workout_completed(2);
        assert_eq!(feedback.rest_finished, 1);
        assert_eq!(feedback.workouts_completed, vec![2]);
    }

    #[test]
    fn test_log_feedback_respects_config() {
        crate::logging::init_test();
        let mut feedback = LogFeedback::new(FeedbackConfig {
            haptics: false,
            sound: true,
            notifications: false,
        });
        // Only checks that emitting with partial channels is fine
        feedback.rest_timer_finished();
        feedback.workout_completed(0);
    }
}
