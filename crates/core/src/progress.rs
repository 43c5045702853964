//! Coarse progress milestones for long-running operations.
//!
//! Progress is a UX placeholder, not a protocol: the upload phase is
//! spread evenly over `[0, UPLOAD_SPAN]` by file count, followed by one
//! `Processing` update and one `Completed` update. Nothing here reflects
//! bytes sent or server-side work.

use serde::Serialize;

/// Upper bound of the upload phase.
pub const UPLOAD_SPAN: f32 = 0.3;

/// Fraction reported once the backend call is in flight.
pub const PROCESSING_FRACTION: f32 = 0.5;

/// Fraction reported when the operation has returned.
pub const COMPLETED_FRACTION: f32 = 1.0;

/// Which milestone an update represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum ProgressStage {
    /// `completed` of `total` files have been uploaded.
    Uploading { completed: usize, total: usize },
    Processing,
    Completed,
}

/// One progress notification. `fraction` is always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressUpdate {
    #[serde(flatten)]
    pub stage: ProgressStage,
    pub fraction: f32,
}

impl ProgressUpdate {
    /// Whole percent, for display.
    pub fn percent(&self) -> u8 {
        (self.fraction * 100.0).round() as u8
    }
}

/// Caller-supplied progress callback.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressUpdate) + Send + Sync);

/// Fraction reached after `completed` of `total` uploads.
pub fn upload_fraction(completed: usize, total: usize) -> f32 {
    if total == 0 {
        return UPLOAD_SPAN;
    }
    UPLOAD_SPAN * completed.min(total) as f32 / total as f32
}

/// Emits milestone updates to an optional callback.
///
/// Updates never go backwards: a fraction lower than the last emitted one
/// is raised to it.
pub struct MilestoneTracker<'a> {
    reporter: Option<ProgressFn<'a>>,
    last: f32,
}

impl<'a> MilestoneTracker<'a> {
    pub fn new(reporter: Option<ProgressFn<'a>>) -> Self {
        Self {
            reporter,
            last: 0.0,
        }
    }

    /// Report the start of an upload run of `total` files.
    pub fn upload_started(&mut self, total: usize) {
        self.emit(
            ProgressStage::Uploading {
                completed: 0,
                total,
            },
            0.0,
        );
    }

    pub fn file_uploaded(&mut self, completed: usize, total: usize) {
        self.emit(
            ProgressStage::Uploading { completed, total },
            upload_fraction(completed, total),
        );
    }

    pub fn processing(&mut self) {
        self.emit(ProgressStage::Processing, PROCESSING_FRACTION);
    }

    pub fn completed(&mut self) {
        self.emit(ProgressStage::Completed, COMPLETED_FRACTION);
    }

    /// Last fraction emitted (0.0 before the first update).
    pub fn last(&self) -> f32 {
        self.last
    }

    fn emit(&mut self, stage: ProgressStage, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0).max(self.last);
        self.last = fraction;
        if let Some(report) = self.reporter {
            report(ProgressUpdate { stage, fraction });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn upload_fraction_spreads_evenly() {
        assert_eq!(upload_fraction(0, 3), 0.0);
        assert!((upload_fraction(1, 3) - 0.1).abs() < 1e-6);
        assert!((upload_fraction(3, 3) - UPLOAD_SPAN).abs() < 1e-6);
    }

    #[test]
    fn upload_fraction_handles_zero_and_overflow() {
        assert_eq!(upload_fraction(0, 0), UPLOAD_SPAN);
        assert!((upload_fraction(5, 2) - UPLOAD_SPAN).abs() < 1e-6);
    }

    #[test]
    fn full_run_is_monotonic_and_bounded() {
        let seen = Mutex::new(Vec::new());
        let report = |u: ProgressUpdate| seen.lock().unwrap().push(u);
        let mut tracker = MilestoneTracker::new(Some(&report));

        tracker.upload_started(2);
        tracker.file_uploaded(1, 2);
        tracker.file_uploaded(2, 2);
        tracker.processing();
        tracker.completed();

        let seen = seen.into_inner().unwrap();
        let fractions: Vec<f32> = seen.iter().map(|u| u.fraction).collect();
        assert_eq!(fractions.len(), 5);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
        assert_eq!(seen.last().unwrap().stage, ProgressStage::Completed);
        assert_eq!(seen.last().unwrap().percent(), 100);
    }

    #[test]
    fn regressions_are_clamped_to_last_value() {
        let seen = Mutex::new(Vec::new());
        let report = |u: ProgressUpdate| seen.lock().unwrap().push(u.fraction);
        let mut tracker = MilestoneTracker::new(Some(&report));

        tracker.processing();
        tracker.file_uploaded(1, 4);

        assert_eq!(seen.into_inner().unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn tracker_without_reporter_still_tracks() {
        let mut tracker = MilestoneTracker::new(None);
        tracker.processing();
        assert_eq!(tracker.last(), PROCESSING_FRACTION);
    }

    #[test]
    fn update_serializes_with_flattened_stage() {
        let update = ProgressUpdate {
            stage: ProgressStage::Uploading {
                completed: 1,
                total: 2,
            },
            fraction: 0.15,
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json["stage"], "uploading");
        assert_eq!(json["completed"], 1);
        assert_eq!(json["total"], 2);
    }
}
