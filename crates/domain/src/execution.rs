//! Execution — live routine progress as reported by the device.
//!
//! The device owns execution; the panel only reads [`ExecutionSnapshot`]s
//! and keeps a small [`RoutineActivity`] record to notice when a run ends.

use serde::{Deserialize, Serialize};

use crate::routine::Routine;

/// Name of a step inside an execution snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStep {
    pub name: String,
}

/// The `routine` object of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSnapshot {
    pub name: String,
    pub running: bool,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub steps: Vec<SnapshotStep>,
    #[serde(default)]
    pub num_steps: usize,
}

/// Classification of a step relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepProgress {
    Done,
    Active,
    Pending,
}

impl ExecutionSnapshot {
    /// Name of the running step, if the reported index is in range.
    #[must_use]
    pub fn current_step_name(&self) -> Option<&str> {
        self.steps
            .get(self.current_step)
            .map(|step| step.name.as_str())
    }

    /// 1-based position of the running step.
    #[must_use]
    pub fn position(&self) -> usize {
        self.current_step + 1
    }

    /// Progress indicator for every reported step.
    #[must_use]
    pub fn progress(&self) -> Vec<StepProgress> {
        (0..self.steps.len())
            .map(|index| match index.cmp(&self.current_step) {
                std::cmp::Ordering::Less => StepProgress::Done,
                std::cmp::Ordering::Equal => StepProgress::Active,
                std::cmp::Ordering::Greater => StepProgress::Pending,
            })
            .collect()
    }

    /// Index of the local routine this snapshot refers to.
    ///
    /// Matching is by name and picks the first hit, so two routines with the
    /// same name cannot be told apart.
    #[must_use]
    pub fn locate(&self, routines: &[Routine]) -> Option<usize> {
        routines
            .iter()
            .position(|routine| routine.name == self.name)
    }
}

/// Outcome of feeding a snapshot into [`RoutineActivity::observe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityChange {
    /// A routine that was running is no longer running.
    Completed { name: String },
}

/// What the panel believes about routine execution between polls.
#[derive(Debug, Clone, Default)]
pub struct RoutineActivity {
    running: bool,
    active_index: Option<usize>,
    snapshot: Option<ExecutionSnapshot>,
}

impl RoutineActivity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the routine part of a status poll.
    ///
    /// A poll without a routine object leaves the activity unchanged.
    pub fn observe(
        &mut self,
        snapshot: Option<&ExecutionSnapshot>,
        routines: &[Routine],
    ) -> Option<ActivityChange> {
        let snapshot = snapshot?;
        let was_running = self.running;

        self.running = snapshot.running;
        self.active_index = if snapshot.running {
            snapshot.locate(routines)
        } else {
            None
        };
        self.snapshot = Some(snapshot.clone());

        (was_running && !snapshot.running).then(|| ActivityChange::Completed {
            name: snapshot.name.clone(),
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the running routine in the local list, when it could be matched.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    /// Last snapshot received while a routine was running.
    #[must_use]
    pub fn running_snapshot(&self) -> Option<&ExecutionSnapshot> {
        self.snapshot.as_ref().filter(|snapshot| snapshot.running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, running: bool, current: usize, steps: &[&str]) -> ExecutionSnapshot {
        ExecutionSnapshot {
            name: name.to_string(),
            running,
            current_step: current,
            steps: steps
                .iter()
                .map(|n| SnapshotStep {
                    name: (*n).to_string(),
                })
                .collect(),
            num_steps: steps.len(),
        }
    }

    #[test]
    fn should_parse_device_snapshot() {
        let json = r#"{"name":"Evening","running":true,"currentStep":1,"steps":[{"name":"Plants"},{"name":"Grass"}],"numSteps":2}"#;
        let parsed: ExecutionSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, snapshot("Evening", true, 1, &["Plants", "Grass"]));
    }

    #[test]
    fn should_classify_steps_around_current_index() {
        let snap = snapshot("R", true, 1, &["a", "b", "c"]);
        assert_eq!(
            snap.progress(),
            vec![StepProgress::Done, StepProgress::Active, StepProgress::Pending]
        );
        assert_eq!(snap.current_step_name(), Some("b"));
        assert_eq!(snap.position(), 2);
    }

    #[test]
    fn should_have_no_step_name_when_index_out_of_range() {
        let snap = snapshot("R", true, 5, &["a"]);
        assert_eq!(snap.current_step_name(), None);
        assert_eq!(snap.progress(), vec![StepProgress::Done]);
    }

    #[test]
    fn should_locate_first_routine_with_matching_name() {
        let routines = vec![
            Routine::new("Lawn"),
            Routine::new("Evening"),
            Routine::new("Evening"),
        ];
        let snap = snapshot("Evening", true, 0, &[]);
        assert_eq!(snap.locate(&routines), Some(1));
    }

    #[test]
    fn should_report_completion_when_running_stops() {
        let routines = vec![Routine::new("Evening")];
        let mut activity = RoutineActivity::new();

        let started = activity.observe(Some(&snapshot("Evening", true, 0, &["a"])), &routines);
        assert_eq!(started, None);
        assert_eq!(activity.active_index(), Some(0));

        let finished = activity.observe(Some(&snapshot("Evening", false, 0, &["a"])), &routines);
        assert_eq!(
            finished,
            Some(ActivityChange::Completed {
                name: "Evening".to_string()
            })
        );
        assert!(!activity.is_running());
        assert_eq!(activity.active_index(), None);
        assert!(activity.running_snapshot().is_none());
    }

    #[test]
    fn should_track_running_routine_unknown_locally() {
        let mut activity = RoutineActivity::new();
        activity.observe(Some(&snapshot("Remote only", true, 0, &["a"])), &[]);
        assert!(activity.is_running());
        assert_eq!(activity.active_index(), None);
        assert!(activity.running_snapshot().is_some());
    }

    #[test]
    fn should_keep_activity_when_status_has_no_routine() {
        let routines = vec![Routine::new("Evening")];
        let mut activity = RoutineActivity::new();
        activity.observe(Some(&snapshot("Evening", true, 0, &["a"])), &routines);

        assert_eq!(activity.observe(None, &routines), None);
        assert!(activity.is_running());
    }
}
