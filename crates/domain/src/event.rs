//! Event — something the dashboard should react to.
//!
//! Events are published on the in-process bus by the services and consumed
//! by the terminal UI.

use serde::Serialize;

use crate::execution::ExecutionSnapshot;
use crate::notice::Notice;
use crate::relay::RelayView;

/// Routine progress as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionView {
    pub running: bool,
    /// Position of the running routine in the local list, if matched by name.
    pub active_index: Option<usize>,
    pub snapshot: Option<ExecutionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A success or error message for the user.
    Notice(Notice),
    /// Fresh display state of all relays.
    Relays { relays: Vec<RelayView> },
    /// Fresh routine execution state.
    Execution(ExecutionView),
    /// The routine collection was reloaded or saved.
    RoutinesChanged { count: usize },
}

impl From<Notice> for DashboardEvent {
    fn from(notice: Notice) -> Self {
        Self::Notice(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_tag_serialized_events_by_type() {
        let event = DashboardEvent::from(Notice::success("Routines saved"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["message"], "Routines saved");
    }
}
