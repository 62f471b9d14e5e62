//! Device status — the body of `GET /api/status` and routine control replies.

use serde::{Deserialize, Serialize};

use crate::execution::ExecutionSnapshot;
use crate::relay::RelayStatus;

/// Full device status as returned by a poll.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub relays: Vec<RelayStatus>,
    /// Absent or `null` when the device reports no routine.
    #[serde(default)]
    pub routine: Option<ExecutionSnapshot>,
}

/// A routine execution command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineCommand {
    /// Start the routine at this position of the device's list.
    Start(usize),
    Stop,
    Skip,
}

impl RoutineCommand {
    /// Value of the `action` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Stop => "stop",
            Self::Skip => "skip",
        }
    }

    /// Value of the `index` query parameter, only for `start`.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Start(index) => Some(*index),
            _ => None,
        }
    }
}

/// Body returned by `GET /api/routine/control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{RelayMode, RelayState};

    #[test]
    fn should_parse_status_with_running_routine() {
        let json = r#"{
            "relays": [
                {"id":0,"state":"off","mode":"off","rem":0},
                {"id":1,"state":"on","mode":"timed","rem":42}
            ],
            "routine": {"name":"Evening","running":true,"currentStep":0,"steps":[{"name":"Plants"}],"numSteps":1}
        }"#;
        let status: DeviceStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.relays.len(), 2);
        assert_eq!(status.relays[1].state, RelayState::On);
        assert_eq!(status.relays[1].mode, RelayMode::Timed);
        assert!(status.routine.unwrap().running);
    }

    #[test]
    fn should_treat_missing_or_null_routine_as_none() {
        let missing: DeviceStatus = serde_json::from_str(r#"{"relays":[]}"#).unwrap();
        let null: DeviceStatus = serde_json::from_str(r#"{"relays":[],"routine":null}"#).unwrap();
        assert!(missing.routine.is_none());
        assert!(null.routine.is_none());
    }

    #[test]
    fn should_expose_query_values_of_commands() {
        assert_eq!(RoutineCommand::Start(2).as_str(), "start");
        assert_eq!(RoutineCommand::Start(2).index(), Some(2));
        assert_eq!(RoutineCommand::Skip.index(), None);
    }
}
