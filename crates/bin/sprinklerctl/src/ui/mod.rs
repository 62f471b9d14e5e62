//! Text rendering of dashboard state.
//!
//! Renderers return plain strings so the output can be asserted on.

pub mod reorder;

use std::fmt::Write as _;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use sprinkler_domain::event::{DashboardEvent, ExecutionView};
use sprinkler_domain::execution::StepProgress;
use sprinkler_domain::notice::Notice;
use sprinkler_domain::relay::RelayView;
use sprinkler_domain::routine::Routine;

use self::reorder::Flip;

/// One line with every relay, e.g. `Plants: OFF | Grass: ON (4:59)`.
#[must_use]
pub fn relay_line(views: &[RelayView], names: &[String]) -> String {
    views
        .iter()
        .map(|view| {
            let name = names
                .get(view.relay.index())
                .map_or("?", String::as_str);
            format!("{name}: {view}")
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Running routine with per-step progress, or a single idle line.
///
/// The header carries the routine's list number when it was matched locally.
#[must_use]
pub fn execution_lines(view: &ExecutionView) -> Vec<String> {
    let Some(snapshot) = view.snapshot.as_ref().filter(|_| view.running) else {
        return vec!["No routine running".to_string()];
    };

    let number = view
        .active_index
        .map(|index| format!(" (routine {})", index + 1))
        .unwrap_or_default();
    let mut lines = vec![format!(
        "▶ {}{number}: step {}/{} {}",
        snapshot.name,
        snapshot.position(),
        snapshot.num_steps,
        snapshot.current_step_name().unwrap_or("?"),
    )];
    for (step, progress) in snapshot.steps.iter().zip(snapshot.progress()) {
        let marker = match progress {
            StepProgress::Done => '✓',
            StepProgress::Active => '▶',
            StepProgress::Pending => '·',
        };
        lines.push(format!("  {marker} {}", step.name));
    }
    lines
}

/// Numbered routine list marking the selection and the running routine.
#[must_use]
pub fn routine_list(
    routines: &[Routine],
    selected: Option<usize>,
    active: Option<usize>,
) -> String {
    if routines.is_empty() {
        return "No routines".to_string();
    }
    let mut out = String::new();
    for (index, routine) in routines.iter().enumerate() {
        let cursor = if selected == Some(index) { '>' } else { ' ' };
        let _ = write!(
            out,
            "{cursor} {}. {} ({} steps)",
            index + 1,
            routine.name,
            routine.steps.len()
        );
        if active == Some(index) {
            out.push_str(" [running]");
        }
        out.push('\n');
    }
    out
}

/// Steps of `routine` in execution order with any pending move markers.
#[must_use]
pub fn routine_detail(routine: &Routine, flip: &Flip) -> String {
    let mut out = format!("{}\n", routine.name);
    if routine.steps.is_empty() {
        out.push_str("  (no steps)\n");
        return out;
    }
    for (row, slot) in routine.sorted_slots().into_iter().enumerate() {
        let step = &routine.steps[slot];
        let check = if step.enabled { 'x' } else { ' ' };
        let _ = write!(
            out,
            "  {:>2}. [{check}] {:<12} {:>2} min",
            row + 1,
            step.name,
            step.duration_minutes
        );
        match flip.offset(slot) {
            0 => {}
            up if up > 0 => {
                let _ = write!(out, "  ↑{up}");
            }
            down => {
                let _ = write!(out, "  ↓{}", down.unsigned_abs());
            }
        }
        out.push('\n');
    }
    out
}

/// Notices already waiting on `events`, in publish order.
///
/// Other events are dropped; a lagged receiver just skips what it missed.
pub fn pending_notices(events: &mut broadcast::Receiver<DashboardEvent>) -> Vec<Notice> {
    let mut notices = Vec::new();
    loop {
        match events.try_recv() {
            Ok(DashboardEvent::Notice(notice)) => notices.push(notice),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::reorder::RowLayout;
    use sprinkler_domain::execution::{ExecutionSnapshot, SnapshotStep};
    use sprinkler_domain::relay::{RelayId, RelayMode};
    use sprinkler_domain::routine::MoveDirection;

    fn names() -> Vec<String> {
        ["Plants", "Grass", "Patio Grass", "Front Lawn"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn view(raw: u8, is_on: bool, remaining: Option<u32>) -> RelayView {
        RelayView {
            relay: RelayId::new(raw).unwrap(),
            is_on,
            mode: if remaining.is_some() {
                RelayMode::Timed
            } else {
                RelayMode::Manual
            },
            remaining_seconds: remaining,
        }
    }

    #[test]
    fn should_render_relays_with_countdown() {
        let line = relay_line(&[view(0, false, None), view(1, true, Some(299))], &names());
        assert_eq!(line, "Plants: OFF | Grass: ON (4:59)");
    }

    #[test]
    fn should_render_idle_execution() {
        let idle = ExecutionView {
            running: false,
            active_index: None,
            snapshot: None,
        };
        assert_eq!(execution_lines(&idle), vec!["No routine running"]);
    }

    #[test]
    fn should_render_step_progress() {
        let running = ExecutionView {
            running: true,
            active_index: Some(0),
            snapshot: Some(ExecutionSnapshot {
                name: "Evening".to_string(),
                running: true,
                current_step: 1,
                steps: ["Plants", "Grass", "Front Lawn"]
                    .iter()
                    .map(|n| SnapshotStep {
                        name: (*n).to_string(),
                    })
                    .collect(),
                num_steps: 3,
            }),
        };
        assert_eq!(
            execution_lines(&running),
            vec![
                "▶ Evening (routine 1): step 2/3 Grass",
                "  ✓ Plants",
                "  ▶ Grass",
                "  · Front Lawn",
            ]
        );
    }

    #[test]
    fn should_fall_back_to_question_mark_for_unknown_step() {
        let running = ExecutionView {
            running: true,
            active_index: None,
            snapshot: Some(ExecutionSnapshot {
                name: "Ghost".to_string(),
                running: true,
                current_step: 4,
                steps: vec![],
                num_steps: 5,
            }),
        };
        assert_eq!(execution_lines(&running)[0], "▶ Ghost: step 5/5 ?");
    }

    #[test]
    fn should_mark_selected_and_running_routines() {
        let routines = vec![Routine::new("Morning"), Routine::new("Evening")];
        let out = routine_list(&routines, Some(0), Some(1));
        assert_eq!(out, "> 1. Morning (0 steps)\n  2. Evening (0 steps) [running]\n");
    }

    #[test]
    fn should_show_move_markers_after_reorder() {
        let mut routine = Routine::new("Morning");
        routine.add_step(RelayId::new(0).unwrap(), "Plants");
        routine.add_step(RelayId::new(1).unwrap(), "Grass");
        let first = RowLayout::capture(&routine);
        routine.move_step(1, MoveDirection::Earlier);
        let flip = Flip::between(&first, &RowLayout::capture(&routine));

        let out = routine_detail(&routine, &flip);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Morning");
        assert!(lines[1].contains("Grass") && lines[1].ends_with("↑1"));
        assert!(lines[2].contains("Plants") && lines[2].ends_with("↓1"));
    }

    #[test]
    fn should_collect_only_notices() {
        let (sender, mut receiver) = broadcast::channel(8);
        sender.send(DashboardEvent::RoutinesChanged { count: 1 }).unwrap();
        sender.send(Notice::success("Routines saved").into()).unwrap();
        sender.send(Notice::error("Failed to start routine").into()).unwrap();

        let notices = pending_notices(&mut receiver);

        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].to_string(), "✓ Routines saved");
        assert!(notices[1].is_error());
        assert!(pending_notices(&mut receiver).is_empty());
    }
}
