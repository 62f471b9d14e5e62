//! Live dashboard: the status poller runs in the background while stdin
//! feeds it commands and dashboard events are printed as they arrive.

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use sprinkler_app::poller::{PollerCommand, StatusPoller};
use sprinkler_app::ports::{Clock, DeviceApi, EventPublisher, LocalCache};
use sprinkler_domain::event::{DashboardEvent, ExecutionView};
use sprinkler_domain::relay::{RelayAction, RelayId};
use sprinkler_domain::status::RoutineCommand;

use crate::prompt::TerminalInput;
use crate::ui;

pub const HELP: &str = "\
commands: on <n> | off <n> | toggle <n> | timer <n> <minutes>
          start <routine> | stop | skip | reload | quit";

/// What a line typed into the dashboard asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Command(PollerCommand),
    Help,
    Quit,
}

/// Parse one dashboard line. Relay and routine numbers are 1-based.
///
/// # Errors
///
/// Returns a message for the user when the line is not a command.
pub fn parse(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let first = words.next();
    let second = words.next();

    let command = match verb.as_str() {
        "on" => PollerCommand::Relay {
            relay: relay(first)?,
            action: RelayAction::On,
        },
        "off" => PollerCommand::Relay {
            relay: relay(first)?,
            action: RelayAction::Off,
        },
        "toggle" => PollerCommand::Relay {
            relay: relay(first)?,
            action: RelayAction::Toggle,
        },
        "timer" => PollerCommand::Timer {
            relay: relay(first)?,
            minutes: second
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| "usage: timer <n> <minutes>".to_string())?,
        },
        "start" => PollerCommand::Routine(RoutineCommand::Start(number(first)? - 1)),
        "stop" => PollerCommand::Routine(RoutineCommand::Stop),
        "skip" => PollerCommand::Routine(RoutineCommand::Skip),
        "reload" => PollerCommand::ReloadRoutines,
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" | "q" => return Ok(Input::Quit),
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Input::Command(command))
}

fn number(raw: Option<&str>) -> Result<usize, String> {
    raw.and_then(|raw| raw.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .ok_or_else(|| "expected a number starting at 1".to_string())
}

fn relay(raw: Option<&str>) -> Result<RelayId, String> {
    let index = number(raw)? - 1;
    u8::try_from(index)
        .ok()
        .and_then(|raw| RelayId::new(raw).ok())
        .ok_or_else(|| "no such relay".to_string())
}

/// Prints dashboard events, skipping repeats of unchanged state.
struct Printer {
    stations: Vec<String>,
    relays: String,
    execution: Vec<String>,
}

impl Printer {
    fn print(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Notice(notice) => println!("{notice}"),
            DashboardEvent::Relays { relays } => {
                let line = ui::relay_line(&relays, &self.stations);
                if line != self.relays {
                    println!("{line}");
                    self.relays = line;
                }
            }
            DashboardEvent::Execution(view) => self.print_execution(&view),
            DashboardEvent::RoutinesChanged { count } => {
                println!("{count} routine(s) on the controller");
            }
        }
    }

    fn print_execution(&mut self, view: &ExecutionView) {
        let lines = ui::execution_lines(view);
        if lines != self.execution {
            for line in &lines {
                println!("{line}");
            }
            self.execution = lines;
        }
    }
}

/// Run the dashboard until `quit`, end of input, or Ctrl-C.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the poller task panicked.
pub async fn run<D, C, P, K>(
    poller: StatusPoller<D, C, P, K>,
    events: BroadcastStream<DashboardEvent>,
    input: &TerminalInput,
    stations: Vec<String>,
) -> anyhow::Result<()>
where
    D: DeviceApi + Send + Sync + 'static,
    C: LocalCache + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    K: Clock + Send + Sync + 'static,
{
    let (commands, receiver) = mpsc::channel(16);
    let task = tokio::spawn(poller.run(receiver));
    let mut events = events;
    let mut printer = Printer {
        stations,
        relays: String::new(),
        execution: Vec::new(),
    };
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    println!("{HELP}");
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => printer.print(event),
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "dashboard output fell behind");
                }
                None => break,
            },
            line = input.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse(&line) {
                    Ok(Input::Command(command)) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Quit) => break,
                    Err(message) => println!("{message}"),
                }
            },
            _ = &mut shutdown => break,
        }
    }

    drop(commands);
    task.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay_id(raw: u8) -> RelayId {
        RelayId::new(raw).unwrap()
    }

    #[test]
    fn should_parse_relay_switches_with_one_based_numbers() {
        assert_eq!(
            parse("on 1"),
            Ok(Input::Command(PollerCommand::Relay {
                relay: relay_id(0),
                action: RelayAction::On
            }))
        );
        assert_eq!(
            parse("TOGGLE 4"),
            Ok(Input::Command(PollerCommand::Relay {
                relay: relay_id(3),
                action: RelayAction::Toggle
            }))
        );
    }

    #[test]
    fn should_pass_timer_minutes_through_unvalidated() {
        assert_eq!(
            parse("timer 2 -5"),
            Ok(Input::Command(PollerCommand::Timer {
                relay: relay_id(1),
                minutes: -5
            }))
        );
        assert!(parse("timer 2").is_err());
    }

    #[test]
    fn should_parse_routine_controls() {
        assert_eq!(
            parse("start 2"),
            Ok(Input::Command(PollerCommand::Routine(RoutineCommand::Start(1))))
        );
        assert_eq!(
            parse("skip"),
            Ok(Input::Command(PollerCommand::Routine(RoutineCommand::Skip)))
        );
        assert_eq!(parse("reload"), Ok(Input::Command(PollerCommand::ReloadRoutines)));
    }

    #[test]
    fn should_reject_unknown_relays_and_commands() {
        assert!(parse("on 0").is_err());
        assert!(parse("on 5").is_err());
        assert!(parse("start").is_err());
        assert!(parse("water").is_err());
        assert_eq!(parse("quit"), Ok(Input::Quit));
    }
}
