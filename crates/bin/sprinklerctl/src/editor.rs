//! Interactive routine editor.
//!
//! Reads one command per line, applies it to the [`RoutineStore`], and
//! re-renders the routine list and the selected routine. Step positions are
//! the 1-based rows as printed; each command resolves its row to the step's
//! `order` rank before editing, so ranks with gaps stay editable.

use std::io::Write as _;
use std::str::FromStr;

use tokio::sync::broadcast;

use sprinkler_app::ports::{Confirmation, DeviceApi, EventPublisher};
use sprinkler_app::services::RoutineStore;
use sprinkler_domain::event::DashboardEvent;
use sprinkler_domain::relay::{RELAY_COUNT, RelayId};
use sprinkler_domain::routine::{MoveDirection, Routine, parse_duration};

use crate::prompt::TerminalInput;
use crate::ui::{self, reorder::Flip, reorder::RowLayout};

pub const HELP: &str = "\
commands:
  list                 show routines
  new                  create and select a routine
  select <n>           select routine n
  rename <name>        rename the selected routine
  delete               delete the selected routine
  add <station>        append a step for station 1-4
  rm <pos>             remove the step at pos
  up <pos> | down <pos>
  dur <pos> <minutes>  set a step's duration (1-20)
  + <pos> | - <pos>    adjust a step's duration by one minute
  enable <pos> | disable <pos>
  save                 push all routines to the controller
  reload               discard local edits and fetch again
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    Help,
    List,
    New,
    Select(usize),
    Rename(String),
    Delete,
    Add(RelayId),
    Remove(usize),
    Move(usize, MoveDirection),
    Duration(usize, String),
    Adjust(usize, i64),
    Enable(usize, bool),
    Save,
    Reload,
    Quit,
}

impl FromStr for EditorCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => Ok(Self::Help),
            "list" | "ls" => Ok(Self::List),
            "new" => Ok(Self::New),
            "select" => Ok(Self::Select(position(rest)?)),
            "rename" if rest.is_empty() => Err("rename needs a name".to_string()),
            "rename" => Ok(Self::Rename(rest.to_string())),
            "delete" => Ok(Self::Delete),
            "add" => station(rest).map(Self::Add),
            "rm" => position(rest).map(Self::Remove),
            "up" => position(rest).map(|row| Self::Move(row, MoveDirection::Earlier)),
            "down" => position(rest).map(|row| Self::Move(row, MoveDirection::Later)),
            "dur" => {
                let (pos, minutes) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: dur <pos> <minutes>".to_string())?;
                Ok(Self::Duration(position(pos)?, minutes.trim().to_string()))
            }
            "+" => position(rest).map(|row| Self::Adjust(row, 1)),
            "-" => position(rest).map(|row| Self::Adjust(row, -1)),
            "enable" => position(rest).map(|row| Self::Enable(row, true)),
            "disable" => position(rest).map(|row| Self::Enable(row, false)),
            "save" => Ok(Self::Save),
            "reload" => Ok(Self::Reload),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

/// 1-based position to 0-based index.
fn position(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(pos) if pos >= 1 => Ok(pos - 1),
        _ => Err(format!("expected a position starting at 1, got '{raw}'")),
    }
}

fn station(raw: &str) -> Result<RelayId, String> {
    position(raw)
        .ok()
        .and_then(|index| u8::try_from(index).ok())
        .and_then(|raw| RelayId::new(raw).ok())
        .ok_or_else(|| format!("station must be between 1 and {RELAY_COUNT}, got '{raw}'"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Editor<D, P> {
    store: RoutineStore<D, P>,
    stations: Vec<String>,
    flip: Flip,
}

impl<D, P> Editor<D, P>
where
    D: DeviceApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    pub fn new(store: RoutineStore<D, P>, stations: Vec<String>) -> Self {
        Self {
            store,
            stations,
            flip: Flip::default(),
        }
    }

    pub fn store(&self) -> &RoutineStore<D, P> {
        &self.store
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Returns a message for the user when the command does not apply to the
    /// current state. Device failures are reported as notices instead.
    pub async fn apply(
        &mut self,
        command: EditorCommand,
        confirmation: &impl Confirmation,
    ) -> Result<Flow, String> {
        self.flip = Flip::default();
        match command {
            EditorCommand::Help => println!("{HELP}"),
            EditorCommand::List => {}
            EditorCommand::New => {
                self.store.create();
            }
            EditorCommand::Select(index) => {
                if self.store.select(index).is_none() {
                    return Err(format!("no routine at position {}", index + 1));
                }
            }
            EditorCommand::Rename(name) => {
                let index = self.selected_index()?;
                self.store.rename(index, name);
            }
            EditorCommand::Delete => {
                let index = self.selected_index()?;
                self.store.delete(index, confirmation).await;
            }
            EditorCommand::Add(relay) => {
                let name = self
                    .stations
                    .get(relay.index())
                    .cloned()
                    .unwrap_or_else(|| format!("Station {}", relay.get() + 1));
                self.selected_routine()?.add_step(relay, name);
            }
            EditorCommand::Remove(row) => {
                let (routine, order) = self.step_at(row)?;
                routine.remove_step(order);
            }
            EditorCommand::Move(row, direction) => {
                let (routine, order) = self.step_at(row)?;
                // swap with the neighbouring row, which may sit past a gap in the ranks
                let neighbour = match direction {
                    MoveDirection::Earlier => row.checked_sub(1),
                    MoveDirection::Later => row.checked_add(1),
                }
                .and_then(|other| rank_at(routine, other));
                let Some(neighbour) = neighbour else {
                    return Ok(Flow::Continue);
                };
                let first = RowLayout::capture(routine);
                if routine.swap_orders(order, neighbour) {
                    let last = RowLayout::capture(routine);
                    self.flip = Flip::between(&first, &last);
                }
            }
            EditorCommand::Duration(row, text) => {
                let minutes = i64::from(parse_duration(&text));
                let (routine, order) = self.step_at(row)?;
                routine.set_duration(order, minutes);
            }
            EditorCommand::Adjust(row, delta) => {
                let (routine, order) = self.step_at(row)?;
                routine.adjust_duration(order, delta);
            }
            EditorCommand::Enable(row, enabled) => {
                let (routine, order) = self.step_at(row)?;
                routine.set_enabled(order, enabled);
            }
            // outcomes arrive as notices
            EditorCommand::Save => {
                let _ = self.store.save().await;
            }
            EditorCommand::Reload => {
                let _ = self.store.load().await;
            }
            EditorCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn selected_index(&self) -> Result<usize, String> {
        self.store
            .selected_index()
            .ok_or_else(|| "select a routine first".to_string())
    }

    fn selected_routine(&mut self) -> Result<&mut Routine, String> {
        self.store
            .selected_mut()
            .ok_or_else(|| "select a routine first".to_string())
    }

    /// Selected routine and the rank of the step printed at `row`.
    fn step_at(&mut self, row: usize) -> Result<(&mut Routine, u32), String> {
        let routine = self.selected_routine()?;
        let order = rank_at(routine, row)
            .ok_or_else(|| format!("no step at position {}", row + 1))?;
        Ok((routine, order))
    }

    /// Routine list followed by the selected routine's steps.
    pub fn render(&self) -> String {
        let mut out = ui::routine_list(self.store.routines(), self.store.selected_index(), None);
        if let Some(routine) = self.store.selected() {
            out.push('\n');
            out.push_str(&ui::routine_detail(routine, &self.flip));
        }
        out
    }
}

fn rank_at(routine: &Routine, row: usize) -> Option<u32> {
    routine.sorted_steps().get(row).map(|step| step.order)
}

/// Read commands from `input` until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run<D, P, C>(
    mut editor: Editor<D, P>,
    input: &TerminalInput,
    confirmation: &C,
    events: &mut broadcast::Receiver<DashboardEvent>,
) -> anyhow::Result<()>
where
    D: DeviceApi + Send + Sync,
    P: EventPublisher + Send + Sync,
    C: Confirmation,
{
    println!("{}", editor.render());
    loop {
        print!("edit> ");
        let _ = std::io::stdout().flush();
        let Some(line) = input.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match line.parse::<EditorCommand>() {
            Ok(command) => editor.apply(command, confirmation).await,
            Err(message) => Err(message),
        };
        for notice in ui::pending_notices(events) {
            println!("{notice}");
        }
        match outcome {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => println!("{}", editor.render()),
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}
