//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sprinkler_domain::firmware::FirmwareTarget;
use sprinkler_domain::relay::RelayAction;

#[derive(Parser, Debug)]
#[command(
    name = "sprinklerctl",
    version,
    about = "Control panel for a four-relay irrigation controller"
)]
pub struct Cli {
    /// Configuration file (defaults to `sprinklerctl.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Controller origin, overriding configuration and environment.
    #[arg(long, global = true)]
    pub device: Option<String>,
    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print relay and routine status once.
    Status,
    /// Live dashboard; reads commands from stdin.
    Watch,
    /// Switch a station (numbered 1-4).
    Relay { id: u8, action: Switch },
    /// Turn a station on for a number of minutes (last used when omitted).
    Timer {
        id: u8,
        #[arg(allow_negative_numbers = true)]
        minutes: Option<i64>,
    },
    /// Inspect or edit the stored routines.
    Routines {
        #[command(subcommand)]
        command: RoutinesCommand,
    },
    /// Control routine execution.
    Routine {
        #[command(subcommand)]
        command: RoutineControl,
    },
    /// Flash a firmware or filesystem image.
    Ota {
        file: PathBuf,
        #[arg(long, default_value = "app")]
        target: FirmwareTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoutinesCommand {
    List,
    /// Interactive editor.
    Edit,
}

#[derive(Subcommand, Debug)]
pub enum RoutineControl {
    /// Start the routine at this position (1-based, as listed).
    Start { position: usize },
    Stop,
    /// Skip to the next step.
    Skip,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
    Toggle,
}

impl From<Switch> for RelayAction {
    fn from(switch: Switch) -> Self {
        match switch {
            Switch::On => Self::On,
            Switch::Off => Self::Off,
            Switch::Toggle => Self::Toggle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_relay_command() {
        let cli = Cli::try_parse_from(["sprinklerctl", "relay", "2", "toggle"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Relay {
                id: 2,
                action: Switch::Toggle
            }
        ));
    }

    #[test]
    fn should_parse_timer_without_minutes() {
        let cli = Cli::try_parse_from(["sprinklerctl", "timer", "1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Timer {
                id: 1,
                minutes: None
            }
        ));
    }

    #[test]
    fn should_accept_negative_minutes_for_validation_downstream() {
        let cli = Cli::try_parse_from(["sprinklerctl", "timer", "1", "-3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Timer {
                minutes: Some(-3),
                ..
            }
        ));
    }

    #[test]
    fn should_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sprinklerctl",
            "ota",
            "fw.bin",
            "--target",
            "spiffs",
            "--yes",
            "--device",
            "http://10.0.0.2",
        ])
        .unwrap();
        assert!(cli.yes);
        assert_eq!(cli.device.as_deref(), Some("http://10.0.0.2"));
        assert!(matches!(
            cli.command,
            Command::Ota {
                target: FirmwareTarget::Spiffs,
                ..
            }
        ));
    }

    #[test]
    fn should_reject_unknown_firmware_target() {
        assert!(
            Cli::try_parse_from(["sprinklerctl", "ota", "fw.bin", "--target", "boot"]).is_err()
        );
    }

    #[test]
    fn should_convert_switch_to_relay_action() {
        assert_eq!(RelayAction::from(Switch::Off), RelayAction::Off);
    }
}
