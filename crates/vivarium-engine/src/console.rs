//! Line-oriented operator console.
//!
//! Each line read from stdin is parsed into a [`Command`] and executed
//! against the [`Caretaker`]. Reports are written as pretty JSON; the
//! notifications a command causes are not echoed here because the engine
//! already logs everything published on the notification stream.
//!
//! Parsing is pure and never touches the caretaker, so it can be tested
//! without a running engine.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use vivarium_core::channels::touch::TouchOutcome;
use vivarium_core::{BreedProfile, Caretaker, ChannelKind};
use vivarium_types::{Disease, EnvFlag, EnvironmentState, ParseNameError, PetState, Rarity};

use crate::error::EngineError;

/// Usage text printed by `help`.
pub const HELP: &str = "\
commands:
  status                          pet, environment, and clock
  check                           run every channel now
  force <channel>                 run one channel now
  clock [set <rfc3339> | advance <span> | real]
  ledger [status | reset | preset <rfc3339> | null]
  pet <json>                      patch pet fields
  flag <name> on|off              set an environment flag
  birth <rarity> <breed> <speed> [name]
  hatch | release | revive
  touch | search | sleep | wake | light
  clean <slot>|all
  cure <disease>
  quit
spans: 45s, 90m, 3h, 2d (bare numbers are minutes)";

/// Errors from parsing a console line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// The first word is not a command.
    #[error("unknown command: {command} (try `help`)")]
    UnknownCommand {
        /// The unrecognised word.
        command: String,
    },

    /// A required argument is missing.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// The command being parsed.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// An argument could not be interpreted.
    #[error("invalid {argument}: {input}")]
    InvalidArgument {
        /// What was expected.
        argument: &'static str,
        /// The rejected input.
        input: String,
    },

    /// A name did not match any variant.
    #[error(transparent)]
    Name(#[from] ParseNameError),
}

/// A subcommand of `clock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockCommand {
    /// Show the current instant.
    Show,
    /// Pin the virtual clock at an RFC 3339 instant.
    Set(String),
    /// Move the virtual clock forward.
    Advance(Duration),
    /// Drop the virtual offset.
    Real,
}

/// A subcommand of `ledger`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    /// Show every entry and dirty object.
    Status,
    /// Align every entry to now.
    Reset,
    /// Set every entry to an RFC 3339 instant.
    Preset(String),
    /// Clear every entry.
    Null,
}

/// What `clean` should remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanTarget {
    /// One slot.
    Slot(u8),
    /// Every object.
    All,
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print usage.
    Help,
    /// Print the status report.
    Status,
    /// Run the unified check.
    Check,
    /// Run one channel.
    Force(ChannelKind),
    /// Virtual clock control.
    Clock(ClockCommand),
    /// Ledger control.
    Ledger(LedgerCommand),
    /// Patch pet fields from a JSON object.
    Pet(String),
    /// Set or clear an environment flag.
    Flag {
        /// The flag.
        flag: EnvFlag,
        /// New value.
        active: bool,
    },
    /// Create an egg.
    Birth {
        /// Rarity tier.
        rarity: Rarity,
        /// Breed key.
        breed: String,
        /// Hunger lost per decay tick.
        hunger_speed: u32,
        /// Optional display name.
        name: Option<String>,
    },
    /// Hatch the egg.
    Hatch,
    /// Release the pet.
    Release,
    /// Revive a dead pet.
    Revive,
    /// Pet the pet.
    Touch,
    /// Search for a pet that left.
    Search,
    /// Put the pet to bed.
    Sleep,
    /// Wake the pet.
    Wake,
    /// Toggle the room light.
    Light,
    /// Remove dirty objects.
    Clean(CleanTarget),
    /// Cure a disease.
    Cure(Disease),
    /// Stop the engine.
    Quit,
}

/// Whether the engine should keep running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands.
    Continue,
    /// Shut down.
    Quit,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one non-empty console line.
pub fn parse(line: &str) -> Result<Command, ConsoleError> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));
    let mut args = rest.split_whitespace();

    let command = match head {
        "help" | "?" => Command::Help,
        "status" => Command::Status,
        "check" => Command::Check,
        "force" => Command::Force(required(args.next(), "force", "channel")?.parse()?),
        "clock" => Command::Clock(parse_clock(&mut args)?),
        "ledger" => Command::Ledger(parse_ledger(&mut args)?),
        "pet" => {
            if rest.is_empty() {
                return Err(ConsoleError::MissingArgument {
                    command: "pet",
                    argument: "JSON object",
                });
            }
            Command::Pet(rest.to_owned())
        }
        "flag" => Command::Flag {
            flag: required(args.next(), "flag", "flag name")?.parse()?,
            active: parse_switch(required(args.next(), "flag", "on|off")?)?,
        },
        "birth" => Command::Birth {
            rarity: required(args.next(), "birth", "rarity")?
                .to_ascii_uppercase()
                .parse()?,
            breed: required(args.next(), "birth", "breed")?.to_owned(),
            hunger_speed: parse_number(required(args.next(), "birth", "hunger speed")?, "hunger speed")?,
            name: args.next().map(str::to_owned),
        },
        "hatch" => Command::Hatch,
        "release" => Command::Release,
        "revive" => Command::Revive,
        "touch" => Command::Touch,
        "search" => Command::Search,
        "sleep" => Command::Sleep,
        "wake" => Command::Wake,
        "light" => Command::Light,
        "clean" => match required(args.next(), "clean", "slot or `all`")? {
            "all" => Command::Clean(CleanTarget::All),
            slot => Command::Clean(CleanTarget::Slot(parse_number(slot, "slot")?)),
        },
        "cure" => Command::Cure(required(args.next(), "cure", "disease")?.parse()?),
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(ConsoleError::UnknownCommand {
                command: other.to_owned(),
            });
        }
    };
    Ok(command)
}

fn required<'a>(
    arg: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ConsoleError> {
    arg.ok_or(ConsoleError::MissingArgument { command, argument })
}

fn parse_number<T: core::str::FromStr>(input: &str, argument: &'static str) -> Result<T, ConsoleError> {
    input.parse().map_err(|_| ConsoleError::InvalidArgument {
        argument,
        input: input.to_owned(),
    })
}

fn parse_switch(input: &str) -> Result<bool, ConsoleError> {
    match input {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(ConsoleError::InvalidArgument {
            argument: "switch",
            input: other.to_owned(),
        }),
    }
}

fn parse_clock<'a>(args: &mut impl Iterator<Item = &'a str>) -> Result<ClockCommand, ConsoleError> {
    match args.next() {
        None | Some("show") => Ok(ClockCommand::Show),
        Some("set") => Ok(ClockCommand::Set(
            required(args.next(), "clock set", "timestamp")?.to_owned(),
        )),
        Some("advance") => Ok(ClockCommand::Advance(parse_span(required(
            args.next(),
            "clock advance",
            "span",
        )?)?)),
        Some("real") => Ok(ClockCommand::Real),
        Some(other) => Err(ConsoleError::InvalidArgument {
            argument: "clock subcommand",
            input: other.to_owned(),
        }),
    }
}

fn parse_ledger<'a>(args: &mut impl Iterator<Item = &'a str>) -> Result<LedgerCommand, ConsoleError> {
    match args.next() {
        None | Some("status") => Ok(LedgerCommand::Status),
        Some("reset") => Ok(LedgerCommand::Reset),
        Some("preset") => Ok(LedgerCommand::Preset(
            required(args.next(), "ledger preset", "timestamp")?.to_owned(),
        )),
        Some("null") => Ok(LedgerCommand::Null),
        Some(other) => Err(ConsoleError::InvalidArgument {
            argument: "ledger subcommand",
            input: other.to_owned(),
        }),
    }
}

/// Parse a span such as `45s`, `90m`, `3h`, or `2d`. Bare numbers are
/// minutes. Negative spans are rejected.
pub fn parse_span(input: &str) -> Result<Duration, ConsoleError> {
    let invalid = || ConsoleError::InvalidArgument {
        argument: "span",
        input: input.to_owned(),
    };
    let (digits, unit) = match input.char_indices().next_back() {
        Some((at, unit)) if unit.is_ascii_alphabetic() => (input.get(..at).unwrap_or_default(), unit),
        _ => (input, 'm'),
    };
    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount < 0 {
        return Err(invalid());
    }
    let span = match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => None,
    };
    span.ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// The `status` report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    now: DateTime<Utc>,
    virtual_time: bool,
    pet: &'a PetState,
    environment: &'a EnvironmentState,
    dirty_objects: usize,
}

/// Execute `command`, writing any report to `out`.
///
/// # Errors
///
/// Returns [`EngineError`] when the caretaker refuses the request or the
/// report cannot be written. The caretaker state is unchanged in that case.
pub fn execute<W: Write>(
    caretaker: &mut Caretaker,
    command: Command,
    out: &mut W,
) -> Result<Flow, EngineError> {
    match command {
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Status => {
            let report = StatusReport {
                now: caretaker.now(),
                virtual_time: caretaker.clock().is_virtual(),
                pet: caretaker.pet(),
                environment: caretaker.environment(),
                dirty_objects: caretaker.dirt().len(),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        Command::Check => {
            let notes = caretaker.operator().force_check_all();
            writeln!(out, "check complete: {} notification(s)", notes.len())?;
        }
        Command::Force(kind) => {
            let notes = caretaker.operator().force_channel(kind);
            writeln!(out, "{kind}: {} notification(s)", notes.len())?;
        }
        Command::Clock(clock) => execute_clock(caretaker, &clock, out)?,
        Command::Ledger(ledger) => execute_ledger(caretaker, &ledger, out)?,
        Command::Pet(json) => {
            caretaker.operator().override_pet_json(&json)?;
            writeln!(out, "{}", serde_json::to_string_pretty(caretaker.pet())?)?;
        }
        Command::Flag { flag, active } => {
            let changed = caretaker.operator().set_flag(flag, active);
            let state = if active { "on" } else { "off" };
            let note = if changed { "" } else { " (unchanged)" };
            writeln!(out, "{flag} {state}{note}")?;
        }
        Command::Birth {
            rarity,
            breed,
            hunger_speed,
            name,
        } => {
            let note = caretaker.birth(rarity, &BreedProfile::new(breed, hunger_speed), name)?;
            writeln!(out, "{}", note.message)?;
        }
        Command::Hatch => {
            caretaker.hatch()?;
            writeln!(out, "hatched")?;
        }
        Command::Release => {
            let note = caretaker.release();
            writeln!(out, "{}", note.message)?;
        }
        Command::Revive => {
            let note = caretaker.revive()?;
            writeln!(out, "{}", note.message)?;
        }
        Command::Touch => match caretaker.touch() {
            TouchOutcome::Content { reaction } => writeln!(out, "{reaction}")?,
            outcome => writeln!(out, "{outcome:?}")?,
        },
        Command::Search => writeln!(out, "{:?}", caretaker.search())?,
        Command::Sleep => writeln!(out, "{:?}", caretaker.start_sleep())?,
        Command::Wake => writeln!(out, "{:?}", caretaker.wake_up())?,
        Command::Light => {
            let on = caretaker.toggle_light();
            writeln!(out, "light {}", if on { "on" } else { "off" })?;
        }
        Command::Clean(CleanTarget::All) => {
            writeln!(out, "removed {} object(s)", caretaker.clean_all())?;
        }
        Command::Clean(CleanTarget::Slot(slot)) => {
            let removed = caretaker.clean(slot);
            writeln!(out, "slot {slot}: {}", if removed { "cleaned" } else { "empty" })?;
        }
        Command::Cure(disease) => {
            let cured = caretaker.clear_disease(disease);
            writeln!(out, "{disease}: {}", if cured { "cured" } else { "not present" })?;
        }
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn execute_clock<W: Write>(
    caretaker: &mut Caretaker,
    command: &ClockCommand,
    out: &mut W,
) -> Result<(), EngineError> {
    let mut operator = caretaker.operator();
    let now = match command {
        ClockCommand::Show => None,
        ClockCommand::Set(input) => Some(operator.set_virtual_time_str(input)?),
        ClockCommand::Advance(by) => Some(operator.advance_clock(*by)),
        ClockCommand::Real => {
            operator.use_real_time();
            None
        }
    };
    let now = now.unwrap_or_else(|| caretaker.now());
    let mode = if caretaker.clock().is_virtual() { "virtual" } else { "real" };
    writeln!(out, "{} ({mode})", now.to_rfc3339())?;
    Ok(())
}

fn execute_ledger<W: Write>(
    caretaker: &mut Caretaker,
    command: &LedgerCommand,
    out: &mut W,
) -> Result<(), EngineError> {
    let mut operator = caretaker.operator();
    match command {
        LedgerCommand::Status => {}
        LedgerCommand::Reset => {
            operator.reset_ledger();
        }
        LedgerCommand::Preset(input) => {
            operator.preset_ledger_str(input)?;
        }
        LedgerCommand::Null => operator.null_ledger(),
    }
    let report = operator.ledger_status();
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use vivarium_core::{ManualWallClock, VivariumConfig};
    use vivarium_store::MemoryStore;
    use vivarium_types::Channel;

    use super::*;

    fn caretaker() -> Caretaker {
        let mut config = VivariumConfig::default();
        config.clock.utc_offset_minutes = Some(0);
        config.engine.seed = Some(7);
        let wall = Arc::new(ManualWallClock::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
        ));
        Caretaker::open(Box::new(MemoryStore::new()), wall, config).unwrap()
    }

    fn run(caretaker: &mut Caretaker, line: &str) -> String {
        let mut out = Vec::new();
        execute(caretaker, parse(line).unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("status").unwrap(), Command::Status);
        assert_eq!(parse("  quit  ").unwrap(), Command::Quit);
        assert_eq!(parse("force hunger-decay").unwrap(), Command::Force(ChannelKind::HungerDecay));
        assert_eq!(parse("clean all").unwrap(), Command::Clean(CleanTarget::All));
        assert_eq!(parse("clean 2").unwrap(), Command::Clean(CleanTarget::Slot(2)));
        assert_eq!(parse("cure flu").unwrap(), Command::Cure(Disease::Flu));
    }

    #[test]
    fn parses_birth_with_optional_name() {
        assert_eq!(
            parse("birth special calico 4 Mochi").unwrap(),
            Command::Birth {
                rarity: Rarity::Special,
                breed: "calico".to_owned(),
                hunger_speed: 4,
                name: Some("Mochi".to_owned()),
            }
        );
        assert!(matches!(
            parse("birth normal tabby").unwrap_err(),
            ConsoleError::MissingArgument { argument: "hunger speed", .. }
        ));
    }

    #[test]
    fn pet_keeps_the_whole_json_payload() {
        assert_eq!(
            parse("pet {\"currentHunger\": 20, \"isLeaving\": true}").unwrap(),
            Command::Pet("{\"currentHunger\": 20, \"isLeaving\": true}".to_owned())
        );
        assert!(parse("pet").is_err());
    }

    #[test]
    fn parses_flags_and_subcommands() {
        assert_eq!(
            parse("flag needLight on").unwrap(),
            Command::Flag {
                flag: EnvFlag::NeedLight,
                active: true
            }
        );
        assert!(parse("flag needLight maybe").is_err());
        assert_eq!(parse("clock").unwrap(), Command::Clock(ClockCommand::Show));
        assert_eq!(
            parse("clock advance 3h").unwrap(),
            Command::Clock(ClockCommand::Advance(Duration::hours(3)))
        );
        assert_eq!(parse("ledger null").unwrap(), Command::Ledger(LedgerCommand::Null));
        assert!(parse("ledger rewind").is_err());
    }

    #[test]
    fn rejects_unknown_commands_and_names() {
        assert_eq!(
            parse("feed").unwrap_err(),
            ConsoleError::UnknownCommand {
                command: "feed".to_owned()
            }
        );
        assert!(matches!(parse("force feeding").unwrap_err(), ConsoleError::Name(_)));
    }

    #[test]
    fn spans_accept_units() {
        assert_eq!(parse_span("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_span("90").unwrap(), Duration::minutes(90));
        assert_eq!(parse_span("2d").unwrap(), Duration::days(2));
        assert!(parse_span("-5m").is_err());
        assert!(parse_span("5w").is_err());
        assert!(parse_span("m").is_err());
    }

    #[test]
    fn executes_a_care_session() {
        let mut caretaker = caretaker();
        run(&mut caretaker, "clock set 2026-06-01T12:00:00Z");
        assert!(run(&mut caretaker, "birth normal tabby 6 Mochi").contains("egg"));
        assert_eq!(caretaker.pet().name.as_deref(), Some("Mochi"));
        run(&mut caretaker, "hatch");
        run(&mut caretaker, "clock advance 185m");
        run(&mut caretaker, "force hunger-decay");
        assert_eq!(caretaker.pet().current_hunger, 82);

        let report = run(&mut caretaker, "ledger");
        assert!(report.contains("hunger-decay"));
        assert!(caretaker.ledger().get(Channel::HungerDecay).is_some());
    }

    #[test]
    fn refused_requests_are_errors() {
        let mut caretaker = caretaker();
        let mut out = Vec::new();
        let result = execute(&mut caretaker, Command::Hatch, &mut out);
        assert!(matches!(result, Err(EngineError::Care { .. })));

        let result = execute(&mut caretaker, parse("pet {\"bogus\": 1}").unwrap(), &mut out);
        assert!(matches!(result, Err(EngineError::Operator { .. })));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut caretaker = caretaker();
        let mut out = Vec::new();
        assert_eq!(execute(&mut caretaker, Command::Quit, &mut out).unwrap(), Flow::Quit);
        assert_eq!(execute(&mut caretaker, Command::Help, &mut out).unwrap(), Flow::Continue);
    }
}
