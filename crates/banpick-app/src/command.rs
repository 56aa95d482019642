// Command-line parsing: turns a line typed into the TUI prompt into a
// `UserCommand`.
//
// A line whose first word is not a known verb is treated as a selection, so
// typing a champion name and pressing Enter drafts it.

use thiserror::Error;

use banpick_core::catalog::Role;
use banpick_core::draft::Team;
use banpick_core::recommend::ControllerScope;
use banpick_core::series::SeriesFormat;

use crate::protocol::UserCommand;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("empty command")]
    Empty,

    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("`{command}`: expected {expected}, got `{value}`")]
    InvalidArgument {
        command: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Short help text listing every verb.
pub const HELP: &str = "<name>|pick <name>  accept  undo  reset  next  format bo1|bo3|bo5  \
game <n>  add|rm <game> blue|red <name>  fearless on|off  scope off|blue|red|both  \
auto on|off  save  load  newseries  reload  find <text>  role <role>|any  quit";

/// Parse one prompt line.
pub fn parse_command(line: &str) -> Result<UserCommand, InputError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    if verb.is_empty() {
        return Err(InputError::Empty);
    }

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "pick" | "p" | "ban" | "select" => {
            UserCommand::Select(required("pick", rest, "a champion name")?.to_string())
        }
        "accept" | "a" => UserCommand::AcceptSuggestion,
        "undo" | "u" => UserCommand::Undo,
        "reset" => UserCommand::ResetDraft,
        "next" | "n" => UserCommand::NextGame,
        "format" => {
            let value = required("format", rest, "bo1, bo3 or bo5")?;
            let format = SeriesFormat::from_str_format(value)
                .ok_or_else(|| invalid("format", value, "bo1, bo3 or bo5"))?;
            UserCommand::SetFormat(format)
        }
        "game" | "g" => {
            let value = required("game", rest, "a game number")?;
            UserCommand::SetGame(game_number("game", value)?)
        }
        "add" => {
            let (game, team, entity) = history_args("add", rest)?;
            UserCommand::BackfillPick { game, team, entity }
        }
        "rm" | "remove" => {
            let (game, team, entity) = history_args("rm", rest)?;
            UserCommand::RemovePick { game, team, entity }
        }
        "fearless" => UserCommand::SetFearless(on_off("fearless", rest)?),
        "scope" | "ai" => {
            let value = required("scope", rest, "off, blue, red or both")?;
            let scope = ControllerScope::from_str_scope(value)
                .ok_or_else(|| invalid("scope", value, "off, blue, red or both"))?;
            UserCommand::SetScope(scope)
        }
        "auto" => UserCommand::SetAutoApply(on_off("auto", rest)?),
        "save" => UserCommand::SaveSeries,
        "load" => UserCommand::LoadSeries,
        "newseries" | "reset-series" => UserCommand::ResetSeries,
        "reload" => UserCommand::ReloadCatalog,
        "find" | "search" | "/" => UserCommand::Search(rest.to_string()),
        "role" => {
            let value = required("role", rest, "a role or `any`")?;
            if value.eq_ignore_ascii_case("any") || value.eq_ignore_ascii_case("all") {
                UserCommand::RoleFilter(None)
            } else {
                let role = Role::from_str_role(value).ok_or_else(|| {
                    invalid("role", value, "top, jungle, mid, bot, support or any")
                })?;
                UserCommand::RoleFilter(Some(role))
            }
        }
        "quit" | "q" | "exit" => UserCommand::Quit,
        _ => UserCommand::Select(line.to_string()),
    };
    Ok(cmd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn required<'a>(
    command: &'static str,
    rest: &'a str,
    expected: &'static str,
) -> Result<&'a str, InputError> {
    if rest.is_empty() {
        Err(InputError::MissingArgument { command, expected })
    } else {
        Ok(rest)
    }
}

fn invalid(command: &'static str, value: &str, expected: &'static str) -> InputError {
    InputError::InvalidArgument {
        command,
        value: value.to_string(),
        expected,
    }
}

fn game_number(command: &'static str, value: &str) -> Result<u32, InputError> {
    value
        .parse::<u32>()
        .map_err(|_| invalid(command, value, "a game number"))
}

fn on_off(command: &'static str, rest: &str) -> Result<bool, InputError> {
    match rest.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        "" => Err(InputError::MissingArgument {
            command,
            expected: "on or off",
        }),
        _ => Err(invalid(command, rest, "on or off")),
    }
}

/// `<game> <team> <name...>`
fn history_args(command: &'static str, rest: &str) -> Result<(u32, Team, String), InputError> {
    const EXPECTED: &str = "<game> blue|red <name>";
    let mut parts = rest.splitn(3, char::is_whitespace);
    let (Some(game), Some(team), Some(entity)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(InputError::MissingArgument {
            command,
            expected: EXPECTED,
        });
    };
    let game = game_number(command, game)?;
    if game == 0 {
        return Err(invalid(command, "0", "a game number from 1"));
    }
    let team = Team::from_str_team(team).ok_or_else(|| invalid(command, team, "blue or red"))?;
    let entity = entity.trim();
    if entity.is_empty() {
        return Err(InputError::MissingArgument {
            command,
            expected: EXPECTED,
        });
    }
    Ok((game, team, entity.to_string()))
}
