//! Command and phase definitions

use serde::{Deserialize, Serialize};

/// One interpreted unit of spoken intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    /// "继续"
    Continue,
    /// "next"; same role as Continue
    Next,
}

impl Command {
    /// All commands, directions first
    pub const ALL: [Command; 6] = [
        Command::Up,
        Command::Down,
        Command::Left,
        Command::Right,
        Command::Continue,
        Command::Next,
    ];

    pub fn is_direction(&self) -> bool {
        matches!(self, Command::Up | Command::Down | Command::Left | Command::Right)
    }

    /// Separators unlock the next direction turn
    pub fn is_separator(&self) -> bool {
        matches!(self, Command::Continue | Command::Next)
    }

    /// Spoken word shown to the user
    pub fn display(&self) -> &'static str {
        match self {
            Command::Up => "上",
            Command::Down => "下",
            Command::Left => "左",
            Command::Right => "右",
            Command::Continue => "继续",
            Command::Next => "下一个",
        }
    }

    /// Arrow glyph for terminal display
    pub fn arrow(&self) -> &'static str {
        match self {
            Command::Up => "↑",
            Command::Down => "↓",
            Command::Left => "←",
            Command::Right => "→",
            Command::Continue | Command::Next => "⏭",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Up => "UP",
            Command::Down => "DOWN",
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
            Command::Continue => "CONTINUE",
            Command::Next => "NEXT",
        };
        write!(f, "{}", name)
    }
}

/// Which kind of command the engine currently expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Direction,
    Separator,
}

impl Phase {
    /// Phase that follows a sentence whose last match was `command`
    pub fn after(command: Command) -> Self {
        if command.is_direction() {
            Phase::Separator
        } else {
            Phase::Direction
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Direction => write!(f, "DIRECTION"),
            Phase::Separator => write!(f, "SEPARATOR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_and_separator_partition() {
        for command in Command::ALL {
            assert_ne!(command.is_direction(), command.is_separator(), "{command}");
        }
    }

    #[test]
    fn test_phase_after_command() {
        assert_eq!(Phase::after(Command::Left), Phase::Separator);
        assert_eq!(Phase::after(Command::Continue), Phase::Direction);
        assert_eq!(Phase::after(Command::Next), Phase::Direction);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Command::Continue).unwrap();
        assert_eq!(json, "\"continue\"");
    }
}
