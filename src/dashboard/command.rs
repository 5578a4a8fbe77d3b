//! User commands accepted by the dashboard

use crate::core::types::EntityId;
use crate::dashboard::options::VisualOptions;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFilter(String),
    Toggle(EntityId),
    SetVisualOptions(VisualOptions),
    Pause,
    Resume,
    TogglePlayback,
    Shutdown,
}

impl Command {
    /// Parse one line of the interactive prompt.
    ///
    /// `blink` needs the current options since it only flips one of them.
    pub fn parse(line: &str, current: VisualOptions) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "filter" | "f" => Ok(Command::SetFilter(rest.to_string())),
            "clear" => Ok(Command::SetFilter(String::new())),
            "toggle" | "select" => {
                if rest.is_empty() {
                    Err("Usage: toggle <id>".into())
                } else {
                    Ok(Command::Toggle(EntityId::new(rest)))
                }
            }
            "blink" => {
                let blinking = match rest {
                    "on" => true,
                    "off" => false,
                    "" => !current.blinking,
                    _ => return Err("Usage: blink [on|off]".into()),
                };
                Ok(Command::SetVisualOptions(VisualOptions {
                    blinking,
                    ..current
                }))
            }
            "lines" => Ok(Command::SetVisualOptions(VisualOptions {
                draw_lines_selected: !current.draw_lines_selected,
                ..current
            })),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "play" | "p" => Ok(Command::TogglePlayback),
            "quit" | "q" => Ok(Command::Shutdown),
            "" => Err("Empty command".into()),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}
