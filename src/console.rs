//! Console output buffer
//!
//! `log` writes here instead of to stdout so hosts can render the output
//! however they like (the TUI draws it in a pane, the headless runner prints
//! new entries after every tick).

use chrono::Local;
use std::fmt;

/// One console entry
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub message: String,
    /// `[display]` tag and/or timestamp
    pub prefix: String,
    /// 0-based source line that produced the entry
    pub line: Option<usize>,
    /// How many identical consecutive messages this entry stands for
    pub repeat: usize,
}

impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.message)?;
        if self.repeat > 1 {
            write!(f, " (x{})", self.repeat)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub group: bool,
    /// Tag prepended as `[tag] `
    pub tag: Option<String>,
    pub timestamps: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Console {
    lines: Vec<ConsoleLine>,
    pub settings: ConsoleSettings,
}

impl Console {
    pub fn new(settings: ConsoleSettings) -> Self {
        Console {
            lines: Vec::new(),
            settings,
        }
    }

    /// Append a message and return the entry as displayed
    pub fn print(&mut self, message: String, line: Option<usize>) -> String {
        if self.settings.group {
            if let Some(last) = self.lines.last_mut() {
                if last.line == line && last.message == message {
                    last.repeat += 1;
                    return last.to_string();
                }
            }
        }

        let mut prefix = String::new();
        if self.settings.timestamps {
            prefix.push_str(&Local::now().format("%H:%M:%S ").to_string());
        }
        if let Some(tag) = &self.settings.tag {
            prefix.push_str(&format!("[{}] ", tag));
        }
        let entry = ConsoleLine {
            message,
            prefix,
            line,
            repeat: 1,
        };
        let text = entry.to_string();
        self.lines.push(entry);
        text
    }

    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    /// All entries as displayed
    pub fn get_output(&self) -> Vec<String> {
        self.lines.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_collapses_repeats() {
        let mut console = Console::new(ConsoleSettings {
            group: true,
            ..Default::default()
        });
        console.print("tick".to_string(), Some(3));
        console.print("tick".to_string(), Some(3));
        console.print("tock".to_string(), Some(3));
        console.print("tock".to_string(), Some(4));
        assert_eq!(console.get_output(), vec!["tick (x2)", "tock", "tock"]);
    }

    #[test]
    fn test_ungrouped_and_tagged() {
        let mut console = Console::new(ConsoleSettings {
            group: false,
            tag: Some("demo".to_string()),
            timestamps: false,
        });
        console.print("a".to_string(), Some(0));
        console.print("a".to_string(), Some(0));
        assert_eq!(console.get_output(), vec!["[demo] a", "[demo] a"]);
    }

    #[test]
    fn test_timestamp_prefix() {
        let mut console = Console::new(ConsoleSettings {
            timestamps: true,
            ..Default::default()
        });
        let text = console.print("hi".to_string(), None);
        // "HH:MM:SS hi"
        assert_eq!(text.len(), 11);
        assert!(text.ends_with(" hi"));
    }
}
