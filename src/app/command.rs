//! Commands typed during a focus session

/// A command read from stdin while the stopwatch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusCommand {
    /// Pause or resume: p, pause, resume
    TogglePause,
    /// Stop and record the session: s, stop, q
    Stop,
    /// Start timing another task: switch <task-id>
    Switch(String),
    /// Show elapsed time: t, status
    Status,
    /// Show help: h, help, ?
    Help,
    /// Empty line
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    Ok(FocusCommand),
    UnknownCommand(String),
    MissingArgument(String),
}

/// Parse one input line
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(FocusCommand::Nop);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "p" | "pause" | "resume" => ParseResult::Ok(FocusCommand::TogglePause),
        "s" | "stop" | "q" | "quit" => ParseResult::Ok(FocusCommand::Stop),
        "t" | "status" => ParseResult::Ok(FocusCommand::Status),
        "h" | "help" | "?" => ParseResult::Ok(FocusCommand::Help),
        "switch" | "sw" => {
            if args.is_empty() {
                ParseResult::MissingArgument("switch".to_string())
            } else {
                ParseResult::Ok(FocusCommand::Switch(args.to_string()))
            }
        }
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

/// One-line summary of the commands
pub const HELP: &str = "p: pause/resume   s: stop   t: status   switch <task-id>   h: help";

/// Format seconds as H:MM:SS
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pause_aliases() {
        for input in ["p", "pause", "RESUME", "  p  "] {
            assert_eq!(parse_command(input), ParseResult::Ok(FocusCommand::TogglePause));
        }
    }

    #[test]
    fn parse_stop_aliases() {
        assert_eq!(parse_command("s"), ParseResult::Ok(FocusCommand::Stop));
        assert_eq!(parse_command("quit"), ParseResult::Ok(FocusCommand::Stop));
    }

    #[test]
    fn parse_switch_command() {
        match parse_command("switch 0-1-0-0-2") {
            ParseResult::Ok(FocusCommand::Switch(id)) => assert_eq!(id, "0-1-0-0-2"),
            other => panic!("Expected Switch command, got {:?}", other),
        }
    }

    #[test]
    fn parse_switch_missing_arg() {
        assert!(matches!(parse_command("switch"), ParseResult::MissingArgument(_)));
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse_command("dance"), ParseResult::UnknownCommand(_)));
    }

    #[test]
    fn parse_empty_is_nop() {
        assert_eq!(parse_command(""), ParseResult::Ok(FocusCommand::Nop));
        assert_eq!(parse_command("   "), ParseResult::Ok(FocusCommand::Nop));
    }

    #[test]
    fn elapsed_formats_hours_minutes_seconds() {
        assert_eq!(format_elapsed(0), "0:00:00");
        assert_eq!(format_elapsed(3725), "1:02:05");
    }
}
