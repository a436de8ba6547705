//! Operator Console - 本機管理介面
//!
//! 從 stdin 讀取新單字與指令。輸入結束只會停止 console，伺服器照常運作。

use super::commands::{
    ParsedCommand, format_logs, format_players, format_status, help_message, parse_command,
};
use super::logger::GameLogger;
use crate::lobby::{SessionCoordinator, WordRejection};
use crate::shutdown::Shutdown;
use log::info;
use std::io::{self, BufRead, Write};

/// 執行 console 主迴圈，直到輸入結束或收到 /quit
pub fn run_console<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    coordinator: &SessionCoordinator,
    logger: &GameLogger,
    shutdown: &Shutdown,
) -> io::Result<()> {
    writeln!(output, "=== Hangman Operator Console === (type /help for commands)")?;

    let mut line = String::new();
    while !shutdown.is_triggered() {
        write_prompt(&mut output, coordinator)?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            info!("[ADMIN] Operator input closed, console stopped");
            break;
        }

        match parse_command(&line) {
            ParsedCommand::Word(word) => match coordinator.submit_word(&word) {
                Ok(id) => {
                    let word = word.trim().to_uppercase();
                    writeln!(output, "OK: session #{} started with word {}", id, word)?;
                    logger.admin_action(
                        "WORD",
                        &format!("session #{} ({} letters)", id, word.chars().count()),
                    );
                }
                Err(reason) => writeln!(output, "IGNORED: {}", reason)?,
            },
            ParsedCommand::Help => writeln!(output, "{}", help_message())?,
            ParsedCommand::Status => writeln!(output, "{}", format_status(&coordinator.status()))?,
            ParsedCommand::Players => {
                writeln!(output, "{}", format_players(&coordinator.players()))?
            }
            ParsedCommand::Logs(count, event_type) => {
                writeln!(output, "{}", format_logs(logger, count, event_type))?
            }
            ParsedCommand::Quit => {
                writeln!(output, "Shutting down...")?;
                logger.admin_action("QUIT", "operator requested shutdown");
                shutdown.trigger();
            }
            ParsedCommand::Empty => {}
            ParsedCommand::Unknown(msg) => writeln!(output, "ERROR: {}", msg)?,
        }
    }

    output.flush()
}

fn write_prompt<W: Write>(output: &mut W, coordinator: &SessionCoordinator) -> io::Result<()> {
    match coordinator.can_accept_word() {
        Ok(()) => write!(output, "\n[ADMIN] Enter new word: ")?,
        Err(WordRejection::InProgress) => write!(output, "[ADMIN] (game in progress) > ")?,
        Err(reason) => write!(output, "[ADMIN] ({}) > ", reason)?,
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::PlayerHandle;
    use std::io::Cursor;
    use std::net::SocketAddr;

    fn run(input: &str, coordinator: &SessionCoordinator, shutdown: &Shutdown) -> String {
        let logger = GameLogger::new();
        let mut output = Vec::new();
        run_console(Cursor::new(input), &mut output, coordinator, &logger, shutdown).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_word_without_players_is_ignored() {
        let coordinator = SessionCoordinator::new(GameLogger::new());
        let shutdown = Shutdown::new();

        let output = run("gato\n", &coordinator, &shutdown);
        assert!(output.contains("IGNORED: no players connected"));
        assert!(!coordinator.is_session_running());
        assert!(!shutdown.is_triggered());
    }

    #[test]
    fn test_word_starts_session_and_second_is_ignored() {
        let coordinator = SessionCoordinator::new(GameLogger::new());
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let (player, _rx) = PlayerHandle::with_channel(1, addr);
        coordinator.register(player);
        let shutdown = Shutdown::new();

        let output = run("\n  gato \nsol\n/status\n", &coordinator, &shutdown);
        assert!(output.contains("[ADMIN] Enter new word: "));
        assert!(output.contains("started with word GATO"));
        assert!(output.contains("IGNORED: a game is already in progress"));
        assert!(output.contains("Word: ____"));
        assert!(coordinator.is_session_running());
    }

    #[test]
    fn test_quit_triggers_shutdown_and_stops_reading() {
        let coordinator = SessionCoordinator::new(GameLogger::new());
        let shutdown = Shutdown::new();

        let output = run("/quit\n/help\n", &coordinator, &shutdown);
        assert!(shutdown.is_triggered());
        assert!(output.contains("Shutting down..."));
        assert!(!output.contains("Commands:"));
    }

    #[test]
    fn test_eof_does_not_trigger_shutdown() {
        let coordinator = SessionCoordinator::new(GameLogger::new());
        let shutdown = Shutdown::new();

        let output = run("/bogus\n", &coordinator, &shutdown);
        assert!(output.contains("ERROR: Unknown command: BOGUS"));
        assert!(!shutdown.is_triggered());
    }
}
