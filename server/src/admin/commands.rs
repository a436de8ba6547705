//! Operator Commands - 管理指令解析與格式化
//!
//! 一般輸入視為新單字，以 `/` 開頭的輸入視為指令。

use super::logger::{EventType, GameLogger};
use crate::lobby::{CoordinatorStatus, PlayerSummary};

/// 指令前綴
pub const COMMAND_PREFIX: char = '/';

/// 預設 LOGS 筆數
const DEFAULT_LOG_COUNT: usize = 20;

/// 指令解析結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// 新單字
    Word(String),
    Help,
    Status,
    Players,
    Logs(usize, Option<EventType>),
    Quit,
    /// 空行
    Empty,
    Unknown(String),
}

/// 解析一行 operator 輸入
pub fn parse_command(input: &str) -> ParsedCommand {
    let input = input.trim();

    if input.is_empty() {
        return ParsedCommand::Empty;
    }

    let Some(rest) = input.strip_prefix(COMMAND_PREFIX) else {
        return ParsedCommand::Word(input.to_string());
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();
    let Some(cmd) = parts.first().map(|c| c.to_uppercase()) else {
        return ParsedCommand::Unknown("Missing command after '/'".to_string());
    };

    match cmd.as_str() {
        "HELP" | "?" => ParsedCommand::Help,
        "STATUS" => ParsedCommand::Status,
        "PLAYERS" => ParsedCommand::Players,
        "LOGS" => {
            let count = parts
                .get(1)
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOG_COUNT);
            let event_type = parts.get(2).and_then(|s| EventType::parse(s));
            ParsedCommand::Logs(count, event_type)
        }
        "QUIT" | "EXIT" => ParsedCommand::Quit,
        _ => ParsedCommand::Unknown(format!("Unknown command: {}", cmd)),
    }
}

/// 產生 HELP 訊息
pub fn help_message() -> String {
    r#"
=== Hangman Operator Console ===

Type a word to start a new game (only when no game is running
and at least one player is connected).

Commands:
  /help              Show this help message
  /status            Show server and game status
  /players           List connected players
  /logs [n] [type]   Show recent n events (default: 20)
                     Types: PLAYER_JOIN, PLAYER_LEAVE, GAME_START,
                            GAME_END, GUESS, ADMIN
  /quit              Shut down the server
"#
    .to_string()
}

/// 格式化狀態
pub fn format_status(status: &CoordinatorStatus) -> String {
    let mut output = format!("\n=== Server Status ===\nPlayers Connected: {}\n", status.players);

    match &status.session {
        Some(session) => {
            let attempted = session
                .attempted
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!(
                "Session: #{} ({:?}, {:.0}s)\nWord: {}\nErrors: {}/{}\nAttempted: [{}]\nTurn: player {} of {} ({} still connected)\n",
                session.id,
                session.state,
                session.elapsed.as_secs_f32(),
                session.mask,
                session.errors,
                crate::game::MAX_ERRORS,
                attempted,
                session.turn,
                session.participants,
                session.present
            ));
        }
        None => output.push_str("Session: none\n"),
    }
    output
}

/// 格式化玩家列表
pub fn format_players(players: &[PlayerSummary]) -> String {
    if players.is_empty() {
        return "No players connected.".to_string();
    }

    let mut output = String::from("\n=== Players ===\n");
    output.push_str(&format!("{:<8} {:<24} {:<8}\n", "ID", "Address", "Playing"));
    output.push_str(&"-".repeat(42));
    output.push('\n');

    for player in players {
        output.push_str(&format!(
            "{:<8} {:<24} {:<8}\n",
            format!("#{}", player.conn_id),
            player.peer_addr.to_string(),
            if player.in_session { "Yes" } else { "No" }
        ));
    }
    output
}

/// 格式化日誌
pub fn format_logs(logger: &GameLogger, count: usize, event_type: Option<EventType>) -> String {
    let entries = match event_type {
        Some(et) => logger.get_recent_by_type(count, et),
        None => logger.get_recent(count),
    };

    if entries.is_empty() {
        return "No logs found.".to_string();
    }

    let mut output = String::from("\n=== Logs ===\n");
    for entry in entries {
        output.push_str(&entry.format());
        output.push('\n');
    }
    output
}
