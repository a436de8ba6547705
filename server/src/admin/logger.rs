//! Game Logger - 遊戲事件記錄器
//!
//! 使用 Ring Buffer 儲存最近的遊戲事件，供 operator console 查詢。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// 預設保留的訊息數量
pub const DEFAULT_CAPACITY: usize = 500;

/// 事件類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    PlayerJoin,
    PlayerLeave,
    GameStart,
    GameEnd,
    Guess,
    AdminAction,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PlayerJoin => "PLAYER_JOIN",
            EventType::PlayerLeave => "PLAYER_LEAVE",
            EventType::GameStart => "GAME_START",
            EventType::GameEnd => "GAME_END",
            EventType::Guess => "GUESS",
            EventType::AdminAction => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLAYER_JOIN" => Some(EventType::PlayerJoin),
            "PLAYER_LEAVE" => Some(EventType::PlayerLeave),
            "GAME_START" => Some(EventType::GameStart),
            "GAME_END" => Some(EventType::GameEnd),
            "GUESS" => Some(EventType::Guess),
            "ADMIN" => Some(EventType::AdminAction),
            _ => None,
        }
    }
}

/// 日誌條目
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: u64,
    pub event_type: EventType,
    pub message: String,
}

impl LogEntry {
    pub fn new(event_type: EventType, message: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            timestamp,
            event_type,
            message: message.into(),
        }
    }

    /// 格式化為顯示字串
    pub fn format(&self) -> String {
        format!(
            "[{}] {}: {}",
            format_timestamp(self.timestamp),
            self.event_type.as_str(),
            self.message
        )
    }
}

/// 格式化時間戳記 (UTC 時:分:秒)
fn format_timestamp(timestamp: u64) -> String {
    let secs = timestamp % 86400;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// 日誌管理器 (線程安全)
#[derive(Clone)]
pub struct GameLogger {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl GameLogger {
    /// 建立新的日誌管理器
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 建立指定容量的日誌管理器
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// 記錄事件
    pub fn log(&self, event_type: EventType, message: impl Into<String>) {
        let entry = LogEntry::new(event_type, message);

        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    /// 取得最近 n 條日誌
    pub fn get_recent(&self, n: usize) -> Vec<LogEntry> {
        if let Ok(entries) = self.entries.lock() {
            let start = entries.len().saturating_sub(n);
            entries.iter().skip(start).cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// 取得最近 n 條指定類型的日誌
    pub fn get_recent_by_type(&self, n: usize, event_type: EventType) -> Vec<LogEntry> {
        if let Ok(entries) = self.entries.lock() {
            let mut matched: Vec<LogEntry> = entries
                .iter()
                .rev()
                .filter(|e| e.event_type == event_type)
                .take(n)
                .cloned()
                .collect();
            matched.reverse();
            matched
        } else {
            Vec::new()
        }
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

// === 便捷記錄函數 ===

impl GameLogger {
    pub fn player_join(&self, conn_id: u64, addr: &str, total: usize) {
        self.log(
            EventType::PlayerJoin,
            format!("#{} from {} joined (total: {})", conn_id, addr, total),
        );
    }

    pub fn player_leave(&self, conn_id: u64, remaining: usize) {
        self.log(
            EventType::PlayerLeave,
            format!("#{} left (remaining: {})", conn_id, remaining),
        );
    }

    pub fn game_start(&self, session_id: u64, word_len: usize, players: usize) {
        self.log(
            EventType::GameStart,
            format!(
                "session #{} started ({} letters, {} players)",
                session_id, word_len, players
            ),
        );
    }

    pub fn game_end(&self, session_id: u64, outcome: &str, word: &str) {
        self.log(
            EventType::GameEnd,
            format!("session #{} {} (word: {})", session_id, outcome, word),
        );
    }

    pub fn guess(&self, conn_id: u64, letter: char, result: &str) {
        self.log(
            EventType::Guess,
            format!("#{} guessed {}: {}", conn_id, letter, result),
        );
    }

    pub fn admin_action(&self, action: &str, detail: &str) {
        self.log(EventType::AdminAction, format!("{}: {}", action, detail));
    }
}
