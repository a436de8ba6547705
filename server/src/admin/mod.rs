//! Admin Module - 本機 operator 介面
//!
//! - 從 stdin 接收下一局的單字
//! - 伺服器狀態與玩家列表
//! - 遊戲事件記錄查看

pub mod commands;
pub mod console;
pub mod logger;

pub use console::run_console;
pub use logger::GameLogger;
