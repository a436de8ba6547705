//! 伺服器層級的錯誤型別
//!
//! 遊戲規則上的拒絕 (猜錯回合、遊戲進行中) 不走這裡，而是以 enum 回傳。

use std::io;
use std::path::PathBuf;

/// 啟動與執行期間的致命錯誤
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// 無法建立 listener
    #[error("Failed to bind listener: {0}")]
    Bind(#[source] io::Error),

    /// 無法註冊 SIGINT / SIGTERM
    #[error("Failed to register signal handlers: {0}")]
    Signal(#[source] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// 設定載入錯誤
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// CLI 參數或環境變數的值無效
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
