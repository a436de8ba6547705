//! 關閉協調
//!
//! accept loop、每條連線的讀取迴圈與主執行緒都會檢查同一個旗標。

use log::info;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// 共享的關閉旗標
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// 收到 SIGINT / SIGTERM 時設定旗標
    pub fn register_signals(&self) -> io::Result<()> {
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&self.flag))?;
        }
        Ok(())
    }

    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            info!("[SERVER] Shutdown initiated");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 阻塞直到旗標被設定
    pub fn wait(&self, poll_interval: Duration) {
        while !self.is_triggered() {
            thread::sleep(poll_interval);
        }
    }
}
