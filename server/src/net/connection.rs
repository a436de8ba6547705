use super::event::{ClientReceiver, ClientSender, Outbound, create_client_channel};
use crate::protocol::ServerMessage;
use log::debug;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// 連線 ID 類型
pub type ConnectionId = u64;

/// 全域連線 ID 計數器
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 產生新的連線 ID
pub fn next_connection_id() -> ConnectionId {
    CONNECTION_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// 玩家連線的對外介面
///
/// 只持有連線 ID、位址和輸出佇列，可以自由 clone 給 roster 與遊戲快照。
/// 所有寫入都經由佇列交給該連線專屬的寫入執行緒，因此 `send` 可同時從
/// 任何執行緒呼叫。
#[derive(Clone)]
pub struct PlayerHandle {
    id: ConnectionId,
    peer_addr: SocketAddr,
    tx: ClientSender,
}

impl PlayerHandle {
    pub fn new(id: ConnectionId, peer_addr: SocketAddr, tx: ClientSender) -> Self {
        Self { id, peer_addr, tx }
    }

    /// 建立 handle 與對應的 receiver (測試與 handler 共用)
    pub fn with_channel(id: ConnectionId, peer_addr: SocketAddr) -> (Self, ClientReceiver) {
        let (tx, rx) = create_client_channel();
        (Self::new(id, peer_addr, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// 將訊息放入輸出佇列，連線已關閉時回傳 false
    pub fn send(&self, msg: ServerMessage) -> bool {
        match self.tx.send(Outbound::Message(msg)) {
            Ok(()) => true,
            Err(_) => {
                debug!("[HANDLER] Connection #{} queue closed, message dropped", self.id);
                false
            }
        }
    }

    /// 要求寫入執行緒在送完佇列後結束
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}
