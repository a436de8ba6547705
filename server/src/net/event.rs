use crate::protocol::ServerMessage;
use std::sync::mpsc;

/// 寫入執行緒處理的項目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// 寫出一行訊息
    Message(ServerMessage),
    /// 送完先前排隊的訊息後結束寫入執行緒
    Close,
}

/// 用於發送訊息給特定 client 的 sender
pub type ClientSender = mpsc::Sender<Outbound>;

/// 用於接收訊息的 receiver (寫入執行緒持有)
pub type ClientReceiver = mpsc::Receiver<Outbound>;

/// 建立 client 的訊息通道
pub fn create_client_channel() -> (ClientSender, ClientReceiver) {
    mpsc::channel()
}
