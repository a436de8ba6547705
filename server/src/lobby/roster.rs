use crate::net::{ConnectionId, PlayerHandle};
use crate::protocol::ServerMessage;
use log::warn;

/// 目前連線中的玩家，依加入順序排列
///
/// 順序決定下一局的輪替順序。
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<PlayerHandle>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增玩家，回傳目前人數
    pub fn add(&mut self, handle: PlayerHandle) -> usize {
        if !self.contains(handle.id()) {
            self.players.push(handle);
        }
        self.players.len()
    }

    /// 移除玩家 (透過 conn_id)
    pub fn remove(&mut self, conn_id: ConnectionId) -> Option<PlayerHandle> {
        let pos = self.players.iter().position(|p| p.id() == conn_id)?;
        Some(self.players.remove(pos))
    }

    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.players.iter().any(|p| p.id() == conn_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// 凍結目前順序，作為新遊戲局的玩家快照
    pub fn snapshot(&self) -> Vec<PlayerHandle> {
        self.players.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerHandle> {
        self.players.iter()
    }

    /// 廣播給所有玩家，回傳成功送出的數量
    pub fn broadcast(&self, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        for player in &self.players {
            if player.send(msg.clone()) {
                delivered += 1;
            } else {
                warn!("[LOBBY] Failed to send to #{}", player.id());
            }
        }
        delivered
    }
}
