use super::mask::Mask;
use crate::net::{ConnectionId, PlayerHandle};
use crate::protocol::ServerMessage;
use log::{debug, info};
use std::collections::BTreeSet;

/// 允許的最大錯誤次數
pub const MAX_ERRORS: u8 = 7;

/// 遊戲局 ID
pub type SessionId = u64;

/// 遊戲局狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 已建立，尚未廣播開局
    Initializing,
    /// 進行中
    InProgress,
    /// 單字全部揭示
    Won,
    /// 錯誤次數用盡
    Lost,
    /// 所有參與者都已離線
    Abandoned,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Won | SessionState::Lost | SessionState::Abandoned
        )
    }
}

/// 遊戲結束結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Won,
    Lost,
    Abandoned,
}

/// 猜測被拒絕的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessRejection {
    NotYourTurn,
    NotInProgress,
    NotALetter,
    AlreadyAttempted(char),
}

/// 猜測結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// 被拒絕，狀態不變
    Rejected(GuessRejection),
    /// 已套用，輪到下一位
    Continue { hit: bool, next_turn: usize },
    /// 已套用，遊戲結束
    Finished(SessionOutcome),
}

/// 快照中的玩家
#[derive(Debug)]
struct Participant {
    handle: PlayerHandle,
    present: bool,
}

/// 一局猜字遊戲
///
/// 玩家順序在建立時凍結，之後 roster 的變動不影響本局。離線的玩家只會被
/// 標記為 departed，輪替時跳過，快照本身的組成不變。
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    word: Vec<char>,
    mask: Mask,
    attempted: BTreeSet<char>,
    errors: u8,
    turn: usize,
    players: Vec<Participant>,
    state: SessionState,
}

impl GameSession {
    /// 建立新遊戲局，`players` 即為本局的固定順序
    pub fn new(id: SessionId, word: &str, players: Vec<PlayerHandle>) -> Self {
        let word: Vec<char> = word.trim().to_uppercase().chars().collect();
        let players = players
            .into_iter()
            .map(|handle| Participant {
                handle,
                present: true,
            })
            .collect();

        Self {
            id,
            mask: Mask::hidden(word.len()),
            word,
            attempted: BTreeSet::new(),
            errors: 0,
            turn: 0,
            players,
            state: SessionState::Initializing,
        }
    }

    /// 開局：重設狀態並廣播開局訊息、遮罩與第一位玩家
    ///
    /// 沒有任何玩家時直接以 Abandoned 結束。
    pub fn start(&mut self) -> Option<SessionOutcome> {
        self.mask = Mask::hidden(self.word.len());
        self.attempted.clear();
        self.errors = 0;
        self.turn = 0;

        if self.players.is_empty() {
            self.state = SessionState::Abandoned;
            return Some(SessionOutcome::Abandoned);
        }

        self.state = SessionState::InProgress;
        info!(
            "[SESSION] #{} started with {} player(s), word length {}",
            self.id,
            self.players.len(),
            self.word.len()
        );

        self.broadcast(&ServerMessage::GameStarted);
        self.broadcast_progress();
        self.announce_turn();
        None
    }

    /// 處理一次猜測
    ///
    /// 呼叫端需以每局一把的 mutex 保護，確保同一局的猜測是序列化的。
    pub fn process_guess(&mut self, letter: char, submitter: &PlayerHandle) -> GuessOutcome {
        // 1. 檢查是否輪到該玩家
        if self.current_player() != Some(submitter.id()) {
            submitter.send(ServerMessage::NotYourTurn);
            return GuessOutcome::Rejected(GuessRejection::NotYourTurn);
        }

        // 2. 已結束 (或尚未開始) 的遊戲不再接受猜測
        if self.state != SessionState::InProgress {
            return GuessOutcome::Rejected(GuessRejection::NotInProgress);
        }

        if !letter.is_alphabetic() {
            return GuessOutcome::Rejected(GuessRejection::NotALetter);
        }

        // 3. 統一轉大寫
        let letter = normalize_letter(letter);

        // 4. 重複的字母
        if self.attempted.contains(&letter) {
            submitter.send(ServerMessage::AlreadyAttempted(letter));
            return GuessOutcome::Rejected(GuessRejection::AlreadyAttempted(letter));
        }

        // 5. 揭示或累計錯誤
        self.attempted.insert(letter);
        let hit = self.mask.reveal(&self.word, letter) > 0;
        if !hit {
            self.errors += 1;
            self.broadcast(&ServerMessage::WrongLetter {
                errors: self.errors,
                max_errors: MAX_ERRORS,
            });
        }
        debug!(
            "[SESSION] #{} player {} guessed {} ({})",
            self.id,
            self.turn + 1,
            letter,
            if hit { "hit" } else { "miss" }
        );

        // 6. 廣播最新狀態
        self.broadcast_progress();

        // 7. 判斷是否結束
        if let Some(outcome) = self.evaluate_end() {
            return GuessOutcome::Finished(outcome);
        }

        // 8. 換下一位
        if !self.advance_turn() {
            return GuessOutcome::Finished(self.abandon());
        }
        GuessOutcome::Continue {
            hit,
            next_turn: self.turn,
        }
    }

    /// 參與者離線
    ///
    /// 若輪到的正是該玩家，強制換到下一位仍在線的玩家；沒有人在線時結束本局。
    pub fn player_departed(&mut self, conn_id: ConnectionId) -> Option<SessionOutcome> {
        if self.state.is_terminal() {
            return None;
        }

        let idx = self
            .players
            .iter()
            .position(|p| p.handle.id() == conn_id && p.present)?;
        self.players[idx].present = false;

        info!(
            "[SESSION] #{} player {} (#{}) departed",
            self.id,
            idx + 1,
            conn_id
        );

        if self.present_count() == 0 {
            return Some(self.abandon());
        }

        self.broadcast(&ServerMessage::PlayerLeft { player: idx + 1 });

        if self.state == SessionState::InProgress && idx == self.turn && !self.advance_turn() {
            return Some(self.abandon());
        }
        None
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn word(&self) -> String {
        self.word.iter().collect()
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn errors(&self) -> u8 {
        self.errors
    }

    pub fn attempted(&self) -> &BTreeSet<char> {
        &self.attempted
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn present_count(&self) -> usize {
        self.players.iter().filter(|p| p.present).count()
    }

    /// 快照中仍在線的玩家
    pub fn participant_ids(&self) -> Vec<ConnectionId> {
        self.players
            .iter()
            .filter(|p| p.present)
            .map(|p| p.handle.id())
            .collect()
    }

    /// 目前輪到的玩家
    pub fn current_player(&self) -> Option<ConnectionId> {
        self.players.get(self.turn).map(|p| p.handle.id())
    }

    fn evaluate_end(&mut self) -> Option<SessionOutcome> {
        let word = self.word();
        if self.mask.is_complete() {
            self.state = SessionState::Won;
            info!("[SESSION] #{} won, word was {}", self.id, word);
            self.broadcast(&ServerMessage::Won { word });
            Some(SessionOutcome::Won)
        } else if self.errors >= MAX_ERRORS {
            self.state = SessionState::Lost;
            info!("[SESSION] #{} lost, word was {}", self.id, word);
            self.broadcast(&ServerMessage::Lost { word });
            Some(SessionOutcome::Lost)
        } else {
            None
        }
    }

    fn abandon(&mut self) -> SessionOutcome {
        self.state = SessionState::Abandoned;
        info!("[SESSION] #{} abandoned, no players left", self.id);
        SessionOutcome::Abandoned
    }

    /// 換到下一位在線玩家 (循環)，沒有在線玩家時回傳 false
    fn advance_turn(&mut self) -> bool {
        let count = self.players.len();
        if count == 0 {
            return false;
        }

        let next = (1..=count)
            .map(|step| (self.turn + step) % count)
            .find(|&idx| self.players[idx].present);

        match next {
            Some(idx) => {
                self.turn = idx;
                self.announce_turn();
                true
            }
            None => false,
        }
    }

    fn announce_turn(&self) {
        self.broadcast(&ServerMessage::TurnOf {
            player: self.turn + 1,
        });
        if let Some(p) = self.players.get(self.turn) {
            p.handle.send(ServerMessage::YourTurn);
        }
    }

    fn broadcast_progress(&self) {
        self.broadcast(&ServerMessage::Mask(self.mask.to_string()));
        self.broadcast(&ServerMessage::Attempted(
            self.attempted.iter().copied().collect(),
        ));
    }

    /// 廣播給快照中仍在線的玩家，單一玩家失敗不影響其他人
    fn broadcast(&self, msg: &ServerMessage) {
        for p in self.players.iter().filter(|p| p.present) {
            p.handle.send(msg.clone());
        }
    }
}

/// 轉大寫，只在結果仍是單一字元時採用
fn normalize_letter(letter: char) -> char {
    let mut upper = letter.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => letter,
    }
}
