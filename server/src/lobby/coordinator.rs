use super::roster::Roster;
use crate::admin::GameLogger;
use crate::game::{GameSession, GuessOutcome, SessionId, SessionOutcome, SessionState};
use crate::net::{ConnectionId, PlayerHandle};
use crate::protocol::ServerMessage;
use log::{debug, info, warn};
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// 新單字被拒絕的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordRejection {
    /// 空白輸入
    Empty,
    /// 已有遊戲進行中
    InProgress,
    /// 沒有玩家連線
    NoPlayers,
}

impl fmt::Display for WordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordRejection::Empty => write!(f, "empty word"),
            WordRejection::InProgress => write!(f, "a game is already in progress"),
            WordRejection::NoPlayers => write!(f, "no players connected"),
        }
    }
}

/// 目前的遊戲局 (可能不存在)
enum ActiveSession {
    Idle,
    Running {
        id: SessionId,
        word: String,
        session: Arc<Mutex<GameSession>>,
        started_at: Instant,
    },
}

/// 遊戲局狀態摘要
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub id: SessionId,
    pub state: SessionState,
    pub mask: String,
    pub errors: u8,
    pub attempted: Vec<char>,
    /// 1-based
    pub turn: usize,
    pub participants: usize,
    pub present: usize,
    pub elapsed: Duration,
}

/// 伺服器狀態摘要
#[derive(Debug, Clone)]
pub struct CoordinatorStatus {
    pub players: usize,
    pub session: Option<SessionStatus>,
}

/// 玩家摘要
#[derive(Debug, Clone)]
pub struct PlayerSummary {
    pub conn_id: ConnectionId,
    pub peer_addr: SocketAddr,
    pub in_session: bool,
}

/// 管理 roster 與唯一的遊戲局
///
/// roster 與目前遊戲局各自有獨立的鎖。鎖的順序固定為 active → roster，
/// 遊戲局自己的鎖絕不在持有 active 或 roster 鎖時取得。
pub struct SessionCoordinator {
    roster: Mutex<Roster>,
    active: Mutex<ActiveSession>,
    next_session_id: AtomicU64,
    logger: GameLogger,
}

impl SessionCoordinator {
    pub fn new(logger: GameLogger) -> Self {
        Self {
            roster: Mutex::new(Roster::new()),
            active: Mutex::new(ActiveSession::Idle),
            next_session_id: AtomicU64::new(1),
            logger,
        }
    }

    /// 新玩家加入 roster，回傳目前人數
    ///
    /// 加入與是否有遊戲進行中的判斷都在 active 鎖內完成，
    /// 因此玩家要嘛在開局快照中，要嘛收到 GameInProgress，不會兩者皆是。
    pub fn register(&self, handle: PlayerHandle) -> usize {
        let conn_id = handle.id();
        let addr = handle.peer_addr();

        let total = {
            let active = lock(&self.active);
            let total = lock(&self.roster).add(handle.clone());
            if let ActiveSession::Running { .. } = *active {
                handle.send(ServerMessage::GameInProgress);
            }
            total
        };

        info!("[LOBBY] Player #{} joined (total: {})", conn_id, total);
        self.logger.player_join(conn_id, &addr.to_string(), total);
        total
    }

    /// 玩家離線：移出 roster，並通知進行中的遊戲局
    pub fn unregister(&self, conn_id: ConnectionId) {
        let remaining = {
            let mut roster = lock(&self.roster);
            if roster.remove(conn_id).is_none() {
                return;
            }
            roster.len()
        };

        info!("[LOBBY] Player #{} left (remaining: {})", conn_id, remaining);
        self.logger.player_leave(conn_id, remaining);

        if let Some((id, session)) = self.active_session() {
            let outcome = lock(&session).player_departed(conn_id);
            if let Some(outcome) = outcome {
                self.finish_session(id, outcome);
            }
        }
    }

    /// 以新單字開局
    ///
    /// 只有在沒有遊戲進行中且 roster 非空時才會開局，否則忽略這個單字。
    pub fn submit_word(&self, raw: &str) -> Result<SessionId, WordRejection> {
        let word = raw.trim().to_uppercase();
        if word.is_empty() {
            return Err(WordRejection::Empty);
        }

        let mut active = lock(&self.active);
        if let ActiveSession::Running { .. } = *active {
            return Err(WordRejection::InProgress);
        }

        let players = {
            let roster = lock(&self.roster);
            if roster.is_empty() {
                return Err(WordRejection::NoPlayers);
            }
            roster.snapshot()
        };

        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        let player_count = players.len();
        let mut session = GameSession::new(id, &word, players);

        // 開局訊息在發布之前送出，發布前到達的猜測一律丟棄
        if let Some(outcome) = session.start() {
            warn!("[LOBBY] Session #{} ended at start: {:?}", id, outcome);
            return Err(WordRejection::NoPlayers);
        }

        *active = ActiveSession::Running {
            id,
            word: session.word(),
            session: Arc::new(Mutex::new(session)),
            started_at: Instant::now(),
        };

        info!("[LOBBY] Session #{} started with {} player(s)", id, player_count);
        self.logger.game_start(id, word.chars().count(), player_count);
        Ok(id)
    }

    /// 檢查現在是否能接受新單字
    pub fn can_accept_word(&self) -> Result<(), WordRejection> {
        if self.is_session_running() {
            Err(WordRejection::InProgress)
        } else if lock(&self.roster).is_empty() {
            Err(WordRejection::NoPlayers)
        } else {
            Ok(())
        }
    }

    /// 將猜測交給目前的遊戲局，沒有遊戲局時回傳 None
    pub fn route_guess(&self, from: &PlayerHandle, letter: char) -> Option<GuessOutcome> {
        let Some((id, session)) = self.active_session() else {
            debug!(
                "[LOBBY] #{} guessed {} with no active session, ignored",
                from.id(),
                letter
            );
            return None;
        };

        let outcome = lock(&session).process_guess(letter, from);

        match &outcome {
            GuessOutcome::Rejected(reason) => {
                debug!("[LOBBY] #{} guess {} rejected: {:?}", from.id(), letter, reason);
            }
            GuessOutcome::Continue { hit, .. } => {
                let result = if *hit { "hit" } else { "miss" };
                self.logger.guess(from.id(), letter, result);
            }
            GuessOutcome::Finished(result) => {
                self.logger.guess(from.id(), letter, outcome_name(*result));
                self.finish_session(id, *result);
            }
        }
        Some(outcome)
    }

    /// 遊戲局結束：清除目前的遊戲局並通知所有玩家等待新單字
    ///
    /// 只處理仍是目前遊戲局的 `id`，重複或過期的通知會被忽略。
    pub fn finish_session(&self, id: SessionId, outcome: SessionOutcome) {
        let finished = {
            let mut active = lock(&self.active);
            let is_current = matches!(
                &*active,
                ActiveSession::Running { id: current, .. } if *current == id
            );
            if is_current {
                match std::mem::replace(&mut *active, ActiveSession::Idle) {
                    ActiveSession::Running {
                        word, started_at, ..
                    } => Some((word, started_at.elapsed())),
                    ActiveSession::Idle => None,
                }
            } else {
                None
            }
        };

        let Some((word, elapsed)) = finished else {
            debug!("[LOBBY] Stale end notification for session #{}", id);
            return;
        };

        info!(
            "[LOBBY] Session #{} {} after {:.1}s, word was {}",
            id,
            outcome_name(outcome),
            elapsed.as_secs_f32(),
            word
        );
        self.logger.game_end(id, outcome_name(outcome), &word);
        self.broadcast_to_all(&ServerMessage::WaitingForWord);
    }

    /// 廣播給 roster 中所有玩家，回傳成功送出的數量
    pub fn broadcast_to_all(&self, msg: &ServerMessage) -> usize {
        lock(&self.roster).broadcast(msg)
    }

    pub fn is_session_running(&self) -> bool {
        matches!(*lock(&self.active), ActiveSession::Running { .. })
    }

    pub fn player_count(&self) -> usize {
        lock(&self.roster).len()
    }

    /// 伺服器狀態摘要
    pub fn status(&self) -> CoordinatorStatus {
        let running = match &*lock(&self.active) {
            ActiveSession::Running {
                session,
                started_at,
                ..
            } => Some((Arc::clone(session), *started_at)),
            ActiveSession::Idle => None,
        };

        let session = running.map(|(session, started_at)| {
            let session = lock(&session);
            SessionStatus {
                id: session.id(),
                state: session.state(),
                mask: session.mask().to_string(),
                errors: session.errors(),
                attempted: session.attempted().iter().copied().collect(),
                turn: session.turn() + 1,
                participants: session.player_count(),
                present: session.present_count(),
                elapsed: started_at.elapsed(),
            }
        });

        CoordinatorStatus {
            players: self.player_count(),
            session,
        }
    }

    /// roster 中的玩家列表
    pub fn players(&self) -> Vec<PlayerSummary> {
        let in_session: Vec<ConnectionId> = self
            .active_session()
            .map(|(_, session)| lock(&session).participant_ids())
            .unwrap_or_default();

        lock(&self.roster)
            .iter()
            .map(|p| PlayerSummary {
                conn_id: p.id(),
                peer_addr: p.peer_addr(),
                in_session: in_session.contains(&p.id()),
            })
            .collect()
    }

    /// 通知所有玩家伺服器關閉並結束其寫入佇列
    pub fn close_all(&self) {
        let roster = lock(&self.roster);
        roster.broadcast(&ServerMessage::ServerShutdown);
        for player in roster.iter() {
            player.close();
        }
        info!("[LOBBY] Closed {} connection(s)", roster.len());
    }

    /// 等待所有連線離開 roster，逾時回傳 false
    ///
    /// 連線在送完佇列中的訊息後才會 unregister，所以 roster 清空代表
    /// 道別訊息都已寫出。
    pub fn wait_until_empty(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if lock(&self.roster).is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(poll_interval);
        }
    }

    fn active_session(&self) -> Option<(SessionId, Arc<Mutex<GameSession>>)> {
        match &*lock(&self.active) {
            ActiveSession::Running { id, session, .. } => Some((*id, Arc::clone(session))),
            ActiveSession::Idle => None,
        }
    }
}

fn outcome_name(outcome: SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Won => "won",
        SessionOutcome::Lost => "lost",
        SessionOutcome::Abandoned => "abandoned",
    }
}

/// 取得鎖；持有者 panic 時沿用內部資料
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
