use std::fmt;

/// 斷線指令 (不分大小寫)
pub const QUIT_COMMAND: &str = "salir";

/// 客戶端到伺服器的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// 猜一個字母
    Guess(char),
    /// 主動離開
    Quit,
    /// 其他內容，直接忽略
    Ignored(String),
}

impl ClientCommand {
    /// 解析一行輸入
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line.eq_ignore_ascii_case(QUIT_COMMAND) {
            return ClientCommand::Quit;
        }

        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_alphabetic() => ClientCommand::Guess(c),
            _ => ClientCommand::Ignored(line.to_string()),
        }
    }
}

/// 伺服器到客戶端的訊息 (每則一行純文字)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// 歡迎訊息
    Welcome,
    /// 已有遊戲進行中，等下一局
    GameInProgress,
    /// 新遊戲開始
    GameStarted,
    /// 目前的遮罩 (e.g. "_A_O")
    Mask(String),
    /// 已嘗試的字母 (已排序)
    Attempted(Vec<char>),
    /// 猜錯
    WrongLetter { errors: u8, max_errors: u8 },
    /// 不是你的回合
    NotYourTurn,
    /// 字母已經猜過
    AlreadyAttempted(char),
    /// 廣播輪到誰 (1-based)
    TurnOf { player: usize },
    /// 私訊目前玩家
    YourTurn,
    /// 玩家離開 (1-based)
    PlayerLeft { player: usize },
    /// 勝利
    Won { word: String },
    /// 失敗
    Lost { word: String },
    /// 遊戲結束，等待新單字
    WaitingForWord,
    /// 伺服器關閉
    ServerShutdown,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => write!(
                f,
                "Welcome to multiplayer Hangman! Type '{}' to leave.",
                QUIT_COMMAND
            ),
            ServerMessage::GameInProgress => {
                write!(f, "A game is in progress. You will join the next one.")
            }
            ServerMessage::GameStarted => write!(f, "NEW GAME STARTED!"),
            ServerMessage::Mask(mask) => write!(f, "Word: {}", mask),
            ServerMessage::Attempted(letters) => {
                let joined = letters
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Attempted letters: [{}]", joined)
            }
            ServerMessage::WrongLetter { errors, max_errors } => {
                write!(f, "Wrong letter! Errors: {}/{}", errors, max_errors)
            }
            ServerMessage::NotYourTurn => write!(f, "It's not your turn, wait for it."),
            ServerMessage::AlreadyAttempted(letter) => {
                write!(f, "Letter already attempted: {}", letter)
            }
            ServerMessage::TurnOf { player } => write!(f, "Turn of player {}", player),
            ServerMessage::YourTurn => write!(f, "It's your turn, enter a letter."),
            ServerMessage::PlayerLeft { player } => write!(f, "Player {} left the game.", player),
            ServerMessage::Won { word } => write!(f, "YOU WON! The word was: {}", word),
            ServerMessage::Lost { word } => write!(f, "YOU LOST! The word was: {}", word),
            ServerMessage::WaitingForWord => write!(f, "GAME OVER! Waiting for a new word..."),
            ServerMessage::ServerShutdown => write!(f, "Server is shutting down. Goodbye!"),
        }
    }
}
