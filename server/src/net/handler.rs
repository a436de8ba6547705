use super::connection::{ConnectionId, PlayerHandle};
use super::event::{ClientReceiver, Outbound};
use crate::lobby::SessionCoordinator;
use crate::protocol::{ClientCommand, LineReader, LineWriter, ServerMessage, is_timeout, split};
use crate::shutdown::Shutdown;
use log::{debug, info, warn};
use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 連線的讀寫 timeout 設定
#[derive(Debug, Clone, Copy)]
pub struct ConnectionTimeouts {
    /// 讀取 timeout，決定多久檢查一次 shutdown
    pub read: Duration,
    /// 寫入 timeout，避免卡在不讀資料的 client
    pub write: Duration,
}

/// Connection handler - 處理單一玩家連線的讀取迴圈
pub struct ConnectionHandler {
    handle: PlayerHandle,
    reader: LineReader,
    writer_thread: JoinHandle<()>,
    coordinator: Arc<SessionCoordinator>,
    shutdown: Shutdown,
}

impl ConnectionHandler {
    /// 執行 handler 主迴圈
    pub fn run(mut self) {
        let conn_id = self.handle.id();

        while !self.shutdown.is_triggered() {
            match self.reader.read_command() {
                Ok(Some(ClientCommand::Guess(letter))) => {
                    debug!("[HANDLER] Connection #{} guess: {}", conn_id, letter);
                    self.coordinator.route_guess(&self.handle, letter);
                }
                Ok(Some(ClientCommand::Quit)) => {
                    info!("[HANDLER] Connection #{} quit", conn_id);
                    break;
                }
                Ok(Some(ClientCommand::Ignored(line))) => {
                    debug!("[HANDLER] Connection #{} ignored: {:?}", conn_id, line);
                }
                Ok(None) => {
                    // EOF - 連線關閉
                    info!("[HANDLER] Connection #{} EOF", conn_id);
                    break;
                }
                Err(e) if is_timeout(&e) => {
                    // Timeout - 回到迴圈開頭檢查 shutdown
                }
                Err(e) => {
                    warn!("[HANDLER] Connection #{} read error: {}", conn_id, e);
                    break;
                }
            }
        }

        // 可能比 close_all 先看到 shutdown；寫入端停在第一個 Close，不會重複
        if self.shutdown.is_triggered() {
            self.handle.send(ServerMessage::ServerShutdown);
        }

        // 送完佇列中剩下的訊息後才離開 roster
        self.handle.close();
        if self.writer_thread.join().is_err() {
            warn!("[HANDLER] Connection #{} writer thread panicked", conn_id);
        }
        self.coordinator.unregister(conn_id);
        self.reader.shutdown();

        info!("[HANDLER] Connection #{} closed", conn_id);
    }
}

/// 寫入執行緒：依序送出佇列中的訊息，直到收到 Close 或寫入失敗
///
/// 寫入失敗 (含 write timeout) 時關閉 socket，讓讀取迴圈結束並 unregister。
fn write_loop(conn_id: ConnectionId, mut writer: LineWriter, rx: ClientReceiver) {
    for outbound in rx {
        match outbound {
            Outbound::Message(msg) => {
                if let Err(e) = writer.send_message(&msg) {
                    warn!("[HANDLER] Connection #{} send error: {}", conn_id, e);
                    writer.shutdown();
                    break;
                }
            }
            Outbound::Close => break,
        }
    }
    debug!("[HANDLER] Connection #{} writer finished", conn_id);
}

/// 建立玩家連線：啟動寫入執行緒、送出歡迎訊息、加入 roster，再啟動讀取執行緒
pub fn spawn_handler(
    conn_id: ConnectionId,
    stream: TcpStream,
    coordinator: Arc<SessionCoordinator>,
    shutdown: Shutdown,
    timeouts: ConnectionTimeouts,
) -> io::Result<PlayerHandle> {
    let peer_addr = stream.peer_addr()?;
    stream.set_read_timeout(Some(timeouts.read))?;
    stream.set_write_timeout(Some(timeouts.write))?;

    let (reader, writer) = split(stream)?;
    let (handle, client_rx) = PlayerHandle::with_channel(conn_id, peer_addr);

    let writer_thread = thread::Builder::new()
        .name(format!("conn-{}-writer", conn_id))
        .spawn(move || write_loop(conn_id, writer, client_rx))?;

    // 歡迎訊息先進佇列，確保排在任何廣播之前
    handle.send(ServerMessage::Welcome);
    coordinator.register(handle.clone());

    let handler = ConnectionHandler {
        handle: handle.clone(),
        reader,
        writer_thread,
        coordinator: Arc::clone(&coordinator),
        shutdown,
    };

    let spawned = thread::Builder::new()
        .name(format!("conn-{}-reader", conn_id))
        .spawn(move || handler.run());

    if let Err(e) = spawned {
        // 讀取執行緒無法啟動時撤銷註冊
        coordinator.unregister(conn_id);
        handle.close();
        return Err(e);
    }

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::GameLogger;
    use crate::net::connection::next_connection_id;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    const TIMEOUTS: ConnectionTimeouts = ConnectionTimeouts {
        read: Duration::from_millis(20),
        write: Duration::from_secs(2),
    };

    struct TestClient {
        reader: BufReader<TcpStream>,
        writer: TcpStream,
    }

    impl TestClient {
        fn send(&mut self, line: &str) {
            writeln!(self.writer, "{}", line).unwrap();
            self.writer.flush().unwrap();
        }

        fn read_line(&mut self) -> Option<String> {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => None,
                Ok(_) => Some(line.trim_end().to_string()),
                Err(e) => panic!("read error: {}", e),
            }
        }

        /// 讀到包含 `needle` 的那一行為止
        fn expect(&mut self, needle: &str) {
            while let Some(line) = self.read_line() {
                if line.contains(needle) {
                    return;
                }
            }
            panic!("connection closed before {:?}", needle);
        }
    }

    fn connect(
        listener: &TcpListener,
        coordinator: &Arc<SessionCoordinator>,
        shutdown: &Shutdown,
    ) -> TestClient {
        connect_with(listener, coordinator, shutdown, TIMEOUTS).0
    }

    fn connect_with(
        listener: &TcpListener,
        coordinator: &Arc<SessionCoordinator>,
        shutdown: &Shutdown,
        timeouts: ConnectionTimeouts,
    ) -> (TestClient, PlayerHandle) {
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let (server_side, _) = listener.accept().unwrap();
        let handle = spawn_handler(
            next_connection_id(),
            server_side,
            Arc::clone(coordinator),
            shutdown.clone(),
            timeouts,
        )
        .unwrap();

        let client = TestClient {
            reader: BufReader::new(client.try_clone().unwrap()),
            writer: client,
        };
        (client, handle)
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_full_game_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();

        let mut alice = connect(&listener, &coordinator, &shutdown);
        let mut bob = connect(&listener, &coordinator, &shutdown);
        alice.expect("Welcome");
        bob.expect("Welcome");
        wait_until(|| coordinator.player_count() == 2);

        coordinator.submit_word("sol").unwrap();
        alice.expect("NEW GAME STARTED!");
        alice.expect("It's your turn");

        // 不是 bob 的回合
        bob.send("s");
        bob.expect("It's not your turn");

        alice.send("s");
        alice.expect("Word: S__");
        bob.expect("It's your turn");

        // 非單一字母的輸入被忽略
        bob.send("ol");
        bob.send("o");
        bob.expect("Word: SO_");

        alice.send("L");
        alice.expect("YOU WON! The word was: SOL");
        alice.expect("GAME OVER! Waiting for a new word...");
        bob.expect("GAME OVER! Waiting for a new word...");

        wait_until(|| !coordinator.is_session_running());
    }

    #[test]
    fn test_quit_unregisters_and_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();

        let mut client = connect(&listener, &coordinator, &shutdown);
        client.expect("Welcome");
        wait_until(|| coordinator.player_count() == 1);

        client.send("SALIR");
        assert!(client.read_line().is_none());
        wait_until(|| coordinator.player_count() == 0);
    }

    #[test]
    fn test_disconnect_mid_game_passes_turn() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();

        let alice = connect(&listener, &coordinator, &shutdown);
        let mut bob = connect(&listener, &coordinator, &shutdown);
        wait_until(|| coordinator.player_count() == 2);

        coordinator.submit_word("gato").unwrap();
        bob.expect("Turn of player 1");

        drop(alice);
        bob.expect("Player 1 left the game.");
        bob.expect("It's your turn");

        bob.send("g");
        bob.expect("Word: G___");
    }

    #[test]
    fn test_shutdown_stops_read_loop() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();

        let mut client = connect(&listener, &coordinator, &shutdown);
        client.expect("Welcome");
        wait_until(|| coordinator.player_count() == 1);

        shutdown.trigger();
        assert_eq!(
            client.read_line().as_deref(),
            Some("Server is shutting down. Goodbye!")
        );
        assert!(client.read_line().is_none());
        wait_until(|| coordinator.player_count() == 0);
    }

    #[test]
    fn test_stalled_client_is_unregistered() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();
        let timeouts = ConnectionTimeouts {
            read: Duration::from_millis(20),
            write: Duration::from_millis(50),
        };

        // client 從不讀取，server 端的寫入最終會 timeout
        let (_client, handle) = connect_with(&listener, &coordinator, &shutdown, timeouts);
        wait_until(|| coordinator.player_count() == 1);

        let line = "X".repeat(64 * 1024);
        let deadline = Instant::now() + Duration::from_secs(10);
        while handle.send(ServerMessage::Mask(line.clone())) {
            assert!(Instant::now() < deadline, "writer never failed");
            thread::sleep(Duration::from_millis(1));
        }

        wait_until(|| coordinator.player_count() == 0);
    }

    #[test]
    fn test_goodbye_is_flushed_before_unregister() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();

        let mut client = connect(&listener, &coordinator, &shutdown);
        client.expect("Welcome");
        wait_until(|| coordinator.player_count() == 1);

        shutdown.trigger();
        coordinator.close_all();
        assert!(coordinator.wait_until_empty(Duration::from_secs(5), Duration::from_millis(5)));

        assert_eq!(
            client.read_line().as_deref(),
            Some("Server is shutting down. Goodbye!")
        );
        assert!(client.read_line().is_none());
    }
}
