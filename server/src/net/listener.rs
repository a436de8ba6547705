use super::connection::next_connection_id;
use super::handler::{ConnectionTimeouts, spawn_handler};
use crate::lobby::SessionCoordinator;
use crate::shutdown::Shutdown;
use log::{error, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DEFAULT_BACKLOG: i32 = 128;

/// 沒有新連線時的等待間隔
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 使用 socket2 建立 TCP listener
pub fn create_tcp_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    // setsockopt(SO_REUSEADDR) - 允許重複使用位址
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(DEFAULT_BACKLOG)?;

    // accept loop 需要定期檢查 shutdown
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// 接受新連線，直到 shutdown 或 listener 本身失效
pub fn accept_loop(
    listener: TcpListener,
    coordinator: Arc<SessionCoordinator>,
    shutdown: Shutdown,
    timeouts: ConnectionTimeouts,
) {
    info!("[ACCEPT] Accept loop started");

    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                let conn_id = next_connection_id();
                info!("[ACCEPT] New connection #{} from {}", conn_id, peer_addr);

                // 連線本身使用 blocking + timeout
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!("[ACCEPT] Failed to configure #{}: {}", conn_id, e);
                    continue;
                }

                if let Err(e) = spawn_handler(
                    conn_id,
                    stream,
                    Arc::clone(&coordinator),
                    shutdown.clone(),
                    timeouts,
                ) {
                    warn!("[ACCEPT] Failed to spawn handler for #{}: {}", conn_id, e);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) if is_listener_closed(&e) => {
                error!("[ACCEPT] Listener is no longer usable: {}", e);
                break;
            }
            Err(e) => {
                error!("[ACCEPT] Accept error: {}", e);
            }
        }
    }

    info!("[ACCEPT] Accept loop ended");
}

/// listener 已關閉或失效 (EINVAL / EBADF 類錯誤)
fn is_listener_closed(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::GameLogger;
    use std::io::{BufRead, BufReader};
    use std::net::TcpStream;
    use std::time::Instant;

    #[test]
    fn test_create_listener() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = create_tcp_listener(addr).expect("Failed to create listener");
        let local_addr = listener.local_addr().expect("Failed to get local addr");
        assert!(local_addr.port() > 0);
    }

    #[test]
    fn test_accept_loop_registers_players_and_stops() {
        let listener = create_tcp_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let coordinator = Arc::new(SessionCoordinator::new(GameLogger::new()));
        let shutdown = Shutdown::new();
        let timeouts = ConnectionTimeouts {
            read: Duration::from_millis(20),
            write: Duration::from_secs(1),
        };

        let accept_thread = {
            let coordinator = Arc::clone(&coordinator);
            let shutdown = shutdown.clone();
            thread::spawn(move || accept_loop(listener, coordinator, shutdown, timeouts))
        };

        let client = TcpStream::connect(addr).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut welcome = String::new();
        BufReader::new(&client).read_line(&mut welcome).unwrap();
        assert!(welcome.starts_with("Welcome"));

        let deadline = Instant::now() + Duration::from_secs(5);
        while coordinator.player_count() != 1 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }

        shutdown.trigger();
        accept_thread.join().unwrap();
    }
}
