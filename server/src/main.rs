mod admin;
mod config;
mod error;
mod game;
mod lobby;
mod net;
mod protocol;
mod shutdown;

use admin::GameLogger;
use config::ServerConfig;
use error::ServerError;
use lobby::SessionCoordinator;
use log::{error, info, warn};
use shutdown::Shutdown;
use std::env;
use std::io;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 主執行緒檢查 shutdown 的間隔
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = ServerConfig::load(env::args().skip(1))
        .map_err(ServerError::from)
        .and_then(run);

    if let Err(e) = result {
        error!("[SERVER] {}", e);
        process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<(), ServerError> {
    let shutdown = Shutdown::new();
    shutdown.register_signals().map_err(ServerError::Signal)?;

    let listener = net::create_tcp_listener(config.socket_addr()).map_err(ServerError::Bind)?;
    info!("[SERVER] Listening on {}", listener.local_addr()?);

    let logger = GameLogger::with_capacity(config.log_capacity);
    let coordinator = Arc::new(SessionCoordinator::new(logger.clone()));

    let accept_thread = {
        let coordinator = Arc::clone(&coordinator);
        let shutdown = shutdown.clone();
        let timeouts = config.timeouts();
        thread::Builder::new()
            .name("accept".to_string())
            .spawn(move || net::accept_loop(listener, coordinator, shutdown, timeouts))?
    };

    {
        let coordinator = Arc::clone(&coordinator);
        let shutdown = shutdown.clone();
        // console 執行緒在 stdin 上阻塞，不等待它結束
        thread::Builder::new().name("console".to_string()).spawn(move || {
            let stdin = io::stdin();
            let stdout = io::stdout();
            if let Err(e) =
                admin::run_console(stdin.lock(), stdout.lock(), &coordinator, &logger, &shutdown)
            {
                warn!("[ADMIN] Console stopped: {}", e);
            }
        })?;
    }

    shutdown.wait(SHUTDOWN_POLL_INTERVAL);

    info!("[SERVER] Shutting down, notifying {} players", coordinator.player_count());
    coordinator.close_all();

    // 讀取迴圈在下一次 read timeout 時結束，寫入端最多等一次 write timeout
    let timeouts = config.timeouts();
    if !coordinator.wait_until_empty(timeouts.read + timeouts.write, SHUTDOWN_POLL_INTERVAL) {
        warn!(
            "[SERVER] {} connection(s) did not close in time",
            coordinator.player_count()
        );
    }

    if accept_thread.join().is_err() {
        warn!("[SERVER] Accept thread panicked");
    }

    info!("[SERVER] Bye");
    Ok(())
}
