//! 伺服器設定
//!
//! 來源依序覆蓋：預設值 → JSON 設定檔 (`--config` 或 `HANGMAN_CONFIG`)
//! → 環境變數 `HANGMAN_PORT` → CLI `--port` / `--bind`。

use crate::error::ConfigError;
use crate::net::ConnectionTimeouts;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5555;

const CONFIG_ENV: &str = "HANGMAN_CONFIG";
const PORT_ENV: &str = "HANGMAN_PORT";

/// 伺服器設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// 連線讀取 timeout，也是檢查 shutdown 的間隔
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// 事件日誌保留筆數
    pub log_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            read_timeout_ms: 100,
            write_timeout_ms: 5000,
            log_capacity: crate::admin::logger::DEFAULT_CAPACITY,
        }
    }
}

/// 從 CLI 取出的覆蓋值
#[derive(Debug, Default, PartialEq, Eq)]
struct CliOverrides {
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind_addr: Option<IpAddr>,
}

impl ServerConfig {
    /// 依序套用所有設定來源，`args` 不含程式名稱
    pub fn load<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::load_with_env(args, |key| std::env::var(key).ok())
    }

    fn load_with_env<I, S>(args: I, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cli = parse_args(args)?;

        let config_path = cli
            .config_path
            .clone()
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(port) = env(PORT_ENV) {
            config.port = parse_port(&port)?;
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(addr) = cli.bind_addr {
            config.bind_addr = addr;
        }

        Ok(config)
    }

    /// 讀取 JSON 設定檔，缺少的欄位使用預設值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn timeouts(&self) -> ConnectionTimeouts {
        ConnectionTimeouts {
            read: Duration::from_millis(self.read_timeout_ms.max(1)),
            write: Duration::from_millis(self.write_timeout_ms.max(1)),
        }
    }
}

fn parse_args<I, S>(args: I) -> Result<CliOverrides, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut overrides = CliOverrides::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let flag = arg.as_ref();
        match flag {
            "--port" | "--bind" | "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| ConfigError::InvalidArgument(format!("{} requires a value", flag)))?;
                let value = value.as_ref();
                match flag {
                    "--port" => overrides.port = Some(parse_port(value)?),
                    "--bind" => {
                        overrides.bind_addr = Some(value.parse().map_err(|_| {
                            ConfigError::InvalidArgument(format!("invalid bind address: {}", value))
                        })?)
                    }
                    _ => overrides.config_path = Some(PathBuf::from(value)),
                }
            }
            other => {
                return Err(ConfigError::InvalidArgument(format!(
                    "unknown argument: {}",
                    other
                )));
            }
        }
    }

    Ok(overrides)
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidArgument(format!("invalid port: {}", value)))
}
