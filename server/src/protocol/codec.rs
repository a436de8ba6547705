use super::messages::{ClientCommand, ServerMessage};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};

/// 單行最大長度 (bytes，不含換行)
pub const MAX_LINE_LEN: usize = 1024;

/// 行讀取端 - 將一行輸入解析為 ClientCommand
///
/// 讀取可能因 read timeout 中斷，尚未收完的半行會保留在 `pending`，
/// 下次呼叫時接著讀。超過 `MAX_LINE_LEN` 的行會被丟棄直到下一個換行。
pub struct LineReader {
    reader: BufReader<TcpStream>,
    pending: Vec<u8>,
    discarding: bool,
}

/// 行寫入端 - 每則 ServerMessage 寫成一行
pub struct LineWriter {
    writer: TcpStream,
}

/// 將 TcpStream 拆成讀寫兩端
pub fn split(stream: TcpStream) -> io::Result<(LineReader, LineWriter)> {
    let writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    Ok((
        LineReader {
            reader,
            pending: Vec::new(),
            discarding: false,
        },
        LineWriter { writer },
    ))
}

impl LineReader {
    /// 讀取一行並解析
    ///
    /// 回傳 `Ok(None)` 代表 EOF。timeout 以 `WouldBlock`/`TimedOut` 錯誤回傳。
    pub fn read_command(&mut self) -> io::Result<Option<ClientCommand>> {
        loop {
            let limit = (MAX_LINE_LEN + 1).saturating_sub(self.pending.len()) as u64;
            let bytes_read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.pending)?;
            let complete = self.pending.last() == Some(&b'\n');

            if self.discarding {
                self.pending.clear();
                if bytes_read == 0 {
                    return Ok(None);
                }
                if complete {
                    self.discarding = false;
                    return Ok(Some(ClientCommand::Ignored(String::new())));
                }
                continue;
            }

            if bytes_read == 0 && self.pending.is_empty() {
                // EOF - 連線關閉
                return Ok(None);
            }

            if !complete && self.pending.len() > MAX_LINE_LEN {
                // 過長的行：丟棄到下一個換行為止
                self.pending.clear();
                self.discarding = true;
                continue;
            }

            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            return Ok(Some(ClientCommand::parse(&line)));
        }
    }

    /// 關閉底層連線 (讀寫兩端)
    pub fn shutdown(&self) {
        let _ = self.reader.get_ref().shutdown(Shutdown::Both);
    }
}

impl LineWriter {
    /// 發送 ServerMessage
    pub fn send_message(&mut self, msg: &ServerMessage) -> io::Result<()> {
        writeln!(self.writer, "{}", msg)?;
        self.writer.flush()
    }

    /// 關閉底層連線，讀取端會因此收到 EOF
    pub fn shutdown(&self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// timeout 類錯誤不代表連線中斷
pub fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
