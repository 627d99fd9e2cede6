//! Supervisord event listener protocol
//!
//! ```text
//! listener -> supervisord   READY\n
//! supervisord -> listener   ver:3.0 server:supervisor ... eventname:X len:N\n
//! supervisord -> listener   <N bytes of payload>
//! listener -> supervisord   RESULT 2\nOK   (or RESULT 4\nFAIL)
//! ```

use bridge_shared::ProcessState;
use std::collections::BTreeMap;
use thiserror::Error;
use std::io;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
};
use tracing::{debug, info, warn};

pub const READY: &[u8] = b"READY\n";
pub const OK: &[u8] = b"RESULT 2\nOK";
pub const FAIL: &[u8] = b"RESULT 4\nFAIL";

/// Payload bytes kept for the log; the rest of a longer payload is discarded
pub const MAX_KEPT_PAYLOAD: usize = 64 * 1024;

#[derive(Error, Debug, PartialEq)]
pub enum ProtocolError {
    #[error("token '{0}' is not key:value")]
    BadToken(String),

    #[error("header has no len")]
    MissingLen,

    #[error("invalid len '{0}'")]
    BadLen(String),
}

/// `key:value` tokens separated by whitespace
fn parse_tokens(line: &str) -> Result<BTreeMap<String, String>, ProtocolError> {
    line.split_whitespace()
        .map(|token| {
            token
                .split_once(':')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| ProtocolError::BadToken(token.to_string()))
        })
        .collect()
}

/// Parsed event header line
#[derive(Debug, Clone, PartialEq)]
pub struct EventHeader {
    fields: BTreeMap<String, String>,
    len: usize,
}

impl EventHeader {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let fields = parse_tokens(line)?;
        let raw_len = fields.get("len").ok_or(ProtocolError::MissingLen)?;
        let len = raw_len
            .parse()
            .map_err(|_| ProtocolError::BadLen(raw_len.clone()))?;
        Ok(Self { fields, len })
    }

    pub fn event_name(&self) -> &str {
        self.fields.get("eventname").map(String::as_str).unwrap_or("UNKNOWN")
    }

    pub fn payload_len(&self) -> usize {
        self.len
    }
}

/// One-line description of an event for the log
pub fn describe(header: &EventHeader, payload: &str) -> String {
    let name = header.event_name();
    let Some(to) = name.strip_prefix("PROCESS_STATE_") else {
        return format!("{} {}", name, payload.trim());
    };

    // Process state payloads are tokens too; anything else is logged raw
    match parse_tokens(payload) {
        Ok(fields) => {
            let process = fields.get("processname").map(String::as_str).unwrap_or("?");
            let from = fields.get("from_state").map(String::as_str).unwrap_or("?");
            format!(
                "{}: {} -> {} ({})",
                process,
                from,
                to,
                ProcessState::from_supervisor(to)
            )
        }
        Err(_) => format!("{} {}", name, payload.trim()),
    }
}

/// Consume exactly `len` payload bytes, keeping at most [`MAX_KEPT_PAYLOAD`]
async fn read_payload<R: AsyncRead + Unpin>(input: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut body = (&mut *input).take(len as u64);

    let mut kept = Vec::with_capacity(len.min(MAX_KEPT_PAYLOAD));
    (&mut body)
        .take(MAX_KEPT_PAYLOAD as u64)
        .read_to_end(&mut kept)
        .await?;
    let skipped = tokio::io::copy(&mut body, &mut tokio::io::sink()).await?;

    if kept.len() as u64 + skipped < len as u64 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("payload ended after {} of {} bytes", kept.len() as u64 + skipped, len),
        ));
    }
    if skipped > 0 {
        debug!("Discarded {} payload bytes past {}", skipped, MAX_KEPT_PAYLOAD);
    }
    Ok(kept)
}

/// Serve events until supervisord closes stdin
pub async fn serve<R, W>(mut input: R, mut output: W) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut handled = 0;
    let mut line = String::new();

    loop {
        output.write_all(READY).await?;
        output.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            return Ok(handled);
        }

        let result = match EventHeader::parse(&line) {
            Ok(header) => {
                let payload = read_payload(&mut input, header.payload_len()).await?;
                info!("{}", describe(&header, &String::from_utf8_lossy(&payload)));
                handled += 1;
                OK
            }
            Err(e) => {
                warn!("Malformed header {:?}: {}", line.trim_end(), e);
                FAIL
            }
        };

        output.write_all(result).await?;
        output.flush().await?;
    }
}
