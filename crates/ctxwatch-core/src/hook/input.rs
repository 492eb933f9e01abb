use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::event::HookEvent;

/// Events larger than this are truncated and then fail to parse
pub const MAX_INPUT_BYTES: u64 = 1024 * 1024;

/// Read one event from `reader` until EOF, bounded by `timeout`
///
/// A timeout, a read error or malformed JSON all produce an empty event;
/// the caller proceeds with defaults either way.
pub async fn read_event<R>(reader: R, timeout: Duration) -> HookEvent
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(MAX_INPUT_BYTES);

    match tokio::time::timeout(timeout, limited.read_to_end(&mut buf)).await {
        Ok(Ok(_)) => HookEvent::parse(&buf),
        Ok(Err(e)) => {
            tracing::debug!("Failed to read hook input: {}", e);
            HookEvent::default()
        }
        Err(_) => {
            tracing::debug!("Timed out after {:?} waiting for hook input", timeout);
            HookEvent::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_event_to_eof() {
        let input: &[u8] = br#"{"session_id":"abc"}"#;
        let event = read_event(input, Duration::from_secs(1)).await;
        assert_eq!(event.session_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_timeout_yields_empty_event() {
        // Write half never closes, so EOF never arrives
        let (_writer, reader) = tokio::io::duplex(64);
        let event = read_event(reader, Duration::from_millis(20)).await;
        assert_eq!(event, HookEvent::default());
    }
}
