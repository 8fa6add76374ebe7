use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    error::{FluxError, Result},
    models::{QueueEvent, QueueStatus, RequestHandle},
};

use super::{traits::EventStream, FalClient};

/// Removes every complete server-sent event from `buffer` and returns the
/// joined `data:` payload of each one.
///
/// Frames are split on raw bytes and only decoded once whole, so a chunk
/// boundary inside a multi-byte character never corrupts the text.
pub fn drain_sse_events(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut events = Vec::new();
    strip_crlf(buffer);

    while let Some(end) = buffer.windows(2).position(|pair| pair == b"\n\n") {
        let block: Vec<u8> = buffer.drain(..end + 2).collect();
        let block = String::from_utf8_lossy(&block);
        let data: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim_start)
            .collect();
        if !data.is_empty() {
            events.push(data.join("\n"));
        }
    }

    events
}

/// Collapses `\r\n` into `\n`. A trailing `\r` is kept until its `\n` arrives.
fn strip_crlf(buffer: &mut Vec<u8>) {
    if !buffer.contains(&b'\r') {
        return;
    }
    let mut out = Vec::with_capacity(buffer.len());
    let mut bytes = buffer.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if byte == b'\r' && bytes.peek() == Some(&b'\n') {
            continue;
        }
        out.push(byte);
    }
    *buffer = out;
}

impl FalClient {
    /// Follows the status stream of an accepted request on a background task.
    ///
    /// The task stops as soon as the returned stream is dropped, releasing
    /// the connection.
    pub(crate) async fn follow_status_stream(&self, handle: RequestHandle) -> Result<EventStream> {
        let response = self
            .authorized(self.client.get(format!("{}/stream", handle.status_url)))
            .query(&[("logs", "1")])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(100);
        let client = self.clone();
        let mut body = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();
            let mut seen_logs = 0usize;

            loop {
                let chunk = tokio::select! {
                    chunk = body.next() => chunk,
                    _ = tx.closed() => {
                        log::debug!("Stopped following request {}: receiver dropped", handle.request_id);
                        return;
                    }
                };
                let Some(chunk) = chunk else {
                    break;
                };
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(FluxError::TransportError(e.to_string()))).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&bytes);

                for data in drain_sse_events(&mut buffer) {
                    let status: QueueStatus = match serde_json::from_str(&data) {
                        Ok(status) => status,
                        Err(e) => {
                            log::debug!("Skipping unreadable status event: {}", e);
                            continue;
                        }
                    };

                    for entry in status.logs.iter().skip(seen_logs) {
                        if tx.send(Ok(QueueEvent::Log(entry.message.clone()))).await.is_err() {
                            return;
                        }
                    }
                    seen_logs = seen_logs.max(status.logs.len());

                    if status.is_completed() {
                        let event = client.fetch_result(&handle).await.map(QueueEvent::Completed);
                        let _ = tx.send(event).await;
                        return;
                    }
                }
            }

            let _ = tx
                .send(Err(FluxError::TransportError(format!(
                    "status stream for request {} ended before completion",
                    handle.request_id
                ))))
                .await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FalConfig;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_drain_complete_events() {
        let mut buffer =
            b"data: {\"status\":\"IN_QUEUE\"}\n\nevent: status\ndata: {\"status\":\"COMPLETED\"}\n\ndata: {\"sta"
                .to_vec();
        let events = drain_sse_events(&mut buffer);
        assert_eq!(
            events,
            vec![
                "{\"status\":\"IN_QUEUE\"}".to_string(),
                "{\"status\":\"COMPLETED\"}".to_string(),
            ]
        );
        assert_eq!(buffer, b"data: {\"sta");
    }

    #[test]
    fn test_drain_handles_crlf_and_multiline_data() {
        let mut buffer = b"data: a\r\ndata: b\r\n\r\n: keepalive\n\ndata: c".to_vec();
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events, vec!["a\nb".to_string()]);
        assert_eq!(buffer, b"data: c");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut buffer = b"data: a\r\n\r".to_vec();
        assert!(drain_sse_events(&mut buffer).is_empty());
        buffer.extend_from_slice(b"\n");
        assert_eq!(drain_sse_events(&mut buffer), vec!["a".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let frame = "data: {\"status\":\"IN_PROGRESS\",\"logs\":[{\"message\":\"café 🎨\"}]}\n\n".as_bytes();
        // Cut right after the first byte of the two-byte `é`.
        let cut = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut buffer = frame[..cut].to_vec();
        assert!(drain_sse_events(&mut buffer).is_empty());
        buffer.extend_from_slice(&frame[cut..]);
        let events = drain_sse_events(&mut buffer);

        assert_eq!(events.len(), 1);
        let status: QueueStatus = serde_json::from_str(&events[0]).unwrap();
        assert_eq!(status.logs[0].message, "café 🎨");
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Sends one log event, then holds the response open until the client hangs up.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let event = "data: {\"status\":\"IN_PROGRESS\",\"logs\":[{\"message\":\"step 1\"}]}\n\n";
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
                event.len(),
                event
            );
            socket.write_all(response.as_bytes()).await.unwrap();

            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => continue,
                }
            }
        });

        let client = FalClient::new(&FalConfig::new().with_api_key("test-key")).unwrap();
        let handle = RequestHandle {
            request_id: "req-1".into(),
            status_url: format!("http://{}/status", addr),
            response_url: format!("http://{}", addr),
        };
        let mut events = client.follow_status_stream(handle).await.unwrap();
        match events.next().await {
            Some(Ok(QueueEvent::Log(line))) => assert_eq!(line, "step 1"),
            other => panic!("unexpected event: {:?}", other),
        }
        drop(events);

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("connection still held after the stream was dropped")
            .unwrap();
    }
}
