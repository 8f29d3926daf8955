//! In-process HTTP server for provider tests

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Raw requests received by the mock server (head and body)
pub(crate) type Captured = Arc<Mutex<Vec<String>>>;

/// Build a complete HTTP/1.1 response with a JSON content type
pub(crate) fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// Serve one canned response per connection, in order
///
/// Returns the base URL and the list of requests received so far.
pub(crate) async fn spawn_mock_server(responses: Vec<String>) -> (String, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    tokio::spawn(async move {
        for response in responses {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let mut reader = BufReader::new(stream);

            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                let end_of_head = line == "\r\n" || line == "\n";
                request.push_str(&line);
                if end_of_head {
                    break;
                }
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).await.ok();
            request.push_str(&String::from_utf8_lossy(&body));
            sink.lock().unwrap().push(request);

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).await.ok();
            stream.shutdown().await.ok();
        }
    });

    (format!("http://127.0.0.1:{}", port), captured)
}
