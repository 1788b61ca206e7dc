//! One-shot HTTP server for exercising the real clients

use std::{
    io::{Read as _, Write as _},
    net::TcpListener,
    thread::{self, JoinHandle},
    time::Duration,
};

/// How the server treats its single connection
pub enum Reply {
    /// Write this raw HTTP response
    Raw(String),
    /// Read the request, then stay silent for the given time
    Silent(Duration),
}

impl Reply {
    /// Response with the given status line and body
    pub fn status(status: &str, body: &str) -> Self {
        Self::Raw(format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
    }
}

/// Accept one connection on a local port.
///
/// Returns the base URL and a handle yielding the raw request text.
pub fn serve_once(reply: Reply) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let request = read_request(&mut stream);

        match reply {
            Reply::Raw(response) => {
                stream.write_all(response.as_bytes()).expect("write response");
            }
            Reply::Silent(duration) => thread::sleep(duration),
        }

        request
    });

    (url, handle)
}

/// Read headers and, if announced, the body
fn read_request(stream: &mut impl std::io::Read) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).expect("read request");
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}
