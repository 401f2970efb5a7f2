//! Job lists fetched over HTTP.
//!
//! A job list is a plain-text document with one command per line. It is
//! fetched with an HTTP/1.1 GET and `Connection: close`; the body is decoded
//! by reqwest and split into lines as it arrives.

use std::fmt;
use std::io::{BufRead, BufReader};

use failure::{Fail, ResultExt};
use log::{debug, info};
use reqwest::{blocking::Client, header};

use crate::errors::{Error, ErrorKind, Result};

pub const DEFAULT_HTTP_PORT: u16 = 80;

const SCHEME_SEPARATOR: &str = "://";
const HTTP_SCHEME: &str = "http";

/// Body lines of a fetched job list. Lazy, finite and not restartable.
pub type JobLines = Box<dyn Iterator<Item = Result<String>>>;

/// Somewhere job lists can be fetched from.
pub trait JobSource {
    fn fetch(&self, url: &str) -> Result<JobLines>;
}

/// The host, port and path of an `http://` URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Url {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    /// Parses `http://host[:port]/path`. The path keeps its leading `/`.
    pub fn parse(url: &str, default_port: u16) -> Result<Self> {
        let separator = url
            .find(SCHEME_SEPARATOR)
            .ok_or_else(|| Error::malformed_url(url))?;
        if &url[..separator] != HTTP_SCHEME {
            return Err(Error::malformed_url(url));
        }

        let rest = &url[separator + SCHEME_SEPARATOR.len()..];
        let slash = rest.find('/').ok_or_else(|| Error::malformed_url(url))?;
        let (authority, path) = rest.split_at(slash);

        let (host, port) = match authority.rfind(':') {
            Some(colon) => {
                let port = authority[colon + 1..]
                    .parse::<u16>()
                    .map_err(|_| Error::malformed_url(url))?;
                (&authority[..colon], port)
            }
            None => (authority, default_port),
        };
        if host.is_empty() {
            return Err(Error::malformed_url(url));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Fetches job lists from web servers.
#[derive(Clone, Copy, Debug)]
pub struct HttpJobSource {
    default_port: u16,
}

impl HttpJobSource {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

impl Default for HttpJobSource {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_PORT)
    }
}

impl JobSource for HttpJobSource {
    fn fetch(&self, url: &str) -> Result<JobLines> {
        let parsed = Url::parse(url, self.default_port)?;
        info!("fetching job list from {}", parsed);

        let transport_error = || ErrorKind::Transport(url.to_string());
        // a hung server blocks the fetch like a hung child blocks its wait
        let client = Client::builder()
            .timeout(None)
            .build()
            .with_context(|_| transport_error())?;
        let response = client
            .get(&parsed.to_string())
            .header(header::CONNECTION, "close")
            .send()
            .with_context(|_| transport_error())?;

        let status = response.status();
        let response = response.error_for_status().map_err(|e| -> Error {
            let status = e.status().unwrap_or(status);
            Error::http_status(url, status.to_string())
        })?;
        debug!("{}: {}", url, status);

        Ok(Box::new(BodyLines {
            reader: Some(BufReader::new(response)),
            url: url.to_string(),
        }))
    }
}

struct BodyLines<R> {
    /// Dropped after the last line or the first error.
    reader: Option<R>,
    url: String,
}

impl<R: BufRead> Iterator for BodyLines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        let result = self.reader.as_mut()?.read_until(b'\n', &mut line);
        match result {
            Ok(0) => {
                self.reader = None;
                None
            }
            Ok(_) => Some(Ok(decode_line(&line))),
            Err(e) => {
                self.reader = None;
                let url = self.url.clone();
                Some(Err(e.context(ErrorKind::Transport(url)).into()))
            }
        }
    }
}

/// Strips the line terminator; bytes that are not UTF-8 become U+FFFD.
fn decode_line(line: &[u8]) -> String {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&line[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serves `response` to a single client and returns the request it sent.
    fn serve_once(response: &'static [u8]) -> (u16, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                request.push_str(&line);
            }
            reader.get_mut().write_all(response).unwrap();
            request
        });
        (port, server)
    }

    fn fetch_all(url: &str) -> Vec<String> {
        HttpJobSource::default()
            .fetch(url)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_parse_url() {
        let url = Url::parse("http://example.com/jobs/serial.txt", 80).unwrap();
        assert_eq!(
            url,
            Url {
                host: "example.com".into(),
                port: 80,
                path: "/jobs/serial.txt".into(),
            }
        );
    }

    #[test]
    fn test_parse_url_with_port() {
        let url = Url::parse("http://localhost:8080/", 80).unwrap();
        assert_eq!(url.host, "localhost");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/");
    }

    #[test]
    fn test_parse_url_uses_default_port() {
        assert_eq!(Url::parse("http://example.com/a", 8000).unwrap().port, 8000);
    }

    #[test]
    fn test_parse_malformed_urls() {
        for url in &[
            "example.com/jobs",
            "http://example.com",
            "https://example.com/jobs",
            "http:///jobs",
            "http://example.com:http/jobs",
        ] {
            match Url::parse(url, 80) {
                Err(ref e) if *e.kind() == ErrorKind::MalformedUrl(url.to_string()) => {}
                other => panic!("{}: expected malformed url, got {:?}", url, other),
            }
        }
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"echo a\r\n"), "echo a");
        assert_eq!(decode_line(b"echo b"), "echo b");
        assert_eq!(decode_line(b"echo caf\xe9\n"), "echo caf\u{FFFD}");
    }

    #[test]
    fn test_body_lines_keep_going_after_invalid_utf8() {
        let lines: Vec<String> = BodyLines {
            reader: Some(Cursor::new(&b"echo caf\xe9\necho b\n"[..])),
            url: "http://jobs.test/latin1.txt".to_string(),
        }
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(lines, vec!["echo caf\u{FFFD}", "echo b"]);
    }

    #[test]
    fn test_fetch_body_lines() {
        let (port, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 22\r\n\r\necho a\necho b\r\n# done\n",
        );

        let lines = fetch_all(&format!("http://127.0.0.1:{}/jobs.txt", port));
        assert_eq!(lines, vec!["echo a", "echo b", "# done"]);

        let request = server.join().unwrap().to_lowercase();
        assert!(request.starts_with("get /jobs.txt http/1.1\r\n"));
        assert!(request.contains(&format!("host: 127.0.0.1:{}\r\n", port)));
        assert!(request.contains("connection: close\r\n"));
    }

    #[test]
    fn test_fetch_decodes_chunked_body() {
        let (port, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              7\r\necho a\n\r\n\
              9\r\necho b\nec\r\n\
              5\r\nho c\n\r\n\
              0\r\n\r\n",
        );

        let lines = fetch_all(&format!("http://127.0.0.1:{}/chunked.txt", port));
        assert_eq!(lines, vec!["echo a", "echo b", "echo c"]);
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_passes_invalid_utf8_through() {
        let (port, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 17\r\n\r\necho caf\xe9\necho b\n",
        );

        let lines = fetch_all(&format!("http://127.0.0.1:{}/latin1.txt", port));
        assert_eq!(lines, vec!["echo caf\u{FFFD}", "echo b"]);
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_rejects_error_status() {
        let (port, server) =
            serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nnot here\n");

        let url = format!("http://127.0.0.1:{}/missing.txt", port);
        let err = HttpJobSource::default().fetch(&url).err().unwrap();
        assert_eq!(
            *err.kind(),
            ErrorKind::HttpStatus {
                url,
                status: "404 Not Found".into(),
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let url = format!("http://127.0.0.1:{}/jobs.txt", port);
        let err = HttpJobSource::default().fetch(&url).err().unwrap();
        assert_eq!(*err.kind(), ErrorKind::Transport(url));
    }
}
