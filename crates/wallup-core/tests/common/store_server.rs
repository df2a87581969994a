//! Minimal HTTP/1.1 server mimicking the blob store and the save-wallpaper
//! endpoint for integration tests.
//!
//! Serves `/blob` (multipart POST, JSON DELETE) and `/save` (JSON POST),
//! counts calls per operation, and can be configured to fail or hang
//! individual steps. One request per connection; responses close the socket.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreServerOptions {
    /// Full-image POST returns 500 `{"success":false,"error":"disk full"}`.
    pub fail_image_upload: bool,
    /// Thumbnail POST returns 500.
    pub fail_thumb_upload: bool,
    /// Save POST returns 500 `{"success":false,"error":"db down"}`.
    pub fail_save: bool,
    /// Full-image POST is read but never answered.
    pub hang_image_upload: bool,
    /// Save POST is read but never answered.
    pub hang_save: bool,
}

#[derive(Default)]
pub struct Counters {
    pub image_posts: AtomicUsize,
    pub thumb_posts: AtomicUsize,
    pub saves: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl Counters {
    pub fn image_posts(&self) -> usize {
        self.image_posts.load(Ordering::SeqCst)
    }
    pub fn thumb_posts(&self) -> usize {
        self.thumb_posts.load(Ordering::SeqCst)
    }
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

/// Handle to a running mock store. The server runs until the process exits.
pub struct StoreServer {
    port: u16,
    pub counters: Arc<Counters>,
    pub last_save_body: Arc<Mutex<Option<String>>>,
    opts: Arc<Mutex<StoreServerOptions>>,
}

impl StoreServer {
    pub fn blob_endpoint(&self) -> String {
        format!("http://127.0.0.1:{}/blob", self.port)
    }

    pub fn save_endpoint(&self) -> String {
        format!("http://127.0.0.1:{}/save", self.port)
    }

    pub fn probe_url(&self) -> String {
        format!("http://127.0.0.1:{}/probe", self.port)
    }

    /// Change behavior between attempts (e.g. let the save succeed on retry).
    pub fn set_options(&self, opts: StoreServerOptions) {
        *self.opts.lock().unwrap() = opts;
    }
}

pub fn start(opts: StoreServerOptions) -> StoreServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let counters = Arc::new(Counters::default());
    let last_save_body = Arc::new(Mutex::new(None));
    let opts = Arc::new(Mutex::new(opts));

    {
        let counters = Arc::clone(&counters);
        let last_save_body = Arc::clone(&last_save_body);
        let opts = Arc::clone(&opts);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let counters = Arc::clone(&counters);
                let last_save_body = Arc::clone(&last_save_body);
                let opts = *opts.lock().unwrap();
                thread::spawn(move || handle(stream, &counters, &last_save_body, opts));
            }
        });
    }

    StoreServer {
        port,
        counters,
        last_save_body,
        opts,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    counters: &Counters,
    last_save_body: &Mutex<Option<String>>,
    opts: StoreServerOptions,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };

    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/blob") => {
            let is_thumb = request.body.contains("thumbnails");
            if is_thumb {
                counters.thumb_posts.fetch_add(1, Ordering::SeqCst);
                if opts.fail_thumb_upload {
                    respond(&mut stream, 500, r#"{"success":false,"error":"thumb store unavailable"}"#);
                } else {
                    respond(
                        &mut stream,
                        200,
                        r#"{"success":true,"url":"http://store/thumbnails/a_thumb.jpg"}"#,
                    );
                }
            } else {
                counters.image_posts.fetch_add(1, Ordering::SeqCst);
                if opts.hang_image_upload {
                    thread::sleep(Duration::from_secs(30));
                    return;
                }
                if opts.fail_image_upload {
                    respond(&mut stream, 500, r#"{"success":false,"error":"disk full"}"#);
                } else {
                    respond(
                        &mut stream,
                        200,
                        r#"{"success":true,"url":"http://store/wallpapers/a.jpg"}"#,
                    );
                }
            }
        }
        ("DELETE", "/blob") => {
            counters.deletes.fetch_add(1, Ordering::SeqCst);
            respond(&mut stream, 200, r#"{"success":true}"#);
        }
        ("POST", "/save") => {
            counters.saves.fetch_add(1, Ordering::SeqCst);
            *last_save_body.lock().unwrap() = Some(request.body.clone());
            if opts.hang_save {
                thread::sleep(Duration::from_secs(30));
                return;
            }
            if opts.fail_save {
                respond(&mut stream, 500, r#"{"success":false,"error":"db down"}"#);
            } else {
                respond(&mut stream, 200, r#"{"success":true,"data":{"id":"42"}}"#);
            }
        }
        ("HEAD", _) => {
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
        _ => {
            respond(&mut stream, 404, r#"{"success":false,"error":"not found"}"#);
        }
    }
}

struct ParsedRequest {
    method: String,
    path: String,
    body: String,
}

/// Read one request: headers, then exactly Content-Length body bytes.
fn read_request(stream: &mut std::net::TcpStream) -> Option<ParsedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end;
    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) => return None,
            Ok(n) => n,
            Err(_) => return None,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            header_end = pos;
            break;
        }
        if buf.len() > 1024 * 1024 {
            return None;
        }
    }

    let header_text = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = header_text.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_bytes = buf[header_end + 4..].to_vec();
    while body_bytes.len() < content_length {
        let n = match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        body_bytes.extend_from_slice(&chunk[..n]);
    }

    Some(ParsedRequest {
        method,
        path,
        body: String::from_utf8_lossy(&body_bytes).to_string(),
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn respond(stream: &mut std::net::TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
