//! Canned-response HTTP server on a loopback port.
//!
//! Stands in for a distributor API in tests: each route answers with a fixed
//! status and body, and every request is recorded so tests can assert on
//! what the client actually sent.
//!
//! ```no_run
//! use partpal_test_utils::mock_api::MockApi;
//!
//! let api = MockApi::new()
//!     .route("POST", "/search/partnumber", 200, r#"{"Errors": []}"#)
//!     .start();
//! let url = api.url();
//! // point a client at `url`, then inspect api.requests()
//! ```

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    /// Path including the query string
    pub target: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Request {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, q)| q)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: String,
    path_prefix: String,
    status: u16,
    body: String,
}

#[derive(Default)]
pub struct MockApi {
    routes: Vec<Route>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` requests whose path starts with `path_prefix`.
    /// Earlier routes win; unmatched requests get a 404.
    pub fn route(mut self, method: &str, path_prefix: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method: method.to_string(),
            path_prefix: path_prefix.to_string(),
            status,
            body: body.to_string(),
        });
        self
    }

    /// Bind a loopback port and serve until the test process exits.
    pub fn start(self) -> RunningMockApi {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback port");
        let port = listener.local_addr().expect("local address").port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        let routes = self.routes;
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve(stream, &routes, &recorded);
            }
        });

        RunningMockApi {
            url: format!("http://127.0.0.1:{port}"),
            requests,
        }
    }
}

pub struct RunningMockApi {
    url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl RunningMockApi {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every request served so far, in arrival order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("request log").clone()
    }
}

fn serve(mut stream: TcpStream, routes: &[Route], recorded: &Mutex<Vec<Request>>) -> Option<()> {
    let request = read_request(&stream)?;

    let route = routes
        .iter()
        .find(|r| r.method == request.method && request.path().starts_with(&r.path_prefix));
    let (status, body) = match route {
        Some(route) => (route.status, route.body.as_str()),
        None => (404, r#"{"error": "no route"}"#),
    };

    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    // Record before answering
    recorded.lock().expect("request log").push(request);

    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

fn read_request(stream: &TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream);

    // GET /path?query HTTP/1.1
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(Request {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
