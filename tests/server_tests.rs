use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use errpages::config::Config;
use errpages::server::Server;
use tempfile::TempDir;

fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Starts a server whose only template is a 404 page; everything else falls
/// through to a default page that doesn't exist.
fn start_server(dir: &TempDir) -> SocketAddr {
    let not_found = dir.path().join("404.html");
    fs::write(&not_found, "nf {url} {method} {request}").unwrap();

    let addr = free_addr();
    let yaml = format!(
        "listen: \"{}\"\n\
         default_error_page: \"{}\"\n\
         error_pages:\n  - code: 404\n    path: \"{}\"\n",
        addr,
        dir.path().join("absent.html").display(),
        not_found.display(),
    );
    let config = Config::from_yaml(&yaml).unwrap();

    thread::spawn(move || {
        let mut server = Server::new().unwrap();
        server.run(&config).unwrap();
    });
    addr
}

fn connect(addr: SocketAddr) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr) {
            stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            return stream;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("server at {} never came up", addr);
}

/// Sends `request` and reads until the server closes the connection.
fn exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = connect(addr);
    stream.write_all(request).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8(response).unwrap()
}

fn body(response: &str) -> &str {
    response.split_once("\r\n\r\n").unwrap().1
}

#[test]
fn answers_each_request_kind_and_closes() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(&dir);

    let response = exchange(addr, b"GET /x HTTP/1.0\r\nHost: localhost\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
    assert!(response.contains("\r\nConnection: close\r\n"));
    assert_eq!(body(&response), "nf /x GET GET /x HTTP/1.0");

    let response = exchange(addr, b"GET /503 HTTP/1.0\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 503 Service Unavailable\r\n"));
    assert!(body(&response).starts_with("<html><head><title>Service Unavailable</title></head>"));
    assert!(response.ends_with("<center>Service Unavailable</center></body></html>\r\n"));

    let response = exchange(addr, b"HELLO\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    assert!(body(&response).contains("<title>Bad Request</title>"));
}

#[test]
fn preview_uses_registered_template() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(&dir);

    let response = exchange(addr, b"GET /404 HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
    // previews only carry the url pair
    assert_eq!(body(&response), "nf /404 (unknown) GET /404 HTTP/1.1");
}
