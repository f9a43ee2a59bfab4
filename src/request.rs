const MAX_HEAD_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub request_line: String,
}

/// Accumulates bytes until the request head is complete, then parses the
/// request line. Headers are not needed to pick an error page and are skipped.
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    buffer: Vec<u8>,
    request: Option<HttpRequest>,
}

impl HttpRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, data: &[u8]) -> Result<(), &'static str> {
        self.buffer.extend_from_slice(data);

        if !self.done() {
            if self.buffer.len() > MAX_HEAD_SIZE {
                return Err("Request head too large");
            }
            return Ok(());
        }

        let line = self.first_line().ok_or("Missing request line")?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 || !parts[2].starts_with("HTTP/") {
            return Err("Invalid request line");
        }

        self.request = Some(HttpRequest {
            method: parts[0].to_string(),
            path: parts[1].to_string(),
            request_line: line.clone(),
        });
        Ok(())
    }

    pub fn done(&self) -> bool {
        self.buffer.windows(4).any(|w| w == b"\r\n\r\n")
    }

    /// The first line received so far, without its line ending.
    pub fn first_line(&self) -> Option<String> {
        let end = self.buffer.windows(2).position(|w| w == b"\r\n")?;
        let line = String::from_utf8_lossy(&self.buffer[..end]).trim().to_string();
        (!line.is_empty()).then_some(line)
    }

    pub fn get(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_line_across_appends() {
        let mut builder = HttpRequestBuilder::new();
        builder.append(b"GET /404 HTT").unwrap();
        assert!(!builder.done());
        assert!(builder.get().is_none());

        builder.append(b"P/1.0\r\nHost: example.com\r\n\r\n").unwrap();
        let request = builder.get().unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/404");
        assert_eq!(request.request_line, "GET /404 HTTP/1.0");
    }

    #[test]
    fn rejects_malformed_request_line() {
        let mut builder = HttpRequestBuilder::new();
        assert_eq!(builder.append(b"HELLO\r\n\r\n"), Err("Invalid request line"));
        assert_eq!(builder.first_line().as_deref(), Some("HELLO"));
    }

    #[test]
    fn rejects_oversized_head() {
        let mut builder = HttpRequestBuilder::new();
        let junk = vec![b'a'; MAX_HEAD_SIZE + 1];
        assert_eq!(builder.append(&junk), Err("Request head too large"));
    }
}
