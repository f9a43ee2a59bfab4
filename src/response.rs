use std::io::{self, Write};

/// Name and version advertised in the `Server:` header and in page variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub package: String,
    pub version: String,
}

impl ServerIdentity {
    pub fn new(package: &str, version: &str) -> Self {
        Self {
            package: package.to_string(),
            version: version.to_string(),
        }
    }
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

/// Writes the status line and header block that precede every error body.
pub fn write_headers<W: Write + ?Sized>(
    sink: &mut W,
    code: u16,
    message: &str,
    server: &ServerIdentity,
) -> io::Result<()> {
    write!(
        sink,
        "HTTP/1.0 {} {}\r\n\
         Server: {}/{}\r\n\
         Content-Type: text/html\r\n\
         Connection: close\r\n\
         \r\n",
        code, message, server.package, server.version
    )
}

/// Writes the built-in page used when the configured template can't be opened.
pub fn write_fallback_body<W: Write + ?Sized>(
    sink: &mut W,
    message: &str,
    server: &ServerIdentity,
    open_error: &io::Error,
) -> io::Result<()> {
    let (errno, description) = describe_os_error(open_error);
    write!(
        sink,
        "<html><head><title>{message}</title></head>\
         <body><blockquote><i>{package} {version}</i><br>\
         The page you requested was unavailable. The error code is listed \
         below. In addition, the HTML file which has been configured as the \
         page to be displayed when an error of this type was unavailable, \
         with the error code {errno} ({description}).  Please contact your administrator.\
         <center>{message}</center>\
         </body></html>\r\n",
        package = server.package,
        version = server.version,
    )
}

/// Splits an I/O error into the OS error number and its description.
///
/// Errors without an OS code report `0` and their display text.
pub fn describe_os_error(err: &io::Error) -> (i32, String) {
    let text = err.to_string();
    match err.raw_os_error() {
        Some(code) => {
            let suffix = format!(" (os error {})", code);
            let description = text.strip_suffix(&suffix).unwrap_or(&text).to_string();
            (code, description)
        }
        None => (0, text),
    }
}

/// Canonical reason phrase for the codes a proxy typically reports.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Error",
    }
}
