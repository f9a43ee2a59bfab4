use std::fs::File;
use std::io::{BufReader, Write};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::{ErrorPageRegistry, is_valid_status};
use crate::response::{ServerIdentity, write_fallback_body, write_headers};
use crate::template::TemplateRenderer;
use crate::variables::VariableStore;

/// Where a response is in its error-reporting lifecycle.
///
/// `Rendering` and `FallbackSent` are entered before the body is written and
/// only remain visible when that write fails; a complete body ends in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ErrorRecorded,
    HeadersSent,
    /// Streaming the configured template.
    Rendering,
    /// Writing the built-in page.
    FallbackSent,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError {
    pub code: u16,
    pub message: String,
}

/// Per-response state: facts about the connection plus whatever error has
/// been recorded against it. Dropped with the response.
#[derive(Debug)]
pub struct ResponseContext {
    pub request_line: Option<String>,
    pub client_ip: Option<String>,
    pub client_host: Option<String>,
    error: Option<RecordedError>,
    variables: VariableStore,
    phase: Phase,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self {
            request_line: None,
            client_ip: None,
            client_host: None,
            error: None,
            variables: VariableStore::new(),
            phase: Phase::Idle,
        }
    }

    pub fn with_request_line(mut self, line: &str) -> Self {
        self.request_line = Some(line.to_string());
        self
    }

    pub fn with_client(mut self, ip: &str, host: &str) -> Self {
        self.client_ip = Some(ip.to_string());
        self.client_host = Some(host.to_string());
        self
    }

    pub fn error(&self) -> Option<&RecordedError> {
        self.error.as_ref()
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns recorded errors into complete HTML responses.
#[derive(Debug, Clone)]
pub struct ErrorResponder<'a> {
    registry: &'a ErrorPageRegistry,
    server: ServerIdentity,
    renderer: TemplateRenderer,
}

impl<'a> ErrorResponder<'a> {
    pub fn new(registry: &'a ErrorPageRegistry, server: ServerIdentity) -> Self {
        Self {
            registry,
            server,
            renderer: TemplateRenderer::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn server(&self) -> &ServerIdentity {
        &self.server
    }

    /// Records `code`/`message` as the response's error and fills in its
    /// variables: `pairs` first, then the standard ones.
    pub fn record_error(
        &self,
        ctx: &mut ResponseContext,
        code: u16,
        message: &str,
        pairs: &[(&str, &str)],
    ) -> Result<()> {
        debug_assert!(is_valid_status(code), "status code {} out of range", code);
        if !matches!(ctx.phase, Phase::Idle | Phase::ErrorRecorded) {
            return Err(Error::HeadersAlreadySent);
        }

        for (name, value) in pairs {
            ctx.variables.set(name, value)?;
        }

        ctx.error = Some(RecordedError {
            code,
            message: message.to_string(),
        });
        ctx.phase = Phase::ErrorRecorded;
        debug!(code, status = message, "recorded error");

        self.add_standard_vars(ctx)
    }

    fn add_standard_vars(&self, ctx: &mut ResponseContext) -> Result<()> {
        let date = httpdate::fmt_http_date(SystemTime::now());
        let cause = ctx.error.as_ref().map(|e| e.message.clone());

        let standard = [
            ("request", ctx.request_line.clone()),
            ("cause", cause),
            ("clientip", ctx.client_ip.clone()),
            ("clienthost", ctx.client_host.clone()),
            ("version", Some(self.server.version.clone())),
            ("package", Some(self.server.package.clone())),
            ("date", Some(date)),
        ];

        for (name, value) in standard {
            match value {
                Some(value) if !value.is_empty() => ctx.variables.set(name, &value)?,
                _ => debug!(name, "standard variable has no value, skipping"),
            }
        }
        Ok(())
    }

    /// Writes the status line and headers for the recorded error.
    pub fn send_headers<W: Write + ?Sized>(
        &self,
        ctx: &mut ResponseContext,
        sink: &mut W,
    ) -> Result<()> {
        match ctx.phase {
            Phase::ErrorRecorded => {}
            Phase::Idle => return Err(Error::NoErrorRecorded),
            _ => return Err(Error::HeadersAlreadySent),
        }
        let error = ctx.error.as_ref().ok_or(Error::NoErrorRecorded)?;

        write_headers(sink, error.code, &error.message, &self.server)?;
        ctx.phase = Phase::HeadersSent;
        Ok(())
    }

    /// Sends the headers if still pending, then the page body: the rendered
    /// template, or the built-in page when the template can't be opened.
    pub fn send_error_response<W: Write + ?Sized>(
        &self,
        ctx: &mut ResponseContext,
        sink: &mut W,
    ) -> Result<()> {
        if ctx.phase != Phase::HeadersSent {
            self.send_headers(ctx, sink)?;
        }
        let error = ctx.error.as_ref().ok_or(Error::NoErrorRecorded)?;
        let path = self.registry.resolve(error.code);

        match File::open(path) {
            Ok(file) => {
                ctx.phase = Phase::Rendering;
                debug!(code = error.code, path = %path.display(), "rendering error page");
                let reader = BufReader::with_capacity(self.renderer.line_buffer_size(), file);
                self.renderer.render(reader, &ctx.variables, sink)?;
            }
            Err(open_error) => {
                warn!(
                    code = error.code,
                    path = %path.display(),
                    error = %open_error,
                    "error page unavailable, sending built-in page"
                );
                ctx.phase = Phase::FallbackSent;
                write_fallback_body(sink, &error.message, &self.server, &open_error)?;
            }
        }

        ctx.phase = Phase::Done;
        Ok(())
    }
}
