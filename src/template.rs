//! Streaming `{name}` substitution for error page templates.
//!
//! Templates are read one line at a time into a bounded buffer and written
//! to the sink as they are scanned, so memory use does not grow with the
//! template size.
//!
//! Token grammar:
//! - `{name}` is replaced by the value of `name`, or `(unknown)` if unset.
//! - `{{` produces a single `{`.
//! - a `}` outside a token is copied as is.
//! - a token still open at the end of a line is dropped.
//!
//! Lines longer than the buffer are processed as successive chunks and each
//! chunk ends like a line does, so a token straddling a chunk boundary is
//! lost. Keep template lines shorter than the configured buffer.

use std::io::{self, BufRead, Write};

use crate::variables::VariableStore;

pub const DEFAULT_LINE_BUFFER_SIZE: usize = 4096;

/// Written in place of a token whose variable is not set.
pub const UNKNOWN_VALUE: &str = "(unknown)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Literal,
    /// Inside a token whose name starts at this offset of the line.
    InToken(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateRenderer {
    line_buffer_size: usize,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_BUFFER_SIZE)
    }
}

impl TemplateRenderer {
    /// `line_buffer_size` includes room for a terminator, so at most
    /// `line_buffer_size - 1` bytes are scanned per chunk.
    pub fn new(line_buffer_size: usize) -> Self {
        Self {
            line_buffer_size: line_buffer_size.max(2),
        }
    }

    pub fn line_buffer_size(&self) -> usize {
        self.line_buffer_size
    }

    /// Copies `template` to `sink`, substituting tokens from `vars`.
    ///
    /// Stops at the first failed write and returns its error.
    pub fn render<R, W>(
        &self,
        mut template: R,
        vars: &VariableStore,
        sink: &mut W,
    ) -> io::Result<()>
    where
        R: BufRead,
        W: Write + ?Sized,
    {
        let limit = self.line_buffer_size - 1;
        let mut line = Vec::with_capacity(limit);

        while read_chunk(&mut template, &mut line, limit)? > 0 {
            render_line(&line, vars, sink)?;
        }
        Ok(())
    }
}

/// Reads up to `limit` bytes into `line`, stopping after the first `\n`.
fn read_chunk<R: BufRead>(reader: &mut R, line: &mut Vec<u8>, limit: usize) -> io::Result<usize> {
    line.clear();

    while line.len() < limit {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }

        let window = &available[..available.len().min(limit - line.len())];
        match window.iter().position(|&b| b == b'\n') {
            Some(end) => {
                line.extend_from_slice(&window[..=end]);
                reader.consume(end + 1);
                break;
            }
            None => {
                let n = window.len();
                line.extend_from_slice(window);
                reader.consume(n);
            }
        }
    }

    Ok(line.len())
}

/// Runs the literal/in-token automaton over one line. State never carries
/// over to the next line.
fn render_line<W: Write + ?Sized>(
    line: &[u8],
    vars: &VariableStore,
    sink: &mut W,
) -> io::Result<()> {
    let mut state = ScanState::Literal;
    // Start of the literal bytes not yet written.
    let mut pending = 0;

    for (i, &byte) in line.iter().enumerate() {
        state = match (state, byte) {
            (ScanState::Literal, b'{') => {
                sink.write_all(&line[pending..i])?;
                ScanState::InToken(i + 1)
            }
            // `{{`: this brace becomes the first pending literal byte.
            (ScanState::InToken(_), b'{') => {
                pending = i;
                ScanState::Literal
            }
            (ScanState::InToken(start), b'}') => {
                let value = std::str::from_utf8(&line[start..i])
                    .ok()
                    .and_then(|name| vars.get(name))
                    .unwrap_or(UNKNOWN_VALUE);
                sink.write_all(value.as_bytes())?;
                pending = i + 1;
                ScanState::Literal
            }
            (state, _) => state,
        };
    }

    if state == ScanState::Literal {
        sink.write_all(&line[pending..])?;
    }
    Ok(())
}
