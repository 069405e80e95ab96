use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::error::PatternError;
use crate::fields::FieldTable;
use crate::http::{LogRequest, LogResponse};
use crate::pattern::Pattern;

/// Initial capacity of the line buffer. Typical combined-format lines fit
/// without growing.
const LINE_CAPACITY: usize = 512;

/// Writes one access log line per request to a sink.
///
/// The logger owns a compiled [`Pattern`], the sink, and a line buffer that
/// is reused across calls, so steady-state logging does not allocate. Each
/// line reaches the sink with a single `write_all`.
///
/// # Thread Safety
///
/// `AccessLogger` takes `&mut self` and does no locking of its own. To log
/// from several threads either give each thread its own logger, or share one
/// [`Pattern`] and render into per-thread buffers.
///
/// # Examples
///
/// ```
/// # use access_logger::AccessLogger;
/// # use access_logger::http::{RequestRecord, ResponseRecord};
/// # use chrono::{TimeZone, Utc};
/// let mut logger = AccessLogger::new(Vec::new(), "$request_method $response_status").unwrap();
///
/// let start = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
/// let req = RequestRecord::new("POST", "/login", "HTTP/1.1");
/// logger.log(&start, &start, &ResponseRecord::new(302), &req).unwrap();
///
/// assert_eq!(logger.into_inner(), b"POST 302\n");
/// ```
pub struct AccessLogger<W: Write> {
    pattern: Pattern,
    out: W,
    line: Vec<u8>,
}

impl<W: Write> AccessLogger<W> {
    /// Creates a logger that renders `format` with the built-in fields.
    ///
    /// # Errors
    ///
    /// [`PatternError::InvalidField`] if the format names an unknown field.
    pub fn new(out: W, format: &str) -> Result<Self, PatternError> {
        Self::with_fields(out, format, FieldTable::standard())
    }

    /// Creates a logger that resolves field names against `fields`.
    pub fn with_fields(out: W, format: &str, fields: &FieldTable) -> Result<Self, PatternError> {
        let pattern = Pattern::compile(format, fields).map_err(|err| {
            tracing::warn!(format, %err, "rejecting access log format");
            err
        })?;
        Ok(Self::from_pattern(out, pattern))
    }

    /// Creates a logger around an already compiled pattern.
    pub fn from_pattern(out: W, pattern: Pattern) -> Self {
        Self {
            pattern,
            out,
            line: Vec::with_capacity(LINE_CAPACITY),
        }
    }

    /// Renders the line for one request and writes it to the sink.
    ///
    /// Nothing is written when the pattern renders no output.
    ///
    /// # Errors
    ///
    /// Any error returned by the sink.
    pub fn log(
        &mut self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        response: &dyn LogResponse,
        request: &dyn LogRequest,
    ) -> io::Result<()> {
        self.line.clear();
        self.pattern.write(&mut self.line, start, end, response, request);
        if self.line.is_empty() {
            return Ok(());
        }
        self.out.write_all(&self.line)
    }

    /// Flushes the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consumes the logger and returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> std::fmt::Debug for AccessLogger<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLogger")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{RequestRecord, ResponseRecord};

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_invalid_format() {
        let err = AccessLogger::new(Vec::new(), "$remote_addr $bogus").unwrap_err();
        assert_eq!(err, PatternError::InvalidField("$bogus".to_owned()));
    }

    #[test]
    fn test_empty_format_writes_nothing() {
        let mut logger = AccessLogger::new(FailingSink, "").unwrap();
        let t = Utc::now();
        let result = logger.log(&t, &t, &ResponseRecord::new(200), &RequestRecord::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut logger = AccessLogger::new(FailingSink, "$response_status").unwrap();
        let t = Utc::now();
        let err = logger
            .log(&t, &t, &ResponseRecord::new(200), &RequestRecord::default())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_line_buffer_is_reused() {
        let mut logger = AccessLogger::new(Vec::new(), "$response_status").unwrap();
        let t = Utc::now();
        let req = RequestRecord::default();
        logger.log(&t, &t, &ResponseRecord::new(200), &req).unwrap();
        logger.log(&t, &t, &ResponseRecord::new(404), &req).unwrap();
        assert_eq!(logger.get_ref(), b"200\n404\n");
    }
}
