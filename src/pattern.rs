use chrono::{DateTime, Utc};

use crate::error::PatternError;
use crate::fields::{FieldFn, FieldTable};
use crate::http::{LogRequest, LogResponse};
use crate::lexer::{tokens, TokenKind, HEADER_PREFIX};

/// One step of a compiled pattern.
#[derive(Clone)]
enum Segment {
    Text(Box<str>),
    Header(Box<str>),
    Field { name: Box<str>, render: FieldFn },
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Segment::Header(name) => f.debug_tuple("Header").field(name).finish(),
            Segment::Field { name, .. } => f.debug_tuple("Field").field(name).finish(),
        }
    }
}

impl Segment {
    #[inline]
    fn render(
        &self,
        buf: &mut Vec<u8>,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        response: &dyn LogResponse,
        request: &dyn LogRequest,
    ) {
        match self {
            Segment::Text(text) => buf.extend_from_slice(text.as_bytes()),
            Segment::Header(name) => {
                if let Some(value) = request.header(name) {
                    buf.extend_from_slice(value.as_bytes());
                }
            }
            Segment::Field { render, .. } => render(buf, start, end, response, request),
        }
    }
}

/// A compiled access log format.
///
/// A pattern is built once from a format string and then rendered once per
/// request. It holds no mutable state, so a single pattern can be shared by
/// any number of threads as long as each render gets its own buffer.
///
/// # Format
///
/// Text is copied verbatim. `$name` is replaced by the field of that name
/// from the [`FieldTable`]. `$header.Name` is replaced by the first value of
/// request header `Name`, looked up case-insensitively.
///
/// # Examples
///
/// ```
/// # use access_logger::{FieldTable, Pattern};
/// # use access_logger::http::{RequestRecord, ResponseRecord};
/// # use chrono::Utc;
/// let pattern = Pattern::compile(
///     "$remote_addr \"$request\" $response_status",
///     FieldTable::standard(),
/// ).unwrap();
///
/// let req = RequestRecord::new("GET", "/?q=x", "HTTP/1.1").with_remote_addr("2.2.2.2:666");
/// let resp = ResponseRecord::new(200);
/// let now = Utc::now();
///
/// let mut buf = Vec::new();
/// pattern.write(&mut buf, &now, &now, &resp, &req);
/// assert_eq!(buf, b"2.2.2.2:666 \"GET /?q=x HTTP/1.1\" 200\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles `format` against `fields`.
    ///
    /// Field names are matched exactly. Compilation stops at the first name
    /// that is neither a `$header.*` token nor in the table.
    ///
    /// # Errors
    ///
    /// [`PatternError::InvalidField`] carrying the unknown name.
    pub fn compile(format: &str, fields: &FieldTable) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        for token in tokens(format) {
            let segment = match token.kind {
                TokenKind::Text => Segment::Text(token.text.into()),
                TokenKind::Header => {
                    // `$header.` is guaranteed by the lexer.
                    let name = &token.text[HEADER_PREFIX.len() + 1..];
                    Segment::Header(name.into())
                }
                TokenKind::Field => {
                    let render = fields
                        .get(token.text)
                        .ok_or_else(|| PatternError::InvalidField(token.text.to_owned()))?;
                    Segment::Field {
                        name: token.text.into(),
                        render,
                    }
                }
            };
            segments.push(segment);
        }

        tracing::debug!(format, segments = segments.len(), "compiled access log pattern");
        Ok(Self { segments })
    }

    /// Renders one log line into `buf`.
    ///
    /// Every segment is appended in order. If they produce any output at all a
    /// single `\n` terminates the line; a pattern that renders nothing leaves
    /// `buf` untouched, so an empty format never yields blank lines.
    ///
    /// # Arguments
    ///
    /// * `buf` - Output buffer, must not be shared with concurrent renders
    /// * `start` - When the request started
    /// * `end` - When the response finished
    /// * `response` - The response being logged
    /// * `request` - The request being logged
    pub fn write(
        &self,
        buf: &mut Vec<u8>,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        response: &dyn LogResponse,
        request: &dyn LogRequest,
    ) {
        let mark = buf.len();
        for segment in &self.segments {
            segment.render(buf, start, end, response, request);
        }
        if buf.len() > mark {
            buf.push(b'\n');
        }
    }

    /// Number of segments, text runs included.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
