//! The request and response data an access log line is rendered from.
//!
//! The logger never depends on a concrete HTTP stack. Anything that can
//! answer the questions in [`LogRequest`] and [`LogResponse`] can be logged,
//! and every accessor returns borrowed data so rendering stays allocation-free.
//! [`RequestRecord`] and [`ResponseRecord`] are plain owned implementations
//! for callers that have no request type of their own.

/// Request attributes available to the field renderers.
pub trait LogRequest {
    /// Request method, e.g. `GET`.
    fn method(&self) -> &str;

    /// Unmodified request-target as sent by the client, e.g. `/?q=x`.
    fn request_uri(&self) -> &str;

    /// Protocol version string, e.g. `HTTP/1.1`.
    fn proto(&self) -> &str;

    /// Raw query string. Rendered verbatim, including a leading `?` if the
    /// implementation stores one.
    fn raw_query(&self) -> &str;

    /// Host the request was addressed to.
    fn host(&self) -> &str;

    /// Peer address in `host:port` form, unparsed.
    fn remote_addr(&self) -> &str;

    /// First value of the header `name`, matched case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Response attributes available to the field renderers.
pub trait LogResponse {
    /// Numeric status code.
    fn status(&self) -> u16;

    /// Body length in bytes, `-1` when unknown.
    fn content_length(&self) -> i64;

    /// The request sent upstream to produce this response, if any.
    fn upstream(&self) -> Option<&dyn LogRequest>;
}

/// An owned [`LogRequest`].
///
/// # Examples
///
/// ```
/// # use access_logger::http::{LogRequest, RequestRecord};
/// let req = RequestRecord::new("GET", "/index.html", "HTTP/1.1")
///     .with_remote_addr("10.0.0.1:5000")
///     .with_header("User-Agent", "curl/8.0");
///
/// assert_eq!(req.header("user-agent"), Some("curl/8.0"));
/// assert_eq!(req.header("Referer"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub request_uri: String,
    pub proto: String,
    pub raw_query: String,
    pub host: String,
    pub remote_addr: String,
    pub headers: Vec<(String, String)>,
}

impl RequestRecord {
    pub fn new(method: &str, request_uri: &str, proto: &str) -> Self {
        Self {
            method: method.to_owned(),
            request_uri: request_uri.to_owned(),
            proto: proto.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_raw_query(mut self, raw_query: &str) -> Self {
        self.raw_query = raw_query.to_owned();
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_owned();
        self
    }

    pub fn with_remote_addr(mut self, remote_addr: &str) -> Self {
        self.remote_addr = remote_addr.to_owned();
        self
    }

    /// Adds a header value. Repeated names keep every value; lookups return
    /// the first one added.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }
}

impl LogRequest for RequestRecord {
    fn method(&self) -> &str {
        &self.method
    }

    fn request_uri(&self) -> &str {
        &self.request_uri
    }

    fn proto(&self) -> &str {
        &self.proto
    }

    fn raw_query(&self) -> &str {
        &self.raw_query
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An owned [`LogResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub status: u16,
    pub content_length: i64,
    pub upstream: Option<RequestRecord>,
}

impl ResponseRecord {
    /// A response with the given status and an unknown (`-1`) length.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_length: -1,
            upstream: None,
        }
    }

    pub fn with_content_length(mut self, content_length: i64) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn with_upstream(mut self, upstream: RequestRecord) -> Self {
        self.upstream = Some(upstream);
        self
    }
}

impl LogResponse for ResponseRecord {
    fn status(&self) -> u16 {
        self.status
    }

    fn content_length(&self) -> i64 {
        self.content_length
    }

    fn upstream(&self) -> Option<&dyn LogRequest> {
        self.upstream.as_ref().map(|req| req as &dyn LogRequest)
    }
}
