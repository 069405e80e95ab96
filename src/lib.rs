//! # Access Logger
//!
//! Compiles an access log format such as
//! `$remote_addr "$request" $response_status` into a [`Pattern`] once, then
//! renders one log line per HTTP request with no allocation beyond growing
//! the output buffer.
//!
//! ## Key Features
//!
//! * Format strings are checked when compiled; unknown fields are rejected up front
//! * Rendering never fails: missing request data renders as empty text
//! * Integers and timestamps are formatted without temporary strings
//! * Patterns are immutable and can be shared between threads
//! * Works with any request type through the [`LogRequest`] / [`LogResponse`] traits
//!
//! ## Main Components
//!
//! * `numeric`: allocation-free integer formatting
//! * `fields`: the table of named fields and their renderers
//! * `lexer`: the tokenizer for format strings
//! * `pattern`: compiling formats and rendering lines
//! * `logger`: `AccessLogger`, a pattern bound to an `io::Write` sink
//! * `presets`: common and combined formats, `ACCESS_LOG_FORMAT` support
//!
//! ## Fields
//!
//! | Field | Output |
//! |---|---|
//! | `$remote_addr`, `$remote_host`, `$remote_port` | client address, host and port |
//! | `$request` | `METHOD URI PROTO` |
//! | `$request_args` | raw query string |
//! | `$request_host`, `$request_method`, `$request_uri`, `$request_proto` | request attributes |
//! | `$response_body_size`, `$response_status` | response attributes |
//! | `$response_time_ms`, `_us`, `_ns` | elapsed time as `seconds.fraction` |
//! | `$time_unix_ms`, `_us`, `_ns` | end time since the Unix epoch |
//! | `$time_common` | `02/Jan/2006:15:04:05 +0000` |
//! | `$time_rfc3339`, `_ms`, `_us`, `_ns` | `2006-01-02T15:04:05[.fraction]Z` |
//! | `$upstream_addr`, `$upstream_host`, `$upstream_port` | address of the upstream request |
//! | `$header.Name` | first value of request header `Name` |
//!
//! ## Quick Start
//!
//! ```
//! use access_logger::AccessLogger;
//! use access_logger::http::{RequestRecord, ResponseRecord};
//! use chrono::Utc;
//!
//! let format = access_logger::presets::COMBINED;
//! let mut logger = AccessLogger::new(std::io::stdout(), format).unwrap();
//!
//! let start = Utc::now();
//! let req = RequestRecord::new("GET", "/", "HTTP/1.1")
//!     .with_remote_addr("127.0.0.1:52100")
//!     .with_header("User-Agent", "curl/8.0");
//! let resp = ResponseRecord::new(200).with_content_length(612);
//!
//! logger.log(&start, &Utc::now(), &resp, &req).unwrap();
//! ```

pub mod error;
pub mod fields;
pub mod http;
pub mod lexer;
pub mod logger;
pub mod numeric;
pub mod pattern;
pub mod presets;

pub use error::PatternError;
pub use fields::{FieldFn, FieldTable};
pub use http::{LogRequest, LogResponse};
pub use logger::AccessLogger;
pub use pattern::Pattern;
