//! Named log fields and the functions that render them.
//!
//! A field renderer appends the text of one field to the line buffer. It is
//! on the hot path of every request, so the built-in renderers never allocate:
//! strings are copied straight out of the request, numbers go through
//! [`write_int`], and timestamps are assembled from their calendar parts
//! instead of going through a formatter.
//!
//! Renderers cannot fail. Missing data (an address without a port, a response
//! without an upstream request) renders as empty text.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use lazy_static::lazy_static;

use crate::http::{LogRequest, LogResponse};
use crate::numeric::write_int;

/// Signature of a field renderer.
///
/// # Arguments
///
/// * `buf` - Line buffer to append to
/// * `start` - When the request started
/// * `end` - When the response finished, the timestamp of the log line
/// * `response` - The response being logged
/// * `request` - The request being logged
pub type FieldFn = fn(
    buf: &mut Vec<u8>,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
    response: &dyn LogResponse,
    request: &dyn LogRequest,
);

const SHORT_MONTH_NAMES: [&str; 13] = [
    "---", "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const NANOS_PER_SECOND: i64 = 1_000_000_000;

lazy_static! {
    /// The built-in fields, shared by every logger in the process.
    static ref STANDARD_FIELDS: FieldTable = FieldTable::builtin();
}

/// Mapping from field name (including the leading `$`) to renderer.
///
/// Build a table once and share it; compiling a pattern only reads from it.
/// Most callers want [`FieldTable::standard`]. Custom tables start from
/// [`FieldTable::builtin`] or [`FieldTable::new`] and add entries with
/// [`FieldTable::with`].
///
/// # Examples
///
/// ```
/// # use access_logger::fields::FieldTable;
/// # use access_logger::Pattern;
/// let fields = FieldTable::builtin().with("$service", |buf, _, _, _, _| {
///     buf.extend_from_slice(b"checkout");
/// });
///
/// assert!(fields.get("$service").is_some());
/// assert!(Pattern::compile("$service $response_status", &fields).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct FieldTable {
    fields: HashMap<Cow<'static, str>, FieldFn>,
}

impl FieldTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table of built-in fields.
    ///
    /// Constructed on first use and never modified afterwards.
    pub fn standard() -> &'static FieldTable {
        &STANDARD_FIELDS
    }

    /// Creates a fresh table holding every built-in field.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("$remote_addr", remote_addr);
        table.insert("$remote_host", remote_host);
        table.insert("$remote_port", remote_port);
        table.insert("$request", request_line);
        table.insert("$request_args", request_args);
        table.insert("$request_host", request_host);
        table.insert("$request_method", request_method);
        table.insert("$request_uri", request_uri);
        table.insert("$request_proto", request_proto);
        table.insert("$response_body_size", response_body_size);
        table.insert("$response_status", response_status);
        table.insert("$response_time_ms", response_time_ms);
        table.insert("$response_time_us", response_time_us);
        table.insert("$response_time_ns", response_time_ns);
        table.insert("$time_unix_ms", time_unix_ms);
        table.insert("$time_unix_us", time_unix_us);
        table.insert("$time_unix_ns", time_unix_ns);
        table.insert("$time_common", time_common);
        table.insert("$time_rfc3339", time_rfc3339);
        table.insert("$time_rfc3339_ms", time_rfc3339_ms);
        table.insert("$time_rfc3339_us", time_rfc3339_us);
        table.insert("$time_rfc3339_ns", time_rfc3339_ns);
        table.insert("$upstream_addr", upstream_addr);
        table.insert("$upstream_host", upstream_host);
        table.insert("$upstream_port", upstream_port);
        table
    }

    /// Adds or replaces the renderer for `name`.
    ///
    /// Names are matched exactly and case-sensitively at compile time, so
    /// they should include the leading `$`.
    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, field: FieldFn) {
        self.fields.insert(name.into(), field);
    }

    /// Builder form of [`FieldTable::insert`].
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, field: FieldFn) -> Self {
        self.insert(name, field);
        self
    }

    /// Looks up the renderer registered under `name`.
    pub fn get(&self, name: &str) -> Option<FieldFn> {
        self.fields.get(name).copied()
    }

    /// Registered field names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(|name| &**name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl std::fmt::Debug for FieldTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Splits `host:port` into its parts.
///
/// Accepts bracketed IPv6 hosts (`[::1]:80`). Returns `None` when there is no
/// port separator or the host part is ambiguous, in which case both the host
/// and the port fields render empty.
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    let colon = addr.rfind(':')?;
    let (host, port) = (&addr[..colon], &addr[colon + 1..]);
    if port.contains(['[', ']']) {
        return None;
    }
    if let Some(inner) = host.strip_prefix('[') {
        let inner = inner.strip_suffix(']')?;
        if inner.contains(['[', ']']) {
            return None;
        }
        return Some((inner, port));
    }
    if host.contains([':', '[', ']']) {
        return None;
    }
    Some((host, port))
}

fn write_host(buf: &mut Vec<u8>, addr: &str) {
    if let Some((host, _)) = split_host_port(addr) {
        buf.extend_from_slice(host.as_bytes());
    }
}

fn write_port(buf: &mut Vec<u8>, addr: &str) {
    if let Some((_, port)) = split_host_port(addr) {
        buf.extend_from_slice(port.as_bytes());
    }
}

/// Elapsed nanoseconds between the two timestamps, saturating at the `i64`
/// range.
fn elapsed_nanos(start: &DateTime<Utc>, end: &DateTime<Utc>) -> i64 {
    match (*end - *start).num_nanoseconds() {
        Some(nanos) => nanos,
        None if end >= start => i64::MAX,
        None => i64::MIN,
    }
}

/// Writes `<seconds>.<fraction>`, the fraction being `unit`-sized ticks
/// since the last whole second, zero-padded to `width` digits.
fn write_elapsed(buf: &mut Vec<u8>, nanos: i64, unit: i64, width: usize) {
    write_int(buf, nanos / NANOS_PER_SECOND, 0);
    buf.push(b'.');
    write_int(buf, nanos % NANOS_PER_SECOND / unit, width);
}

/// Splits the sub-second part of `t` into a leap flag and nanoseconds below
/// one second. chrono encodes a leap second as second 59 with
/// `nanosecond()` in `1_000_000_000..2_000_000_000`.
fn leap_and_nanos(t: &DateTime<Utc>) -> (i64, i64) {
    let nanos = i64::from(t.nanosecond());
    (nanos / NANOS_PER_SECOND, nanos % NANOS_PER_SECOND)
}

/// Unix time in `unit`-sized ticks. A leap second repeats the preceding
/// second, as POSIX time does.
fn unix_ticks(t: &DateTime<Utc>, unit: i64) -> Option<i64> {
    let (_, nanos) = leap_and_nanos(t);
    t.timestamp()
        .checked_mul(NANOS_PER_SECOND / unit)?
        .checked_add(nanos / unit)
}

/// Writes `YYYY-MM-DDTHH:MM:SS[.fraction]Z`. A `width` of zero omits the
/// fraction.
fn write_rfc3339(buf: &mut Vec<u8>, t: &DateTime<Utc>, unit: i64, width: usize) {
    write_int(buf, i64::from(t.year()), 4);
    buf.push(b'-');
    write_int(buf, i64::from(t.month()), 2);
    buf.push(b'-');
    write_int(buf, i64::from(t.day()), 2);
    buf.push(b'T');
    write_clock(buf, t);
    if width > 0 {
        buf.push(b'.');
        let (_, nanos) = leap_and_nanos(t);
        write_int(buf, nanos / unit, width);
    }
    buf.push(b'Z');
}

/// Writes `HH:MM:SS`, with second `60` during a leap second.
fn write_clock(buf: &mut Vec<u8>, t: &DateTime<Utc>) {
    let (leap, _) = leap_and_nanos(t);
    write_int(buf, i64::from(t.hour()), 2);
    buf.push(b':');
    write_int(buf, i64::from(t.minute()), 2);
    buf.push(b':');
    write_int(buf, i64::from(t.second()) + leap, 2);
}

fn remote_addr(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.remote_addr().as_bytes());
}

fn remote_host(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    write_host(buf, r.remote_addr());
}

fn remote_port(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    write_port(buf, r.remote_addr());
}

fn request_line(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.method().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(r.request_uri().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(r.proto().as_bytes());
}

fn request_args(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.raw_query().as_bytes());
}

fn request_host(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.host().as_bytes());
}

fn request_method(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.method().as_bytes());
}

fn request_uri(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.request_uri().as_bytes());
}

fn request_proto(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    _: &dyn LogResponse,
    r: &dyn LogRequest,
) {
    buf.extend_from_slice(r.proto().as_bytes());
}

fn response_body_size(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    w: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_int(buf, w.content_length(), 0);
}

fn response_status(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    w: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_int(buf, i64::from(w.status()), 0);
}

fn response_time_ms(
    buf: &mut Vec<u8>,
    t1: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_elapsed(buf, elapsed_nanos(t1, t2), 1_000_000, 3);
}

fn response_time_us(
    buf: &mut Vec<u8>,
    t1: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_elapsed(buf, elapsed_nanos(t1, t2), 1_000, 6);
}

fn response_time_ns(
    buf: &mut Vec<u8>,
    t1: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_elapsed(buf, elapsed_nanos(t1, t2), 1, 9);
}

fn time_unix_ms(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    if let Some(ticks) = unix_ticks(t2, 1_000_000) {
        write_int(buf, ticks, 0);
    }
}

fn time_unix_us(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    if let Some(ticks) = unix_ticks(t2, 1_000) {
        write_int(buf, ticks, 0);
    }
}

fn time_unix_ns(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    if let Some(ticks) = unix_ticks(t2, 1) {
        write_int(buf, ticks, 0);
    }
}

fn time_common(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_int(buf, i64::from(t2.day()), 2);
    buf.push(b'/');
    buf.extend_from_slice(SHORT_MONTH_NAMES[t2.month() as usize].as_bytes());
    buf.push(b'/');
    write_int(buf, i64::from(t2.year()), 4);
    buf.push(b':');
    write_clock(buf, t2);
    // Always UTC, the offset is never anything else.
    buf.extend_from_slice(b" +0000");
}

fn time_rfc3339(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_rfc3339(buf, t2, 1, 0);
}

fn time_rfc3339_ms(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_rfc3339(buf, t2, 1_000_000, 3);
}

fn time_rfc3339_us(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_rfc3339(buf, t2, 1_000, 6);
}

fn time_rfc3339_ns(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    t2: &DateTime<Utc>,
    _: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    write_rfc3339(buf, t2, 1, 9);
}

fn upstream_addr(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    w: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    if let Some(upstream) = w.upstream() {
        buf.extend_from_slice(upstream.remote_addr().as_bytes());
    }
}

fn upstream_host(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    w: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    if let Some(upstream) = w.upstream() {
        write_host(buf, upstream.remote_addr());
    }
}

fn upstream_port(
    buf: &mut Vec<u8>,
    _: &DateTime<Utc>,
    _: &DateTime<Utc>,
    w: &dyn LogResponse,
    _: &dyn LogRequest,
) {
    if let Some(upstream) = w.upstream() {
        write_port(buf, upstream.remote_addr());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{RequestRecord, ResponseRecord};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("2.2.2.2:666"), Some(("2.2.2.2", "666")));
        assert_eq!(split_host_port("[::1]:8080"), Some(("::1", "8080")));
        assert_eq!(split_host_port("example.com:"), Some(("example.com", "")));
        assert_eq!(split_host_port("2.2.2.2"), None);
        assert_eq!(split_host_port("::1"), None);
        assert_eq!(split_host_port("[::1]"), None);
        assert_eq!(split_host_port(""), None);
    }

    #[test]
    fn test_builtin_names() {
        let fields = FieldTable::builtin();
        assert_eq!(fields.len(), 25);
        assert!(fields.get("$remote_addr").is_some());
        assert!(fields.get("$Remote_Addr").is_none());
        assert!(fields.get("$header").is_none());
        assert_eq!(fields.names().first(), Some(&"$remote_addr"));
    }

    #[test]
    fn test_standard_is_shared() {
        assert!(std::ptr::eq(FieldTable::standard(), FieldTable::standard()));
        assert_eq!(FieldTable::standard().len(), FieldTable::builtin().len());
    }

    #[test]
    fn test_elapsed_formatting() {
        let mut buf = Vec::new();
        write_elapsed(&mut buf, 2_005_000_000, 1_000_000, 3);
        assert_eq!(buf, b"2.005");
    }

    #[test]
    fn test_rfc3339_pads_small_years() {
        let t = Utc.with_ymd_and_hms(987, 6, 5, 4, 3, 2).unwrap();
        let mut buf = Vec::new();
        write_rfc3339(&mut buf, &t, 1, 0);
        assert_eq!(buf, b"0987-06-05T04:03:02Z");
    }

    #[test]
    fn test_leap_second_rendering() {
        let leap = NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 1_500_000_000)
            .unwrap()
            .and_utc();
        let (req, resp) = (RequestRecord::default(), ResponseRecord::new(200));

        let render = |field: FieldFn| {
            let mut buf = Vec::new();
            field(&mut buf, &leap, &leap, &resp, &req);
            String::from_utf8(buf).unwrap()
        };
        assert_eq!(render(time_rfc3339), "2016-12-31T23:59:60Z");
        assert_eq!(render(time_rfc3339_ms), "2016-12-31T23:59:60.500Z");
        assert_eq!(render(time_rfc3339_ns), "2016-12-31T23:59:60.500000000Z");
        assert_eq!(render(time_common), "31/Dec/2016:23:59:60 +0000");
        assert_eq!(render(time_unix_ms), "1483228799500");
        assert_eq!(render(time_unix_us), "1483228799500000");
        assert_eq!(render(time_unix_ns), "1483228799500000000");
    }
}
