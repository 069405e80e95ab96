//! Well-known formats and environment-driven format selection.

use std::borrow::Cow;
use std::env;

/// Apache/NCSA common log format.
pub const COMMON: &str =
    "$remote_host - - [$time_common] \"$request\" $response_status $response_body_size";

/// Common log format plus referer and user agent.
pub const COMBINED: &str = "$remote_host - - [$time_common] \"$request\" $response_status \
     $response_body_size \"$header.Referer\" \"$header.User-Agent\"";

/// Environment variable holding the format string.
pub const FORMAT_ENV: &str = "ACCESS_LOG_FORMAT";

/// Resolves a preset by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static str> {
    if name.eq_ignore_ascii_case("common") {
        Some(COMMON)
    } else if name.eq_ignore_ascii_case("combined") {
        Some(COMBINED)
    } else {
        None
    }
}

/// Resolves a format given by the user: a preset name or a literal format.
pub fn resolve(format: &str) -> Cow<'_, str> {
    match lookup(format) {
        Some(preset) => Cow::Borrowed(preset),
        None => Cow::Borrowed(format),
    }
}

/// The format from [`FORMAT_ENV`], falling back to [`COMBINED`] when unset.
///
/// The variable may hold a preset name or a literal format. An empty value is
/// honored and disables logging.
pub fn format_from_env() -> Cow<'static, str> {
    match env::var(FORMAT_ENV) {
        Ok(value) => match lookup(&value) {
            Some(preset) => Cow::Borrowed(preset),
            None => Cow::Owned(value),
        },
        Err(_) => Cow::Borrowed(COMBINED),
    }
}
