use std::env;
use std::process::ExitCode;

use access_logger::http::{RequestRecord, ResponseRecord};
use access_logger::{presets, AccessLogger};
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

/// Renders a sample request with the given format.
///
/// Usage: `access_logger [FORMAT]`. FORMAT may be a preset name (`common`,
/// `combined`) or a format string; without it `ACCESS_LOG_FORMAT` is used.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let format = match env::args().nth(1) {
        Some(arg) => presets::resolve(&arg).into_owned(),
        None => presets::format_from_env().into_owned(),
    };

    let (stdout, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut logger = match AccessLogger::new(stdout, &format) {
        Ok(logger) => logger,
        Err(err) => {
            tracing::error!(%format, %err, "invalid access log format");
            return ExitCode::FAILURE;
        }
    };

    let end = Utc::now();
    let start = end - Duration::milliseconds(42);
    let req = RequestRecord::new("GET", "/index.html?lang=en", "HTTP/1.1")
        .with_raw_query("lang=en")
        .with_host("example.com")
        .with_remote_addr("192.0.2.10:51234")
        .with_header("Referer", "https://example.com/")
        .with_header("User-Agent", "curl/8.5.0");
    let resp = ResponseRecord::new(200)
        .with_content_length(1024)
        .with_upstream(RequestRecord::default().with_remote_addr("10.0.0.5:8080"));

    if let Err(err) = logger.log(&start, &end, &resp, &req).and_then(|()| logger.flush()) {
        tracing::error!(%err, "failed to write access log line");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
