use std::path::{Path, PathBuf};

use axum::{Router, extract::Request, http::Method};
use chrono::{Local, NaiveTime};
use thiserror::Error;
use tower::util::MapRequest;
use tower_http::services::{ServeDir, ServeFile};

/// Source tag used when a caller does not name one.
pub const DEFAULT_LOG_SOURCE: &str = "server";

/// Errors raised while mounting the client bundle. Fatal at startup.
#[derive(Debug, Error)]
pub enum ServeStaticError {
    #[error("Could not find the build directory: {}, make sure to build the client first", .path.display())]
    MissingBuildDir { path: PathBuf },
}

/// Formats a log line as `h:mm:ss AM [source] message` (12-hour clock, unpadded hour).
pub fn format_log_line(time: NaiveTime, message: &str, source: &str) -> String {
    format!("{} [{source}] {message}", time.format("%-I:%M:%S %p"))
}

/// Writes one timestamped line through the tracing subscriber.
pub fn log(message: &str, source: &str) {
    let line = format_log_line(Local::now().time(), message, source);
    tracing::info!("{line}");
}

/// setup_dev_server
///
/// No-op: in development the client is served by its own dev server.
pub fn setup_dev_server<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    tracing::debug!("client dev server runs independently; nothing to mount");
    router
}

/// serve_static
///
/// Mounts `dist_dir` as the router's fallback and answers any unmatched path with
/// `dist_dir/index.html` so client-side routing can take over.
///
/// Fails before touching the router if `dist_dir` is not an existing directory.
pub fn serve_static<S>(router: Router<S>, dist_dir: &Path) -> Result<Router<S>, ServeStaticError>
where
    S: Clone + Send + Sync + 'static,
{
    if !dist_dir.is_dir() {
        return Err(ServeStaticError::MissingBuildDir {
            path: dist_dir.to_path_buf(),
        });
    }

    // ServeFile only answers GET and HEAD, so every other method reads the entry point as a GET.
    let index = MapRequest::new(
        ServeFile::new(dist_dir.join("index.html")),
        |mut request: Request| {
            if request.method() != Method::HEAD {
                *request.method_mut() = Method::GET;
            }
            request
        },
    );
    let assets = ServeDir::new(dist_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(index);

    log(&format!("serving client bundle from {}", dist_dir.display()), DEFAULT_LOG_SOURCE);
    Ok(router.fallback_service(assets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn afternoon_times_use_twelve_hour_clock() {
        let time = NaiveTime::from_hms_opt(15, 4, 5).unwrap();
        assert_eq!(
            format_log_line(time, "GET /api/courses 200", "server"),
            "3:04:05 PM [server] GET /api/courses 200"
        );
    }

    #[test]
    fn midnight_renders_as_twelve_am() {
        let time = NaiveTime::from_hms_opt(0, 0, 9).unwrap();
        assert_eq!(format_log_line(time, "boot", "vite"), "12:00:09 AM [vite] boot");
    }
}
