use fetchline_http::{FetchResult, FetchSummary};
use std::fmt::Write;

/// One line per URL plus a totals line.
pub fn render_text(results: &[FetchResult]) -> String {
    let mut out = String::new();
    for r in results {
        let outcome = r.error.as_deref().unwrap_or("ok");
        let _ = writeln!(
            out,
            "{status} {url} attempts={attempt} bytes={len} {outcome}",
            status = r.status,
            url = r.url,
            attempt = r.attempt,
            len = r.content.len(),
        );
    }
    let s = FetchSummary::from_results(results);
    let _ = writeln!(
        out,
        "total={} ok={} failed={} (http={} timeout={} connection={}) attempts={}",
        s.total,
        s.succeeded,
        s.failed(),
        s.http_errors,
        s.timeouts,
        s.connection_errors,
        s.total_attempts
    );
    out
}
