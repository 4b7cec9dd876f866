#[derive(Debug, Clone, Copy)]
pub struct WarnEvent<'a> {
    pub code: &'a str,
    pub stage: &'a str,
    pub action: &'a str,
    pub url: &'a str,
    pub build: &'a str,
    pub target: &'a str,
    pub reason: &'a str,
    pub err: &'a str,
}

const MAX_VALUE_CHARS: usize = 240;

// Values land in `key=value` fields: whitespace runs become `_` and a stray
// `=` becomes `:`. Urls such as `job/x/6/changelog-history/5/changes#detail0`
// pass through as-is.
fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len().min(MAX_VALUE_CHARS));
    let mut pending_sep = false;
    let mut kept = 0usize;
    for ch in value.chars() {
        if ch.is_whitespace() || ch.is_control() {
            pending_sep = kept > 0;
            continue;
        }
        if kept >= MAX_VALUE_CHARS {
            out.push_str("...");
            break;
        }
        if pending_sep {
            out.push('_');
            kept += 1;
            pending_sep = false;
        }
        out.push(if ch == '=' { ':' } else { ch });
        kept += 1;
    }
    if out.is_empty() { "na".to_string() } else { out }
}

pub fn format_line(event: &WarnEvent<'_>) -> String {
    format!(
        "CLH_WARN code={} stage={} action={} url={} build={} target={} reason={} err={}",
        sanitize_value(event.code),
        sanitize_value(event.stage),
        sanitize_value(event.action),
        sanitize_value(event.url),
        sanitize_value(event.build),
        sanitize_value(event.target),
        sanitize_value(event.reason),
        sanitize_value(event.err),
    )
}

pub fn emit(event: WarnEvent<'_>) {
    eprintln!("{}", format_line(&event));
}
