use url::Url;

/// File name a completed download of `url` is stored under.
///
/// The name is always a verbatim substring of `url`, since completed files are
/// matched back to their job by that substring. Candidates, in order: the last
/// non-empty path segment, the host, then the longest filesystem-safe run of
/// the raw string. Returns `None` when no candidate is usable.
pub fn download_filename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok();
    let segment = parsed.as_ref().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_owned)
    });
    let host = parsed
        .as_ref()
        .and_then(|parsed| parsed.host_str())
        .map(str::to_owned);

    [segment, host, Some(url.to_owned())]
        .into_iter()
        .flatten()
        .filter_map(|candidate| safe_run(&candidate))
        .find(|name| url.contains(name.as_str()))
}

/// Longest run of `input` free of forbidden characters, trimmed of edge dots
/// and spaces. Rejects empty runs and reserved device names.
fn safe_run(input: &str) -> Option<String> {
    let run = input
        .split(is_forbidden)
        .map(|run| run.trim_matches(&[' ', '.'][..]))
        .max_by_key(|run| run.len())?;
    if run.is_empty() || is_reserved_windows_name(run) {
        return None;
    }
    Some(run.to_string())
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
