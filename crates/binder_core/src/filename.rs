/// Filesystem-safe transform of a chapter or work title: forbidden
/// characters become `_`, runs of `_` collapse, leading/trailing junk is
/// trimmed and Windows reserved device names are defused.
pub fn filesystem_safe_name(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name = compacted;
    if final_name.len() > 80 {
        // The cap must land on a char boundary for multibyte titles.
        let mut cut = 80;
        while !final_name.is_char_boundary(cut) {
            cut -= 1;
        }
        final_name.truncate(cut);
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

/// `{safe_title}.{ext}`, e.g. an archive entry name for one chapter.
pub fn entry_filename(title: &str, ext: &str) -> String {
    format!("{}.{ext}", filesystem_safe_name(title))
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
