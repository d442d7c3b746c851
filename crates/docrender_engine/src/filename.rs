const MAX_STEM_LEN: usize = 80;

/// Windows-safe export filename derived from the document title: `{title}.pdf`.
pub fn export_filename(title: Option<&str>) -> String {
    format!("{}.pdf", sanitize_title(title.unwrap_or("untitled")))
}

fn sanitize_title(input: &str) -> String {
    let mut stem = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        // Collapse runs of replacements.
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(c);
    }

    let mut stem = stem.trim_matches(&['_', ' ', '.'][..]).to_string();
    if stem.is_empty() {
        stem = "untitled".to_string();
    }
    if stem.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem.truncate(cut);
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
