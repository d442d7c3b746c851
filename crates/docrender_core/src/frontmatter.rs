/// Title from the leading `---` metadata block, if the buffer has one.
///
/// Only the first block counts; it must open on the first non-blank line and
/// ends at `---` or `...`. Surrounding quotes are stripped.
pub fn document_title(text: &str) -> Option<String> {
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .skip_while(|line| line.trim().is_empty());
    if lines.next()?.trim_end() != "---" {
        return None;
    }
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            break;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        if key.trim() != "title" {
            continue;
        }
        let value = strip_quotes(value.trim());
        if value.is_empty() {
            return None;
        }
        return Some(value.to_string());
    }
    None
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::document_title;

    #[test]
    fn reads_title_from_leading_block() {
        let doc = "---\ntitle: \"Eigenvalues\"\nauthor: someone\n---\n# Body\n";
        assert_eq!(document_title(doc).as_deref(), Some("Eigenvalues"));
    }

    #[test]
    fn ignores_title_outside_block() {
        assert_eq!(document_title("# Title\n\ntitle: nope\n"), None);
        assert_eq!(document_title("---\nauthor: a\n---\ntitle: late\n"), None);
    }

    #[test]
    fn blank_title_is_none() {
        assert_eq!(document_title("---\ntitle:   \n---\n"), None);
    }
}
