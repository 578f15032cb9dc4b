use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_text_unicode(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    const ELLIPSIS: &str = "...";
    let ellipsis_width = ELLIPSIS.width();

    if max_width <= ellipsis_width {
        return ELLIPSIS[..max_width].to_string();
    }

    let target_width = max_width - ellipsis_width;
    let mut result = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if current_width + ch_width > target_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }

    result.push_str(ELLIPSIS);
    result
}

/// Strip markup and control characters from a single-line text field,
/// collapsing runs of whitespace into one space.
///
/// A `<` only opens a tag when followed by a letter, `/`, `!` or `?`, so
/// "3 < 5" survives. An unterminated tag is kept as text. `script` and
/// `style` elements are removed with their contents.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('<') {
        push_plain(&mut out, &rest[..pos]);
        let after = &rest[pos + 1..];

        if !after.chars().next().is_some_and(opens_tag) {
            out.push('<');
            rest = after;
            continue;
        }

        // a tag ends at the next '>' unless another '<' comes first
        match after.find(|c: char| c == '>' || c == '<') {
            Some(end) if after.as_bytes()[end] == b'>' => {
                let name = tag_name(&after[..end]);
                rest = &after[end + 1..];
                if matches!(name.as_str(), "script" | "style") {
                    if let Some(skip) = closing_tag_end(rest, &name) {
                        rest = &rest[skip..];
                    }
                }
            }
            Some(end) => {
                push_plain(&mut out, &rest[pos..pos + 1 + end]);
                rest = &after[end..];
            }
            None => {
                push_plain(&mut out, &rest[pos..]);
                rest = "";
            }
        }
    }
    push_plain(&mut out, rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}

fn push_plain(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| if c.is_control() { ' ' } else { c }));
}

/// Lowercase element name of an opening tag body, empty for closing tags
fn tag_name(tag: &str) -> String {
    tag.chars()
        .take_while(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Byte offset just past `</name ...>` in `text`, matched case-insensitively
fn closing_tag_end(text: &str, name: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find(&format!("</{}", name))?;
    lower[start..].find('>').map(|end| start + end + 1)
}

/// Normalize a form field key: lowercase, only `[a-z0-9_-]` kept.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Show only the first and last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    if secret.len() > 8 && secret.is_ascii() {
        format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
    } else {
        "*****".to_string()
    }
}
