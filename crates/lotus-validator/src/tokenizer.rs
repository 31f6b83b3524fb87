/// A coarse classification of a span of already-bound SQL text, produced
/// by walking the statement once. Not a full parse tree — just enough to
/// tell literal/comment spans apart from executable SQL text so the
/// deny-list scan (and the semicolon check) can ignore what's inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
    DollarQuoted,
}

/// Walks `sql` once, classifying every byte as inside or outside a
/// quoted/comment span. Returns the `Code`-only text (quotes and
/// comments blanked to spaces, preserving length) plus whether an
/// interior (non-trailing) semicolon was found outside any span.
pub struct Scan {
    /// Same length as the input; non-code bytes replaced with spaces so
    /// downstream regex/keyword matching only ever sees code bytes.
    pub code_only: String,
    pub has_interior_semicolon: bool,
}

pub fn scan(sql: &str) -> Scan {
    let bytes = sql.as_bytes();
    let mut out: Vec<u8> = bytes.to_vec();
    let mut mode = Mode::Code;
    let mut dollar_tag: String = String::new();
    let mut has_interior_semicolon = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match mode {
            Mode::Code => match c {
                '\'' => {
                    mode = Mode::SingleQuoted;
                    out[i] = b' ';
                }
                '"' => {
                    mode = Mode::DoubleQuoted;
                    out[i] = b' ';
                }
                '-' if bytes.get(i + 1) == Some(&b'-') => {
                    mode = Mode::LineComment;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 1;
                }
                '/' if bytes.get(i + 1) == Some(&b'*') => {
                    mode = Mode::BlockComment;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 1;
                }
                '$' => {
                    if let Some(tag) = dollar_tag_at(sql, i) {
                        let tag_len = tag.len() + 2;
                        for o in out.iter_mut().skip(i).take(tag_len) {
                            *o = b' ';
                        }
                        dollar_tag = tag;
                        mode = Mode::DollarQuoted;
                        i += tag_len - 1;
                    }
                }
                ';' => {
                    let rest = sql[i + 1..].trim_start();
                    if !rest.is_empty() {
                        has_interior_semicolon = true;
                    }
                }
                _ => {}
            },
            Mode::SingleQuoted => {
                out[i] = b' ';
                if c == '\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        out[i + 1] = b' ';
                        i += 1;
                    } else {
                        mode = Mode::Code;
                    }
                }
            }
            Mode::DoubleQuoted => {
                out[i] = b' ';
                if c == '"' {
                    mode = Mode::Code;
                }
            }
            Mode::LineComment => {
                out[i] = b' ';
                if c == '\n' {
                    mode = Mode::Code;
                }
            }
            Mode::BlockComment => {
                out[i] = b' ';
                if c == '*' && bytes.get(i + 1) == Some(&b'/') {
                    out[i + 1] = b' ';
                    mode = Mode::Code;
                    i += 1;
                }
            }
            Mode::DollarQuoted => {
                out[i] = b' ';
                if c == '$' {
                    if let Some(tag) = dollar_tag_at(sql, i) {
                        if tag == dollar_tag {
                            let tag_len = tag.len() + 2;
                            for o in out.iter_mut().skip(i).take(tag_len) {
                                *o = b' ';
                            }
                            mode = Mode::Code;
                            i += tag_len - 1;
                        }
                    }
                }
            }
        }
        i += 1;
    }

    Scan {
        code_only: String::from_utf8(out).unwrap_or_default(),
        has_interior_semicolon,
    }
}

/// If `sql[pos..]` starts a `$tag$` delimiter, return `tag` (possibly empty).
fn dollar_tag_at(sql: &str, pos: usize) -> Option<String> {
    let rest = &sql[pos..];
    if !rest.starts_with('$') {
        return None;
    }
    let after = &rest[1..];
    let end = after.find('$')?;
    let tag = &after[..end];
    if tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(tag.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_inside_single_quote_is_ignored() {
        let s = scan("SELECT ';' FROM t");
        assert!(!s.has_interior_semicolon);
    }

    #[test]
    fn interior_semicolon_outside_literal_is_detected() {
        let s = scan("SELECT 1; SELECT 2");
        assert!(s.has_interior_semicolon);
    }

    #[test]
    fn trailing_semicolon_is_not_interior() {
        let s = scan("SELECT 1;");
        assert!(!s.has_interior_semicolon);
    }

    #[test]
    fn dollar_quoted_body_is_blanked() {
        let s = scan("SELECT $$DROP TABLE$$");
        assert!(!s.code_only.to_uppercase().contains("DROP"));
    }

    #[test]
    fn tagged_dollar_quote_respects_matching_tag() {
        let s = scan("SELECT $tag$it's $not$ the end$tag$ FROM t");
        assert!(s.code_only.contains("FROM t"));
    }

    #[test]
    fn doubled_single_quote_escape_stays_inside_literal() {
        let s = scan("SELECT 'it''s; fine'");
        assert!(!s.has_interior_semicolon);
    }

    #[test]
    fn line_comment_blanked() {
        let s = scan("SELECT 1 -- DROP TABLE\nFROM t");
        assert!(!s.code_only.to_uppercase().contains("DROP"));
    }

    #[test]
    fn block_comment_blanked() {
        let s = scan("SELECT 1 /* DROP TABLE */ FROM t");
        assert!(!s.code_only.to_uppercase().contains("DROP"));
    }
}
