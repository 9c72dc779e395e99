// `Content-Disposition` header values for uploaded files (RFC 6266).
//
// Plain names go out as a bare token, printable ASCII names as a quoted
// string, and anything else gets an ASCII fallback plus an RFC 5987
// `filename*` parameter carrying the exact UTF-8 name.

const SEPARATORS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}', ' ', '\t',
];

/// Build the header value announcing `filename` as an attachment.
pub fn content_disposition(filename: &str) -> String {
    if is_token(filename) {
        return format!("attachment; filename={}", filename);
    }

    if is_printable_ascii(filename) && is_lws_safe(filename) {
        let quoted = quote(filename);
        if quoted == filename {
            return format!("attachment; filename=\"{}\"", quoted);
        }
        // Some agents mishandle backslash escapes.
        return format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            quoted,
            urlencoding::encode(filename)
        );
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        quote(&ascii_fallback(filename)),
        urlencoding::encode(filename)
    )
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_graphic() && !SEPARATORS.contains(&c))
}

fn is_printable_ascii(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' '..='~'))
}

// No leading, trailing or repeated whitespace.
fn is_lws_safe(s: &str) -> bool {
    s.split_whitespace().collect::<Vec<_>>().join(" ") == s
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn ascii_fallback(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if matches!(c, ' '..='~') { c } else { '_' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_names_are_bare() {
        assert_eq!(content_disposition("report.pdf"), "attachment; filename=report.pdf");
    }

    #[test]
    fn paths_and_spaces_are_quoted() {
        assert_eq!(
            content_disposition("letters/to mom.pdf"),
            "attachment; filename=\"letters/to mom.pdf\""
        );
    }

    #[test]
    fn escaped_quotes_also_carry_extended_name() {
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say \\\"hi\\\".txt\"; filename*=UTF-8''say%20%22hi%22.txt"
        );
    }

    #[test]
    fn non_ascii_names_get_fallback_and_utf8() {
        assert_eq!(
            content_disposition("résumé.pdf"),
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn irregular_whitespace_is_encoded() {
        let value = content_disposition("a  b.pdf");
        assert!(value.starts_with("attachment; filename=\"a b.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''a%20%20b.pdf"));
    }

    #[test]
    fn header_is_always_ascii() {
        for name in ["日本語.docx", "tab\there.txt", "x\u{7f}y", "ok.txt"] {
            assert!(content_disposition(name).is_ascii(), "{}", name);
        }
    }
}
