use regex::{Captures, Regex};

lazy_static! {
    static ref UNSAFE_CHARS_REGEX: Regex =
        Regex::new(r"[/ %:\\\[\].#_]").unwrap();
}

/// Makes a name, tag value or field key safe to use as one segment of a
/// metric path.
///
/// Every character is substituted in a single pass, so an underscore written
/// in place of `/`, `:` or `\` is never stripped again by the `_` rule:
///
/// - `/`, `:`, `\` become `_`
/// - `%` becomes `Percent`
/// - space, `[`, `]`, `.`, `#` and `_` are removed
pub fn sanitize(segment: &str) -> String {
    UNSAFE_CHARS_REGEX
        .replace_all(segment, |caps: &Captures| {
            match &caps[0] {
                "/" | ":" | "\\" => "_",
                "%" => "Percent",
                _ => "",
            }
        })
        .into_owned()
}

/// Like `sanitize`, except that a tag value of exactly `/` (usually a mount
/// point) is reported as `ROOT`.
pub fn sanitize_tag_value(value: &str) -> String {
    if value == "/" {
        return "ROOT".to_owned()
    }

    sanitize(value)
}
