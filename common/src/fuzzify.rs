//! Wildcard / fuzzy rewriting of free-text search terms.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fuzzify {
    /// `*term*`
    #[serde(rename = "*")]
    Wildcard,
    /// `term~`
    #[serde(rename = "~")]
    Fuzzy,
}

impl Fuzzify {
    pub fn as_char(&self) -> char {
        match self {
            Fuzzify::Wildcard => '*',
            Fuzzify::Fuzzy => '~',
        }
    }
}

/// Characters that mean the user already wrote query syntax themselves.
const EXPLICIT_SYNTAX: [char; 3] = ['*', '~', ':'];

/// Every token is followed by one space, including the last one.
pub fn fuzzify(text: &str, mode: Option<Fuzzify>) -> String {
    let Some(mode) = mode else {
        return text.to_string();
    };
    if text.contains(EXPLICIT_SYNTAX) {
        return text.to_string();
    }

    let marker = mode.as_char();
    let mut out = String::with_capacity(text.len() * 2);
    for token in text.split(' ').filter(|token| !token.is_empty()) {
        if mode == Fuzzify::Wildcard {
            out.push(marker);
        }
        out.push_str(token);
        out.push(marker);
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_mode_leaves_text_alone() {
        assert_eq!(fuzzify("hello world", None), "hello world");
    }

    #[test]
    fn wildcard_wraps_each_token() {
        assert_eq!(fuzzify("hello world", Some(Fuzzify::Wildcard)), "*hello* *world* ");
    }

    #[test]
    fn fuzzy_suffixes_each_token() {
        assert_eq!(fuzzify("hello world", Some(Fuzzify::Fuzzy)), "hello~ world~ ");
    }

    #[test]
    fn explicit_syntax_is_kept() {
        assert_eq!(fuzzify("field:val", Some(Fuzzify::Wildcard)), "field:val");
        assert_eq!(fuzzify("hel*", Some(Fuzzify::Fuzzy)), "hel*");
        assert_eq!(fuzzify("helo~", Some(Fuzzify::Wildcard)), "helo~");
    }

    #[test]
    fn repeated_spaces_do_not_produce_empty_tokens() {
        assert_eq!(fuzzify("  a   b ", Some(Fuzzify::Fuzzy)), "a~ b~ ");
        assert_eq!(fuzzify("", Some(Fuzzify::Wildcard)), "");
    }

    #[test]
    fn mode_reads_from_option_character() {
        let mode: Fuzzify = serde_json::from_str(r#""*""#).unwrap();
        assert_eq!(mode, Fuzzify::Wildcard);
    }
}
