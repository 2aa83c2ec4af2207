//! Nick and channel name folding.
//!
//! IRC compares names case-insensitively, and under the classic `rfc1459`
//! mapping a few punctuation characters fold too (`[` ~ `{`). The server
//! announces which mapping it uses through the ISUPPORT `CASEMAPPING` token;
//! until it does, `rfc1459` is assumed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseMapping {
    /// `A-Z` plus `[]\~` fold to `a-z{}|^`.
    #[default]
    Rfc1459,
    /// Like `rfc1459` but `~` and `^` stay distinct.
    StrictRfc1459,
    /// Only `A-Z` folds.
    Ascii,
}

impl CaseMapping {
    #[inline]
    pub const fn fold_char(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => (c as u8 + 32) as char,
            (CaseMapping::Ascii, _) => c,
            (_, '[') => '{',
            (_, ']') => '}',
            (_, '\\') => '|',
            (CaseMapping::Rfc1459, '~') => '^',
            _ => c,
        }
    }

    /// Fold a name into the key used for lookups.
    pub fn fold(self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }

    pub fn equals(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a.chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.fold_char(ca) == self.fold_char(cb))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CaseMapping::Rfc1459 => "rfc1459",
            CaseMapping::StrictRfc1459 => "strict-rfc1459",
            CaseMapping::Ascii => "ascii",
        }
    }
}

impl FromStr for CaseMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rfc1459" => Ok(CaseMapping::Rfc1459),
            "strict-rfc1459" => Ok(CaseMapping::StrictRfc1459),
            "ascii" => Ok(CaseMapping::Ascii),
            other => Err(format!("unsupported case mapping: {}", other)),
        }
    }
}

impl fmt::Display for CaseMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find the `CASEMAPPING` value in `RPL_ISUPPORT` parameters.
///
/// The first parameter is our nick and the last is the trailing
/// "are supported by this server" text; neither is a token.
pub fn casemapping_from_isupport(params: &[String]) -> Option<&str> {
    let tokens = params.get(1..params.len().saturating_sub(1))?;
    tokens
        .iter()
        .filter_map(|t| t.strip_prefix("CASEMAPPING="))
        .next_back()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc1459_fold() {
        let m = CaseMapping::Rfc1459;
        assert_eq!(m.fold("HELLO"), "hello");
        assert_eq!(m.fold("#Channel[1]"), "#channel{1}");
        assert_eq!(m.fold("Nick\\Away"), "nick|away");
        assert_eq!(m.fold("Test~Name"), "test^name");
    }

    #[test]
    fn test_strict_keeps_tilde() {
        let m = CaseMapping::StrictRfc1459;
        assert_eq!(m.fold("A~[B]"), "a~{b}");
    }

    #[test]
    fn test_ascii_only_letters() {
        let m = CaseMapping::Ascii;
        assert_eq!(m.fold("Foo[Bar]"), "foo[bar]");
        assert!(!m.equals("a[", "A{"));
    }

    #[test]
    fn test_eq() {
        let m = CaseMapping::Rfc1459;
        assert!(m.equals("Nick[away]", "nick{AWAY}"));
        assert!(!m.equals("nick", "nick_"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("ASCII".parse::<CaseMapping>(), Ok(CaseMapping::Ascii));
        assert_eq!(
            "strict-rfc1459".parse::<CaseMapping>(),
            Ok(CaseMapping::StrictRfc1459)
        );
        assert!("rfc7613".parse::<CaseMapping>().is_err());
    }

    #[test]
    fn test_casemapping_from_isupport() {
        let params: Vec<String> = ["me", "NETWORK=Test", "CASEMAPPING=ascii", "are supported by this server"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(casemapping_from_isupport(&params), Some("ascii"));

        let none: Vec<String> = vec!["me".into(), "are supported".into()];
        assert_eq!(casemapping_from_isupport(&none), None);
        assert_eq!(casemapping_from_isupport(&[]), None);
    }
}
