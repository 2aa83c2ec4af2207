use chrono::{DateTime, Utc};

/// Immutable payload attached to lifecycle and messaging events.
///
/// `text` is the free-text argument of the inbound line (the body of a
/// PRIVMSG, the token of a PING, the reason of an ERROR). Events that carry
/// structured data, such as the MOTD, expose it through `lines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    params: Vec<String>,
    lines: Vec<String>,
    received_at: DateTime<Utc>,
}

impl Message {
    pub fn new(text: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            text: text.into(),
            params,
            lines: Vec::new(),
            received_at: Utc::now(),
        }
    }

    /// Use the last parameter as the text.
    pub fn from_params(params: &[String]) -> Self {
        let text = params.last().cloned().unwrap_or_default();
        Self::new(text, params.to_vec())
    }

    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params_uses_trailing() {
        let msg = Message::from_params(&["#rust".into(), "hello there".into()]);
        assert_eq!(msg.text(), "hello there");
        assert_eq!(msg.params().len(), 2);
        assert!(msg.lines().is_empty());
    }

    #[test]
    fn test_from_no_params() {
        let msg = Message::from_params(&[]);
        assert_eq!(msg.text(), "");
    }
}
