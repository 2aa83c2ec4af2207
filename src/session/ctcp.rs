use crate::event::CtcpReply;

const DELIM: char = '\x01';

/// Split a CTCP-wrapped message body into `(command, arguments)`.
///
/// Returns `None` unless the text starts with `\x01`. The closing delimiter
/// is optional, some clients drop it.
pub fn parse_ctcp(text: &str) -> Option<(String, String)> {
    let inner = text.strip_prefix(DELIM)?;
    let inner = inner.strip_suffix(DELIM).unwrap_or(inner);
    if inner.is_empty() {
        return None;
    }
    let (command, arguments) = inner.split_once(' ').unwrap_or((inner, ""));
    Some((command.to_uppercase(), arguments.to_string()))
}

/// Build a reply, splitting `arguments` on the first `" :"` into the echoed
/// query and the answer.
pub fn split_reply(command: &str, arguments: &str) -> CtcpReply {
    let (query, answer) = match arguments.split_once(" :") {
        Some((query, answer)) => (Some(query.to_string()), Some(answer.to_string())),
        None => (None, None),
    };
    CtcpReply {
        command: command.to_string(),
        arguments: arguments.to_string(),
        query,
        answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_request() {
        assert_eq!(parse_ctcp("\x01VERSION\x01"), Some(("VERSION".into(), String::new())));
    }

    #[test]
    fn test_parse_action_with_args() {
        assert_eq!(
            parse_ctcp("\x01ACTION waves hello\x01"),
            Some(("ACTION".into(), "waves hello".into()))
        );
    }

    #[test]
    fn test_missing_closing_delimiter() {
        assert_eq!(parse_ctcp("\x01PING 123"), Some(("PING".into(), "123".into())));
    }

    #[test]
    fn test_not_ctcp() {
        assert_eq!(parse_ctcp("hello"), None);
        assert_eq!(parse_ctcp("\x01\x01"), None);
        assert_eq!(parse_ctcp(""), None);
    }

    #[test]
    fn test_errmsg_with_answer() {
        let reply = split_reply("ERRMSG", "xyz :bla");
        assert_eq!(reply.query.as_deref(), Some("xyz"));
        assert_eq!(reply.answer.as_deref(), Some("bla"));
        assert_eq!(reply.arguments, "xyz :bla");
    }

    #[test]
    fn test_errmsg_without_delimiter() {
        let reply = split_reply("ERRMSG", "xyz");
        assert_eq!(reply.query, None);
        assert_eq!(reply.answer, None);
        assert_eq!(reply.arguments, "xyz");
    }

    #[test]
    fn test_answer_keeps_later_delimiters() {
        let reply = split_reply("ERRMSG", "a :b :c");
        assert_eq!(reply.query.as_deref(), Some("a"));
        assert_eq!(reply.answer.as_deref(), Some("b :c"));
    }
}
