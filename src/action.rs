/// Outbound requests produced while translating inbound messages. The host
/// owns the transport and decides how to send them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Ask the server for a channel's modes (`MODE <channel>`).
    RequestModes { channel: String },
}

impl Action {
    /// The raw protocol line for this request.
    pub fn to_line(&self) -> String {
        match self {
            Action::RequestModes { channel } => format!("MODE {}", channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_modes_line() {
        let action = Action::RequestModes {
            channel: "#rust".into(),
        };
        assert_eq!(action.to_line(), "MODE #rust");
    }
}
