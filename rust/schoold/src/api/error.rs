use super::types::ErrorBody;

pub const GENERIC_FAILURE: &str = "An unexpected error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request rejected with status {status}")]
    Rejected { status: u16, messages: Vec<String> },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("request not sent: {0}")]
    Unsent(String),
}

impl ApiError {
    pub(crate) fn rejected(status: u16, body: &[u8]) -> Self {
        let messages = serde_json::from_slice::<ErrorBody>(body)
            .map(ErrorBody::into_messages)
            .unwrap_or_default();
        ApiError::Rejected { status, messages }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Messages to show the user: the server's own wording when it sent any,
    /// otherwise a generic fallback.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            ApiError::Rejected { messages, .. } if !messages.is_empty() => messages.clone(),
            _ => vec![GENERIC_FAILURE.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_string_is_surfaced_verbatim() {
        let e = ApiError::rejected(409, br#"{"message":"Room already assigned"}"#);
        assert_eq!(e.user_messages(), vec!["Room already assigned".to_string()]);
        assert_eq!(e.status(), Some(409));
    }

    #[test]
    fn server_message_list_is_surfaced_in_order() {
        let e = ApiError::rejected(400, br#"{"message":["grade must be a number","room is required"]}"#);
        assert_eq!(
            e.user_messages(),
            vec!["grade must be a number".to_string(), "room is required".to_string()]
        );
    }

    #[test]
    fn missing_or_unreadable_message_falls_back() {
        assert_eq!(
            ApiError::rejected(500, b"<html>oops</html>").user_messages(),
            vec![GENERIC_FAILURE.to_string()]
        );
        assert_eq!(
            ApiError::rejected(500, br#"{"error":"x"}"#).user_messages(),
            vec![GENERIC_FAILURE.to_string()]
        );
        assert_eq!(
            ApiError::MalformedResponse("eof".into()).user_messages(),
            vec![GENERIC_FAILURE.to_string()]
        );
    }
}
