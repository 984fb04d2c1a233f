use serde::Serialize;

/// Who the daemon talks to and as whom. Owned by the daemon state and handed
/// to the API client when it is (re)built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub api_url: String,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub authenticated: bool,
}

impl SessionContext {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            auth_token: None,
            authenticated: false,
        }
    }
}
