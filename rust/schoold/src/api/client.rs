use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use super::error::ApiError;
use crate::entities::{Body, Submission};
use crate::session::SessionContext;

/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(session: &SessionContext, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: session.api_url.trim_end_matches('/').to_string(),
            auth_token: session.auth_token.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let rb = self.authorize(self.http.get(self.url(path)));
        finish(rb.send().await?).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let rb = self.authorize(self.http.post(self.url(path)).json(body));
        finish(rb.send().await?).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Value, ApiError> {
        let rb = self.authorize(self.http.post(self.url(path)).multipart(form));
        finish(rb.send().await?).await
    }

    /// Posts a prepared entity submission, as JSON or as multipart form data.
    pub async fn submit(&self, submission: Submission) -> Result<Value, ApiError> {
        match submission.body {
            Body::Json(body) => self.post_json(submission.endpoint, &body).await,
            Body::Multipart { fields, file } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(file.mime)
                    .map_err(|e| ApiError::Unsent(e.to_string()))?;
                form = form.part(file.field, part);
                self.post_multipart(submission.endpoint, form).await
            }
        }
    }
}

async fn finish(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::rejected(status.as_u16(), &body));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}
