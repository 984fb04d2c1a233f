pub mod core;
pub mod data;
pub mod forms;
pub mod session;
pub mod views;
pub mod wizard;

use serde::de::DeserializeOwned;

use crate::ipc::error::err;
use crate::ipc::types::Request;

pub(crate) fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Reads the whole params object as `T`; absent params mean `T::default()`.
pub(crate) fn params_as<T: DeserializeOwned + Default>(req: &Request) -> Result<T, serde_json::Value> {
    if req.params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(req.params.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid params: {e}"), None))
}
