use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `/api/iserver/auth/status`
///
/// Market data and trading aren't possible unless `authenticated` is `true`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    /// Another session of the same user is logged in
    #[serde(default)]
    pub competing: bool,
    /// Connected to the brokerage backend
    #[serde(default)]
    pub connected: bool,
    /// `null` on some gateway builds
    pub message: Option<String>,
    pub fail: Option<String>,
    #[serde(rename = "MAC")]
    pub mac: Option<String>,
    #[serde(rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
    /// Everything not covered above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerInfo {
    #[serde(rename = "serverName")]
    pub server_name: Option<String>,
    #[serde(rename = "serverVersion")]
    pub server_version: Option<String>,
}

/// `/api/iserver/account`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerAccount {
    /// Whether the account was switched
    #[serde(default)]
    pub set: bool,
    #[serde(rename = "acctId")]
    pub account_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `/api/sso/validate`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Validation {
    #[serde(rename = "USER_ID")]
    pub user_id: Option<i64>,
    #[serde(rename = "USER_NAME")]
    pub user_name: Option<String>,
    /// `true` if the SSO session is valid
    #[serde(rename = "RESULT", default)]
    pub result: bool,
    /// Milliseconds since epoch
    #[serde(rename = "AUTH_TIME")]
    pub auth_time: Option<i64>,
    #[serde(rename = "SF_ENABLED")]
    pub second_factor_enabled: Option<bool>,
    #[serde(rename = "IS_FREE_TRIAL")]
    pub is_free_trial: Option<bool>,
    /// Milliseconds until the session expires
    #[serde(rename = "EXPIRES")]
    pub expires: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `/api/iserver/reauthenticate`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Reauthentication {
    /// Usually `triggered`
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `/api/logout`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Logout {
    #[serde(default)]
    pub status: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
