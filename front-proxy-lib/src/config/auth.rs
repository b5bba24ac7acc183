use serde::Deserialize;

/// Trusted request-header authentication
///
/// An upstream authenticating component (or the edge load balancer) asserts the
/// caller's identity through these headers. The front proxy must only be
/// reachable through that component.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AuthConfig {
    /// Header carrying the user name
    /// Default: "x-remote-user"
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// Header carrying the unique user ID
    /// Default: "x-remote-uid"
    #[serde(default = "default_uid_header")]
    pub uid_header: String,
    /// Header carrying group membership (repeatable, or comma separated)
    /// Default: "x-remote-group"
    #[serde(default = "default_group_header")]
    pub group_header: String,
    /// Remove the identity headers before forwarding to the backend
    /// Default: false
    #[serde(default)]
    pub strip_headers: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
            uid_header: default_uid_header(),
            group_header: default_group_header(),
            strip_headers: false,
        }
    }
}

fn default_user_header() -> String {
    "x-remote-user".to_string()
}

fn default_uid_header() -> String {
    "x-remote-uid".to_string()
}

fn default_group_header() -> String {
    "x-remote-group".to_string()
}
