use http::{HeaderMap, HeaderName, Request};
use tracing::trace;

use super::AuthenticatedUser;
use crate::config::AuthConfig;
use crate::error::{ProxyError, Result};

/// Authenticates callers from trusted request headers.
///
/// Reads the user name, UID and groups asserted by the upstream authenticating
/// component and stores them as an [`AuthenticatedUser`] request extension.
/// Requests without a usable user header get no extension.
#[derive(Debug, Clone)]
pub struct HeaderAuthenticator {
    user_header: HeaderName,
    uid_header: HeaderName,
    group_header: HeaderName,
    strip_headers: bool,
}

impl HeaderAuthenticator {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            user_header: parse_header_name(&config.user_header)?,
            uid_header: parse_header_name(&config.uid_header)?,
            group_header: parse_header_name(&config.group_header)?,
            strip_headers: config.strip_headers,
        })
    }

    /// Attach the authenticated user to `req`, returning whether one was found.
    pub fn authenticate<B>(&self, req: &mut Request<B>) -> bool {
        let user = self.user_from_headers(req.headers());

        if self.strip_headers {
            let headers = req.headers_mut();
            headers.remove(&self.user_header);
            headers.remove(&self.uid_header);
            headers.remove(&self.group_header);
        }

        match user {
            Some(user) => {
                trace!(user = %user.name, groups = ?user.groups, "Authenticated request from headers");
                req.extensions_mut().insert(user);
                true
            }
            None => false,
        }
    }

    fn user_from_headers(&self, headers: &HeaderMap) -> Option<AuthenticatedUser> {
        let name = single_value(headers, &self.user_header)?;
        let uid = single_value(headers, &self.uid_header).unwrap_or_default();
        let groups = headers
            .get_all(&self.group_header)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();

        Some(AuthenticatedUser::new(name).with_uid(uid).with_groups(groups))
    }
}

fn single_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.to_lowercase().as_bytes())
        .map_err(|e| ProxyError::Config(format!("Invalid auth header name '{name}': {e}")))
}
