//! Authenticated brokerage session.
//!
//! The login flow itself happens outside this tool; the session is built once
//! from an app id and an access token, handed to the market-data client, and
//! dropped when the run ends.
use std::fmt;

use log::debug;
use margin_common::{MarginError, Result};

/// App id and access token of a logged-in user.
pub struct Session {
    app_id: String,
    access_token: String,
}

impl Session {
    /// Fails with `Authentication` when either credential is blank.
    pub fn new(app_id: &str, access_token: &str) -> Result<Self> {
        let app_id = app_id.trim();
        let access_token = access_token.trim();
        if app_id.is_empty() || access_token.is_empty() {
            return Err(MarginError::Authentication(
                "app id and access token are required".into(),
            ));
        }
        Ok(Session {
            app_id: app_id.to_string(),
            access_token: access_token.to_string(),
        })
    }

    /// Value of the `Authorization` header, `<app_id>:<access_token>`.
    pub fn authorization(&self) -> String {
        format!("{}:{}", self.app_id, self.access_token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("app_id", &self.app_id)
            .field("access_token", &"***")
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.access_token.clear();
        debug!("Session for {} released", self.app_id);
    }
}
