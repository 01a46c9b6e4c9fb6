use serde::{Deserialize, Serialize};
use tracing::info;

use sape_shared::models::{Session, User};

use crate::client::ApiClient;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    user: User,
}

impl ApiClient {
    /// `POST /login`. Does not install the token; the caller decides when the
    /// session becomes current.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let resp: TokenResponse = self
            .post_json("login", &LoginRequest { username, password })
            .await?;

        info!(user_id = %resp.user.id, "login accepted");

        Ok(Session {
            user: resp.user,
            token: resp.token,
        })
    }
}
