use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: AuthUser,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_seconds: i64,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
}
