//! Account API operations: user, organizations and tokens.

use std::path::Path;

use crate::client::{path_segment, OnlineLabsClient};
use crate::error::{ClientError, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{
    CreateTokenRequest, OrganizationsResponse, PublicKeyPayload, TokenResponse, TokensResponse,
    UpdateTokenRequest, UpdateUserKeysRequest, UserResponse,
};

/// Reads an SSH public key file, dropping surrounding whitespace and the
/// trailing newline.
pub fn read_public_key(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents.trim().to_string())
}

impl<T: Transport> OnlineLabsClient<T> {
    // --- build ---

    pub fn build_get_user_informations(&self, user_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.account_url(&format!("users/{}", path_segment(user_id))),
        )
    }

    pub fn build_get_user_organizations(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.account_url("organizations"))
    }

    pub fn build_get_user_tokens(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.account_url("tokens"))
    }

    pub fn build_get_user_token(&self, token_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            self.account_url(&format!("tokens/{}", path_segment(token_id))),
        )
    }

    pub fn build_create_token(
        &self,
        email: &str,
        password: &str,
        expires: bool,
    ) -> Result<HttpRequest> {
        let payload = CreateTokenRequest {
            email: email.to_string(),
            password: password.to_string(),
            expires,
        };
        self.json_request(HttpMethod::Post, self.account_url("tokens"), &payload)
    }

    pub fn build_update_token(&self, token_id: &str) -> Result<HttpRequest> {
        self.json_request(
            HttpMethod::Patch,
            self.account_url(&format!("tokens/{}", path_segment(token_id))),
            &UpdateTokenRequest { expires: true },
        )
    }

    pub fn build_delete_token(&self, token_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            self.account_url(&format!("tokens/{}", path_segment(token_id))),
        )
    }

    /// `public_key` is sent as given; `upload_public_key` trims file contents
    /// before calling this.
    pub fn build_upload_public_key(&self, user_id: &str, public_key: &str) -> Result<HttpRequest> {
        let payload = UpdateUserKeysRequest {
            ssh_public_keys: vec![PublicKeyPayload {
                key: public_key.to_string(),
            }],
        };
        self.json_request(
            HttpMethod::Patch,
            self.account_url(&format!("users/{}", path_segment(user_id))),
            &payload,
        )
    }

    // --- execute ---

    pub fn get_user_informations(&self, user_id: &str) -> Result<UserResponse> {
        self.fetch(&self.build_get_user_informations(user_id))
    }

    pub fn get_user_organizations(&self) -> Result<OrganizationsResponse> {
        self.fetch(&self.build_get_user_organizations())
    }

    pub fn get_user_tokens(&self) -> Result<TokensResponse> {
        self.fetch(&self.build_get_user_tokens())
    }

    pub fn get_user_token(&self, token_id: &str) -> Result<TokenResponse> {
        self.fetch(&self.build_get_user_token(token_id))
    }

    /// Authenticates with email and password and returns a new token.
    /// With `expires` false the token never expires.
    pub fn create_token(&self, email: &str, password: &str, expires: bool) -> Result<TokenResponse> {
        self.fetch(&self.build_create_token(email, password, expires)?)
    }

    /// Pushes the token's expiry back by the API's fixed extension.
    pub fn update_token(&self, token_id: &str) -> Result<TokenResponse> {
        self.fetch(&self.build_update_token(token_id)?)
    }

    pub fn delete_token(&self, token_id: &str) -> Result<()> {
        self.send(&self.build_delete_token(token_id))
    }

    /// Replaces the user's SSH keys with the key stored at `key_path`.
    ///
    /// A file that cannot be read fails with `ClientError::Io` before any
    /// request is sent.
    pub fn upload_public_key(&self, user_id: &str, key_path: impl AsRef<Path>) -> Result<UserResponse> {
        let public_key = read_public_key(key_path.as_ref())?;
        self.fetch(&self.build_upload_public_key(user_id, &public_key)?)
    }
}
