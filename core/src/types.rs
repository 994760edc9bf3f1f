//! Resource records, response envelopes and request payloads.
//!
//! # Design
//! Resource records mirror the JSON the API returns. Every field is optional:
//! absent or `null` fields decode to `None`, `None` fields are omitted when
//! serializing, and unknown fields are ignored. The remote service owns
//! consistency, so no cross-record checks happen here.
//!
//! Envelopes require their single key. A body without it is a shape mismatch
//! and fails to decode rather than producing an empty record.
//!
//! Payloads are one struct per write operation. Field order is declaration
//! order, which fixes the exact bytes sent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag attached to every server created through this client.
pub const DOCKER_MACHINE_TAG: &str = "docker-machine";

// ---------------------------------------------------------------------------
// Compute resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A cloud server. `state` is free-form (`running`, `stopped`, `starting`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<PublicIp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Short server reference embedded in a volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// Bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<Volume>,
}

/// Asynchronous job started by a server action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Account resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    /// Expiry timestamp; `None` for tokens that never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_user_perms: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshPublicKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizations: Option<Vec<Organization>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_public_keys: Option<Vec<SshPublicKey>>,
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    pub server: Server,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServersResponse {
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub volume: Volume,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumesResponse {
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image: Image,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: Token,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensResponse {
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationsResponse {
    pub organizations: Vec<Organization>,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub organization: String,
    pub image: String,
    pub tags: Vec<String>,
}

impl CreateServerRequest {
    /// Servers are always tagged `docker-machine`.
    pub fn new(name: &str, organization: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            organization: organization.to_string(),
            image: image.to_string(),
            tags: vec![DOCKER_MACHINE_TAG.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVolumeRequest {
    pub name: String,
    pub organization: String,
    pub volume_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerActionRequest {
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub email: String,
    pub password: String,
    pub expires: bool,
}

/// Extends a token's expiry when sent with `expires: true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTokenRequest {
    pub expires: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyPayload {
    pub key: String,
}

/// Replaces the user's SSH keys with the listed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserKeysRequest {
    pub ssh_public_keys: Vec<PublicKeyPayload>,
}

/// Action for `POST /servers/{id}/action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAction {
    PowerOn,
    PowerOff,
    Reboot,
    Terminate,
    /// Any action name the API accepts that has no variant here.
    Other(String),
}

impl ServerAction {
    pub fn as_str(&self) -> &str {
        match self {
            ServerAction::PowerOn => "poweron",
            ServerAction::PowerOff => "poweroff",
            ServerAction::Reboot => "reboot",
            ServerAction::Terminate => "terminate",
            ServerAction::Other(action) => action,
        }
    }
}

impl From<&str> for ServerAction {
    fn from(action: &str) -> Self {
        match action {
            "poweron" => ServerAction::PowerOn,
            "poweroff" => ServerAction::PowerOff,
            "reboot" => ServerAction::Reboot,
            "terminate" => ServerAction::Terminate,
            other => ServerAction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ServerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_omits_absent_fields() {
        let server = Server {
            id: Some("abc".to_string()),
            tags: Some(vec!["web".to_string()]),
            ..Server::default()
        };
        let json = serde_json::to_string(&server).unwrap();
        assert_eq!(json, r#"{"id":"abc","tags":["web"]}"#);
    }

    #[test]
    fn server_tolerates_unknown_and_null_fields() {
        let server: Server = serde_json::from_str(
            r#"{"id":"abc","public_ip":null,"hostname":"box","bootscript":{"id":"x"}}"#,
        )
        .unwrap();
        assert_eq!(server.id.as_deref(), Some("abc"));
        assert!(server.public_ip.is_none());
    }

    #[test]
    fn server_response_requires_envelope_key() {
        let result: Result<ServerResponse, _> = serde_json::from_str(r#"{"id":"abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_server_request_is_tagged() {
        let json = serde_json::to_string(&CreateServerRequest::new("box", "org", "img")).unwrap();
        assert_eq!(
            json,
            r#"{"name":"box","organization":"org","image":"img","tags":["docker-machine"]}"#
        );
    }

    #[test]
    fn create_server_request_escapes_quotes() {
        let json = serde_json::to_string(&CreateServerRequest::new(r#"my "box""#, "o", "i")).unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["name"], r#"my "box""#);
    }

    #[test]
    fn server_action_parses_known_names() {
        assert_eq!(ServerAction::from("reboot"), ServerAction::Reboot);
        assert_eq!(
            ServerAction::from("backup"),
            ServerAction::Other("backup".to_string())
        );
        assert_eq!(ServerAction::PowerOff.to_string(), "poweroff");
    }
}
