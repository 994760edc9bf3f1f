//! In-memory stand-in for the Online Labs compute and account APIs.
//!
//! Serves both API families from one router so tests can point the client's
//! compute and account base URLs at the same address. Every request except
//! `POST /tokens` must carry a known token in `X-Auth-Token`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const AUTH_TOKEN: &str = "mock-token";
pub const USER_ID: &str = "7b3a0f5e-0000-4000-8000-000000000001";
pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "secret";
pub const ORGANIZATION_ID: &str = "0c3f9a12-0000-4000-8000-000000000002";
pub const IMAGE_ID: &str = "a8f6b9d2-0000-4000-8000-000000000003";

const NOW: &str = "2015-04-20T12:00:00.000000+00:00";
const EXTENDED_EXPIRY: &str = "2015-04-20T12:30:00.000000+00:00";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicIp {
    pub id: String,
    pub dynamic: bool,
    pub address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub image: String,
    pub creation_date: String,
    pub modification_date: String,
    pub arch: String,
    pub public_ip: Option<PublicIp>,
    pub state: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub volume_type: String,
    pub size: u64,
    pub creation_date: String,
    pub modification_date: String,
    pub server: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub arch: String,
    pub public: bool,
    pub creation_date: String,
    pub modification_date: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub user_id: String,
    pub creation_date: String,
    pub expires: Option<String>,
    pub inherits_user_perms: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SshKey {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub fullname: String,
    pub organizations: Vec<Organization>,
    pub ssh_public_keys: Vec<SshKey>,
}

#[derive(Deserialize)]
pub struct CreateServer {
    pub name: String,
    pub organization: String,
    pub image: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateVolume {
    pub name: String,
    pub organization: String,
    pub volume_type: String,
    pub size: u64,
}

#[derive(Deserialize)]
pub struct ServerAction {
    pub action: String,
}

#[derive(Deserialize)]
pub struct CreateToken {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub expires: bool,
}

#[derive(Deserialize)]
pub struct UpdateToken {
    pub expires: bool,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub ssh_public_keys: Vec<SshKey>,
}

/// Everything the mock remembers between requests.
#[derive(Debug)]
pub struct Store {
    pub user: User,
    pub tokens: BTreeMap<String, Token>,
    pub servers: BTreeMap<String, Server>,
    pub volumes: BTreeMap<String, Volume>,
    pub images: BTreeMap<String, Image>,
}

impl Default for Store {
    fn default() -> Self {
        let organization = Organization {
            id: ORGANIZATION_ID.to_string(),
            name: "Mock Labs".to_string(),
        };
        let user = User {
            id: USER_ID.to_string(),
            email: USER_EMAIL.to_string(),
            firstname: "Mock".to_string(),
            lastname: "User".to_string(),
            fullname: "Mock User".to_string(),
            organizations: vec![organization],
            ssh_public_keys: Vec::new(),
        };
        let token = Token {
            id: AUTH_TOKEN.to_string(),
            user_id: USER_ID.to_string(),
            creation_date: NOW.to_string(),
            expires: None,
            inherits_user_perms: true,
        };
        let image = Image {
            id: IMAGE_ID.to_string(),
            name: "Ubuntu Trusty (14.04 LTS)".to_string(),
            organization: ORGANIZATION_ID.to_string(),
            arch: "arm".to_string(),
            public: true,
            creation_date: NOW.to_string(),
            modification_date: NOW.to_string(),
        };
        Self {
            user,
            tokens: BTreeMap::from([(token.id.clone(), token)]),
            servers: BTreeMap::new(),
            volumes: BTreeMap::new(),
            images: BTreeMap::from([(image.id.clone(), image)]),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error body in the API's `{"type", "message"}` shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "invalid_auth",
            message: "Authentication error".to_string(),
        }
    }

    fn not_found(resource: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "unknown_resource",
            message: format!("Unable to find {resource}"),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request_error",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"type": self.kind, "message": self.message})),
        )
            .into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/users/{id}", get(get_user).patch(update_user))
        .route("/organizations", get(list_organizations))
        .route("/tokens", get(list_tokens).post(create_token))
        .route(
            "/tokens/{id}",
            get(get_token).patch(update_token).delete(delete_token),
        )
        .route("/servers", get(list_servers).post(create_server))
        .route("/servers/{id}", get(get_server).delete(delete_server))
        .route("/servers/{id}/action", post(server_action))
        .route("/volumes", get(list_volumes).post(create_volume))
        .route("/volumes/{id}", get(get_volume).delete(delete_volume))
        .route("/images", get(list_images))
        .route("/images/{id}", get(get_image).delete(delete_image))
        .layer(middleware::from_fn_with_state(db.clone(), require_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Creating a token is the only unauthenticated call.
async fn require_token(State(db): State<Db>, request: Request, next: Next) -> Response {
    if request.method() == Method::POST && request.uri().path() == "/tokens" {
        return next.run(request).await;
    }
    let token = request
        .headers()
        .get("x-auth-token")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let known = match token {
        Some(token) => db.read().await.tokens.contains_key(&token),
        None => false,
    };
    if !known {
        return ApiError::unauthorized().into_response();
    }
    next.run(request).await
}

// --- account ---

async fn get_user(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    if store.user.id != id {
        return Err(ApiError::not_found("user"));
    }
    Ok(Json(json!({"user": store.user})))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    if store.user.id != id {
        return Err(ApiError::not_found("user"));
    }
    store.user.ssh_public_keys = input
        .ssh_public_keys
        .into_iter()
        .map(|key| SshKey {
            fingerprint: Some(fingerprint(&key.key)),
            key: key.key,
        })
        .collect();
    Ok(Json(json!({"user": store.user})))
}

/// Stand-in for the real key fingerprint: key type plus length.
fn fingerprint(key: &str) -> String {
    let kind = key.split_whitespace().next().unwrap_or("unknown");
    format!("{} {kind}", key.len())
}

async fn list_organizations(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    Json(json!({"organizations": store.user.organizations}))
}

async fn list_tokens(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let tokens: Vec<&Token> = store.tokens.values().collect();
    Json(json!({"tokens": tokens}))
}

async fn create_token(
    State(db): State<Db>,
    Json(input): Json<CreateToken>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut store = db.write().await;
    if input.email != store.user.email || input.password != USER_PASSWORD {
        return Err(ApiError::unauthorized());
    }
    let token = Token {
        id: Uuid::new_v4().to_string(),
        user_id: store.user.id.clone(),
        creation_date: NOW.to_string(),
        expires: input.expires.then(|| EXTENDED_EXPIRY.to_string()),
        inherits_user_perms: true,
    };
    store.tokens.insert(token.id.clone(), token.clone());
    Ok((StatusCode::CREATED, Json(json!({"token": token}))))
}

async fn get_token(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let token = store.tokens.get(&id).ok_or_else(|| ApiError::not_found("token"))?;
    Ok(Json(json!({"token": token})))
}

async fn update_token(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateToken>,
) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let token = store.tokens.get_mut(&id).ok_or_else(|| ApiError::not_found("token"))?;
    if input.expires {
        token.expires = Some(EXTENDED_EXPIRY.to_string());
    }
    Ok(Json(json!({"token": token})))
}

async fn delete_token(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .tokens
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("token"))
}

// --- servers ---

async fn list_servers(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let servers: Vec<&Server> = store.servers.values().collect();
    Json(json!({"servers": servers}))
}

async fn create_server(
    State(db): State<Db>,
    Json(input): Json<CreateServer>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut store = db.write().await;
    let arch = store
        .images
        .get(&input.image)
        .map(|image| image.arch.clone())
        .ok_or_else(|| ApiError::invalid(format!("image {} does not exist", input.image)))?;
    let server = Server {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        organization: input.organization,
        image: input.image,
        creation_date: NOW.to_string(),
        modification_date: NOW.to_string(),
        arch,
        public_ip: None,
        state: "stopped".to_string(),
        tags: input.tags,
    };
    store.servers.insert(server.id.clone(), server.clone());
    Ok((StatusCode::CREATED, Json(json!({"server": server}))))
}

async fn get_server(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let server = store.servers.get(&id).ok_or_else(|| ApiError::not_found("server"))?;
    Ok(Json(json!({"server": server})))
}

async fn delete_server(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .servers
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("server"))
}

async fn server_action(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<ServerAction>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut store = db.write().await;
    let server = store.servers.get_mut(&id).ok_or_else(|| ApiError::not_found("server"))?;
    match input.action.as_str() {
        "poweron" | "reboot" => {
            server.state = "running".to_string();
            server.public_ip = Some(PublicIp {
                id: Uuid::new_v4().to_string(),
                dynamic: true,
                address: "212.47.225.1".to_string(),
            });
        }
        "poweroff" => {
            server.state = "stopped".to_string();
            server.public_ip = None;
        }
        "terminate" => {
            store.servers.remove(&id);
        }
        other => return Err(ApiError::invalid(format!("unknown action {other}"))),
    }
    let task = json!({
        "id": Uuid::new_v4().to_string(),
        "description": format!("server_{}", input.action),
        "status": "pending",
        "href_from": format!("/servers/{id}/action"),
        "started_at": NOW,
        "terminated_at": null,
    });
    Ok((StatusCode::ACCEPTED, Json(json!({"task": task}))))
}

// --- volumes ---

async fn list_volumes(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let volumes: Vec<&Volume> = store.volumes.values().collect();
    Json(json!({"volumes": volumes}))
}

async fn create_volume(
    State(db): State<Db>,
    Json(input): Json<CreateVolume>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if input.size == 0 {
        return Err(ApiError::invalid("size must be positive"));
    }
    let volume = Volume {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        organization: input.organization,
        volume_type: input.volume_type,
        size: input.size,
        creation_date: NOW.to_string(),
        modification_date: NOW.to_string(),
        server: None,
    };
    db.write().await.volumes.insert(volume.id.clone(), volume.clone());
    Ok((StatusCode::CREATED, Json(json!({"volume": volume}))))
}

async fn get_volume(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let volume = store.volumes.get(&id).ok_or_else(|| ApiError::not_found("volume"))?;
    Ok(Json(json!({"volume": volume})))
}

async fn delete_volume(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .volumes
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("volume"))
}

// --- images ---

async fn list_images(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let images: Vec<&Image> = store.images.values().collect();
    Json(json!({"images": images}))
}

async fn get_image(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let image = store.images.get(&id).ok_or_else(|| ApiError::not_found("image"))?;
    Ok(Json(json!({"image": image})))
}

async fn delete_image(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .images
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("image"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_is_seeded() {
        let store = Store::default();
        assert!(store.tokens.contains_key(AUTH_TOKEN));
        assert!(store.images.contains_key(IMAGE_ID));
        assert_eq!(store.user.organizations[0].id, ORGANIZATION_ID);
        assert!(store.servers.is_empty());
    }

    #[test]
    fn api_error_body_shape() {
        let err = ApiError::not_found("server");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.kind, "unknown_resource");
        assert_eq!(err.message, "Unable to find server");
    }

    #[test]
    fn fingerprint_names_key_type() {
        assert_eq!(fingerprint("ssh-rsa AAAA"), "12 ssh-rsa");
        assert_eq!(fingerprint(""), "0 unknown");
    }

    #[test]
    fn create_server_requires_image() {
        let result: Result<CreateServer, _> =
            serde_json::from_str(r#"{"name":"box","organization":"o"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_token_defaults_expires_to_false() {
        let input: CreateToken =
            serde_json::from_str(r#"{"email":"a@b.com","password":"pw"}"#).unwrap();
        assert!(!input.expires);
    }
}
