//! Verify build/parse halves against JSON test vectors stored in `test-vectors/`.
//!
//! Each case names an operation and its arguments, the exact request it must
//! build, a simulated response, and either the decoded envelope or the error
//! kind it must produce. Request bodies are compared byte for byte; decoded
//! results are compared as JSON values so field ordering does not matter.

use onlinelabs_core::{
    check_status, decode, ClientConfig, ClientError, HttpRequest, HttpResponse, ImageResponse,
    ImagesResponse, OnlineLabsClient, OrganizationsResponse, ServerAction, ServerResponse,
    ServersResponse, TaskResponse, TokenResponse, TokensResponse, UserResponse, VolumeResponse,
    VolumesResponse,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

const COMPUTE_URL: &str = "http://compute.test";
const ACCOUNT_URL: &str = "http://account.test";
const TOKEN: &str = "vector-token";

type Parser = fn(&HttpResponse) -> Result<Value, ClientError>;

fn client() -> OnlineLabsClient {
    let config = ClientConfig::new("u1", TOKEN, "org123")
        .with_compute_url(COMPUTE_URL)
        .with_account_url(ACCOUNT_URL);
    OnlineLabsClient::from_config(config)
}

fn parse_as<T: DeserializeOwned + Serialize>(response: &HttpResponse) -> Result<Value, ClientError> {
    check_status(response)?;
    let decoded: T = decode(&response.body)?;
    Ok(serde_json::to_value(decoded).unwrap())
}

fn parse_empty(response: &HttpResponse) -> Result<Value, ClientError> {
    check_status(response)?;
    Ok(Value::Null)
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args[key].as_str().unwrap()
}

fn build(c: &OnlineLabsClient, operation: &str, args: &Value) -> (HttpRequest, Parser) {
    let arg = |key| str_arg(args, key);
    match operation {
        "get_servers" => (c.build_get_servers(), parse_as::<ServersResponse>),
        "get_server" => (c.build_get_server(arg("id")), parse_as::<ServerResponse>),
        "create_server" => (
            c.build_create_server(arg("name"), arg("organization"), arg("image")).unwrap(),
            parse_as::<ServerResponse>,
        ),
        "delete_server" => (c.build_delete_server(arg("id")), parse_empty),
        "perform_server_action" => (
            c.build_perform_server_action(arg("id"), &ServerAction::from(arg("action")))
                .unwrap(),
            parse_as::<TaskResponse>,
        ),
        "get_volumes" => (c.build_get_volumes(), parse_as::<VolumesResponse>),
        "get_volume" => (c.build_get_volume(arg("id")), parse_as::<VolumeResponse>),
        "create_volume" => (
            c.build_create_volume(
                arg("name"),
                arg("organization"),
                arg("volume_type"),
                args["size"].as_u64().unwrap(),
            )
            .unwrap(),
            parse_as::<VolumeResponse>,
        ),
        "delete_volume" => (c.build_delete_volume(arg("id")), parse_empty),
        "get_images" => (c.build_get_images(), parse_as::<ImagesResponse>),
        "get_image" => (c.build_get_image(arg("id")), parse_as::<ImageResponse>),
        "delete_image" => (c.build_delete_image(arg("id")), parse_empty),
        "get_user_informations" => (
            c.build_get_user_informations(arg("id")),
            parse_as::<UserResponse>,
        ),
        "get_user_organizations" => (
            c.build_get_user_organizations(),
            parse_as::<OrganizationsResponse>,
        ),
        "get_user_tokens" => (c.build_get_user_tokens(), parse_as::<TokensResponse>),
        "get_user_token" => (c.build_get_user_token(arg("id")), parse_as::<TokenResponse>),
        "create_token" => (
            c.build_create_token(arg("email"), arg("password"), args["expires"].as_bool().unwrap())
                .unwrap(),
            parse_as::<TokenResponse>,
        ),
        "update_token" => (c.build_update_token(arg("id")).unwrap(), parse_as::<TokenResponse>),
        "delete_token" => (c.build_delete_token(arg("id")), parse_empty),
        "upload_public_key" => (
            c.build_upload_public_key(arg("id"), arg("key")).unwrap(),
            parse_as::<UserResponse>,
        ),
        other => panic!("unknown operation: {other}"),
    }
}

fn run_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (req, parse) = build(&c, case["operation"].as_str().unwrap(), &case["args"]);

        // Verify build
        let expected_req = &case["expected_request"];
        assert_eq!(req.method.as_str(), expected_req["method"].as_str().unwrap(), "{name}: method");
        let base = match expected_req["base"].as_str().unwrap() {
            "compute" => COMPUTE_URL,
            "account" => ACCOUNT_URL,
            other => panic!("{name}: unknown base {other}"),
        };
        assert_eq!(req.url, format!("{base}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.header("X-Auth-Token"), Some(TOKEN), "{name}: token header");
        assert_eq!(req.header("Content-Type"), Some("application/json"), "{name}: content type");
        assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse::new(
            sim["status"].as_u64().unwrap() as u16,
            sim["body"].as_str().unwrap(),
        );
        let result = parse(&response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Api" => match err {
                    ClientError::Api { status, body } => {
                        assert_eq!(status, response.status, "{name}: status");
                        assert_eq!(body, response.body_text(), "{name}: raw body");
                    }
                    other => panic!("{name}: expected Api error, got {other:?}"),
                },
                "Decode" => assert!(matches!(err, ClientError::Decode { .. }), "{name}: expected Decode"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}

#[test]
fn server_vectors() {
    run_vectors(include_str!("../../test-vectors/servers.json"));
}

#[test]
fn volume_and_image_vectors() {
    run_vectors(include_str!("../../test-vectors/volumes_images.json"));
}

#[test]
fn account_vectors() {
    run_vectors(include_str!("../../test-vectors/account.json"));
}
