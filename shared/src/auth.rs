use std::collections::HashMap;

use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use sha2::Sha256;

use homeward_atoms::users::model::{CreateUserPayload, Role};
use homeward_atoms::users::service::create_user_record;

pub const ACCESS_TOKEN_COOKIE: &str = "hw_access";
pub const REFRESH_TOKEN_COOKIE: &str = "hw_refresh";
pub const USERNAME_COOKIE: &str = "hw_username";

/// Cookies were once issued on the apex domain; logout still clears both.
pub const LEGACY_COOKIE_DOMAIN: &str = ".homeward.estate";

const ACCESS_TOKEN_MAX_AGE: i64 = 3600;
const REFRESH_TOKEN_MAX_AGE: i64 = 30 * 24 * 3600;

const ALLOWED_ORIGINS: [&str; 3] = [
    "https://app.homeward.estate",
    "http://localhost:3000",
    "http://localhost:5173",
];

/// Authenticated caller, plus any cookies minted during auto-refresh that
/// must be attached to the final response.
pub struct AuthContext {
    pub user_id: String,
    pub set_cookies: Vec<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    name: String,
    role: String,
    supervisor: Option<String>,
}

#[derive(Deserialize, Default)]
struct RefreshRequest {
    refresh_token: Option<String>,
}

/// Cognito SECRET_HASH: base64(HMAC-SHA256(client_secret, username + client_id))
pub fn secret_hash(client_secret: &str, username: &str, client_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Parse a Cookie header into name -> value
pub fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    if let Some(header) = header {
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
    cookies
}

pub fn get_cors_origin(request_origin: Option<&str>) -> String {
    match request_origin {
        Some(origin) if ALLOWED_ORIGINS.contains(&origin) => origin.to_string(),
        _ => ALLOWED_ORIGINS[0].to_string(),
    }
}

fn http_only_cookie(name: &str, value: &str, max_age: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={}",
        name, value, max_age
    )
}

/// Username cookie is frontend-readable (no HttpOnly); it feeds the
/// SECRET_HASH on refresh.
fn username_cookie(value: &str) -> String {
    format!(
        "{}={}; Secure; SameSite=None; Path=/; Max-Age={}",
        USERNAME_COOKIE, value, REFRESH_TOKEN_MAX_AGE
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0",
        name
    )
}

pub fn clear_cookie_for_domain(name: &str, domain: &str) -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=None; Path=/; Domain={}; Max-Age=0",
        name, domain
    )
}

fn unauthorized(message: &str) -> Response<Body> {
    let mut resp = Response::new(Body::from(
        serde_json::json!({ "error": message }).to_string(),
    ));
    *resp.status_mut() = StatusCode::UNAUTHORIZED;
    resp.headers_mut().insert(
        "Content-Type",
        lambda_http::http::header::HeaderValue::from_static("application/json"),
    );
    resp
}

/// Resolve the Cognito `sub` for an access token
async fn user_id_for_token(client: &CognitoClient, access_token: &str) -> Result<String, String> {
    let out = client
        .get_user()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| format!("Cognito get_user error: {}", e))?;

    out.user_attributes()
        .iter()
        .find(|a| a.name() == "sub")
        .and_then(|a| a.value())
        .map(|s| s.to_string())
        .ok_or_else(|| "Token has no sub attribute".to_string())
}

/// POST /login - USER_PASSWORD_AUTH, tokens land in HttpOnly cookies
pub async fn login(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: LoginRequest = serde_json::from_slice(body)?;
    let hash = secret_hash(client_secret, &req.email, client_id);

    let result = client
        .initiate_auth()
        .auth_flow(AuthFlowType::UserPasswordAuth)
        .client_id(client_id)
        .auth_parameters("USERNAME", req.email.as_str())
        .auth_parameters("PASSWORD", req.password.as_str())
        .auth_parameters("SECRET_HASH", hash)
        .send()
        .await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Login failed for {}: {}", req.email, e);
            return Ok(Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({"error": "Invalid email or password"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    };

    let Some(tokens) = output.authentication_result() else {
        return Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header("Content-Type", "application/json")
            .body(
                serde_json::json!({"error": "Challenge responses are not supported"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    };

    let access_token = tokens.access_token().unwrap_or_default();
    let refresh_token = tokens.refresh_token().unwrap_or_default();
    let user_id = user_id_for_token(client, access_token).await?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header(
            "Set-Cookie",
            http_only_cookie(ACCESS_TOKEN_COOKIE, access_token, ACCESS_TOKEN_MAX_AGE),
        )
        .header(
            "Set-Cookie",
            http_only_cookie(REFRESH_TOKEN_COOKIE, refresh_token, REFRESH_TOKEN_MAX_AGE),
        )
        .header("Set-Cookie", username_cookie(&req.email))
        .body(
            serde_json::json!({"message": "ok", "userId": user_id})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

/// POST /signup - Cognito SignUp plus the directory row
pub async fn signup(
    cognito: &CognitoClient,
    dynamo: &DynamoClient,
    table_name: &str,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: SignupRequest = serde_json::from_slice(body)?;

    let Some(role) = Role::parse(&req.role) else {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .body(
                serde_json::json!({"error": format!("Unknown role: {}", req.role)})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    };

    let hash = secret_hash(client_secret, &req.email, client_id);
    let result = cognito
        .sign_up()
        .client_id(client_id)
        .secret_hash(hash)
        .username(req.email.as_str())
        .password(req.password.as_str())
        .user_attributes(
            AttributeType::builder()
                .name("email")
                .value(req.email.as_str())
                .build()?,
        )
        .user_attributes(
            AttributeType::builder()
                .name("name")
                .value(req.name.as_str())
                .build()?,
        )
        .send()
        .await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Signup failed for {}: {}", req.email, e);
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({"error": "Could not create account"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?);
        }
    };

    let user_id = output.user_sub().to_string();
    let payload = CreateUserPayload {
        name: req.name,
        email: req.email,
        role: role.as_str().to_string(),
        supervisor: req.supervisor,
    };
    let user = create_user_record(dynamo, table_name, &user_id, &payload, role).await?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&user)?.into())
        .map_err(Box::new)?)
}

/// POST /refresh - REFRESH_TOKEN_AUTH from the refresh cookie (body
/// fallback for native clients)
pub async fn refresh_token(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    body: &[u8],
    cookie_header: Option<&str>,
) -> Result<Response<Body>, Error> {
    let cookies = parse_cookies(cookie_header);
    let from_body: RefreshRequest = serde_json::from_slice(body).unwrap_or_default();

    let Some(refresh) = cookies
        .get(REFRESH_TOKEN_COOKIE)
        .cloned()
        .or(from_body.refresh_token)
    else {
        return Ok(unauthorized("No refresh token"));
    };
    let Some(username) = cookies.get(USERNAME_COOKIE) else {
        return Ok(unauthorized("No username cookie"));
    };

    match exchange_refresh_token(client, client_id, client_secret, username, &refresh).await {
        Ok(access_token) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header(
                "Set-Cookie",
                http_only_cookie(ACCESS_TOKEN_COOKIE, &access_token, ACCESS_TOKEN_MAX_AGE),
            )
            .body(serde_json::json!({"message": "ok"}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::warn!("Refresh failed: {}", e);
            Ok(unauthorized("Refresh token is no longer valid"))
        }
    }
}

async fn exchange_refresh_token(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    username: &str,
    refresh: &str,
) -> Result<String, String> {
    let hash = secret_hash(client_secret, username, client_id);
    let output = client
        .initiate_auth()
        .auth_flow(AuthFlowType::RefreshTokenAuth)
        .client_id(client_id)
        .auth_parameters("REFRESH_TOKEN", refresh)
        .auth_parameters("SECRET_HASH", hash)
        .send()
        .await
        .map_err(|e| format!("Cognito initiate_auth error: {}", e))?;

    output
        .authentication_result()
        .and_then(|r| r.access_token())
        .map(|t| t.to_string())
        .ok_or_else(|| "No access token in refresh result".to_string())
}

/// Validate the access-token cookie, auto-refreshing once when it has
/// expired. Err carries the 401 response to return as-is.
pub async fn authenticate_cookie_request(
    client: &CognitoClient,
    client_id: &str,
    client_secret: &str,
    cookie_header: Option<&str>,
) -> Result<AuthContext, Response<Body>> {
    let cookies = parse_cookies(cookie_header);

    if let Some(access_token) = cookies.get(ACCESS_TOKEN_COOKIE) {
        if let Ok(user_id) = user_id_for_token(client, access_token).await {
            return Ok(AuthContext {
                user_id,
                set_cookies: vec![],
            });
        }
    }

    let (Some(refresh), Some(username)) = (
        cookies.get(REFRESH_TOKEN_COOKIE),
        cookies.get(USERNAME_COOKIE),
    ) else {
        return Err(unauthorized("Not signed in"));
    };

    let access_token =
        match exchange_refresh_token(client, client_id, client_secret, username, refresh).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Cookie auto-refresh failed: {}", e);
                return Err(unauthorized("Session expired"));
            }
        };

    match user_id_for_token(client, &access_token).await {
        Ok(user_id) => Ok(AuthContext {
            user_id,
            set_cookies: vec![http_only_cookie(
                ACCESS_TOKEN_COOKIE,
                &access_token,
                ACCESS_TOKEN_MAX_AGE,
            )],
        }),
        Err(e) => {
            tracing::warn!("Refreshed token rejected: {}", e);
            Err(unauthorized("Session expired"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cookies_splits_and_trims_pairs() {
        let cookies = parse_cookies(Some("hw_access=abc; hw_username=dana%40x.com;foo=bar"));
        assert_eq!(cookies.get("hw_access").map(String::as_str), Some("abc"));
        assert_eq!(
            cookies.get("hw_username").map(String::as_str),
            Some("dana%40x.com")
        );
        assert_eq!(cookies.get("foo").map(String::as_str), Some("bar"));
        assert!(parse_cookies(None).is_empty());
    }

    #[test]
    fn secret_hash_is_deterministic_and_user_scoped() {
        let a = secret_hash("secret", "dana@x.com", "client");
        let b = secret_hash("secret", "dana@x.com", "client");
        let c = secret_hash("secret", "omar@x.com", "client");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // base64 of a 32-byte MAC
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn cors_origin_falls_back_to_the_app_origin() {
        assert_eq!(
            get_cors_origin(Some("http://localhost:3000")),
            "http://localhost:3000"
        );
        assert_eq!(
            get_cors_origin(Some("https://evil.example")),
            "https://app.homeward.estate"
        );
        assert_eq!(get_cors_origin(None), "https://app.homeward.estate");
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(ACCESS_TOKEN_COOKIE);
        assert!(cookie.starts_with("hw_access=;"));
        assert!(cookie.contains("Max-Age=0"));

        let legacy = clear_cookie_for_domain(ACCESS_TOKEN_COOKIE, LEGACY_COOKIE_DOMAIN);
        assert!(legacy.contains("Domain=.homeward.estate"));
    }
}
