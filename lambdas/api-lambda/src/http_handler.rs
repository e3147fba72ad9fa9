use homeward_atoms::{messages, prospects, users, visits};
use homeward_shared::{auth, intake, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use leads_block::{assign, dashboard, leads};
use std::env;
use std::sync::Arc;

use lambda_http::http::header::{HeaderValue, SET_COOKIE, VARY};

fn with_set_cookies(mut resp: Response<Body>, cookies: &[String]) -> Response<Body> {
    let headers = resp.headers_mut();
    for cookie in cookies {
        if let Ok(v) = HeaderValue::from_str(cookie) {
            headers.append(SET_COOKIE, v);
        }
    }
    resp
}

fn with_cors_headers(mut resp: Response<Body>, request_origin: Option<&str>) -> Response<Body> {
    let cors_origin = auth::get_cors_origin(request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin)
            .unwrap_or_else(|_| HeaderValue::from_static("https://app.homeward.estate")),
    );
    headers.insert(
        "Access-Control-Allow-Credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    request_origin: Option<&str>,
    cookies: &[String],
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(with_set_cookies(r, cookies), request_origin))
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"error": "Method not allowed"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}

fn server_error(e: String) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "error": e }).to_string().into())
        .map_err(Box::new)?)
}

fn no_directory_entry() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(
            serde_json::json!({"error": "Caller has no directory entry"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

/// Main Lambda handler - routes requests to auth, intake or CRM endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!(
        "🚀 API Lambda v1.3.0 invoked - Method: {} Path: {}",
        method,
        path
    );

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, request_origin));
    }

    // Route to auth endpoints (no cookie validation)
    if path.starts_with("/login") {
        let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
        let client_secret =
            env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");

        return match method {
            &Method::POST => finalize_response(
                auth::login(&state.cognito_client, &client_id, &client_secret, body).await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/signup") {
        let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
        let client_secret =
            env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");
        let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "homeward".to_string());

        return match method {
            &Method::POST => finalize_response(
                auth::signup(
                    &state.cognito_client,
                    &state.dynamo_client,
                    &table_name,
                    &client_id,
                    &client_secret,
                    body,
                )
                .await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/refresh") {
        let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
        let client_secret =
            env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");

        let cookie_header = event.headers().get("Cookie").and_then(|v| v.to_str().ok());

        return match method {
            &Method::POST => finalize_response(
                auth::refresh_token(
                    &state.cognito_client,
                    &client_id,
                    &client_secret,
                    body,
                    cookie_header,
                )
                .await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    if path.starts_with("/logout") {
        return match method {
            &Method::POST => {
                let resp = Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "application/json")
                    .header("Set-Cookie", auth::clear_cookie(auth::ACCESS_TOKEN_COOKIE))
                    .header(
                        "Set-Cookie",
                        auth::clear_cookie_for_domain(
                            auth::ACCESS_TOKEN_COOKIE,
                            auth::LEGACY_COOKIE_DOMAIN,
                        ),
                    )
                    .header("Set-Cookie", auth::clear_cookie(auth::REFRESH_TOKEN_COOKIE))
                    .header(
                        "Set-Cookie",
                        auth::clear_cookie_for_domain(
                            auth::REFRESH_TOKEN_COOKIE,
                            auth::LEGACY_COOKIE_DOMAIN,
                        ),
                    )
                    .header("Set-Cookie", auth::clear_cookie(auth::USERNAME_COOKIE))
                    .header(
                        "Set-Cookie",
                        auth::clear_cookie_for_domain(
                            auth::USERNAME_COOKIE,
                            auth::LEGACY_COOKIE_DOMAIN,
                        ),
                    )
                    .body(serde_json::json!({"message": "ok"}).to_string().into())
                    .map_err(Box::new)?;
                finalize_response(Ok(resp), request_origin, &[])
            }
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    // Public prospect intake (no auth required)
    if path == "/intake" {
        let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "homeward".to_string());
        return match method {
            &Method::POST => finalize_response(
                intake::handle_intake(&state.dynamo_client, &state.ses_client, &table_name, body)
                    .await,
                request_origin,
                &[],
            ),
            _ => finalize_response(method_not_allowed(), request_origin, &[]),
        };
    }

    // All other routes require auth (cookie auth + auto-refresh)
    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "homeward".to_string());
    let client_id = env::var("COGNITO_CLIENT_ID").expect("COGNITO_CLIENT_ID must be set");
    let client_secret = env::var("COGNITO_CLIENT_SECRET").expect("COGNITO_CLIENT_SECRET must be set");
    let cookie_header = event.headers().get("Cookie").and_then(|v| v.to_str().ok());

    let auth_ctx = match auth::authenticate_cookie_request(
        &state.cognito_client,
        &client_id,
        &client_secret,
        cookie_header,
    )
    .await
    {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(with_cors_headers(resp, request_origin)),
    };

    let user_id = auth_ctx.user_id.clone();

    // Users routes
    if path.starts_with("/users") {
        let resp = match (method, path) {
            (&Method::POST, "/users") => {
                users::create_user(&state.dynamo_client, &table_name, &user_id, body).await
            }
            (&Method::GET, "/users") => {
                users::list_users(&state.dynamo_client, &table_name).await
            }
            (&Method::GET, "/users/me") => {
                users::get_user(&state.dynamo_client, &table_name, &user_id).await
            }
            (&Method::PATCH, "/users/me") => {
                users::update_user(&state.dynamo_client, &table_name, &user_id, body).await
            }
            _ => not_found(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // Role-scoped routes need the directory and the caller's row
    let directory = match users::load_users(&state.dynamo_client, &table_name).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("Failed to load directory: {}", e);
            return finalize_response(server_error(e), request_origin, &auth_ctx.set_cookies);
        }
    };
    let viewer = directory.iter().find(|u| u.user_id == user_id).cloned();

    // Leads routes
    if path.starts_with("/leads") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            // GET /leads - list leads visible to the caller
            (&Method::GET, ["leads"]) => match &viewer {
                Some(viewer) => {
                    leads::list_leads(&state.dynamo_client, &table_name, viewer, &directory).await
                }
                None => no_directory_entry(),
            },
            // POST /leads - manual entry
            (&Method::POST, ["leads"]) => {
                leads::create_lead(&state.dynamo_client, &table_name, body).await
            }
            // POST /leads/import - bulk import with a per-row report
            (&Method::POST, ["leads", "import"]) => {
                leads::import_leads(&state.dynamo_client, &table_name, body).await
            }
            // POST /leads/assign - batch assignment with per-item results
            (&Method::POST, ["leads", "assign"]) => {
                assign::assign_leads(&state.dynamo_client, &table_name, &user_id, body).await
            }
            // GET /leads/{id} - get specific lead
            (&Method::GET, ["leads", lead_id]) => {
                leads::get_lead(&state.dynamo_client, &table_name, lead_id).await
            }
            // PATCH /leads/{id} - status update / direct reassignment
            (&Method::PATCH, ["leads", lead_id]) => {
                leads::update_lead(&state.dynamo_client, &table_name, lead_id, &directory, body)
                    .await
            }
            _ => not_found(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // Prospects routes
    if path.starts_with("/prospects") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            (&Method::GET, ["prospects"]) => match &viewer {
                Some(viewer) => {
                    prospects::list_prospects(&state.dynamo_client, &table_name, viewer, &directory)
                        .await
                }
                None => no_directory_entry(),
            },
            (&Method::POST, ["prospects"]) => {
                prospects::create_prospect(&state.dynamo_client, &table_name, &user_id, body).await
            }
            (&Method::GET, ["prospects", prospect_id]) => {
                prospects::get_prospect(&state.dynamo_client, &table_name, prospect_id).await
            }
            (&Method::PATCH, ["prospects", prospect_id]) => {
                prospects::update_prospect(&state.dynamo_client, &table_name, prospect_id, body)
                    .await
            }
            _ => not_found(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // Visits routes
    if path.starts_with("/visits") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            (&Method::GET, ["visits"]) => match &viewer {
                Some(viewer) => {
                    visits::list_visits(&state.dynamo_client, &table_name, viewer, &directory).await
                }
                None => no_directory_entry(),
            },
            (&Method::POST, ["visits"]) => {
                visits::create_visit(&state.dynamo_client, &table_name, &user_id, body).await
            }
            (&Method::PATCH, ["visits", visit_id]) => {
                visits::update_visit(&state.dynamo_client, &table_name, visit_id, body).await
            }
            _ => not_found(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // Messages routes
    if path.starts_with("/messages") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            (&Method::GET, ["messages"]) => {
                messages::list_messages(&state.dynamo_client, &table_name, &user_id).await
            }
            (&Method::POST, ["messages"]) => {
                messages::create_message(&state.dynamo_client, &table_name, &user_id, body).await
            }
            _ => not_found(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // Dashboard route
    if path == "/dashboard" {
        let resp = match (method, &viewer) {
            (&Method::GET, Some(viewer)) => {
                dashboard::get_dashboard(&state.dynamo_client, &table_name, viewer, &directory)
                    .await
            }
            (&Method::GET, None) => no_directory_entry(),
            _ => method_not_allowed(),
        };

        return finalize_response(resp, request_origin, &auth_ctx.set_cookies);
    }

    // No matching route
    tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
    finalize_response(not_found(), request_origin, &auth_ctx.set_cookies)
}
