use super::cookie::CookieConfig;
use super::error::*;
use crate::application_port::{
    AuthContext, AuthError, AuthService, AuthSession, CatalogService, LoginInput, ProductFilter,
    ProductInput, PublicUser, RegisterInput,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use warp::http::header::SET_COOKIE;
use warp::{self, Reply, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body shape of every auth endpoint that establishes a session: the access
/// token for the page, the user for display. The refresh token is NOT here;
/// it rides the Set-Cookie header only.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

fn session_reply(session: &AuthSession, cookie: &CookieConfig) -> warp::reply::Response {
    let body = warp::reply::json(&ApiResponse::ok(AuthResponse {
        token: session.tokens.access_token.0.clone(),
        user: session.user.clone(),
    }));
    warp::reply::with_header(body, SET_COOKIE, cookie.set(&session.tokens.refresh_token.0))
        .into_response()
}

pub async fn register(
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
    cookie: CookieConfig,
) -> Result<warp::reply::Response, warp::Rejection> {
    let session = auth_service
        .register(RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(session_reply(&session, &cookie))
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookie: CookieConfig,
) -> Result<warp::reply::Response, warp::Rejection> {
    let session = auth_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(session_reply(&session, &cookie))
}

/// Exchange the cookie-held refresh token for a new pair. Any failure answers
/// 401 and clears the cookie in the same response, so the handler builds its
/// replies inline instead of rejecting.
pub async fn refresh(
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookie: CookieConfig,
) -> Result<warp::reply::Response, warp::Rejection> {
    let result = match refresh_cookie {
        Some(raw) => auth_service.refresh(&raw).await,
        None => Err(AuthError::TokenInvalid),
    };

    match result {
        Ok(session) => Ok(session_reply(&session, &cookie)),
        Err(err) => {
            let code = ApiErrorCode::from(err);
            let body = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
            let status = warp::reply::with_status(body, code.status());
            Ok(warp::reply::with_header(status, SET_COOKIE, cookie.clear()).into_response())
        }
    }
}

/// Always succeeds and clears the cookie; a stale or garbage token is not an
/// error on the way out.
pub async fn logout(
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookie: CookieConfig,
) -> Result<warp::reply::Response, warp::Rejection> {
    if let Some(raw) = refresh_cookie {
        if let Err(e) = auth_service.logout(&raw).await {
            warn!("logout cleanup failed: {}", e);
        }
    }
    let body = warp::reply::json(&ApiResponse::ok(LogoutResponse));
    Ok(warp::reply::with_header(body, SET_COOKIE, cookie.clear()).into_response())
}

pub async fn me(
    ctx: AuthContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = auth_service
        .current_user(ctx.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

pub async fn list_products(
    filter: ProductFilter,
    catalog_service: Arc<dyn CatalogService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let products = catalog_service
        .list(filter)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(products)))
}

pub async fn get_product(
    code: String,
    catalog_service: Arc<dyn CatalogService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let product = catalog_service
        .get(&code)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(product)))
}

pub async fn create_product(
    body: ProductInput,
    ctx: AuthContext,
    catalog_service: Arc<dyn CatalogService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let product = catalog_service
        .create(&ctx, body)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(product)))
}

pub async fn update_product(
    code: String,
    body: ProductInput,
    ctx: AuthContext,
    catalog_service: Arc<dyn CatalogService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let product = catalog_service
        .update(&ctx, &code, body)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(product)))
}

pub async fn delete_product(
    code: String,
    ctx: AuthContext,
    catalog_service: Arc<dyn CatalogService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    catalog_service
        .delete(&ctx, &code)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(code)))
}
