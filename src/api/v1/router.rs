use super::cookie::{CookieConfig, REFRESH_COOKIE};
use super::error::*;
use super::handler;
use crate::application_port::{AuthContext, AuthService, ProductFilter};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.cookie.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.cookie.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.cookie.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.cookie.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::me);

    let auth = warp::path("auth").and(register.or(login).or(refresh).or(logout).or(me));

    let list_products = warp::get()
        .and(warp::path::end())
        .and(warp::query::<ProductFilter>())
        .and(with(server.catalog_service.clone()))
        .and_then(handler::list_products);

    let get_product = warp::get()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with(server.catalog_service.clone()))
        .and_then(handler::get_product);

    let create_product = warp::post()
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.catalog_service.clone()))
        .and_then(handler::create_product);

    let update_product = warp::put()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.catalog_service.clone()))
        .and_then(handler::update_product);

    let delete_product = warp::delete()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.catalog_service.clone()))
        .and_then(handler::delete_product);

    let products = warp::path("products").and(
        list_products
            .or(get_product)
            .or(create_product)
            .or(update_product)
            .or(delete_product),
    );

    auth.or(products)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_cookie(
    cookie: CookieConfig,
) -> impl Filter<Extract = (CookieConfig,), Error = Infallible> + Clone {
    warp::any().map(move || cookie.clone())
}

/// Extracts and verifies the bearer token. A missing or malformed header is
/// the same 401 as a bad token, so the client interceptor sees one shape.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (AuthContext,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let token = header
                    .as_deref()
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .ok_or_else(|| reject::custom(ApiErrorCode::InvalidToken))?;
                auth_service
                    .verify_token(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{FakeAuthService, RealCatalogService};
    use crate::application_port::ProductInput;
    use crate::infra_memory::MemoryProductStore;
    use serde_json::{Value, json};

    fn test_server() -> Arc<Server> {
        Arc::new(Server {
            auth_service: Arc::new(FakeAuthService::new()),
            catalog_service: Arc::new(RealCatalogService::new(Arc::new(
                MemoryProductStore::new(),
            ))),
            cookie: CookieConfig {
                secure: false,
                max_age_secs: 2_592_000,
            },
        })
    }

    fn test_routes(
        server: Arc<Server>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
        routes(server).recover(recover_error)
    }

    #[tokio::test]
    async fn login_sets_scoped_refresh_cookie() {
        let routes = test_routes(test_server());
        let resp = warp::test::request()
            .method("POST")
            .path("/auth/login")
            .json(&json!({"email": "ada@example.com", "password": "hunter22"}))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), 200);
        let cookie = resp
            .headers()
            .get("set-cookie")
            .expect("refresh cookie set")
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("refresh_token="));
        assert!(cookie.contains("Path=/api/v1/auth/refresh"));
        assert!(cookie.contains("HttpOnly"));

        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["success"], true);
        assert!(body["data"]["token"].as_str().unwrap().starts_with("fake-access-token:"));
        // the refresh token must not appear in the body
        assert!(body["data"].get("refresh_token").is_none());
    }

    #[tokio::test]
    async fn me_requires_a_bearer_token() {
        let routes = test_routes(test_server());

        let resp = warp::test::request()
            .method("GET")
            .path("/auth/me")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 401);

        let resp = warp::test::request()
            .method("GET")
            .path("/auth/me")
            .header("authorization", "Bearer garbage")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 401);

        let resp = warp::test::request()
            .method("GET")
            .path("/auth/me")
            .header("authorization", "Bearer fake-access-token:ada@example.com")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_401_and_clears_cookie() {
        let routes = test_routes(test_server());
        let resp = warp::test::request()
            .method("POST")
            .path("/auth/refresh")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), 401);
        let cookie = resp
            .headers()
            .get("set-cookie")
            .expect("clearing cookie set")
            .to_str()
            .unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn refresh_with_cookie_rotates() {
        let routes = test_routes(test_server());
        let resp = warp::test::request()
            .method("POST")
            .path("/auth/refresh")
            .header("cookie", "refresh_token=fake-refresh-token:ada@example.com")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), 200);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["success"], true);
        assert!(resp.headers().get("set-cookie").is_some());
    }

    #[tokio::test]
    async fn logout_always_succeeds() {
        let routes = test_routes(test_server());
        for _ in 0..2 {
            let resp = warp::test::request()
                .method("POST")
                .path("/auth/logout")
                .reply(&routes)
                .await;
            assert_eq!(resp.status(), 200);
            let cookie = resp.headers().get("set-cookie").unwrap().to_str().unwrap();
            assert!(cookie.contains("Max-Age=0"));
        }
    }

    #[tokio::test]
    async fn product_mutations_enforce_the_role_claim() {
        let routes = test_routes(test_server());
        let input = ProductInput {
            code: "tee-01".to_string(),
            name: "Basic Tee".to_string(),
            category: "shirts".to_string(),
            price_cents: 4999,
            description: String::new(),
        };

        // no token
        let resp = warp::test::request()
            .method("POST")
            .path("/products")
            .json(&input)
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 401);

        // authenticated but not admin
        let resp = warp::test::request()
            .method("POST")
            .path("/products")
            .header("authorization", "Bearer fake-access-token:ada@example.com")
            .json(&input)
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 403);

        // admin
        let resp = warp::test::request()
            .method("POST")
            .path("/products")
            .header("authorization", "Bearer fake-access-token:admin@example.com")
            .json(&input)
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);

        // listing is public
        let resp = warp::test::request()
            .method("GET")
            .path("/products")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }
}
