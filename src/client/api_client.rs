use crate::application_port::{ProductFilter, ProductInput, PublicUser};
use crate::client::SingleFlight;
use crate::domain_model::Product;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const AUTH_PATH: &str = "/api/v1/auth";
const PRODUCTS_PATH: &str = "/api/v1/products";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("http transport error: {0}")]
    Transport(Arc<reqwest::Error>),
    /// Terminal auth failure: refresh was impossible or the replayed request
    /// still answered 401. The local session has been cleared; re-login.
    #[error("authentication required")]
    Unauthorized,
    #[error("server answered {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(Arc::new(err))
    }
}

/// Locally held session state: the bearer token plus the signed-in user.
/// The refresh token never appears here; it lives in the http-only cookie
/// jar owned by reqwest.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    token: String,
    user: PublicUser,
}

/// Storefront API client. Every authenticated request goes through a
/// refresh-on-401 interceptor: the first 401 triggers (or joins) a single
/// refresh call, then the request is replayed exactly once with the new
/// token. A 401 on the replay, or from the refresh endpoint itself, is
/// terminal.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<Option<Session>>,
    refresh: SingleFlight<String, ClientError>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: base_url.into(),
                session: RwLock::new(None),
                refresh: SingleFlight::new(),
            }),
        })
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, ClientError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let resp = self
            .execute(
                &Method::POST,
                &format!("{AUTH_PATH}/register"),
                Some(&body),
                None,
            )
            .await?;
        self.adopt_session(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let body = json!({ "email": email, "password": password });
        let resp = self
            .execute(
                &Method::POST,
                &format!("{AUTH_PATH}/login"),
                Some(&body),
                None,
            )
            .await?;
        self.adopt_session(resp).await
    }

    /// Invalidates the server-side session via the cookie and drops local
    /// state. Succeeds even when the session was already gone.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let url = format!("{}{}/logout", self.inner.base_url, AUTH_PATH);
        self.inner.http.post(&url).send().await?;
        *self.inner.session.write().await = None;
        Ok(())
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let resp = self
            .send_with_refresh(Method::GET, &format!("{AUTH_PATH}/me"), None)
            .await?;
        decode_data(resp).await
    }

    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ClientError> {
        let url = format!("{}{}", self.inner.base_url, PRODUCTS_PATH);
        let resp = self.inner.http.get(&url).query(filter).send().await?;
        decode_data(resp).await
    }

    pub async fn product(&self, code: &str) -> Result<Product, ClientError> {
        let url = format!("{}{}/{}", self.inner.base_url, PRODUCTS_PATH, code);
        let resp = self.inner.http.get(&url).send().await?;
        decode_data(resp).await
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ClientError> {
        let body = serde_json::to_value(input)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self
            .send_with_refresh(Method::POST, PRODUCTS_PATH, Some(body))
            .await?;
        decode_data(resp).await
    }

    pub async fn update_product(
        &self,
        code: &str,
        input: &ProductInput,
    ) -> Result<Product, ClientError> {
        let body = serde_json::to_value(input)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self
            .send_with_refresh(Method::PUT, &format!("{PRODUCTS_PATH}/{code}"), Some(body))
            .await?;
        decode_data(resp).await
    }

    pub async fn delete_product(&self, code: &str) -> Result<(), ClientError> {
        let resp = self
            .send_with_refresh(Method::DELETE, &format!("{PRODUCTS_PATH}/{code}"), None)
            .await?;
        decode_data::<String>(resp).await.map(|_| ())
    }

    /// The interceptor. One refresh, one replay, then give up.
    async fn send_with_refresh(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let token = self.access_token().await;
        let resp = self
            .execute(&method, path, body.as_ref(), token.as_deref())
            .await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!(path, "access token rejected, refreshing");
        let token = self.refresh_session().await?;
        self.execute(&method, path, body.as_ref(), Some(&token))
            .await
    }

    async fn execute(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut req = self.inner.http.request(method.clone(), &url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }

    /// Obtain a fresh access token, coordinating concurrent callers: only one
    /// refresh call reaches the wire, everyone else awaits its outcome. Any
    /// failure clears the local session.
    async fn refresh_session(&self) -> Result<String, ClientError> {
        let inner = self.inner.clone();
        let result = self
            .inner
            .refresh
            .run_or_join(async move {
                let url = format!("{}{}/refresh", inner.base_url, AUTH_PATH);
                // relies on the http-only cookie in the jar; no body, no bearer
                let resp = inner.http.post(&url).send().await?;
                if resp.status() == StatusCode::UNAUTHORIZED {
                    return Err(ClientError::Unauthorized);
                }
                let auth: AuthBody = decode_data(resp).await?;
                *inner.session.write().await = Some(Session {
                    token: auth.token.clone(),
                    user: auth.user,
                });
                Ok(auth.token)
            })
            .await;

        if result.is_err() {
            *self.inner.session.write().await = None;
        }
        result
    }

    async fn adopt_session(&self, resp: reqwest::Response) -> Result<PublicUser, ClientError> {
        let auth: AuthBody = decode_data(resp).await?;
        let user = auth.user.clone();
        *self.inner.session.write().await = Some(Session {
            token: auth.token,
            user: auth.user,
        });
        Ok(user)
    }

    async fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.token.clone())
    }
}

async fn decode_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let envelope: Envelope<T> = resp.json().await?;
    if envelope.success {
        return envelope
            .data
            .ok_or_else(|| ClientError::Decode("missing data field".to_string()));
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        message: envelope.error.map(|e| e.message).unwrap_or_default(),
    })
}
