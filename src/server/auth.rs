//! Authentication middleware
//!
//! Validates the Bearer credential on every request except health checks
//! and resolves it to a user identity through a pluggable provider. The
//! resolved identity is inserted into request extensions for handlers.

use crate::error::ApiError;
use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, Method},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use tower::Layer;

/// Resolved caller identity, available to handlers via `Extension`
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// The external auth contract: given a credential, return a user identity
/// or reject.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, credential: &str) -> Option<String>;
}

/// Credential table from secrets.toml (token -> user identity)
pub struct StaticCredentials {
    credentials: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(credentials: HashMap<String, String>) -> Self {
        Self { credentials }
    }

    /// Single-user table for a generated bootstrap token
    pub fn single_user(token: &str, user: &str) -> Self {
        let mut credentials = HashMap::new();
        credentials.insert(token.to_string(), user.to_string());
        Self { credentials }
    }
}

impl AuthProvider for StaticCredentials {
    fn authenticate(&self, credential: &str) -> Option<String> {
        self.credentials.get(credential).cloned()
    }
}

/// Authentication layer that validates Bearer credentials
#[derive(Clone)]
pub struct AuthLayer {
    provider: Arc<dyn AuthProvider>,
}

impl AuthLayer {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            provider: self.provider.clone(),
        }
    }
}

/// The actual middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    provider: Arc<dyn AuthProvider>,
}

impl<S> tower::Service<Request> for AuthMiddleware<S>
where
    S: tower::Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let provider = self.provider.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path = req.uri().path();

            // CORS preflight and health checks stay public
            if req.method() == Method::OPTIONS || path == "/health" {
                return inner.call(req).await;
            }

            let bearer = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            let user = bearer.and_then(|credential| provider.authenticate(credential));

            match user {
                Some(identity) => {
                    req.extensions_mut().insert(AuthUser(identity));
                    inner.call(req).await
                }
                None => Ok(ApiError::Unauthorized.into_response()),
            }
        })
    }
}

/// Generate a secure random bootstrap token
pub fn generate_auth_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut result = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        result.push(HEX_CHARS[(byte >> 4) as usize] as char);
        result.push(HEX_CHARS[(byte & 0xf) as usize] as char);
    }
    result
}
