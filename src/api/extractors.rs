//! # Custom Extractors
//!
//! Request metadata for click recording, plus a JSON body extractor whose
//! rejection is an [`AppError`].

use std::net::SocketAddr;

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::{error::AppError, utils::resolve_client_ip};

// =====================================
// Client metadata
// =====================================
/// Client IP resolved from proxy headers, falling back to the socket
/// address when the server was started with connect info.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());

        Ok(ClientIp(resolve_client_ip(&parts.headers, remote.as_deref())))
    }
}

#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserAgent {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ua = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        Ok(UserAgent(ua))
    }
}

#[derive(Debug, Clone)]
pub struct Referer(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Referer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let referer = parts
            .headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        Ok(Referer(referer))
    }
}

// =====================================
// JSON body
// =====================================
/// `axum::Json` whose rejection renders through [`AppError`], so malformed
/// bodies get the same error envelope as everything else.
///
/// Validation is left to the service, which also normalises the input first.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::InvalidInput(format!("Invalid JSON: {}", e)))?;

        Ok(JsonBody(data))
    }
}
