use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::Next;
use actix_web::{HttpMessage, web};
use anyhow::Context;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use secrecy::Secret;
use sqlx::PgPool;

use crate::authentication::{AuthError, Credentials, validate_credentials};
use crate::authorization::Client;
use crate::utils::{build_error_response, e500};

#[derive(Debug)]
pub enum AuthorizationHeader {
    Missing,
    Basic(Credentials),
}

impl AuthorizationHeader {
    pub fn parse(value: Option<&str>) -> Result<Self, anyhow::Error> {
        let Some(value) = value else {
            return Ok(Self::Missing);
        };

        let (scheme, encoded) = value
            .split_once(' ')
            .context("The authorization header is malformed.")?;
        if scheme != "Basic" {
            anyhow::bail!("The authorization scheme was not 'Basic'.");
        }

        let decoded = BASE64_STANDARD
            .decode(encoded.trim())
            .context("Failed to base64-decode 'Basic' credentials.")?;
        let decoded = String::from_utf8(decoded)
            .context("The decoded credential string is not valid UTF8.")?;

        let (user_name, password) = decoded
            .split_once(':')
            .context("A user name and password must be separated by ':'.")?;

        Ok(Self::Basic(Credentials {
            user_name: user_name.to_string(),
            password: Secret::new(password.to_string()),
        }))
    }
}

fn reject_credentials(e: anyhow::Error) -> actix_web::Error {
    let response = build_error_response(StatusCode::UNAUTHORIZED, e.to_string());
    InternalError::from_response(e, response).into()
}

/// Attaches the acting [`Client`] to every request; requests without credentials act anonymously.
pub async fn resolve_client(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str())
        .transpose()
        .context("The authorization header is not a valid UTF8 string.")
        .map_err(reject_credentials)?;

    let client = match AuthorizationHeader::parse(header_value).map_err(reject_credentials)? {
        AuthorizationHeader::Missing => Client::anonymous(),
        AuthorizationHeader::Basic(credentials) => {
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| e500("Database pool is not registered"))?;

            validate_credentials(credentials, &pool)
                .await
                .map_err(|e| match e {
                    AuthError::InvalidCredentials(_) => reject_credentials(e.into()),
                    AuthError::UnexpectedError(_) => e500(e),
                })?
        }
    };

    req.extensions_mut().insert(client);
    next.call(req).await
}
