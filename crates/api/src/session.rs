//! Signed session cookie carrying the reservation draft and a one-shot flash.
//!
//! The cookie value is an HS256-signed JWT whose claims hold the draft and the
//! flash message. A missing, tampered or expired cookie yields an empty
//! session; the next response then clears it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use bookings_core::workflow::ReservationDraft;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "bookings_session";

/// Severity of a flash message; doubles as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Info,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Info => "info",
            FlashKind::Error => "error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// JWT claims embedded in the session cookie.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub draft: Option<ReservationDraft>,
    pub flash: Option<Flash>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Sign a session token holding `draft` and `flash`.
pub fn issue_token(
    draft: Option<ReservationDraft>,
    flash: Option<Flash>,
    config: &SessionConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        draft,
        flash,
        exp: now + config.lifetime_secs(),
        iat: now,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a session token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &SessionConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// Find the session cookie value among the request's `Cookie` headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// Per-request session state.
///
/// Handlers mutate it and finish with [`Session::respond`] or
/// [`Session::redirect`], which emit `Set-Cookie` only when something
/// changed.
#[derive(Debug, Default)]
pub struct Session {
    draft: Option<ReservationDraft>,
    flash: Option<Flash>,
    dirty: bool,
}

impl Session {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            draft: claims.draft,
            flash: claims.flash,
            dirty: false,
        }
    }

    pub fn draft(&self) -> Option<&ReservationDraft> {
        self.draft.as_ref()
    }

    pub fn take_draft(&mut self) -> Option<ReservationDraft> {
        let draft = self.draft.take();
        self.dirty |= draft.is_some();
        draft
    }

    pub fn set_draft(&mut self, draft: ReservationDraft) {
        self.draft = Some(draft);
        self.dirty = true;
    }

    /// Remove the pending flash message so it is shown exactly once.
    pub fn take_flash(&mut self) -> Option<Flash> {
        let flash = self.flash.take();
        self.dirty |= flash.is_some();
        flash
    }

    pub fn flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.flash = Some(Flash {
            kind,
            message: message.into(),
        });
        self.dirty = true;
    }

    /// The `Set-Cookie` value for this session, if it changed.
    ///
    /// An emptied session clears the cookie instead of signing an empty token.
    pub fn set_cookie(&self, config: &SessionConfig) -> Result<Option<HeaderValue>, AppError> {
        if !self.dirty {
            return Ok(None);
        }

        let secure = if config.secure_cookie { "; Secure" } else { "" };
        let cookie = if self.draft.is_none() && self.flash.is_none() {
            format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}")
        } else {
            let token = issue_token(self.draft.clone(), self.flash.clone(), config)
                .map_err(|e| AppError::InternalError(format!("Failed to sign session: {e}")))?;
            format!(
                "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
                config.lifetime_secs()
            )
        };

        HeaderValue::from_str(&cookie)
            .map(Some)
            .map_err(|e| AppError::InternalError(format!("Invalid session cookie: {e}")))
    }

    /// Attach the session cookie (if changed) to `body`.
    pub fn respond(self, config: &SessionConfig, body: impl IntoResponse) -> Response {
        match self.set_cookie(config) {
            Ok(Some(cookie)) => (AppendHeaders([(SET_COOKIE, cookie)]), body).into_response(),
            Ok(None) => body.into_response(),
            Err(err) => err.into_response(),
        }
    }

    /// `303 See Other` to `to`, carrying the session cookie.
    pub fn redirect(self, config: &SessionConfig, to: &str) -> Response {
        self.respond(config, Redirect::to(to))
    }

    /// Set an error flash and redirect to `to`.
    pub fn fail(mut self, config: &SessionConfig, message: impl Into<String>, to: &str) -> Response {
        self.flash(FlashKind::Error, message);
        self.redirect(config, to)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_cookie(&parts.headers) else {
            return Ok(Session::default());
        };

        match validate_token(token, &state.config.session) {
            Ok(claims) => Ok(Session::from_claims(claims)),
            Err(err) => {
                tracing::debug!(error = %err, "Discarding invalid session cookie");
                Ok(Session {
                    dirty: true,
                    ..Session::default()
                })
            }
        }
    }
}
