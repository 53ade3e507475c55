//! Route handlers for the social-login flow.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use sociauth_core::AuthError;
use sociauth_gateway::CallbackParams;
use sociauth_session::SessionConfig;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::{Cookie, Cookies};

use crate::{SociauthAxumError, SocialLogin};

const STATE_COOKIE_PREFIX: &str = "sociauth_state_";
const STATE_COOKIE_MAX_AGE_MINUTES: i64 = 15;

fn to_cookie_same_site(ss: sociauth_core::SameSite) -> tower_cookies::cookie::SameSite {
    match ss {
        sociauth_core::SameSite::Lax => tower_cookies::cookie::SameSite::Lax,
        sociauth_core::SameSite::Strict => tower_cookies::cookie::SameSite::Strict,
        sociauth_core::SameSite::None => tower_cookies::cookie::SameSite::None,
    }
}

fn state_cookie(state: &str) -> Cookie<'static> {
    Cookie::build((format!("{STATE_COOKIE_PREFIX}{state}"), state.to_string()))
        .path("/")
        .http_only(true)
        .same_site(tower_cookies::cookie::SameSite::Lax)
        .secure(true)
        .max_age(CookieDuration::minutes(STATE_COOKIE_MAX_AGE_MINUTES))
        .build()
}

fn session_cookie(config: &SessionConfig, value: String, persistent: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((config.cookie_name.clone(), value))
        .path(config.path.clone())
        .secure(config.secure)
        .http_only(config.http_only)
        .same_site(to_cookie_same_site(config.same_site));

    // Transient sessions get no Max-Age, so the cookie dies with the browser.
    if persistent {
        builder = builder.max_age(CookieDuration::seconds(
            config.persistent_max_age.num_seconds(),
        ));
    }
    builder.build()
}

/// `GET /auth/{provider}` — redirect to the provider's consent screen.
pub async fn login_handler(
    Path(provider): Path<String>,
    State(login): State<SocialLogin>,
    cookies: Cookies,
) -> Result<Response, SociauthAxumError> {
    let target = login.gateway.begin_auth(&provider).map_err(|e| match e {
        AuthError::UnknownProvider(_) => SociauthAxumError::NotFound,
        other => SociauthAxumError::Internal(other.to_string()),
    })?;

    cookies.add(state_cookie(&target.state));
    Ok(Redirect::to(&target.url).into_response())
}

/// `GET /auth/{provider}/callback` — complete the handshake, resolve the user,
/// issue a persistent session.
///
/// Any provider-side failure (consent denial, bad code, timeout, state
/// mismatch) sends the user back to `/auth/{provider}` for another attempt.
/// Only storage or session-store failure surfaces, as a generic 500.
pub async fn callback_handler(
    Path(provider): Path<String>,
    State(login): State<SocialLogin>,
    Query(params): Query<CallbackParams>,
    cookies: Cookies,
) -> Result<Response, SociauthAxumError> {
    let retry = Redirect::to(&format!("/auth/{provider}"));

    let Some(state) = params.state.clone() else {
        log::warn!("{provider} callback missing state parameter");
        return Ok(retry.into_response());
    };

    let state_cookie_name = format!("{STATE_COOKIE_PREFIX}{state}");
    match cookies.get(&state_cookie_name) {
        Some(_) => {
            let mut removal = Cookie::new(state_cookie_name, "");
            removal.set_path("/");
            cookies.remove(removal);
        }
        None => {
            log::warn!("{provider} callback with unknown state");
            return Ok(retry.into_response());
        }
    }

    let profile = match login.gateway.complete_auth(&provider, &params).await {
        Ok(profile) => profile,
        Err(AuthError::UnknownProvider(_)) => return Err(SociauthAxumError::NotFound),
        Err(AuthError::Provider(detail)) => {
            log::warn!("{provider} handshake failed: {detail}");
            return Ok(retry.into_response());
        }
        Err(other) => return Err(SociauthAxumError::Internal(other.to_string())),
    };

    let user = login
        .resolver
        .resolve(&profile)
        .await
        .map_err(|e| SociauthAxumError::Internal(e.to_string()))?;

    // Social logins always get the persistent variant; there is no password
    // re-entry to fall back on.
    let session = login
        .issuer
        .issue(&user, true)
        .await
        .map_err(|e| SociauthAxumError::Internal(e.to_string()))?;

    cookies.add(session_cookie(
        login.issuer.config(),
        session.id,
        session.persistent,
    ));

    Ok(Redirect::to(login.issuer.post_login_destination()).into_response())
}

/// `GET /auth/logout` — delete the session and clear the cookie.
pub async fn logout_handler(
    State(login): State<SocialLogin>,
    cookies: Cookies,
) -> Result<Response, SociauthAxumError> {
    let cookie_name = login.issuer.config().cookie_name.clone();
    if let Some(cookie) = cookies.get(&cookie_name) {
        let session_id = cookie.value().to_string();
        login
            .issuer
            .store()
            .delete_session(&session_id)
            .await
            .map_err(|e| SociauthAxumError::Internal(e.to_string()))?;

        let mut removal = Cookie::new(cookie_name, "");
        removal.set_path(login.issuer.config().path.clone());
        cookies.remove(removal);
    }

    Ok(Redirect::to("/").into_response())
}
