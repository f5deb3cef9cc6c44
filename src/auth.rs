/*
 * Copyright (C) 2020 Oakes, Gregory <gregoryoakes@fastmail.com>
 * Author: Oakes, Gregory <gregory.oakes@fastmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Account registration, login and logout.

use std::sync::Arc;

use warp::{
    http::{header::SET_COOKIE, StatusCode},
    reply::{json, with_header, with_status},
    Filter, Rejection, Reply,
};

use crate::{
    guard,
    models::{Credentials, MessageResp},
    password,
    session::{SessionId, SessionKeys, SessionStore},
    store::{NewUser, ObjectId, Store},
    Context, Error,
};

pub fn api(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let signup = warp::path("signup")
        .and(warp::post())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::json_body())
        .and(guard::with_context(ctx.clone()))
        .and_then(signup);

    let login = warp::path("login")
        .and(warp::post())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::json_body())
        .and(guard::with_context(ctx.clone()))
        .and_then(login);

    let logout = warp::path("logout")
        .and(warp::post())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::with_context(ctx))
        .and_then(logout);

    signup.or(login).or(logout)
}

/// Registers and authenticates users against the Users collection.
pub struct Accounts {
    store: Arc<dyn Store>,
    sessions: Arc<dyn SessionStore>,
}

fn validate(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid_input(format!("{} is required", field)));
    }
    if value.chars().any(char::is_control) {
        return Err(Error::invalid_input(format!(
            "{} contains invalid characters",
            field
        )));
    }
    Ok(())
}

impl Accounts {
    pub fn new(store: Arc<dyn Store>, sessions: Arc<dyn SessionStore>) -> Self {
        Accounts { store, sessions }
    }

    /// Create an account and log it in. Returns the new session.
    #[tracing::instrument(skip(self, current, password))]
    pub async fn signup(
        &self,
        current: Option<&SessionId>,
        username: &str,
        password: &str,
    ) -> Result<SessionId, Error> {
        let username = username.trim();
        validate("username", username)?;
        validate("password", password)?;

        // The store's uniqueness guard is authoritative; this only skips the hashing.
        if self.store.find_user_by_name(username).await?.is_some() {
            return Err(Error::UsernameTaken);
        }
        let (password_hash, salt) = password::hash_blocking(password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
                salt,
            })
            .await?;
        tracing::info!(user = %user.id, "account created");
        self.start_session(current, &user.id).await
    }

    /// Authenticate and start a session. An unknown username and a wrong
    /// password fail identically.
    #[tracing::instrument(skip(self, current, password))]
    pub async fn login(
        &self,
        current: Option<&SessionId>,
        username: &str,
        password: &str,
    ) -> Result<SessionId, Error> {
        let username = username.trim();
        validate("username", username)?;
        validate("password", password)?;

        match self.store.find_user_by_name(username).await? {
            Some(user) => {
                let verified =
                    password::verify_blocking(password, user.password_hash, user.salt).await?;
                if verified {
                    self.start_session(current, &user.id).await
                } else {
                    Err(Error::InvalidCredentials)
                }
            }
            None => {
                // Same cost as a real verification.
                password::hash_blocking(password).await?;
                Err(Error::InvalidCredentials)
            }
        }
    }

    pub async fn logout(&self, current: Option<&SessionId>) -> Result<(), Error> {
        let session = current.ok_or(Error::NotAuthenticated)?;
        if self.sessions.destroy(session).await? {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// Replace any presented session with a fresh one bound to `user`.
    async fn start_session(
        &self,
        current: Option<&SessionId>,
        user: &ObjectId,
    ) -> Result<SessionId, Error> {
        if let Some(previous) = current {
            self.sessions.destroy(previous).await?;
        }
        self.sessions.create(user).await
    }
}

async fn signup(
    current: Option<SessionId>,
    form: Credentials,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let session = ctx
        .accounts
        .signup(current.as_ref(), &form.username, &form.password)
        .await?;
    Ok(with_header(
        with_status(json(&MessageResp::new("Signup successful")), StatusCode::CREATED),
        SET_COOKIE,
        ctx.keys.set_cookie(&session)?,
    ))
}

async fn login(
    current: Option<SessionId>,
    form: Credentials,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let session = ctx
        .accounts
        .login(current.as_ref(), &form.username, &form.password)
        .await?;
    Ok(with_header(
        json(&MessageResp::new("Login successful")),
        SET_COOKIE,
        ctx.keys.set_cookie(&session)?,
    ))
}

async fn logout(current: Option<SessionId>, ctx: Context) -> Result<impl Reply, Rejection> {
    ctx.accounts.logout(current.as_ref()).await?;
    Ok(with_header(
        json(&MessageResp::new("Logout successful")),
        SET_COOKIE,
        SessionKeys::clear_cookie(),
    ))
}
