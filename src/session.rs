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

//! Server-side sessions and the signed cookie that carries their id.

use std::{collections::HashMap, iter};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{
    decode as jwt_decode, encode as jwt_encode, DecodingKey, EncodingKey, Header as JWTHeader,
    Validation,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{store::ObjectId, Error};

pub const SESSION_COOKIE: &str = "session";
/// Fourteen days.
pub const SESSION_MAX_AGE_SECONDS: u64 = 1_209_600;
const SESSION_ID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(random_string(SESSION_ID_LEN))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

pub fn random_string(len: usize) -> String {
    let mut rng = thread_rng();
    iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .take(len)
        .collect::<String>()
}

/// Binds session ids to the user they authenticate.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user: &ObjectId) -> Result<SessionId, Error>;
    async fn user(&self, session: &SessionId) -> Result<Option<ObjectId>, Error>;
    /// Returns whether a session was removed.
    async fn destroy(&self, session: &SessionId) -> Result<bool, Error>;
}

#[derive(Default)]
pub struct MemorySessions {
    sessions: RwLock<HashMap<SessionId, ObjectId>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Default::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn create(&self, user: &ObjectId) -> Result<SessionId, Error> {
        let id = SessionId::generate();
        self.sessions.write().await.insert(id.clone(), user.clone());
        Ok(id)
    }

    async fn user(&self, session: &SessionId) -> Result<Option<ObjectId>, Error> {
        Ok(self.sessions.read().await.get(session).cloned())
    }

    async fn destroy(&self, session: &SessionId) -> Result<bool, Error> {
        Ok(self.sessions.write().await.remove(session).is_some())
    }
}

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    sid: String,
    iat: u64,
    exp: u64,
}

/// Signs and verifies the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    encoder: EncodingKey,
    decoder: DecodingKey<'static>,
}

impl SessionKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        SessionKeys {
            encoder: EncodingKey::from_secret(secret),
            decoder: DecodingKey::from_secret(secret).into_static(),
        }
    }

    /// Keys from a throwaway secret; cookies stop verifying when the process restarts.
    pub fn random() -> Self {
        Self::from_secret(random_string(32).as_bytes())
    }

    pub fn encode(&self, session: &SessionId) -> Result<String, Error> {
        let now = Utc::now().timestamp() as u64;
        let claims = SessionClaims {
            sid: session.as_str().to_string(),
            iat: now,
            exp: now + SESSION_MAX_AGE_SECONDS,
        };
        Ok(jwt_encode(&JWTHeader::default(), &claims, &self.encoder)?)
    }

    /// The session id in a cookie value, or `None` if the signature or expiry fails.
    pub fn decode(&self, token: &str) -> Option<SessionId> {
        let validation = Validation {
            leeway: 60,
            ..Default::default()
        };
        match jwt_decode::<SessionClaims>(token, &self.decoder, &validation) {
            Ok(data) => Some(SessionId(data.claims.sid)),
            Err(e) => {
                tracing::debug!("rejected session cookie: {}", e);
                None
            }
        }
    }

    /// `Set-Cookie` value establishing `session`.
    pub fn set_cookie(&self, session: &SessionId) -> Result<String, Error> {
        Ok(format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            self.encode(session)?,
            SESSION_MAX_AGE_SECONDS
        ))
    }

    /// `Set-Cookie` value removing the session cookie from the client.
    pub fn clear_cookie() -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            SESSION_COOKIE
        )
    }
}
