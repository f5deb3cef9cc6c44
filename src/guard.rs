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

use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{Filter, Rejection};

use crate::{
    session::{SessionId, SessionKeys, SESSION_COOKIE},
    Context,
};

const MAX_BODY_BYTES: u64 = 1024 * 1024;

pub fn with_context(ctx: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// The session id presented in the session cookie, if its signature checks out.
///
/// Whether the session still exists is decided by the services.
pub fn session(
    keys: SessionKeys,
) -> impl Filter<Extract = (Option<SessionId>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .map(move |raw: Option<String>| raw.and_then(|token| keys.decode(&token)))
}

pub fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}
