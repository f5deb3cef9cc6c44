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

use std::{convert::Infallible, sync::Arc};

use warp::{Filter, Reply};

pub mod guard;

pub mod auth;
pub mod deck;
pub mod models;
pub mod password;
pub mod session;

pub mod db;
pub mod store;

pub mod config;
mod error;
pub use error::{handle_rejects, Error};

use auth::Accounts;
use deck::Decks;
use models::MessageResp;
use session::{SessionKeys, SessionStore};
use store::Store;

/// The services a request handler may call, built once at startup.
#[derive(Clone)]
pub struct Context {
    pub accounts: Arc<Accounts>,
    pub decks: Arc<Decks>,
    pub keys: SessionKeys,
}

impl Context {
    pub fn new(store: Arc<dyn Store>, sessions: Arc<dyn SessionStore>, keys: SessionKeys) -> Self {
        Context {
            accounts: Arc::new(Accounts::new(store.clone(), sessions.clone())),
            decks: Arc::new(Decks::new(store, sessions)),
            keys,
        }
    }
}

pub fn app(
    ctx: Context,
    allowed_origins: &[String],
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let root = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&MessageResp::new("Hello World")));

    let cors = warp::cors()
        .allow_origins(allowed_origins.iter().map(String::as_str))
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    root.or(auth::api(ctx.clone()))
        .or(deck::api(ctx))
        .with(cors)
        .recover(handle_rejects)
        .with(warp::trace::request())
}
