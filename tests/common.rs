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

use serde::{de::DeserializeOwned, Serialize};
use warp::{
    http::Response,
    hyper::body::Bytes,
    Filter, Reply,
};

use flashdeck::{
    app,
    session::{MemorySessions, SessionKeys},
    store::MemoryStore,
    Context,
};

pub const ORIGIN: &str = "http://localhost:3000";

pub fn secret() -> &'static [u8] {
    b"flashdeck-test-secret"
}

pub fn api() -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let ctx = Context::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemorySessions::new()),
        SessionKeys::from_secret(secret()),
    );
    app(ctx, &[ORIGIN.to_string()])
}

/// The `name=value` part of the response's `Set-Cookie` header.
pub fn session_cookie(res: &Response<Bytes>) -> String {
    let raw = res
        .headers()
        .get("set-cookie")
        .expect("response sets a cookie")
        .to_str()
        .expect("cookie is ascii");
    raw.split(';').next().unwrap_or_default().to_string()
}

pub fn body<T: DeserializeOwned>(res: &Response<Bytes>) -> T {
    serde_json::from_slice(res.body()).expect("response body decodes")
}

pub fn message(res: &Response<Bytes>) -> String {
    body::<serde_json::Value>(res)["message"]
        .as_str()
        .expect("response carries a message")
        .to_string()
}

pub async fn post<F, T>(api: &F, path: &str, cookie: Option<&str>, json: &T) -> Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
    T: Serialize,
{
    let mut req = warp::test::request()
        .method("POST")
        .path(path)
        .header("Content-Type", "application/json");
    if let Some(c) = cookie {
        req = req.header("Cookie", c);
    }
    req.json(json).reply(api).await
}

pub async fn post_empty<F>(api: &F, path: &str, cookie: Option<&str>) -> Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let mut req = warp::test::request().method("POST").path(path);
    if let Some(c) = cookie {
        req = req.header("Cookie", c);
    }
    req.reply(api).await
}

pub async fn get<F>(api: &F, path: &str, cookie: Option<&str>) -> Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let mut req = warp::test::request()
        .method("GET")
        .path(path)
        .header("Accept", "application/json");
    if let Some(c) = cookie {
        req = req.header("Cookie", c);
    }
    req.reply(api).await
}
