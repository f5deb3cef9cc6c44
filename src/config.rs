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

use std::{env, net::SocketAddr};

use crate::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub session_secret: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| Error::Config(format!("BIND_ADDR is not an address: {}", bind_raw)))?;

        Ok(Config {
            bind_addr,
            database_url: get("DATABASE_URL"),
            session_secret: get("SESSION_SECRET"),
            allowed_origins: parse_origins(
                &get("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            )?,
        })
    }
}

/// Comma-separated origins, each with an http or https scheme.
fn parse_origins(raw: &str) -> Result<Vec<String>, Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            if o.starts_with("http://") || o.starts_with("https://") {
                Ok(o.trim_end_matches('/').to_string())
            } else {
                Err(Error::Config(format!("ALLOWED_ORIGINS entry lacks a scheme: {}", o)))
            }
        })
        .collect()
}
