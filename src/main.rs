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

use std::sync::Arc;

use flashdeck::{
    app,
    config::Config,
    db,
    session::{MemorySessions, SessionKeys},
    store::{MemoryStore, PgStore, Store},
    Context, Error,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url)?;
            db::init_db(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; data is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let keys = match &config.session_secret {
        Some(secret) => SessionKeys::from_secret(secret.as_bytes()),
        None => {
            tracing::warn!("SESSION_SECRET is not set; sessions end when the server restarts");
            SessionKeys::random()
        }
    };

    let ctx = Context::new(store, Arc::new(MemorySessions::new()), keys);

    tracing::info!("listening on {}", config.bind_addr);
    warp::serve(app(ctx, &config.allowed_origins))
        .run(config.bind_addr)
        .await;
    Ok(())
}
