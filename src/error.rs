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

use mobc_postgres::tokio_postgres;
use serde::Serialize;
use warp::{http::StatusCode, reject, Rejection, Reply};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("not logged in")]
    NotAuthenticated,
    #[error("invalid deck")]
    InvalidDeck,
    #[error(transparent)]
    DBPoolError(#[from] mobc::Error<tokio_postgres::Error>),
    #[error(transparent)]
    DBError(#[from] tokio_postgres::Error),
    #[error(transparent)]
    JWTError(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    TaskError(#[from] tokio::task::JoinError),
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::UsernameTaken
                | Error::InvalidCredentials
                | Error::NotAuthenticated
                | Error::InvalidDeck
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// The text shown to the client. Server errors never expose their cause.
    pub fn message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "internal server error".to_string()
        }
    }
}

impl reject::Reject for Error {}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

pub async fn handle_rejects(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        tracing::debug!("undecodable body: {}", e);
        (StatusCode::BAD_REQUEST, "invalid request body".to_string())
    } else if let Some(e) = err.find::<Error>() {
        if !e.is_client_error() {
            tracing::error!("request failed: {:?}", e);
        }
        (e.status(), e.message())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "request body too large".to_string(),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "content-type must be application/json".to_string(),
        )
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid query string".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "content-length required".to_string(),
        )
    } else if err.find::<warp::filters::cors::CorsForbidden>().is_some() {
        (StatusCode::FORBIDDEN, "origin not allowed".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed".to_string(),
        )
    } else {
        tracing::error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { message }),
        code,
    ))
}
