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

//! Salted password hashing with PBKDF2-HMAC-SHA256.

use crypto::{hmac::Hmac, pbkdf2::pbkdf2, sha2::Sha256, util::fixed_time_eq};
use rand::{thread_rng, RngCore};

use crate::Error;

pub const ITERATIONS: u32 = 100_000;
pub const SALT_LEN: usize = 32;
pub const HASH_LEN: usize = 32;

/// Derive a password hash. A fresh random salt is generated when `salt` is `None`.
///
/// Returns the `(hash, salt)` pair; the same password and salt always yield the same hash.
pub fn hash(password: &str, salt: Option<&[u8]>) -> (Vec<u8>, Vec<u8>) {
    let salt = match salt {
        Some(s) => s.to_vec(),
        None => random_salt(),
    };
    let mut mac = Hmac::new(Sha256::new(), password.as_bytes());
    let mut derived = vec![0u8; HASH_LEN];
    pbkdf2(&mut mac, &salt, ITERATIONS, &mut derived);
    (derived, salt)
}

pub fn verify(password: &str, stored_hash: &[u8], salt: &[u8]) -> bool {
    let (candidate, _) = hash(password, Some(salt));
    candidate.len() == stored_hash.len() && fixed_time_eq(&candidate, stored_hash)
}

fn random_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LEN];
    thread_rng().fill_bytes(&mut salt);
    salt
}

/// [`hash`] on the blocking pool, keeping the key derivation off the async workers.
pub async fn hash_blocking(password: &str) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || hash(&password, None)).await?)
}

/// [`verify`] on the blocking pool.
pub async fn verify_blocking(
    password: &str,
    stored_hash: Vec<u8>,
    salt: Vec<u8>,
) -> Result<bool, Error> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || verify(&password, &stored_hash, &salt)).await?)
}
