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

//! The document collections backing users, decks and cards.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use rand::{thread_rng, RngCore};

use crate::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

const OBJECT_ID_BYTES: usize = 12;

/// An opaque, store-generated document identifier: 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new() -> Self {
        let mut bytes = [0u8; OBJECT_ID_BYTES];
        thread_rng().fill_bytes(&mut bytes);
        ObjectId(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Wrap an identifier read back from the database without re-validating it.
    pub(crate) fn from_stored(raw: String) -> Self {
        ObjectId(raw)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == OBJECT_ID_BYTES * 2
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(ObjectId(s.to_string()))
        } else {
            Err(Error::invalid_input("malformed identifier"))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDoc {
    pub id: ObjectId,
    pub username: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub decks: Vec<ObjectId>,
}

impl UserDoc {
    pub fn owns(&self, deck: &ObjectId) -> bool {
        self.decks.contains(deck)
    }
}

pub struct NewUser {
    pub username: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckDoc {
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    pub cards: Vec<ObjectId>,
}

pub struct NewDeck {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardDoc {
    pub id: ObjectId,
    pub term: String,
    pub definition: String,
    pub deck_id: ObjectId,
}

pub struct NewCard {
    pub term: String,
    pub definition: String,
}

/// Users, Decks and Cards collections.
///
/// Single-document operations are atomic. `insert_deck` and `replace_cards`
/// touch several documents and implementations must make each appear atomic
/// to readers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with [`Error::UsernameTaken`] when the username is in use.
    async fn insert_user(&self, user: NewUser) -> Result<UserDoc, Error>;
    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>, Error>;
    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserDoc>, Error>;

    /// Create a deck with no cards and append it to `owner`'s deck list.
    async fn insert_deck(&self, owner: &ObjectId, deck: NewDeck) -> Result<DeckDoc, Error>;
    async fn find_deck(&self, id: &ObjectId) -> Result<Option<DeckDoc>, Error>;
    /// Decks with the given ids, in the order of `ids`. Missing ids are left out.
    async fn find_decks(&self, ids: &[ObjectId]) -> Result<Vec<DeckDoc>, Error>;

    /// Delete every card of `deck`, insert `cards` and point the deck at them.
    async fn replace_cards(
        &self,
        deck: &ObjectId,
        cards: Vec<NewCard>,
    ) -> Result<Vec<ObjectId>, Error>;
    /// Cards of `deck` in the order they were last set.
    async fn find_cards(&self, deck: &ObjectId) -> Result<Vec<CardDoc>, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_parse() {
        let id = ObjectId::new();
        assert_eq!(id.as_str().len(), 24);
        assert_eq!(id.as_str().parse::<ObjectId>().unwrap(), id);
        assert_ne!(ObjectId::new(), id);
    }

    #[test]
    fn malformed_ids_are_invalid_input() {
        for raw in &[
            "",
            "abc",
            "5f2b6c0e8d1a4f3b9c7e2d1",
            "5f2b6c0e8d1a4f3b9c7e2d1aa",
            "5F2B6C0E8D1A4F3B9C7E2D1A",
            "zz2b6c0e8d1a4f3b9c7e2d1a",
        ] {
            match raw.parse::<ObjectId>() {
                Err(Error::InvalidInput(_)) => (),
                other => panic!("{:?} parsed as {:?}", raw, other),
            }
        }
    }
}
