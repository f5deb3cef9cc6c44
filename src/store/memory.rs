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

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CardDoc, DeckDoc, NewCard, NewDeck, NewUser, ObjectId, Store, UserDoc};
use crate::Error;

#[derive(Default)]
struct Collections {
    users: HashMap<ObjectId, UserDoc>,
    usernames: HashMap<String, ObjectId>,
    decks: HashMap<ObjectId, DeckDoc>,
    cards: HashMap<ObjectId, CardDoc>,
}

/// A store held in process memory. Every operation runs under one lock, so
/// multi-document writes are never observed half done.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    #[cfg(test)]
    pub(crate) async fn remove_deck_document(&self, id: &ObjectId) {
        self.inner.write().await.decks.remove(id);
    }

    #[cfg(test)]
    pub(crate) async fn card_count(&self) -> usize {
        self.inner.read().await.cards.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserDoc, Error> {
        let mut db = self.inner.write().await;
        if db.usernames.contains_key(&user.username) {
            return Err(Error::UsernameTaken);
        }
        let doc = UserDoc {
            id: ObjectId::new(),
            username: user.username,
            password_hash: user.password_hash,
            salt: user.salt,
            decks: vec![],
        };
        db.usernames.insert(doc.username.clone(), doc.id.clone());
        db.users.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>, Error> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserDoc>, Error> {
        let db = self.inner.read().await;
        Ok(db
            .usernames
            .get(username)
            .and_then(|id| db.users.get(id))
            .cloned())
    }

    async fn insert_deck(&self, owner: &ObjectId, deck: NewDeck) -> Result<DeckDoc, Error> {
        let mut db = self.inner.write().await;
        let doc = DeckDoc {
            id: ObjectId::new(),
            name: deck.name,
            description: deck.description,
            cards: vec![],
        };
        match db.users.get_mut(owner) {
            Some(user) => user.decks.push(doc.id.clone()),
            None => return Err(Error::NotAuthenticated),
        }
        db.decks.insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn find_deck(&self, id: &ObjectId) -> Result<Option<DeckDoc>, Error> {
        Ok(self.inner.read().await.decks.get(id).cloned())
    }

    async fn find_decks(&self, ids: &[ObjectId]) -> Result<Vec<DeckDoc>, Error> {
        let db = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| db.decks.get(id).cloned()).collect())
    }

    async fn replace_cards(
        &self,
        deck: &ObjectId,
        cards: Vec<NewCard>,
    ) -> Result<Vec<ObjectId>, Error> {
        let mut db = self.inner.write().await;
        if !db.decks.contains_key(deck) {
            return Err(Error::InvalidDeck);
        }
        db.cards.retain(|_, card| &card.deck_id != deck);

        let mut ids = Vec::with_capacity(cards.len());
        for card in cards {
            let doc = CardDoc {
                id: ObjectId::new(),
                term: card.term,
                definition: card.definition,
                deck_id: deck.clone(),
            };
            ids.push(doc.id.clone());
            db.cards.insert(doc.id.clone(), doc);
        }
        if let Some(d) = db.decks.get_mut(deck) {
            d.cards = ids.clone();
        }
        Ok(ids)
    }

    async fn find_cards(&self, deck: &ObjectId) -> Result<Vec<CardDoc>, Error> {
        let db = self.inner.read().await;
        Ok(match db.decks.get(deck) {
            Some(d) => d
                .cards
                .iter()
                .filter_map(|id| db.cards.get(id))
                .filter(|card| &card.deck_id == deck)
                .cloned()
                .collect(),
            None => vec![],
        })
    }
}
