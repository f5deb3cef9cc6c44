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

use std::convert::TryFrom;

use async_trait::async_trait;
use mobc_postgres::tokio_postgres::{error::SqlState, row::Row};

use super::{CardDoc, DeckDoc, NewCard, NewDeck, NewUser, ObjectId, Store, UserDoc};
use crate::{db, Error};

/// Store backed by PostgreSQL. Multi-document writes run in a transaction.
pub struct PgStore {
    pool: db::Pool,
}

impl PgStore {
    pub fn new(pool: db::Pool) -> Self {
        PgStore { pool }
    }
}

fn stored_ids(raw: Vec<String>) -> Vec<ObjectId> {
    raw.into_iter().map(ObjectId::from_stored).collect()
}

/// The `position` column value for the card at `index`.
fn card_position(index: usize) -> Result<i32, Error> {
    i32::try_from(index).map_err(|_| Error::invalid_input("too many cards in one deck"))
}

fn id_strings(ids: &[ObjectId]) -> Vec<&str> {
    ids.iter().map(ObjectId::as_str).collect()
}

impl<'a> From<&'a Row> for UserDoc {
    fn from(row: &'a Row) -> Self {
        UserDoc {
            id: ObjectId::from_stored(row.get("id")),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            salt: row.get("salt"),
            decks: stored_ids(row.get("decks")),
        }
    }
}

impl<'a> From<&'a Row> for DeckDoc {
    fn from(row: &'a Row) -> Self {
        DeckDoc {
            id: ObjectId::from_stored(row.get("id")),
            name: row.get("name"),
            description: row.get("description"),
            cards: stored_ids(row.get("cards")),
        }
    }
}

impl<'a> From<&'a Row> for CardDoc {
    fn from(row: &'a Row) -> Self {
        CardDoc {
            id: ObjectId::from_stored(row.get("id")),
            term: row.get("term"),
            definition: row.get("definition"),
            deck_id: ObjectId::from_stored(row.get("deck_id")),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserDoc, Error> {
        let conn = db::get_db_conn(&self.pool).await?;
        let id = ObjectId::new();
        let res = conn
            .query_one(
                r#"
                INSERT INTO users (id, username, password_hash, salt)
                VALUES ($1, $2, $3, $4)
                RETURNING id, username, password_hash, salt, decks
                "#,
                &[&id.as_str(), &user.username, &user.password_hash, &user.salt],
            )
            .await;
        match res {
            Ok(row) => Ok(UserDoc::from(&row)),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Err(Error::UsernameTaken),
            Err(e) => Err(Error::DBError(e)),
        }
    }

    async fn find_user(&self, id: &ObjectId) -> Result<Option<UserDoc>, Error> {
        let conn = db::get_db_conn(&self.pool).await?;
        let row = conn
            .query_opt(
                "SELECT id, username, password_hash, salt, decks FROM users WHERE id = $1",
                &[&id.as_str()],
            )
            .await?;
        Ok(row.as_ref().map(UserDoc::from))
    }

    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserDoc>, Error> {
        let conn = db::get_db_conn(&self.pool).await?;
        let row = conn
            .query_opt(
                "SELECT id, username, password_hash, salt, decks FROM users WHERE username = $1",
                &[&username],
            )
            .await?;
        Ok(row.as_ref().map(UserDoc::from))
    }

    async fn insert_deck(&self, owner: &ObjectId, deck: NewDeck) -> Result<DeckDoc, Error> {
        let mut conn = db::get_db_conn(&self.pool).await?;
        let tx = conn.transaction().await?;
        let id = ObjectId::new();
        let row = tx
            .query_one(
                r#"
                INSERT INTO decks (id, name, description)
                VALUES ($1, $2, $3)
                RETURNING id, name, description, cards
                "#,
                &[&id.as_str(), &deck.name, &deck.description],
            )
            .await?;
        let attached = tx
            .execute(
                "UPDATE users SET decks = array_append(decks, $1) WHERE id = $2",
                &[&id.as_str(), &owner.as_str()],
            )
            .await?;
        if attached != 1 {
            tx.rollback().await?;
            return Err(Error::NotAuthenticated);
        }
        tx.commit().await?;
        Ok(DeckDoc::from(&row))
    }

    async fn find_deck(&self, id: &ObjectId) -> Result<Option<DeckDoc>, Error> {
        let conn = db::get_db_conn(&self.pool).await?;
        let row = conn
            .query_opt(
                "SELECT id, name, description, cards FROM decks WHERE id = $1",
                &[&id.as_str()],
            )
            .await?;
        Ok(row.as_ref().map(DeckDoc::from))
    }

    async fn find_decks(&self, ids: &[ObjectId]) -> Result<Vec<DeckDoc>, Error> {
        let conn = db::get_db_conn(&self.pool).await?;
        let rows = conn
            .query(
                r#"
                SELECT d.id, d.name, d.description, d.cards
                FROM UNNEST($1::TEXT[]) WITH ORDINALITY AS wanted(id, ord)
                JOIN decks d ON d.id = wanted.id
                ORDER BY wanted.ord
                "#,
                &[&id_strings(ids)],
            )
            .await?;
        Ok(rows.iter().map(DeckDoc::from).collect())
    }

    async fn replace_cards(
        &self,
        deck: &ObjectId,
        cards: Vec<NewCard>,
    ) -> Result<Vec<ObjectId>, Error> {
        let mut conn = db::get_db_conn(&self.pool).await?;
        let tx = conn.transaction().await?;

        // Lock the deck row so concurrent replacements serialize.
        let locked = tx
            .query_opt(
                "SELECT id FROM decks WHERE id = $1 FOR UPDATE",
                &[&deck.as_str()],
            )
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Err(Error::InvalidDeck);
        }

        tx.execute("DELETE FROM cards WHERE deck_id = $1", &[&deck.as_str()])
            .await?;
        let insert = tx
            .prepare(
                r#"
                INSERT INTO cards (id, deck_id, position, term, definition)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .await?;
        let mut new_ids = Vec::with_capacity(cards.len());
        for (position, card) in cards.iter().enumerate() {
            let id = ObjectId::new();
            let position = card_position(position)?;
            tx.execute(
                &insert,
                &[
                    &id.as_str(),
                    &deck.as_str(),
                    &position,
                    &card.term,
                    &card.definition,
                ],
            )
            .await?;
            new_ids.push(id);
        }
        tx.execute(
            "UPDATE decks SET cards = $1 WHERE id = $2",
            &[&id_strings(&new_ids), &deck.as_str()],
        )
        .await?;
        tx.commit().await?;
        Ok(new_ids)
    }

    async fn find_cards(&self, deck: &ObjectId) -> Result<Vec<CardDoc>, Error> {
        let conn = db::get_db_conn(&self.pool).await?;
        let rows = conn
            .query(
                r#"
                SELECT id, term, definition, deck_id FROM cards
                WHERE deck_id = $1
                ORDER BY position
                "#,
                &[&deck.as_str()],
            )
            .await?;
        Ok(rows.iter().map(CardDoc::from).collect())
    }
}
