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

//! Decks and their cards, scoped to the user that owns them.

use std::sync::Arc;

use warp::{
    http::StatusCode,
    reply::{json, with_status},
    Filter, Rejection, Reply,
};

use crate::{
    guard,
    models::{
        CardEntry, CardView, CardsForm, CardsResp, CreateDeckResp, DeckForm, DeckSummary,
        DecksResp, SetCardsResp,
    },
    session::{SessionId, SessionStore},
    store::{NewCard, NewDeck, ObjectId, Store, UserDoc},
    Context, Error,
};

pub fn api(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create_deck = warp::path("create-deck")
        .and(warp::post())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::json_body())
        .and(guard::with_context(ctx.clone()))
        .and_then(create_deck);

    let set_cards = warp::path("set-cards")
        .and(warp::post())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::json_body())
        .and(guard::with_context(ctx.clone()))
        .and_then(set_cards);

    let get_decks = warp::path("get-decks")
        .and(warp::get())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::with_context(ctx.clone()))
        .and_then(get_decks);

    let get_cards = warp::path("get-cards")
        .and(warp::get())
        .and(warp::path::param())
        .and(warp::path::end())
        .and(guard::session(ctx.keys.clone()))
        .and(guard::with_context(ctx))
        .and_then(get_cards);

    create_deck.or(set_cards).or(get_decks).or(get_cards)
}

/// Deck and card operations on behalf of the session's user.
///
/// A deck belongs to the user whose deck list contains it. Decks that exist
/// but belong to someone else are reported exactly like missing ones.
pub struct Decks {
    store: Arc<dyn Store>,
    sessions: Arc<dyn SessionStore>,
}

impl Decks {
    pub fn new(store: Arc<dyn Store>, sessions: Arc<dyn SessionStore>) -> Self {
        Decks { store, sessions }
    }

    async fn caller(&self, current: Option<&SessionId>) -> Result<UserDoc, Error> {
        let session = current.ok_or(Error::NotAuthenticated)?;
        let user_id = self
            .sessions
            .user(session)
            .await?
            .ok_or(Error::NotAuthenticated)?;
        self.store
            .find_user(&user_id)
            .await?
            .ok_or(Error::NotAuthenticated)
    }

    fn owned_deck(user: &UserDoc, deck_id: &str) -> Result<ObjectId, Error> {
        let deck_id = deck_id.trim();
        if deck_id.is_empty() {
            return Err(Error::invalid_input("deck_id is required"));
        }
        let id: ObjectId = deck_id.parse()?;
        if user.owns(&id) {
            Ok(id)
        } else {
            Err(Error::InvalidDeck)
        }
    }

    #[tracing::instrument(skip(self, current))]
    pub async fn create_deck(
        &self,
        current: Option<&SessionId>,
        name: &str,
        description: &str,
    ) -> Result<ObjectId, Error> {
        let user = self.caller(current).await?;
        if name.trim().is_empty() {
            return Err(Error::invalid_input("name is required"));
        }
        let deck = self
            .store
            .insert_deck(
                &user.id,
                NewDeck {
                    name: name.to_string(),
                    description: description.to_string(),
                },
            )
            .await?;
        tracing::info!(user = %user.id, deck = %deck.id, "deck created");
        Ok(deck.id)
    }

    /// Replace the deck's cards with `cards`. Repeating the call with the same
    /// cards leaves the same content behind, under new card ids.
    #[tracing::instrument(skip(self, current, cards), fields(count = cards.len()))]
    pub async fn set_cards(
        &self,
        current: Option<&SessionId>,
        deck_id: &str,
        cards: Vec<CardEntry>,
    ) -> Result<Vec<ObjectId>, Error> {
        let user = self.caller(current).await?;
        let deck = Self::owned_deck(&user, deck_id)?;
        let cards = cards
            .into_iter()
            .map(|c| NewCard {
                term: c.term,
                definition: c.definition,
            })
            .collect();
        self.store.replace_cards(&deck, cards).await
    }

    pub async fn get_decks(&self, current: Option<&SessionId>) -> Result<Vec<DeckSummary>, Error> {
        let user = self.caller(current).await?;
        let decks = self.store.find_decks(&user.decks).await?;
        if decks.len() != user.decks.len() {
            let missing: Vec<&ObjectId> = user
                .decks
                .iter()
                .filter(|id| !decks.iter().any(|d| &d.id == *id))
                .collect();
            tracing::warn!(user = %user.id, ?missing, "user references missing decks");
        }
        Ok(decks.into_iter().map(DeckSummary::from).collect())
    }

    pub async fn get_cards(
        &self,
        current: Option<&SessionId>,
        deck_id: &str,
    ) -> Result<Vec<CardView>, Error> {
        let user = self.caller(current).await?;
        let deck = Self::owned_deck(&user, deck_id)?;
        if self.store.find_deck(&deck).await?.is_none() {
            tracing::warn!(user = %user.id, deck = %deck, "user references missing deck");
            return Err(Error::InvalidDeck);
        }
        Ok(self
            .store
            .find_cards(&deck)
            .await?
            .into_iter()
            .map(CardView::from)
            .collect())
    }
}

async fn create_deck(
    current: Option<SessionId>,
    form: DeckForm,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let id = ctx
        .decks
        .create_deck(current.as_ref(), &form.name, &form.description)
        .await?;
    Ok(with_status(
        json(&CreateDeckResp::from(id)),
        StatusCode::CREATED,
    ))
}

async fn set_cards(
    current: Option<SessionId>,
    form: CardsForm,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let ids = ctx
        .decks
        .set_cards(current.as_ref(), &form.deck_id, form.cards)
        .await?;
    Ok(json(&SetCardsResp {
        message: "Cards set".to_string(),
        card_count: ids.len(),
    }))
}

async fn get_decks(current: Option<SessionId>, ctx: Context) -> Result<impl Reply, Rejection> {
    let decks = ctx.decks.get_decks(current.as_ref()).await?;
    Ok(json(&DecksResp {
        message: "Decks retrieved".to_string(),
        decks,
    }))
}

async fn get_cards(
    deck_id: String,
    current: Option<SessionId>,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let cards = ctx.decks.get_cards(current.as_ref(), &deck_id).await?;
    Ok(json(&CardsResp {
        message: "Cards retrieved".to_string(),
        cards,
    }))
}
