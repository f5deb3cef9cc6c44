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

use serde::{Deserialize, Serialize};

use crate::store::{CardDoc, DeckDoc, ObjectId};

/// The input data type of a signup or login request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The input data type of a create-deck request.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeckForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One card as supplied to set-cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardEntry {
    pub term: String,
    pub definition: String,
}

/// The input data type of a set-cards request.
#[derive(Debug, Serialize, Deserialize)]
pub struct CardsForm {
    pub deck_id: String,
    pub cards: Vec<CardEntry>,
}

/// A response carrying only a message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResp {
    pub message: String,
}

impl MessageResp {
    pub fn new<T: Into<String>>(message: T) -> Self {
        MessageResp {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDeckResp {
    pub message: String,
    pub deck_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetCardsResp {
    pub message: String,
    pub card_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<DeckDoc> for DeckSummary {
    fn from(deck: DeckDoc) -> Self {
        DeckSummary {
            id: deck.id.to_string(),
            name: deck.name,
            description: deck.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecksResp {
    pub message: String,
    pub decks: Vec<DeckSummary>,
}

/// A card as returned to its owner; the deck reference is left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardView {
    pub id: String,
    pub term: String,
    pub definition: String,
}

impl From<CardDoc> for CardView {
    fn from(card: CardDoc) -> Self {
        CardView {
            id: card.id.to_string(),
            term: card.term,
            definition: card.definition,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardsResp {
    pub message: String,
    pub cards: Vec<CardView>,
}

impl From<ObjectId> for CreateDeckResp {
    fn from(id: ObjectId) -> Self {
        CreateDeckResp {
            message: "Deck created".to_string(),
            deck_id: id.to_string(),
        }
    }
}
