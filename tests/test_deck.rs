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

use flashdeck::models::{
    CardEntry, CardsForm, CardsResp, CreateDeckResp, Credentials, DeckForm, DecksResp,
    SetCardsResp,
};

mod common;

async fn signed_up<F>(api: &F, username: &str, password: &str) -> String
where
    F: warp::Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let res = common::post(
        api,
        "/signup",
        None,
        &Credentials {
            username: username.to_string(),
            password: password.to_string(),
        },
    )
    .await;
    assert_eq!(res.status(), 201, "signup {}", username);
    common::session_cookie(&res)
}

fn deck(name: &str, description: &str) -> DeckForm {
    DeckForm {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn cards(deck_id: &str, pairs: &[(&str, &str)]) -> CardsForm {
    CardsForm {
        deck_id: deck_id.to_string(),
        cards: pairs
            .iter()
            .map(|(t, d)| CardEntry {
                term: t.to_string(),
                definition: d.to_string(),
            })
            .collect(),
    }
}

#[tokio::test]
async fn study_flow() {
    let api = common::api();

    signed_up(&api, "alice", "pw123").await;
    let res = common::post(
        &api,
        "/login",
        None,
        &Credentials {
            username: "alice".to_string(),
            password: "pw123".to_string(),
        },
    )
    .await;
    assert_eq!(res.status(), 200, "login succeeds after signup");
    let alice = common::session_cookie(&res);

    // A fresh account has no decks.
    let res = common::get(&api, "/get-decks", Some(&alice)).await;
    assert_eq!(res.status(), 200);
    assert!(common::body::<DecksResp>(&res).decks.is_empty());

    // Create a deck.
    let res = common::post(&api, "/create-deck", Some(&alice), &deck("Spanish", "")).await;
    assert_eq!(res.status(), 201, "deck created");
    let deck_id = common::body::<CreateDeckResp>(&res).deck_id;

    // Give it a card.
    let res = common::post(
        &api,
        "/set-cards",
        Some(&alice),
        &cards(&deck_id, &[("hola", "hello")]),
    )
    .await;
    assert_eq!(res.status(), 200, "cards set");
    assert_eq!(common::body::<SetCardsResp>(&res).card_count, 1);

    // Read the card back.
    let res = common::get(&api, &format!("/get-cards/{}", deck_id), Some(&alice)).await;
    assert_eq!(res.status(), 200);
    let body = String::from_utf8_lossy(res.body()).to_string();
    assert!(!body.contains("deck_id"), "cards omit their deck reference");
    let found = common::body::<CardsResp>(&res).cards;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].term, "hola");
    assert_eq!(found[0].definition, "hello");
    assert!(!found[0].id.is_empty());

    // And the deck list.
    let res = common::get(&api, "/get-decks", Some(&alice)).await;
    let decks = common::body::<DecksResp>(&res).decks;
    assert_eq!(decks.len(), 1);
    assert_eq!(decks[0].name, "Spanish");
    assert_eq!(decks[0].description, "");
    assert_eq!(decks[0].id, deck_id);
}

#[tokio::test]
async fn deck_routes_require_a_session() {
    let api = common::api();

    let res = common::post(&api, "/create-deck", None, &deck("Spanish", "")).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "not logged in");

    let res = common::get(&api, "/get-decks", None).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "not logged in");

    let res = common::post(
        &api,
        "/set-cards",
        None,
        &cards("5f2b6c0e8d1a4f3b9c7e2d1a", &[]),
    )
    .await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "not logged in");

    let res = common::get(&api, "/get-cards/5f2b6c0e8d1a4f3b9c7e2d1a", None).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "not logged in");

    // Nothing was created along the way.
    let alice = signed_up(&api, "alice", "pw123").await;
    let res = common::get(&api, "/get-decks", Some(&alice)).await;
    assert!(common::body::<DecksResp>(&res).decks.is_empty());
}

#[tokio::test]
async fn decks_are_private_to_their_owner() {
    let api = common::api();
    let alice = signed_up(&api, "alice", "pw123").await;
    let bob = signed_up(&api, "bob", "hunter2").await;

    let res = common::post(&api, "/create-deck", Some(&alice), &deck("Spanish", "es")).await;
    let deck_id = common::body::<CreateDeckResp>(&res).deck_id;
    common::post(
        &api,
        "/set-cards",
        Some(&alice),
        &cards(&deck_id, &[("hola", "hello")]),
    )
    .await;

    // Bob cannot read or overwrite Alice's cards.
    let res = common::get(&api, &format!("/get-cards/{}", deck_id), Some(&bob)).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "invalid deck");
    let foreign_body = res.body().clone();

    let res = common::post(&api, "/set-cards", Some(&bob), &cards(&deck_id, &[])).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "invalid deck");

    // A deck that does not exist looks the same as one that is not yours.
    let res = common::get(&api, "/get-cards/5f2b6c0e8d1a4f3b9c7e2d1a", Some(&bob)).await;
    assert_eq!(res.body(), &foreign_body);

    let res = common::get(&api, "/get-decks", Some(&bob)).await;
    assert!(common::body::<DecksResp>(&res).decks.is_empty());

    // Alice's cards are untouched.
    let res = common::get(&api, &format!("/get-cards/{}", deck_id), Some(&alice)).await;
    assert_eq!(common::body::<CardsResp>(&res).cards.len(), 1);
}

#[tokio::test]
async fn set_cards_replaces_the_whole_set() {
    let api = common::api();
    let alice = signed_up(&api, "alice", "pw123").await;
    let res = common::post(&api, "/create-deck", Some(&alice), &deck("Spanish", "")).await;
    let deck_id = common::body::<CreateDeckResp>(&res).deck_id;

    let first = cards(&deck_id, &[("uno", "one"), ("dos", "two"), ("tres", "three")]);
    let second = cards(&deck_id, &[("hola", "hello"), ("adios", "goodbye")]);

    common::post(&api, "/set-cards", Some(&alice), &first).await;
    for _ in 0..2 {
        let res = common::post(&api, "/set-cards", Some(&alice), &second).await;
        assert_eq!(res.status(), 200);
    }

    let res = common::get(&api, &format!("/get-cards/{}", deck_id), Some(&alice)).await;
    let found: Vec<(String, String)> = common::body::<CardsResp>(&res)
        .cards
        .into_iter()
        .map(|c| (c.term, c.definition))
        .collect();
    assert_eq!(
        found,
        vec![
            ("hola".to_string(), "hello".to_string()),
            ("adios".to_string(), "goodbye".to_string()),
        ]
    );
}

#[tokio::test]
async fn bad_deck_input_is_rejected() {
    let api = common::api();
    let alice = signed_up(&api, "alice", "pw123").await;

    let res = common::post(&api, "/create-deck", Some(&alice), &deck("", "no name")).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "name is required");

    let res = common::post(&api, "/set-cards", Some(&alice), &cards("", &[])).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "deck_id is required");

    let res = common::post(&api, "/set-cards", Some(&alice), &cards("12345", &[])).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "malformed identifier");

    let res = common::get(&api, "/get-cards/not-an-id", Some(&alice)).await;
    assert_eq!(res.status(), 400);
    assert_eq!(common::message(&res), "malformed identifier");
}
