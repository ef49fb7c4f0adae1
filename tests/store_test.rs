// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Catalog store claim-index and constraint tests.

use biblio_engine_rs::{
    Book, BookDraft, BookId, CatalogStore, Reader, ReaderDraft, ReaderId, ReservationId,
    StoreViolation,
};

// === Helper Functions ===

fn make_book(store: &CatalogStore, title: &str) -> Book {
    let draft = BookDraft::new(title, "Test Author", 1990).unwrap();
    store.insert_book(draft)
}

fn make_reader(store: &CatalogStore, name: &str, email: &str) -> Reader {
    let draft = ReaderDraft::new(name, email).unwrap();
    store.insert_reader(draft).unwrap()
}

// === Book Table ===

#[test]
fn insert_book_assigns_ids_from_one() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");

    assert_eq!(book.id, BookId(1));
    assert_eq!(store.book_count(), 1);
    assert!(store.contains_book(book.id));
}

#[test]
fn update_missing_book_is_a_violation() {
    let store = CatalogStore::new();
    let draft = BookDraft::new("Dune", "Frank Herbert", 1965).unwrap();

    let result = store.update_book(BookId(7), &draft);
    assert_eq!(result.unwrap_err(), StoreViolation::MissingBook);
}

#[test]
fn delete_book_removes_reservation_history() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let reservation = store
        .insert_reservation(book.id, reader.id, String::new(), 1)
        .unwrap();
    store.cancel(reservation.id).unwrap();

    store.delete_book(book.id).unwrap();

    assert!(store.get_reservation(reservation.id).is_none());
    assert_eq!(store.reservation_count(), 0);
    assert_eq!(store.reservation_count_for(reader.id), 0);
}

// === Email Claims ===

#[test]
fn duplicate_email_reports_the_owner() {
    let store = CatalogStore::new();
    let ada = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let draft = ReaderDraft::new("Impostor Ada", "ada@example.com").unwrap();
    let result = store.insert_reader(draft);
    assert_eq!(result.unwrap_err(), StoreViolation::EmailTaken(ada.id));
}

#[test]
fn update_reader_to_taken_email_is_a_violation() {
    let store = CatalogStore::new();
    let ada = make_reader(&store, "Ada Lovelace", "ada@example.com");
    let grace = make_reader(&store, "Grace Hopper", "grace@example.com");

    let draft = ReaderDraft::new("Grace Hopper", "ada@example.com").unwrap();
    let result = store.update_reader(grace.id, &draft);
    assert_eq!(result.unwrap_err(), StoreViolation::EmailTaken(ada.id));

    // The losing update left both claims untouched
    assert_eq!(store.reader_by_email("ada@example.com").unwrap().id, ada.id);
    assert_eq!(
        store.reader_by_email("grace@example.com").unwrap().id,
        grace.id
    );
}

#[test]
fn update_reader_moves_the_email_claim() {
    let store = CatalogStore::new();
    let ada = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let draft = ReaderDraft::new("Ada King", "countess@example.com").unwrap();
    store.update_reader(ada.id, &draft).unwrap();

    assert!(store.reader_by_email("ada@example.com").is_none());
    assert_eq!(
        store.reader_by_email("countess@example.com").unwrap().id,
        ada.id
    );
}

#[test]
fn delete_reader_releases_email_and_history() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");
    let reservation = store
        .insert_reservation(book.id, reader.id, String::new(), 1)
        .unwrap();
    store.cancel(reservation.id).unwrap();

    store.delete_reader(reader.id).unwrap();

    assert!(store.reader_by_email("ada@example.com").is_none());
    assert!(store.get_reservation(reservation.id).is_none());
    assert!(store.is_book_available(book.id));
}

// === Reservation Claims ===

#[test]
fn insert_reservation_claims_both_slots() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let reservation = store
        .insert_reservation(book.id, reader.id, "notes".to_string(), 1)
        .unwrap();

    assert_eq!(reservation.id, ReservationId(1));
    assert!(reservation.is_active);
    assert!(!store.is_book_available(book.id));
    assert_eq!(store.active_count_for(reader.id), 1);
}

#[test]
fn second_claim_on_book_reports_the_holder() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let ada = make_reader(&store, "Ada Lovelace", "ada@example.com");
    let grace = make_reader(&store, "Grace Hopper", "grace@example.com");

    let held = store
        .insert_reservation(book.id, ada.id, String::new(), 1)
        .unwrap();

    let result = store.insert_reservation(book.id, grace.id, String::new(), 1);
    assert_eq!(result.unwrap_err(), StoreViolation::BookTaken(held.id));
}

#[test]
fn reader_at_capacity_rolls_back_book_claim() {
    let store = CatalogStore::new();
    let book_a = make_book(&store, "Dune");
    let book_b = make_book(&store, "Neuromancer");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");

    store
        .insert_reservation(book_a.id, reader.id, String::new(), 1)
        .unwrap();

    let result = store.insert_reservation(book_b.id, reader.id, String::new(), 1);
    assert_eq!(result.unwrap_err(), StoreViolation::ReaderAtCapacity);

    // The failed insert must not leave book B claimed
    assert!(store.is_book_available(book_b.id));
    assert_eq!(store.reservation_count(), 1);
}

#[test]
fn missing_rows_are_checked_before_claims() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let result = store.insert_reservation(BookId(9), reader.id, String::new(), 1);
    assert_eq!(result.unwrap_err(), StoreViolation::MissingBook);

    let result = store.insert_reservation(book.id, ReaderId(9), String::new(), 1);
    assert_eq!(result.unwrap_err(), StoreViolation::MissingReader);

    assert!(store.is_book_available(book.id));
}

#[test]
fn cancel_releases_both_claims() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");
    let reservation = store
        .insert_reservation(book.id, reader.id, String::new(), 1)
        .unwrap();

    assert!(store.cancel(reservation.id).unwrap());

    assert!(store.is_book_available(book.id));
    assert_eq!(store.active_count_for(reader.id), 0);
    // The row itself survives as history
    assert!(store.get_reservation(reservation.id).is_some());
}

#[test]
fn reactivate_reclaims_the_book() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");
    let reservation = store
        .insert_reservation(book.id, reader.id, String::new(), 1)
        .unwrap();

    store.cancel(reservation.id).unwrap();
    assert!(store.reactivate(reservation.id).unwrap());

    assert!(!store.is_book_available(book.id));
    assert_eq!(
        store.current_reservation(book.id).unwrap().id,
        reservation.id
    );
}

#[test]
fn reactivate_loses_to_a_newer_holder() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let ada = make_reader(&store, "Ada Lovelace", "ada@example.com");
    let grace = make_reader(&store, "Grace Hopper", "grace@example.com");

    let first = store
        .insert_reservation(book.id, ada.id, String::new(), 1)
        .unwrap();
    store.cancel(first.id).unwrap();
    let second = store
        .insert_reservation(book.id, grace.id, String::new(), 1)
        .unwrap();

    let result = store.reactivate(first.id);
    assert_eq!(result.unwrap_err(), StoreViolation::BookTaken(second.id));
}

#[test]
fn cancel_missing_reservation_is_a_violation() {
    let store = CatalogStore::new();
    assert_eq!(
        store.cancel(ReservationId(1)).unwrap_err(),
        StoreViolation::MissingReservation
    );
    assert_eq!(
        store.reactivate(ReservationId(1)).unwrap_err(),
        StoreViolation::MissingReservation
    );
}

// === Ordering ===

#[test]
fn recent_reservations_are_newest_first() {
    let store = CatalogStore::new();
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let mut ids = Vec::new();
    for i in 0..5 {
        let book = make_book(&store, &format!("Volume {i}"));
        let reservation = store
            .insert_reservation(book.id, reader.id, String::new(), 10)
            .unwrap();
        ids.push(reservation.id);
    }

    let recent = store.recent_reservations(3);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].id, ids[4]);
    assert_eq!(recent[1].id, ids[3]);
    assert_eq!(recent[2].id, ids[2]);
}

#[test]
fn reservation_ids_survive_cancellation() {
    let store = CatalogStore::new();
    let book = make_book(&store, "Dune");
    let reader = make_reader(&store, "Ada Lovelace", "ada@example.com");

    let first = store
        .insert_reservation(book.id, reader.id, String::new(), 1)
        .unwrap();
    store.cancel(first.id).unwrap();
    let second = store
        .insert_reservation(book.id, reader.id, String::new(), 1)
        .unwrap();

    // Ids are never reused, cancelled or not
    assert_eq!(first.id, ReservationId(1));
    assert_eq!(second.id, ReservationId(2));
    assert_eq!(store.reservation_count(), 2);
    assert_eq!(store.active_reservation_count(), 1);
}
