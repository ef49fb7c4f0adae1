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

//! Concurrent catalog storage with constraint-bearing indexes.
//!
//! The [`CatalogStore`] holds books, readers, and reservations in
//! [`DashMap`] tables and backs the uniqueness rules with dedicated claim
//! indexes:
//!
//! - `active_by_book` maps a book to its single active reservation. Claims
//!   go through the dashmap entry API, so check-and-claim is one atomic
//!   step and two racing writers cannot both claim the same book.
//! - `active_by_reader` maps a reader to their active reservation ids. The
//!   create path claims a slot only below the configured ceiling; the
//!   reactivate path appends unconditionally (only book availability gates
//!   reactivation).
//! - `emails` maps each normalized email address to its owning reader.
//!
//! The claim indexes are the authoritative race guard. Callers are expected
//! to pre-check availability for friendlier error ordering, but the claim
//! decides who wins.
//!
//! # Locking
//!
//! Writers that flip a reservation's state hold that row's guard while
//! updating the claim indexes, so cancel and reactivate of the same
//! reservation serialize. Lock order is always row guard, then book claim,
//! then reader claim; read paths copy ids out of a claim guard before
//! touching row shards and never hold two guards at once. Reader updates
//! likewise swap email claims under the reader's row guard.

use crate::base::{BookId, ReaderId, ReservationId};
use crate::book::{Book, BookDraft};
use crate::reader::{Reader, ReaderDraft};
use crate::reservation::Reservation;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Storage-level rejection of a write that would break a constraint or
/// reference a missing row.
///
/// These are raw store outcomes; the engine translates them into
/// [`CatalogError`](crate::error::CatalogError) values before they reach
/// callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreViolation {
    MissingBook,
    MissingReader,
    MissingReservation,
    /// The book already carries the given active reservation.
    BookTaken(ReservationId),
    /// The reader is at their active-reservation ceiling.
    ReaderAtCapacity,
    /// The normalized email already belongs to the given reader.
    EmailTaken(ReaderId),
}

/// Concurrent entity storage for the library catalog.
pub struct CatalogStore {
    books: DashMap<BookId, Book>,
    readers: DashMap<ReaderId, Reader>,
    reservations: DashMap<ReservationId, Reservation>,
    /// Partial-uniqueness constraint: at most one active reservation per book.
    active_by_book: DashMap<BookId, ReservationId>,
    /// Active reservation ids per reader.
    active_by_reader: DashMap<ReaderId, Vec<ReservationId>>,
    /// Normalized email address to owning reader.
    emails: DashMap<String, ReaderId>,
    /// Reservation ids in creation order.
    log: RwLock<Vec<ReservationId>>,
    next_book_id: AtomicU32,
    next_reader_id: AtomicU32,
    next_reservation_id: AtomicU64,
}

impl CatalogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            readers: DashMap::new(),
            reservations: DashMap::new(),
            active_by_book: DashMap::new(),
            active_by_reader: DashMap::new(),
            emails: DashMap::new(),
            log: RwLock::new(Vec::new()),
            next_book_id: AtomicU32::new(0),
            next_reader_id: AtomicU32::new(0),
            next_reservation_id: AtomicU64::new(0),
        }
    }

    // === Books ===

    /// Inserts a validated book and returns the stored record.
    pub fn insert_book(&self, draft: BookDraft) -> Book {
        let id = BookId(self.next_book_id.fetch_add(1, Ordering::Relaxed) + 1);
        let book = draft.into_book(id, Utc::now());
        self.books.insert(id, book.clone());
        book
    }

    /// Applies a validated draft to an existing book.
    pub fn update_book(&self, id: BookId, draft: &BookDraft) -> Result<Book, StoreViolation> {
        let mut book = self.books.get_mut(&id).ok_or(StoreViolation::MissingBook)?;
        draft.apply_to(&mut book, Utc::now());
        Ok(book.clone())
    }

    /// Removes a book and cascades to all reservations referencing it.
    ///
    /// Policy checks (refusing deletion while reserved) belong to the
    /// caller; the store always cascades.
    pub fn delete_book(&self, id: BookId) -> Result<(), StoreViolation> {
        self.books.remove(&id).ok_or(StoreViolation::MissingBook)?;
        let doomed: Vec<ReservationId> = self
            .reservations
            .iter()
            .filter(|r| r.book_id == id)
            .map(|r| r.id)
            .collect();
        for reservation_id in doomed {
            self.remove_reservation_row(reservation_id);
        }
        Ok(())
    }

    pub fn get_book(&self, id: BookId) -> Option<Book> {
        self.books.get(&id).map(|b| b.clone())
    }

    pub fn contains_book(&self, id: BookId) -> bool {
        self.books.contains_key(&id)
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Snapshot of all books, unordered.
    pub fn books_snapshot(&self) -> Vec<Book> {
        self.books.iter().map(|b| b.clone()).collect()
    }

    // === Readers ===

    /// Inserts a validated reader, claiming their email address.
    ///
    /// # Errors
    ///
    /// Returns [`StoreViolation::EmailTaken`] if the normalized email is
    /// already registered.
    pub fn insert_reader(&self, draft: ReaderDraft) -> Result<Reader, StoreViolation> {
        let id = ReaderId(self.next_reader_id.fetch_add(1, Ordering::Relaxed) + 1);
        match self.emails.entry(draft.email().to_owned()) {
            Entry::Occupied(existing) => return Err(StoreViolation::EmailTaken(*existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        let reader = draft.into_reader(id, Utc::now());
        self.readers.insert(id, reader.clone());
        Ok(reader)
    }

    /// Applies a validated draft to an existing reader, re-claiming the
    /// email address when it changed.
    pub fn update_reader(&self, id: ReaderId, draft: &ReaderDraft) -> Result<Reader, StoreViolation> {
        // The email swap happens under the row guard. A concurrent delete
        // or second update of the same reader serializes behind it, so a
        // loser can never leave an address claimed by nobody.
        let mut reader = self
            .readers
            .get_mut(&id)
            .ok_or(StoreViolation::MissingReader)?;
        if draft.email() != reader.email {
            match self.emails.entry(draft.email().to_owned()) {
                Entry::Occupied(existing) if *existing.get() != id => {
                    return Err(StoreViolation::EmailTaken(*existing.get()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove_if(&reader.email, |_, owner| *owner == id);
        }
        reader.name = draft.name().to_owned();
        reader.email = draft.email().to_owned();
        reader.updated_at = Utc::now();
        Ok(reader.clone())
    }

    /// Removes a reader, releasing their email and cascading to all
    /// reservations referencing them.
    pub fn delete_reader(&self, id: ReaderId) -> Result<(), StoreViolation> {
        let (_, reader) = self
            .readers
            .remove(&id)
            .ok_or(StoreViolation::MissingReader)?;
        self.emails.remove_if(&reader.email, |_, owner| *owner == id);
        let doomed: Vec<ReservationId> = self
            .reservations
            .iter()
            .filter(|r| r.reader_id == id)
            .map(|r| r.id)
            .collect();
        for reservation_id in doomed {
            self.remove_reservation_row(reservation_id);
        }
        Ok(())
    }

    pub fn get_reader(&self, id: ReaderId) -> Option<Reader> {
        self.readers.get(&id).map(|r| r.clone())
    }

    pub fn contains_reader(&self, id: ReaderId) -> bool {
        self.readers.contains_key(&id)
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Snapshot of all readers, unordered.
    pub fn readers_snapshot(&self) -> Vec<Reader> {
        self.readers.iter().map(|r| r.clone()).collect()
    }

    /// Looks up a reader by normalized email address.
    pub fn reader_by_email(&self, email: &str) -> Option<Reader> {
        let id = self.emails.get(email).map(|owner| *owner)?;
        self.get_reader(id)
    }

    // === Reservations ===

    /// Creates an active reservation, claiming both constraint slots.
    ///
    /// The book claim is taken first; if the reader is at `limit` active
    /// reservations the book claim is rolled back, so a failed insert
    /// leaves no trace.
    ///
    /// # Errors
    ///
    /// - [`StoreViolation::MissingBook`] / [`StoreViolation::MissingReader`]
    /// - [`StoreViolation::BookTaken`] - Another active reservation holds the book.
    /// - [`StoreViolation::ReaderAtCapacity`] - The reader has `limit` active reservations.
    pub fn insert_reservation(
        &self,
        book_id: BookId,
        reader_id: ReaderId,
        notes: String,
        limit: usize,
    ) -> Result<Reservation, StoreViolation> {
        if !self.books.contains_key(&book_id) {
            return Err(StoreViolation::MissingBook);
        }
        if !self.readers.contains_key(&reader_id) {
            return Err(StoreViolation::MissingReader);
        }

        let id = ReservationId(self.next_reservation_id.fetch_add(1, Ordering::Relaxed) + 1);

        // Atomic check-and-claim on the book slot.
        match self.active_by_book.entry(book_id) {
            Entry::Occupied(existing) => return Err(StoreViolation::BookTaken(*existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        // Claim a reader slot below the ceiling. The guard is dropped
        // before any rollback touches the book index.
        let claimed = {
            let mut slots = self.active_by_reader.entry(reader_id).or_default();
            if slots.len() >= limit {
                false
            } else {
                slots.push(id);
                true
            }
        };
        if !claimed {
            self.active_by_book.remove_if(&book_id, |_, held| *held == id);
            return Err(StoreViolation::ReaderAtCapacity);
        }

        let reservation = Reservation::new(id, book_id, reader_id, notes, Utc::now());
        self.reservations.insert(id, reservation.clone());
        self.log.write().push(id);

        // A concurrent delete may have taken the book or reader between the
        // existence check and the row insert. Revalidate after the row is
        // visible: either the cascade sweep already removed it, or we do.
        if !self.books.contains_key(&book_id) {
            self.remove_reservation_row(id);
            return Err(StoreViolation::MissingBook);
        }
        if !self.readers.contains_key(&reader_id) {
            self.remove_reservation_row(id);
            return Err(StoreViolation::MissingReader);
        }
        Ok(reservation)
    }

    /// Cancels a reservation.
    ///
    /// Returns `Ok(false)` without changes when the reservation is already
    /// inactive. Claims are released while the row guard is still held.
    pub fn cancel(&self, id: ReservationId) -> Result<bool, StoreViolation> {
        let mut row = self
            .reservations
            .get_mut(&id)
            .ok_or(StoreViolation::MissingReservation)?;
        if !row.is_active {
            return Ok(false);
        }
        row.is_active = false;
        row.cancelled_at = Some(Utc::now());
        let (book_id, reader_id) = (row.book_id, row.reader_id);
        self.active_by_book.remove_if(&book_id, |_, held| *held == id);
        if let Some(mut slots) = self.active_by_reader.get_mut(&reader_id) {
            slots.retain(|held| *held != id);
        }
        Ok(true)
    }

    /// Reactivates a cancelled reservation.
    ///
    /// Returns `Ok(false)` without changes when the reservation is already
    /// active. Only book availability gates reactivation; the reader
    /// ceiling is not re-checked.
    ///
    /// # Errors
    ///
    /// - [`StoreViolation::MissingReservation`]
    /// - [`StoreViolation::BookTaken`] - A different reservation holds the book.
    pub fn reactivate(&self, id: ReservationId) -> Result<bool, StoreViolation> {
        let mut row = self
            .reservations
            .get_mut(&id)
            .ok_or(StoreViolation::MissingReservation)?;
        if row.is_active {
            return Ok(false);
        }
        let book_id = row.book_id;
        match self.active_by_book.entry(book_id) {
            Entry::Occupied(existing) if *existing.get() != id => {
                return Err(StoreViolation::BookTaken(*existing.get()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        row.is_active = true;
        row.cancelled_at = None;
        // The row guard stays held across the slot push. A concurrent
        // cancel must not observe the row active before the reader claim
        // exists, or it would release a claim not yet taken.
        let mut slots = self.active_by_reader.entry(row.reader_id).or_default();
        if !slots.contains(&id) {
            slots.push(id);
        }
        Ok(true)
    }

    pub fn get_reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.reservations.get(&id).map(|r| r.clone())
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    /// Number of active reservations across the whole catalog.
    pub fn active_reservation_count(&self) -> usize {
        self.active_by_book.len()
    }

    /// Snapshot of all reservations, unordered.
    pub fn reservations_snapshot(&self) -> Vec<Reservation> {
        self.reservations.iter().map(|r| r.clone()).collect()
    }

    // === Availability reads ===

    /// True iff no active reservation references the book.
    pub fn is_book_available(&self, book_id: BookId) -> bool {
        !self.active_by_book.contains_key(&book_id)
    }

    /// The single active reservation for a book, if any.
    pub fn current_reservation(&self, book_id: BookId) -> Option<Reservation> {
        let id = self.active_by_book.get(&book_id).map(|held| *held)?;
        self.reservations
            .get(&id)
            .filter(|r| r.is_active)
            .map(|r| r.clone())
    }

    /// All active reservations held by a reader.
    pub fn active_reservations_for(&self, reader_id: ReaderId) -> Vec<Reservation> {
        let ids: Vec<ReservationId> = self
            .active_by_reader
            .get(&reader_id)
            .map(|slots| slots.clone())
            .unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.reservations.get(id).map(|r| r.clone()))
            .filter(|r| r.is_active)
            .collect()
    }

    /// Number of active reservations held by a reader.
    pub fn active_count_for(&self, reader_id: ReaderId) -> usize {
        self.active_by_reader
            .get(&reader_id)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }

    /// Total reservations ever made by a reader, active or not.
    pub fn reservation_count_for(&self, reader_id: ReaderId) -> usize {
        self.reservations
            .iter()
            .filter(|r| r.reader_id == reader_id)
            .count()
    }

    /// The newest reservations, latest first, up to `limit`.
    pub fn recent_reservations(&self, limit: usize) -> Vec<Reservation> {
        let ids: Vec<ReservationId> = {
            let log = self.log.read();
            log.iter().rev().copied().collect()
        };
        ids.into_iter()
            .filter_map(|id| self.reservations.get(&id).map(|r| r.clone()))
            .take(limit)
            .collect()
    }

    /// Drops a reservation row and any claims it holds. Cascade helper.
    fn remove_reservation_row(&self, id: ReservationId) {
        let Some((_, row)) = self.reservations.remove(&id) else {
            return;
        };
        if row.is_active {
            self.active_by_book
                .remove_if(&row.book_id, |_, held| *held == id);
            if let Some(mut slots) = self.active_by_reader.get_mut(&row.reader_id) {
                slots.retain(|held| *held != id);
            }
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
