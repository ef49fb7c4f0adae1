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

//! Reservation engine.
//!
//! The [`Engine`] is the only component that creates or transitions
//! reservations. Each operation runs its pre-checks and its write against
//! the shared [`CatalogStore`], whose claim indexes are the authoritative
//! guard against check-then-act races: two concurrent creates for the same
//! book both pass the optimistic pre-check at most once, and the loser is
//! rejected at claim time with a [`StoreViolation`] that the engine
//! translates back into the same error kind the pre-check would have
//! produced.
//!
//! # Invariants
//!
//! - A book carries at most one active reservation at any time.
//! - A reader holds at most `reservation_limit` active reservations via the
//!   create path (reactivation bypasses the ceiling; only book availability
//!   gates it).
//! - `cancelled_at` is set exactly while a reservation is cancelled.

use crate::base::{BookId, ReaderId, ReservationId};
use crate::book::{Book, BookDraft};
use crate::error::CatalogError;
use crate::query::Reports;
use crate::reader::{Reader, ReaderDraft};
use crate::reservation::Reservation;
use crate::store::{CatalogStore, StoreViolation};

/// Active reservations a reader may hold through the create path.
pub const DEFAULT_RESERVATION_LIMIT: usize = 1;

/// Reservation engine over a shared catalog store.
pub struct Engine {
    store: CatalogStore,
    reservation_limit: usize,
}

impl Engine {
    /// Creates an engine with the default per-reader ceiling of one active
    /// reservation.
    pub fn new() -> Self {
        Self::with_reservation_limit(DEFAULT_RESERVATION_LIMIT)
    }

    /// Creates an engine with a custom per-reader ceiling (minimum 1).
    pub fn with_reservation_limit(limit: usize) -> Self {
        Self {
            store: CatalogStore::new(),
            reservation_limit: limit.max(1),
        }
    }

    pub fn reservation_limit(&self) -> usize {
        self.reservation_limit
    }

    /// Direct read access to the underlying store.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Read-side reports over the current committed state.
    pub fn reports(&self) -> Reports<'_> {
        Reports::new(&self.store)
    }

    // === Catalog management ===

    /// Validates and adds a book.
    pub fn add_book(&self, title: &str, author: &str, year: i32) -> Result<Book, CatalogError> {
        let draft = BookDraft::new(title, author, year)?;
        Ok(self.store.insert_book(draft))
    }

    /// Validates and updates an existing book.
    pub fn update_book(
        &self,
        id: BookId,
        title: &str,
        author: &str,
        year: i32,
    ) -> Result<Book, CatalogError> {
        let draft = BookDraft::new(title, author, year)?;
        self.store.update_book(id, &draft).map_err(|v| self.translate(v))
    }

    /// Deletes a book and its reservation history.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::BookNotFound`]
    /// - [`CatalogError::ActiveReservationExists`] - The book is currently reserved.
    pub fn delete_book(&self, id: BookId) -> Result<(), CatalogError> {
        if !self.store.contains_book(id) {
            return Err(CatalogError::BookNotFound);
        }
        if !self.store.is_book_available(id) {
            return Err(CatalogError::ActiveReservationExists);
        }
        self.store.delete_book(id).map_err(|v| self.translate(v))
    }

    pub fn get_book(&self, id: BookId) -> Option<Book> {
        self.store.get_book(id)
    }

    /// Validates and registers a reader.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidName`] / [`CatalogError::InvalidEmail`]
    /// - [`CatalogError::DuplicateEmail`] - Normalized email already registered.
    pub fn add_reader(&self, name: &str, email: &str) -> Result<Reader, CatalogError> {
        let draft = ReaderDraft::new(name, email)?;
        self.store.insert_reader(draft).map_err(|v| self.translate(v))
    }

    /// Validates and updates an existing reader.
    pub fn update_reader(
        &self,
        id: ReaderId,
        name: &str,
        email: &str,
    ) -> Result<Reader, CatalogError> {
        let draft = ReaderDraft::new(name, email)?;
        self.store.update_reader(id, &draft).map_err(|v| self.translate(v))
    }

    /// Deletes a reader and their reservation history.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ReaderNotFound`]
    /// - [`CatalogError::ActiveReservationExists`] - The reader holds an active reservation.
    pub fn delete_reader(&self, id: ReaderId) -> Result<(), CatalogError> {
        if !self.store.contains_reader(id) {
            return Err(CatalogError::ReaderNotFound);
        }
        if self.store.active_count_for(id) > 0 {
            return Err(CatalogError::ActiveReservationExists);
        }
        self.store.delete_reader(id).map_err(|v| self.translate(v))
    }

    pub fn get_reader(&self, id: ReaderId) -> Option<Reader> {
        self.store.get_reader(id)
    }

    pub fn get_reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.store.get_reservation(id)
    }

    // === Reservation lifecycle ===

    /// Creates an active reservation for a book and reader.
    ///
    /// Pre-checks run in order, first failure wins: book exists, reader
    /// exists, book available, reader below the ceiling. The store claim
    /// then re-enforces both uniqueness rules; a concurrent winner shows up
    /// here as a claim rejection and is reported with the same error kinds.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::BookNotFound`] / [`CatalogError::ReaderNotFound`]
    /// - [`CatalogError::BookAlreadyReserved`] - Carries the holding reader's name.
    /// - [`CatalogError::ReaderAlreadyReserved`]
    pub fn create_reservation(
        &self,
        book_id: BookId,
        reader_id: ReaderId,
        notes: &str,
    ) -> Result<Reservation, CatalogError> {
        if !self.store.contains_book(book_id) {
            return Err(CatalogError::BookNotFound);
        }
        if !self.store.contains_reader(reader_id) {
            return Err(CatalogError::ReaderNotFound);
        }
        if let Some(existing) = self.store.current_reservation(book_id) {
            return Err(CatalogError::BookAlreadyReserved {
                reader: self.holder_name(existing.reader_id),
            });
        }
        if self.store.active_count_for(reader_id) >= self.reservation_limit {
            return Err(CatalogError::ReaderAlreadyReserved);
        }
        self.store
            .insert_reservation(book_id, reader_id, notes.trim().to_owned(), self.reservation_limit)
            .map_err(|v| self.translate(v))
    }

    /// Cancels a reservation.
    ///
    /// Returns `Ok(true)` when the reservation was active and is now
    /// cancelled, `Ok(false)` as a no-op when it was already cancelled.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ReservationNotFound`]
    pub fn cancel_reservation(&self, id: ReservationId) -> Result<bool, CatalogError> {
        self.store.cancel(id).map_err(|v| self.translate(v))
    }

    /// Reactivates a cancelled reservation.
    ///
    /// Returns `Ok(true)` on success, `Ok(false)` as a no-op when the
    /// reservation is already active. Unlike creation, reactivation checks
    /// only book availability, never the reader's ceiling.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ReservationNotFound`]
    /// - [`CatalogError::BookAlreadyReserved`] - A different reservation holds the book.
    pub fn reactivate_reservation(&self, id: ReservationId) -> Result<bool, CatalogError> {
        self.store.reactivate(id).map_err(|v| self.translate(v))
    }

    // === Availability evaluator ===

    /// True iff the book exists and carries no active reservation.
    pub fn is_book_available(&self, book_id: BookId) -> Result<bool, CatalogError> {
        if !self.store.contains_book(book_id) {
            return Err(CatalogError::BookNotFound);
        }
        Ok(self.store.is_book_available(book_id))
    }

    /// The single active reservation for a book, if any.
    pub fn current_reservation(
        &self,
        book_id: BookId,
    ) -> Result<Option<Reservation>, CatalogError> {
        if !self.store.contains_book(book_id) {
            return Err(CatalogError::BookNotFound);
        }
        Ok(self.store.current_reservation(book_id))
    }

    /// All active reservations held by a reader.
    pub fn active_reservations(
        &self,
        reader_id: ReaderId,
    ) -> Result<Vec<Reservation>, CatalogError> {
        if !self.store.contains_reader(reader_id) {
            return Err(CatalogError::ReaderNotFound);
        }
        Ok(self.store.active_reservations_for(reader_id))
    }

    /// Total reservations ever made by a reader, active or not.
    pub fn reservation_count(&self, reader_id: ReaderId) -> Result<usize, CatalogError> {
        if !self.store.contains_reader(reader_id) {
            return Err(CatalogError::ReaderNotFound);
        }
        Ok(self.store.reservation_count_for(reader_id))
    }

    /// Supports the deletion-refusal policy one layer above the engine.
    pub fn book_has_active_reservation(&self, book_id: BookId) -> Result<bool, CatalogError> {
        Ok(!self.is_book_available(book_id)?)
    }

    /// Supports the deletion-refusal policy one layer above the engine.
    pub fn reader_has_active_reservation(&self, reader_id: ReaderId) -> Result<bool, CatalogError> {
        if !self.store.contains_reader(reader_id) {
            return Err(CatalogError::ReaderNotFound);
        }
        Ok(self.store.active_count_for(reader_id) > 0)
    }

    // === Violation translation ===

    /// Maps raw store rejections onto caller-facing error kinds. Conflict
    /// violations are enriched with the holding reader's name so callers
    /// can compose messages.
    fn translate(&self, violation: StoreViolation) -> CatalogError {
        match violation {
            StoreViolation::MissingBook => CatalogError::BookNotFound,
            StoreViolation::MissingReader => CatalogError::ReaderNotFound,
            StoreViolation::MissingReservation => CatalogError::ReservationNotFound,
            StoreViolation::BookTaken(existing) => {
                let reader = self
                    .store
                    .get_reservation(existing)
                    .map(|r| self.holder_name(r.reader_id))
                    .unwrap_or_else(|| "another reader".to_owned());
                CatalogError::BookAlreadyReserved { reader }
            }
            StoreViolation::ReaderAtCapacity => CatalogError::ReaderAlreadyReserved,
            StoreViolation::EmailTaken(_) => CatalogError::DuplicateEmail,
        }
    }

    fn holder_name(&self, reader_id: ReaderId) -> String {
        self.store
            .get_reader(reader_id)
            .map(|r| r.name)
            .unwrap_or_else(|| "another reader".to_owned())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
