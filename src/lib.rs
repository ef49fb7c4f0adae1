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

//! # Biblio Engine
//!
//! This library provides a reservation consistency engine for a small
//! library catalog: books, readers, and the reservation lifecycle
//! (create, cancel, reactivate) under concurrent callers.
//!
//! ## Core Components
//!
//! - [`Engine`]: Reservation operations and the availability evaluator
//! - [`CatalogStore`]: Concurrent storage with constraint-bearing indexes
//! - [`Reports`]: Read-side statistics and histories
//! - [`CatalogError`]: Error kinds for catalog and reservation failures
//!
//! ## Example
//!
//! ```
//! use biblio_engine_rs::Engine;
//!
//! let engine = Engine::new();
//!
//! let book = engine.add_book("The Name of the Rose", "Umberto Eco", 1980).unwrap();
//! let reader = engine.add_reader("Ada Lovelace", "ada@example.com").unwrap();
//!
//! // Reserve the book
//! let reservation = engine.create_reservation(book.id, reader.id, "").unwrap();
//! assert!(reservation.is_active);
//! assert!(!engine.is_book_available(book.id).unwrap());
//!
//! // Cancel and the book is free again
//! assert!(engine.cancel_reservation(reservation.id).unwrap());
//! assert!(engine.is_book_available(book.id).unwrap());
//! ```
//!
//! ## Thread Safety
//!
//! The store keeps one active reservation per book through an atomically
//! claimed index, so any number of callers may invoke engine operations in
//! parallel: concurrent creates for the same book resolve to exactly one
//! winner.

pub mod base;
pub mod book;
mod engine;
pub mod error;
pub mod query;
pub mod reader;
pub mod reservation;
pub mod store;

pub use base::{BookId, ReaderId, ReservationId};
pub use book::{Book, BookDraft, MIN_PUBLICATION_YEAR};
pub use engine::{DEFAULT_RESERVATION_LIMIT, Engine};
pub use error::CatalogError;
pub use query::{CatalogStats, MonthlyCount, Reports};
pub use reader::{Reader, ReaderDraft};
pub use reservation::{Reservation, ReservationStatus};
pub use store::{CatalogStore, StoreViolation};
