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

//! Error types for catalog and reservation operations.

use thiserror::Error;

/// Catalog operation errors.
///
/// Every error is scoped to the single operation that produced it; a failed
/// operation leaves no partial writes behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Referenced book id does not exist
    #[error("book not found")]
    BookNotFound,

    /// Referenced reader id does not exist
    #[error("reader not found")]
    ReaderNotFound,

    /// Referenced reservation id does not exist
    #[error("reservation not found")]
    ReservationNotFound,

    /// Title is empty or too short after trimming
    #[error("title must have at least 2 characters")]
    InvalidTitle,

    /// Author is empty or too short after trimming
    #[error("author must have at least 2 characters")]
    InvalidAuthor,

    /// Publication year outside [1000, current year]
    #[error("publication year {0} is out of range")]
    YearOutOfRange(i32),

    /// Reader name is too short or consists only of digits
    #[error("name must have at least 2 characters and cannot be only digits")]
    InvalidName,

    /// Email address is malformed
    #[error("malformed email address")]
    InvalidEmail,

    /// Email address is already registered to another reader
    #[error("email address is already registered")]
    DuplicateEmail,

    /// The book already carries an active reservation
    #[error("book is already reserved by {reader}")]
    BookAlreadyReserved { reader: String },

    /// The reader is at their active-reservation ceiling
    #[error("reader already has an active reservation")]
    ReaderAlreadyReserved,

    /// Deletion refused while an active reservation exists
    #[error("an active reservation exists")]
    ActiveReservationExists,
}
