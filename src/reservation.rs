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

//! Reservation records.
//!
//! A reservation has exactly two states:
//! - [`Active`] → [`Cancelled`] (via cancel)
//! - [`Cancelled`] → [`Active`] (via reactivate, only while the book has no
//!   other active reservation)
//!
//! [`Active`]: ReservationStatus::Active
//! [`Cancelled`]: ReservationStatus::Cancelled

use crate::base::{BookId, ReaderId, ReservationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reservation of one book by one reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub book_id: BookId,
    pub reader_id: ReaderId,
    /// Set once at creation, never updated.
    pub reserved_at: DateTime<Utc>,
    pub is_active: bool,
    /// `Some` exactly while the reservation sits in the cancelled state;
    /// cleared again on reactivation.
    pub cancelled_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl Reservation {
    pub(crate) fn new(
        id: ReservationId,
        book_id: BookId,
        reader_id: ReaderId,
        notes: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            book_id,
            reader_id,
            reserved_at: now,
            is_active: true,
            cancelled_at: None,
            notes,
        }
    }

    pub fn status(&self) -> ReservationStatus {
        if self.is_active {
            ReservationStatus::Active
        } else {
            ReservationStatus::Cancelled
        }
    }
}

/// The two lifecycle states of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Active,
    Cancelled,
}
