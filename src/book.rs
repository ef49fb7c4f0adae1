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

//! Book catalog entries and field validation.

use crate::base::BookId;
use crate::error::CatalogError;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Oldest publication year the catalog accepts.
pub const MIN_PUBLICATION_YEAR: i32 = 1000;

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, normalized input for creating or updating a book.
///
/// Construction is the only validation point: a `BookDraft` always holds a
/// trimmed title and author of at least two characters and a year within
/// `[MIN_PUBLICATION_YEAR, current year]`.
#[derive(Debug, Clone)]
pub struct BookDraft {
    title: String,
    author: String,
    year: i32,
}

impl BookDraft {
    /// Validates and normalizes book fields.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidTitle`] - Title shorter than 2 characters after trimming.
    /// - [`CatalogError::InvalidAuthor`] - Author shorter than 2 characters after trimming.
    /// - [`CatalogError::YearOutOfRange`] - Year before 1000 or after the current year.
    pub fn new(title: &str, author: &str, year: i32) -> Result<Self, CatalogError> {
        let title = title.trim();
        if title.chars().count() < 2 {
            return Err(CatalogError::InvalidTitle);
        }
        let author = author.trim();
        if author.chars().count() < 2 {
            return Err(CatalogError::InvalidAuthor);
        }
        let current_year = Utc::now().year();
        if year < MIN_PUBLICATION_YEAR || year > current_year {
            return Err(CatalogError::YearOutOfRange(year));
        }
        Ok(Self {
            title: title.to_owned(),
            author: author.to_owned(),
            year,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub(crate) fn into_book(self, id: BookId, now: DateTime<Utc>) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply_to(&self, book: &mut Book, now: DateTime<Utc>) {
        book.title = self.title.clone();
        book.author = self.author.clone();
        book.year = self.year;
        book.updated_at = now;
    }
}
