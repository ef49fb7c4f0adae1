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

//! Registered readers and their field validation.
//!
//! Email addresses are stored normalized: trimmed and lower-cased. The
//! normalized form is what the store's uniqueness index sees, so
//! `" Ada@Example.COM "` and `"ada@example.com"` are the same address.

use crate::base::ReaderId;
use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub id: ReaderId,
    pub name: String,
    /// Normalized (trimmed, lower-cased) email address, unique per reader.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, normalized input for creating or updating a reader.
#[derive(Debug, Clone)]
pub struct ReaderDraft {
    name: String,
    email: String,
}

impl ReaderDraft {
    /// Validates the name and normalizes the email address.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidName`] - Name shorter than 2 characters or only digits.
    /// - [`CatalogError::InvalidEmail`] - Email is not of the form `local@domain.tld`.
    pub fn new(name: &str, email: &str) -> Result<Self, CatalogError> {
        let name = name.trim();
        if name.chars().count() < 2 || name.chars().all(|c| c.is_ascii_digit()) {
            return Err(CatalogError::InvalidName);
        }
        let email = email.trim().to_lowercase();
        if !is_well_formed_email(&email) {
            return Err(CatalogError::InvalidEmail);
        }
        Ok(Self {
            name: name.to_owned(),
            email,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn into_reader(self, id: ReaderId, now: DateTime<Utc>) -> Reader {
        Reader {
            id,
            name: self.name,
            email: self.email,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Minimal shape check: non-empty local part, a domain with at least one
/// dot-separated label on each side, no whitespace anywhere.
fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty())
}
