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

//! Read-side reporting over committed catalog state.
//!
//! [`Reports`] aggregates snapshots for presentation-layer callers: global
//! counts, recent activity, per-entity histories, and simple groupings for
//! statistics pages. Everything here is read-only and carries no invariant
//! obligations beyond reflecting committed state.

use crate::base::{BookId, ReaderId};
use crate::book::Book;
use crate::reader::Reader;
use crate::reservation::Reservation;
use crate::store::CatalogStore;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Global catalog counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_books: usize,
    pub total_readers: usize,
    pub total_reservations: usize,
    pub active_reservations: usize,
    pub available_books: usize,
}

/// Reservation count for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

/// Read-only reports over a catalog store.
pub struct Reports<'a> {
    store: &'a CatalogStore,
}

impl<'a> Reports<'a> {
    pub fn new(store: &'a CatalogStore) -> Self {
        Self { store }
    }

    /// Global counters for dashboards.
    pub fn stats(&self) -> CatalogStats {
        let total_books = self.store.book_count();
        let active_reservations = self.store.active_reservation_count();
        CatalogStats {
            total_books,
            total_readers: self.store.reader_count(),
            total_reservations: self.store.reservation_count(),
            active_reservations,
            available_books: total_books.saturating_sub(active_reservations),
        }
    }

    /// The newest reservations, latest first.
    pub fn recent_reservations(&self, limit: usize) -> Vec<Reservation> {
        self.store.recent_reservations(limit)
    }

    /// Reservation history of one book, newest first.
    pub fn book_history(&self, book_id: BookId) -> Vec<Reservation> {
        let mut history: Vec<Reservation> = self
            .store
            .reservations_snapshot()
            .into_iter()
            .filter(|r| r.book_id == book_id)
            .collect();
        sort_newest_first(&mut history);
        history
    }

    /// Reservation history of one reader, newest first.
    pub fn reader_history(&self, reader_id: ReaderId) -> Vec<Reservation> {
        let mut history: Vec<Reservation> = self
            .store
            .reservations_snapshot()
            .into_iter()
            .filter(|r| r.reader_id == reader_id)
            .collect();
        sort_newest_first(&mut history);
        history
    }

    /// Books ranked by total reservation count, descending. Books that were
    /// never reserved are omitted.
    pub fn popular_books(&self, limit: usize) -> Vec<(Book, usize)> {
        let counts = self.reservation_counts_by(|r| r.book_id);
        let mut ranked: Vec<(Book, usize)> = self
            .store
            .books_snapshot()
            .into_iter()
            .filter_map(|book| counts.get(&book.id).map(|&count| (book, count)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.title.cmp(&b.0.title)));
        ranked.truncate(limit);
        ranked
    }

    /// Readers ranked by total reservation count, descending. Readers that
    /// never reserved are omitted.
    pub fn busiest_readers(&self, limit: usize) -> Vec<(Reader, usize)> {
        let counts = self.reservation_counts_by(|r| r.reader_id);
        let mut ranked: Vec<(Reader, usize)> = self
            .store
            .readers_snapshot()
            .into_iter()
            .filter_map(|reader| counts.get(&reader.id).map(|&count| (reader, count)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
        ranked.truncate(limit);
        ranked
    }

    /// Number of reservations made at or after `cutoff`.
    pub fn reservations_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.store
            .reservations_snapshot()
            .iter()
            .filter(|r| r.reserved_at >= cutoff)
            .count()
    }

    /// Reservation counts per calendar month within the trailing window,
    /// oldest month first.
    pub fn monthly_counts(&self, window_days: i64) -> Vec<MonthlyCount> {
        let cutoff = Utc::now() - Duration::days(window_days);
        let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for reservation in self.store.reservations_snapshot() {
            if reservation.reserved_at >= cutoff {
                let key = (
                    reservation.reserved_at.year(),
                    reservation.reserved_at.month(),
                );
                *buckets.entry(key).or_insert(0) += 1;
            }
        }
        buckets
            .into_iter()
            .map(|((year, month), count)| MonthlyCount { year, month, count })
            .collect()
    }

    fn reservation_counts_by<K: std::hash::Hash + Eq>(
        &self,
        key: impl Fn(&Reservation) -> K,
    ) -> HashMap<K, usize> {
        let mut counts = HashMap::new();
        for reservation in self.store.reservations_snapshot() {
            *counts.entry(key(&reservation)).or_insert(0) += 1;
        }
        counts
    }
}

/// Newest first by timestamp; ties broken by id so ordering is total.
fn sort_newest_first(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| {
        b.reserved_at
            .cmp(&a.reserved_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
