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

use biblio_engine_rs::{BookId, Engine, ReaderId, ReservationId};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Biblio Engine - Process catalog operation CSV files
///
/// Reads catalog operations from a CSV file, replays them through the
/// reservation engine, and writes the final reservation table to stdout.
#[derive(Parser, Debug)]
#[command(name = "biblio-engine-rs")]
#[command(about = "A library reservation engine that processes operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,book,reader,reservation,title,author,year,name,email,notes
    /// Example: cargo run -- operations.csv > reservations.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Active reservations a single reader may hold
    #[arg(long, default_value_t = 1)]
    reservation_limit: usize,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Replay operations from CSV
    let engine = match process_operations(BufReader::new(file), args.reservation_limit) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_reservations(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, book, reader, reservation, title, author, year, name, email, notes`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    book: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    reader: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    reservation: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year: Option<i32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// One engine operation parsed from a CSV row.
#[derive(Debug)]
enum Command {
    AddBook { title: String, author: String, year: i32 },
    AddReader { name: String, email: String },
    Reserve { book: BookId, reader: ReaderId, notes: String },
    Cancel(ReservationId),
    Reactivate(ReservationId),
}

impl CsvRecord {
    /// Converts a CSV record into a Command.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_command(self) -> Option<Command> {
        match self.op.to_lowercase().as_str() {
            "add_book" => Some(Command::AddBook {
                title: self.title?,
                author: self.author?,
                year: self.year?,
            }),
            "add_reader" => Some(Command::AddReader {
                name: self.name?,
                email: self.email?,
            }),
            "reserve" => Some(Command::Reserve {
                book: BookId(self.book?),
                reader: ReaderId(self.reader?),
                notes: self.notes.unwrap_or_default(),
            }),
            "cancel" => Some(Command::Cancel(ReservationId(self.reservation?))),
            "reactivate" => Some(Command::Reactivate(ReservationId(self.reservation?))),
            _ => None,
        }
    }
}

fn apply(engine: &Engine, command: Command) -> Result<(), biblio_engine_rs::CatalogError> {
    match command {
        Command::AddBook { title, author, year } => {
            engine.add_book(&title, &author, year)?;
        }
        Command::AddReader { name, email } => {
            engine.add_reader(&name, &email)?;
        }
        Command::Reserve { book, reader, notes } => {
            engine.create_reservation(book, reader, &notes)?;
        }
        Command::Cancel(id) => {
            engine.cancel_reservation(id)?;
        }
        Command::Reactivate(id) => {
            engine.reactivate_reservation(id)?;
        }
    }
    Ok(())
}

/// Replay operations from a CSV reader.
///
/// Uses streaming parsing so arbitrarily large operation files never load
/// fully into memory. Malformed rows and rejected operations are skipped
/// (logged in debug builds); ids are allocated sequentially from 1, so
/// scripted inputs can reference entities they created earlier.
///
/// # CSV Format
///
/// Expected columns: `op, book, reader, reservation, title, author, year, name, email, notes`
/// - `op`: Operation (add_book, add_reader, reserve, cancel, reactivate)
/// - `book` / `reader` / `reservation`: Numeric ids for the referencing ops
/// - `title`, `author`, `year`: add_book fields
/// - `name`, `email`: add_reader fields
/// - `notes`: Optional free text for reserve
///
/// # Example
///
/// ```csv
/// op,book,reader,reservation,title,author,year,name,email,notes
/// add_book,,,,Dune,Frank Herbert,1965,,,
/// add_reader,,,,,,,Ada Lovelace,ada@example.com,
/// reserve,1,1,,,,,,,holiday pick
/// cancel,,,1,,,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual operation errors don't stop processing.
pub fn process_operations<R: Read>(reader: R, limit: usize) -> Result<Engine, csv::Error> {
    let engine = Engine::with_reservation_limit(limit);

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " reserve "
        .flexible(true) // Allow short rows for ops with few fields
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(command) = record.into_command() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                    continue;
                };

                if let Err(_e) = apply(&engine, command) {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping rejected operation: {}", _e);
                }
            }
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                continue;
            }
        }
    }

    Ok(engine)
}

/// Write the reservation table to a CSV writer, ordered by id.
///
/// # CSV Format
///
/// Columns: `id, book_id, reader_id, reserved_at, is_active, cancelled_at, notes`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_reservations<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut reservations = engine.store().reservations_snapshot();
    reservations.sort_by_key(|r| r.id);
    for reservation in reservations {
        wtr.serialize(&reservation)?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_engine_rs::{BookId, ReservationId};
    use std::io::Cursor;

    const HEADER: &str = "op,book,reader,reservation,title,author,year,name,email,notes\n";

    fn ops(rows: &str) -> Cursor<String> {
        Cursor::new(format!("{HEADER}{rows}"))
    }

    #[test]
    fn parse_add_book_and_reader() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         add_reader,,,,,,,Ada Lovelace,ada@example.com,\n");

        let engine = process_operations(input, 1).unwrap();

        let book = engine.get_book(BookId(1)).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.year, 1965);
        let reader = engine.get_reader(biblio_engine_rs::ReaderId(1)).unwrap();
        assert_eq!(reader.email, "ada@example.com");
    }

    #[test]
    fn parse_reserve_sequence() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         add_reader,,,,,,,Ada Lovelace,ada@example.com,\n\
                         reserve,1,1,,,,,,,holiday pick\n");

        let engine = process_operations(input, 1).unwrap();

        let reservation = engine.get_reservation(ReservationId(1)).unwrap();
        assert!(reservation.is_active);
        assert_eq!(reservation.notes, "holiday pick");
        assert!(!engine.is_book_available(BookId(1)).unwrap());
    }

    #[test]
    fn parse_cancel_and_reactivate() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         add_reader,,,,,,,Ada Lovelace,ada@example.com,\n\
                         reserve,1,1,,,,,,,\n\
                         cancel,,,1,,,,,,\n\
                         reactivate,,,1,,,,,,\n");

        let engine = process_operations(input, 1).unwrap();

        let reservation = engine.get_reservation(ReservationId(1)).unwrap();
        assert!(reservation.is_active);
        assert_eq!(reservation.cancelled_at, None);
    }

    #[test]
    fn conflicting_reserve_is_skipped() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         add_reader,,,,,,,Ada Lovelace,ada@example.com,\n\
                         add_reader,,,,,,,Grace Hopper,grace@example.com,\n\
                         reserve,1,1,,,,,,,\n\
                         reserve,1,2,,,,,,,\n");

        let engine = process_operations(input, 1).unwrap();

        // Second reserve lost; the book still belongs to reader 1
        let current = engine.current_reservation(BookId(1)).unwrap().unwrap();
        assert_eq!(current.reader_id, biblio_engine_rs::ReaderId(1));
        assert_eq!(engine.store().reservation_count(), 1);
    }

    #[test]
    fn skip_malformed_rows() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         bogus,row,data\n\
                         add_book,,,,Neuromancer,William Gibson,1984,,,\n");

        let engine = process_operations(input, 1).unwrap();

        assert_eq!(engine.store().book_count(), 2);
    }

    #[test]
    fn invalid_year_is_skipped() {
        let input = ops("add_book,,,,Future,Time Traveller,3000,,,\n");

        let engine = process_operations(input, 1).unwrap();

        assert_eq!(engine.store().book_count(), 0);
    }

    #[test]
    fn honors_reservation_limit() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         add_book,,,,Neuromancer,William Gibson,1984,,,\n\
                         add_reader,,,,,,,Ada Lovelace,ada@example.com,\n\
                         reserve,1,1,,,,,,,\n\
                         reserve,2,1,,,,,,,\n");

        let engine = process_operations(input, 5).unwrap();

        // With a ceiling of 5 the same reader may hold both books
        assert_eq!(engine.store().active_reservation_count(), 2);
    }

    #[test]
    fn write_reservations_to_csv() {
        let input = ops("add_book,,,,Dune,Frank Herbert,1965,,,\n\
                         add_reader,,,,,,,Ada Lovelace,ada@example.com,\n\
                         reserve,1,1,,,,,,,\n");
        let engine = process_operations(input, 1).unwrap();

        let mut output = Vec::new();
        write_reservations(&engine, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("id,book_id,reader_id,reserved_at,is_active,cancelled_at,notes"));
        assert!(output_str.contains("1,1,1,"));
    }
}
