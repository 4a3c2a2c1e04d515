// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Courier distribution platform.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! via `tokio-rusqlite`. [`SqliteStorage`] implements every repository trait
//! from `courier-core`, plus the administrative operations the CLI uses:
//! campaign activation, sender attachment and the daily counter reset.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use queries::dialogs::DialogRecord;
