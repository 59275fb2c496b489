/*!
 * Database module for persistent storage of jobs, segments and translations.
 *
 * This module provides SQLite-based persistence for:
 * - Transcription jobs with their terminal status and failure classification
 * - Reconciled transcript segments with alternatives and confidence
 * - Per-language translations keyed uniquely by (segment, language)
 */

// Allow dead code - database types are for library consumers
#![allow(dead_code)]

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
