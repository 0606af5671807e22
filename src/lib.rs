//! fieldscan - document scanning and field extraction service.
//!
//! Walks folders of PDFs and images, extracts labeled fields through one
//! or more OCR/text engines, evaluates them against critical-field rules,
//! and persists everything in SQLite behind a JSON API and CLI.

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
