//! Background Tasks Module
//!
//! Contains tasks that run alongside the HTTP server.
//!
//! # Tasks
//! - Ingestion: Saves orders delivered by the message feed

mod ingest;

pub use ingest::{process_message, spawn_ingest_task, FeedReceiver, FeedSender};
