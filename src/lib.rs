//! storeapi: an in-memory key-value store served over HTTP, snapshotted to
//! disk on a timer, next to a read-only aggregation over count records kept
//! in MongoDB.
//!
//! - [`state::KvStore`] holds the map; [`persistence`] hydrates it at startup
//!   and runs the cancellable autosave loop.
//! - [`storage::RecordRepository`] is the aggregation seam, backed by
//!   [`storage::MongoRecordRepository`] in production.
//! - [`app::build_app`] wires both behind axum.

pub mod app;
pub mod config;
pub mod errors;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
