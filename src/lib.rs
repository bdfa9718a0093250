// reviewlens: adjective topic modeling for app store reviews
//
// This is the library root. Each module corresponds to a major subsystem:
// the topic pipeline, the review store, import, and the outer surfaces.

pub mod config;
pub mod db;
pub mod ingest;
pub mod output;
pub mod status;
pub mod topics;

#[cfg(feature = "web")]
pub mod web;
