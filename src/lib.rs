//! Event-pair association statistics for narrative event chains.
//!
//! Predicates are pulled out of dependency-parsed documents, their arguments
//! are resolved through coreference, and co-occurring event pairs are counted
//! and scored with discounted PMI.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod nlp;
pub mod signals;
