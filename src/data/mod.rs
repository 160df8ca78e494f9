//! Corpus ingestion and the persistent frequency/count tables.

pub mod corpus;
pub mod counts;
pub mod idf;
