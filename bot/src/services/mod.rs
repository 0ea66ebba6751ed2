pub mod ingest;
pub mod result_matcher;
