mod ingest_fragment;
mod load_fragments;
mod query_implementors;

pub use ingest_fragment::*;
pub use load_fragments::*;
pub use query_implementors::*;
