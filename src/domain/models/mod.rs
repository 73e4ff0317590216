mod fragment;
mod implementor;
mod implementor_set;
mod ingest_report;
mod interface_id;
mod load_summary;
mod registry_snapshot;

pub use fragment::*;
pub use implementor::*;
pub use implementor_set::*;
pub use ingest_report::*;
pub use interface_id::*;
pub use load_summary::*;
pub use registry_snapshot::*;
