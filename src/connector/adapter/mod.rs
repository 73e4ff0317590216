mod fs_fragment_source;
mod in_memory_implementor_registry;
mod json_fragment_decoder;
mod rustdoc_fragment_decoder;

pub use fs_fragment_source::*;
pub use in_memory_implementor_registry::*;
pub use json_fragment_decoder::*;
pub use rustdoc_fragment_decoder::*;
