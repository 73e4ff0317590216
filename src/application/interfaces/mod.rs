mod fragment_decoder;
mod fragment_source;
mod implementor_registry;

pub use fragment_decoder::*;
pub use fragment_source::*;
pub use implementor_registry::*;
