pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    FragmentDecoder, FragmentSource, ImplementorRegistry, IngestFragmentUseCase,
    LoadFragmentsUseCase, QueryImplementorsUseCase, DEFAULT_LOAD_CONCURRENCY,
};

pub use cli::*;

pub use connector::{
    FsFragmentSource, InMemoryImplementorRegistry, JsonFragmentDecoder, RustdocFragmentDecoder,
};

pub use domain::{
    DomainError, Fragment, FragmentFormat, ImplementedInterface, ImplementorDescriptor,
    ImplementorLookup, ImplementorSet, InterfaceId, LoadSummary, RawFragment, RegistrationId,
    RegistrySnapshot, RegistryStats,
};
