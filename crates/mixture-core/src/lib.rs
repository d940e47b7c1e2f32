//! Mixin configuration model, registry and inheritance resolution for mixture

pub mod class_context;
pub mod config;
pub mod error;
pub mod inheritance;
pub mod mixin_context;
pub mod registry;
pub mod serialization;
pub mod types;

pub use class_context::ClassContext;
pub use config::{EngineConfig, MergePolicy, RegistryConfig, ValidationSettings};
pub use error::{MixinError, Result};
pub use mixin_context::{
    IntroducedMemberVisibility, MixinContext, MixinContextCollection, MixinKind,
};
pub use registry::{ClassContextCollection, ReadOnlyView, RegistryHandle};
pub use types::{TypeDescriptor, TypeRef, TypeSpec, TypeUniverse};
