use thiserror::Error;

use crate::types::TypeRef;

pub type Result<T> = std::result::Result<T, MixinError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixinError {
    #[error("Argument '{parameter}' refers to {ty:?}, which is not part of this type universe")]
    ForeignType {
        parameter: &'static str,
        ty: TypeRef,
    },

    #[error("Type name '{0}' is declared more than once")]
    DuplicateTypeName(String),

    #[error("Type '{referenced}' referenced by '{from}' is not declared")]
    UndeclaredType { from: String, referenced: String },

    #[error("Mixin {mixin:?} is configured more than once for the same target")]
    DuplicateMixin { mixin: TypeRef },

    #[error("A class context for {target:?} was supplied more than once")]
    DuplicateClassContext { target: TypeRef },

    #[error(
        "Conflicting configurations for mixin {mixin:?} inherited by {target:?} \
         (from {first:?} and {second:?})"
    )]
    ConflictingMixins {
        target: TypeRef,
        mixin: TypeRef,
        first: TypeRef,
        second: TypeRef,
    },

    #[error("Inheritance cycle detected while resolving {ty:?}")]
    InheritanceCycle { ty: TypeRef },

    #[error("Inheritance resolution for {ty:?} exceeded the maximum depth of {max_depth}")]
    InheritanceTooDeep { ty: TypeRef, max_depth: usize },

    #[error("Unsupported operation: {operation} on a read-only class context collection")]
    UnsupportedOperation { operation: &'static str },
}
