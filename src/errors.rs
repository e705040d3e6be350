//! Error types with diagnostics using miette
//!
//! Only caller bugs and strategy misconfiguration surface as errors. A
//! position that cannot be computed right now is not an error: the anchor
//! simply leaves its cache untouched.

use miette::Diagnostic;
use thiserror::Error;

use crate::anchor::AnchorKey;
use crate::anchor::parameter::ParameterType;
use crate::scene::NodeId;

pub type Result<T, E = AnchorError> = std::result::Result<T, E>;

// ============================================================================
// Anchor Errors
// ============================================================================

/// Errors reported by [`Anchor`](crate::Anchor) operations
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum AnchorError {
    #[error("key {key} is already attached")]
    #[diagnostic(
        code(diagram_anchors::anchor::already_attached),
        help("detach the key before attaching it again")
    )]
    AlreadyAttached { key: AnchorKey },

    #[error("key {key} is not attached")]
    #[diagnostic(code(diagram_anchors::anchor::not_attached))]
    NotAttached { key: AnchorKey },

    #[error("anchor key role must not be empty")]
    #[diagnostic(code(diagram_anchors::anchor::empty_role))]
    EmptyRole,

    #[error("node {node:?} does not exist in the scene")]
    #[diagnostic(code(diagram_anchors::scene::unknown_node))]
    UnknownNode { node: NodeId },

    #[error("node {node:?} cannot become a child of its own descendant")]
    #[diagnostic(code(diagram_anchors::scene::cyclic_parent))]
    CyclicParent { node: NodeId },

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------
    #[error("parameter {ty} is per-anchored and needs an anchor key")]
    #[diagnostic(
        code(diagram_anchors::parameter::missing_key_context),
        help("pass the key whose parameter should be accessed")
    )]
    MissingKeyContext { ty: ParameterType },

    #[error("parameter {ty} is bound and cannot be set manually")]
    #[diagnostic(
        code(diagram_anchors::parameter::bound),
        help("unbind the parameter first")
    )]
    ParameterBound { ty: ParameterType },

    #[error("binding {binding} cannot provide a value for parameter {ty}")]
    #[diagnostic(code(diagram_anchors::parameter::binding_type_mismatch))]
    BindingTypeMismatch {
        ty: ParameterType,
        binding: &'static str,
    },

    // ------------------------------------------------------------------------
    // Strategy configuration
    // ------------------------------------------------------------------------
    #[error("strategy {strategy} requires {ty} but supplies no default for it")]
    #[diagnostic(
        code(diagram_anchors::strategy::missing_parameter_factory),
        help("every required parameter type needs a factory in the strategy")
    )]
    MissingParameterFactory {
        strategy: &'static str,
        ty: ParameterType,
    },
}
