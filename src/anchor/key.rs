//! Attachment identity

use std::fmt;

use crate::errors::{AnchorError, Result};
use crate::scene::NodeId;

/// Identifies one attachment: an anchored node plus a role such as
/// `"start"` or `"end"`.
///
/// The node is compared by identity (its arena handle), never by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchorKey {
    anchored: NodeId,
    role: String,
}

impl AnchorKey {
    pub fn new(anchored: NodeId, role: impl Into<String>) -> Result<Self> {
        let role = role.into();
        if role.is_empty() {
            return Err(AnchorError::EmptyRole);
        }
        Ok(AnchorKey { anchored, role })
    }

    pub fn anchored(&self) -> NodeId {
        self.anchored
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

impl fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.anchored, self.role)
    }
}
