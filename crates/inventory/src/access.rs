//! Ownership-based access policy.

use shelfwise_core::{DomainError, DomainResult, UserId};

/// A resource with an owner and a public/private flag.
///
/// - private: visible and mutable only by its owner
/// - public: readable by anyone, mutable only by its owner
pub trait Shared {
    fn owner_id(&self) -> UserId;

    fn is_public(&self) -> bool;

    fn can_read(&self, viewer: UserId) -> bool {
        self.is_public() || self.owner_id() == viewer
    }

    fn can_write(&self, viewer: UserId) -> bool {
        self.owner_id() == viewer
    }

    fn ensure_readable(&self, viewer: UserId) -> DomainResult<()> {
        if self.can_read(viewer) {
            Ok(())
        } else {
            Err(DomainError::forbidden("this inventory is private"))
        }
    }

    fn ensure_writable(&self, viewer: UserId) -> DomainResult<()> {
        if self.can_write(viewer) {
            Ok(())
        } else {
            Err(DomainError::forbidden("only the owner can modify this inventory"))
        }
    }
}
