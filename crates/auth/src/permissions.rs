use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "templates.write"). The wildcard
/// `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const WILDCARD: Permission = Permission::from_static("*");

pub mod templates {
    use super::Permission;

    pub const WRITE: Permission = Permission::from_static("templates.write");
    pub const LIKE: Permission = Permission::from_static("templates.like");
}

pub mod inventories {
    use super::Permission;

    pub const WRITE: Permission = Permission::from_static("inventories.write");
    pub const LIKE: Permission = Permission::from_static("inventories.like");
}

pub mod discussions {
    use super::Permission;

    pub const POST: Permission = Permission::from_static("discussions.post");
}

pub mod admin {
    use super::Permission;

    pub const READ: Permission = Permission::from_static("admin.read");
}
