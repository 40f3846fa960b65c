use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named capability held by a login user, such as `"admin"`.
///
/// `"*"` satisfies every check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Lets the holder cancel confirmed sales even when the branch forbids it.
    pub const ADMIN: Permission = Permission(Cow::Borrowed("admin"));

    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Self::WILDCARD
    }

    /// True when a user holding `self` passes a check for `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        self.is_wildcard() || self == required
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
