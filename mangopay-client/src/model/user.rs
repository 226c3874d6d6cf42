//! References to users.
//!
//! Users themselves are managed elsewhere; operations only need their
//! identifier.

/// Anything that owns money on the platform: a natural or legal user.
pub trait Consumer: Send + Sync {
    /// Identifier of the user.
    fn consumer_id(&self) -> &str;
}

/// A user known by identifier only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserRef {
    id: String,
}

impl UserRef {
    /// Creates a reference to an existing user.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Identifier of the user.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Consumer for UserRef {
    fn consumer_id(&self) -> &str {
        &self.id
    }
}

impl Consumer for String {
    fn consumer_id(&self) -> &str {
        self
    }
}
