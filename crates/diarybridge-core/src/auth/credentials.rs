use std::fmt;

/// Login identifier and secret, held only for the duration of one login call.
///
/// Never serialized or persisted; `Debug` redacts the secret.
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        self.identifier.trim()
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Both parts present. Whitespace-only identifiers count as missing.
    pub fn is_complete(&self) -> bool {
        !self.identifier().is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}
