//! Image reference resolution.

use std::convert::Infallible;
use std::str::FromStr;

/// A resolved image reference.
///
/// Only Docker Hub style `namespace/repository` names are understood; the tag
/// is always [`ImageReference::DEFAULT_TAG`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Namespace (`library` for official images).
    pub namespace: String,
    /// Repository name within the namespace.
    pub repository: String,
    /// Tag to pull.
    pub tag: String,
}

impl ImageReference {
    /// Namespace of official images.
    pub const DEFAULT_NAMESPACE: &'static str = "library";
    /// Default tag.
    pub const DEFAULT_TAG: &'static str = "latest";

    /// Resolve a user-supplied image name.
    ///
    /// Examples:
    /// - `alpine` -> `library/alpine`
    /// - `myuser/myapp` -> `myuser/myapp`
    ///
    /// Nothing is validated here; a bad name surfaces as a registry error.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let (namespace, repository) = match reference.split_once('/') {
            Some((namespace, repository)) => (namespace.to_string(), repository.to_string()),
            None => (Self::DEFAULT_NAMESPACE.to_string(), reference.to_string()),
        };

        Self {
            namespace,
            repository,
            tag: Self::DEFAULT_TAG.to_string(),
        }
    }

    /// The canonical `namespace/repository` string used in registry URLs.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/{}", self.namespace, self.repository)
    }
}

impl FromStr for ImageReference {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.repository)
    }
}
