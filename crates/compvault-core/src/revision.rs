use serde::{Deserialize, Serialize};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PATH: &str = "components.json";

/// Where the collection lives: one file on one branch of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl StoreLocation {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_string(),
            path: DEFAULT_PATH.to_string(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}:{}", self.owner, self.repo, self.branch, self.path)
    }
}

/// Last-known revision token of the remote file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RevisionState {
    /// Nothing read yet.
    #[default]
    Unknown,
    /// Read succeeded and the file does not exist.
    Absent,
    /// Read or write succeeded; writes must carry this token.
    Known(String),
}

impl RevisionState {
    /// Token to send as the write precondition, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Known(sha) => Some(sha),
            Self::Unknown | Self::Absent => None,
        }
    }
}

/// Location plus revision state. Owned by a single session; only the store
/// adapter moves the state, and only after a successful remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHandle {
    pub location: StoreLocation,
    pub revision: RevisionState,
}

impl StoreHandle {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            revision: RevisionState::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_starts_unknown_with_defaults() {
        let handle = StoreHandle::new(StoreLocation::new("acme", "components"));
        assert_eq!(handle.revision, RevisionState::Unknown);
        assert_eq!(handle.location.branch, "main");
        assert_eq!(handle.location.path, "components.json");
        assert_eq!(
            handle.location.to_string(),
            "acme/components@main:components.json"
        );
    }

    #[test]
    fn only_known_state_yields_a_token() {
        assert_eq!(RevisionState::Unknown.token(), None);
        assert_eq!(RevisionState::Absent.token(), None);
        assert_eq!(RevisionState::Known("abc".into()).token(), Some("abc"));
    }
}
