//! Remote persistence for the encrypted collection: a GitHub contents
//! client and the adapter that tracks the file's revision token.

pub mod github;
pub mod remote;

pub use github::{GitHubConfig, GitHubContents};
pub use remote::{Commit, RemoteStore};
