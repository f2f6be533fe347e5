use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{Result, VaultError},
    revision::StoreLocation,
};

/// A file as returned by the contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Base64 file content as sent by the provider (may contain line breaks).
    pub content_base64: String,
    /// Revision token of this version of the file.
    pub sha: String,
}

/// Body of a create/update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFileRequest {
    pub message: String,
    pub content_base64: String,
    /// Previous revision token; `None` means "create".
    pub sha: Option<String>,
}

/// Contract for a versioned-file provider with compare-and-swap writes.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Short provider name for logging.
    fn name(&self) -> &'static str;

    /// Fetch the file; `Ok(None)` when it does not exist.
    async fn get_file(&self, location: &StoreLocation) -> Result<Option<RemoteFile>>;

    /// Create or update the file and return the new revision token.
    /// Fails with `VaultError::Conflict` when the precondition does not hold.
    async fn put_file(&self, location: &StoreLocation, request: PutFileRequest) -> Result<String>;
}

#[async_trait]
impl<T: ContentsApi + ?Sized> ContentsApi for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn get_file(&self, location: &StoreLocation) -> Result<Option<RemoteFile>> {
        (**self).get_file(location).await
    }

    async fn put_file(&self, location: &StoreLocation, request: PutFileRequest) -> Result<String> {
        (**self).put_file(location, request).await
    }
}

/// In-memory provider with the same compare-and-swap semantics as the real
/// one. Used by tests and offline smoke runs; clones share state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryContents {
    inner: Arc<Mutex<HashMap<String, RemoteFile>>>,
}

impl InMemoryContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token of a file, if it exists.
    pub fn current_sha(&self, location: &StoreLocation) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(&location.to_string()).map(|f| f.sha.clone()))
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentsApi for InMemoryContents {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_file(&self, location: &StoreLocation) -> Result<Option<RemoteFile>> {
        let map = self.inner.lock().map_err(lock_err)?;
        Ok(map.get(&location.to_string()).cloned())
    }

    async fn put_file(&self, location: &StoreLocation, request: PutFileRequest) -> Result<String> {
        let mut map = self.inner.lock().map_err(lock_err)?;
        let key = location.to_string();

        match (map.get(&key), request.sha.as_deref()) {
            (None, None) => {}
            (Some(existing), Some(sha)) if existing.sha == sha => {}
            (Some(_), None) => {
                return Err(VaultError::conflict(format!(
                    "{key} already exists; a revision token is required"
                )))
            }
            (Some(_), Some(sha)) => {
                return Err(VaultError::conflict(format!(
                    "{key} does not match {sha}"
                )))
            }
            (None, Some(sha)) => {
                return Err(VaultError::conflict(format!(
                    "{key} does not exist; stale token {sha}"
                )))
            }
        }

        // Opaque 32-char hex token, unique per write.
        let sha = Uuid::new_v4().simple().to_string();
        map.insert(
            key,
            RemoteFile {
                content_base64: request.content_base64,
                sha: sha.clone(),
            },
        );
        Ok(sha)
    }
}

fn lock_err<E: std::fmt::Display>(err: E) -> VaultError {
    VaultError::internal(format!("lock poisoned: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> StoreLocation {
        StoreLocation::new("acme", "components")
    }

    fn put(content: &str, sha: Option<&str>) -> PutFileRequest {
        PutFileRequest {
            message: "test".into(),
            content_base64: content.into(),
            sha: sha.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let api = InMemoryContents::new();
        assert_eq!(api.get_file(&location()).await.expect("get"), None);
        assert!(api.is_empty());
    }

    #[tokio::test]
    async fn create_then_update_with_current_token() {
        let api = InMemoryContents::new();
        let first = api.put_file(&location(), put("YQ==", None)).await.expect("create");
        let second = api
            .put_file(&location(), put("Yg==", Some(&first)))
            .await
            .expect("update");
        assert_ne!(first, second);

        let file = api.get_file(&location()).await.expect("get").expect("exists");
        assert_eq!(file.content_base64, "Yg==");
        assert_eq!(file.sha, second);
        assert_eq!(api.current_sha(&location()), Some(second));
    }

    #[tokio::test]
    async fn stale_or_missing_token_conflicts() {
        let api = InMemoryContents::new();
        let first = api.put_file(&location(), put("YQ==", None)).await.expect("create");
        api.put_file(&location(), put("Yg==", Some(&first)))
            .await
            .expect("update");

        let stale = api
            .put_file(&location(), put("Yw==", Some(&first)))
            .await
            .expect_err("stale token");
        assert!(stale.is_conflict());

        let blind = api
            .put_file(&location(), put("Yw==", None))
            .await
            .expect_err("missing token");
        assert!(blind.is_conflict());
    }

    #[tokio::test]
    async fn identical_content_still_gets_a_fresh_token() {
        let api = InMemoryContents::new();
        let first = api.put_file(&location(), put("YQ==", None)).await.expect("create");
        let second = api
            .put_file(&location(), put("YQ==", Some(&first)))
            .await
            .expect("rewrite");
        assert_ne!(first, second);
        assert_eq!(second.len(), 32);
        assert!(second.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn shared_through_arc() {
        let api = Arc::new(InMemoryContents::new());
        let sha = api.put_file(&location(), put("YQ==", None)).await.expect("create");
        assert_eq!(api.name(), "memory");
        assert_eq!(api.current_sha(&location()), Some(sha));
    }
}
