use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use compvault_core::{
    component::{Collection, Component, StoredDocument},
    contents::{ContentsApi, PutFileRequest},
    revision::{RevisionState, StoreHandle},
    Result, VaultError,
};
use tracing::{info, instrument};
use zeroize::Zeroizing;

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// New revision token, also recorded in the handle.
    pub sha: String,
    /// The `lastUpdated` stamp sealed into the committed document.
    pub committed_at: DateTime<Utc>,
}

/// Maps a component collection onto exactly one versioned remote file.
///
/// The adapter holds no session state of its own: the revision token lives
/// in the caller's [`StoreHandle`] and only moves after a successful call.
pub struct RemoteStore<C: ContentsApi> {
    api: C,
}

impl<C: ContentsApi> RemoteStore<C> {
    pub fn new(api: C) -> Self {
        Self { api }
    }

    /// Read and decrypt the collection.
    ///
    /// A missing file is not an error: it yields an empty collection and
    /// moves the handle to `Absent`. Decryption failures stay distinct from
    /// transport failures so the caller can ask for another passphrase
    /// instead of retrying the request.
    #[instrument(skip_all, fields(provider = self.api.name(), location = %handle.location))]
    pub async fn fetch_collection(
        &self,
        handle: &mut StoreHandle,
        passphrase: &str,
    ) -> Result<Collection> {
        let Some(file) = self.api.get_file(&handle.location).await? else {
            info!("remote file absent; starting with an empty collection");
            handle.revision = RevisionState::Absent;
            return Ok(Collection::empty());
        };

        let blob = decode_transport(&file.content_base64)?;
        let document = open_blocking(blob, passphrase).await?;
        let collection = document.into_collection();
        info!(components = collection.len(), "collection loaded");
        handle.revision = RevisionState::Known(file.sha);
        Ok(collection)
    }

    /// Encrypt and write the collection, using the handle's token (if any)
    /// as the write precondition. On error the handle is left as it was.
    #[instrument(skip_all, fields(provider = self.api.name(), location = %handle.location, components = components.len()))]
    pub async fn commit_collection(
        &self,
        handle: &mut StoreHandle,
        components: &[Component],
        passphrase: &str,
    ) -> Result<Commit> {
        let now = Utc::now();
        let document = StoredDocument::from_components(components, now);
        let blob = seal_blocking(document, passphrase).await?;

        let request = PutFileRequest {
            message: commit_message(now),
            content_base64: STANDARD.encode(blob.as_bytes()),
            sha: handle.revision.token().map(str::to_string),
        };
        let sha = self.api.put_file(&handle.location, request).await?;
        info!(sha = %sha, "collection committed");
        handle.revision = RevisionState::Known(sha.clone());
        Ok(Commit {
            sha,
            committed_at: now,
        })
    }
}

/// The file content is the envelope text, base64-encoded once more for the
/// contents API. Providers wrap long base64 lines, so whitespace is dropped.
fn decode_transport(content: &str) -> Result<String> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| VaultError::decryption(format!("stored content is not base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| VaultError::decryption(format!("stored content is not text: {e}")))
}

fn commit_message(now: DateTime<Utc>) -> String {
    format!(
        "Update encrypted components data - {}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

// PBKDF2 is CPU bound; run seal/open on the blocking pool.
async fn seal_blocking(document: StoredDocument, passphrase: &str) -> Result<String> {
    let passphrase = Zeroizing::new(passphrase.to_owned());
    tokio::task::spawn_blocking(move || compvault_envelope::seal(&document, &passphrase))
        .await
        .map_err(|e| VaultError::internal(format!("encrypt task failed: {e}")))?
}

async fn open_blocking(blob: String, passphrase: &str) -> Result<StoredDocument> {
    let passphrase = Zeroizing::new(passphrase.to_owned());
    tokio::task::spawn_blocking(move || {
        compvault_envelope::open::<StoredDocument>(&blob, &passphrase)
    })
    .await
    .map_err(|e| VaultError::internal(format!("decrypt task failed: {e}")))?
}
