//! Session object for one user's view of the component collection, and the
//! optimistic mutation protocol used by every add/update/delete.

use chrono::Utc;
use compvault_core::{
    component::{Collection, Component, ComponentDraft},
    contents::ContentsApi,
    revision::{StoreHandle, StoreLocation},
    Result, VaultError,
};
use compvault_store::RemoteStore;
use tracing::{instrument, warn};
use zeroize::Zeroizing;

/// Holds everything one editing session needs: the remote store, the
/// handle with its revision token, the passphrase and the local collection.
///
/// Mutations take `&mut self`, so a session never has two writes in flight.
/// Each mutation is applied locally, committed, and rolled back to the
/// pre-mutation snapshot if the commit fails.
pub struct ComponentSession<C: ContentsApi> {
    store: RemoteStore<C>,
    handle: StoreHandle,
    passphrase: Zeroizing<String>,
    collection: Collection,
}

impl<C: ContentsApi> ComponentSession<C> {
    pub fn new(api: C, location: StoreLocation, passphrase: impl Into<String>) -> Result<Self> {
        let passphrase = Zeroizing::new(passphrase.into());
        if passphrase.is_empty() {
            return Err(VaultError::validation("encryption password is not set"));
        }
        Ok(Self {
            store: RemoteStore::new(api),
            handle: StoreHandle::new(location),
            passphrase,
            collection: Collection::empty(),
        })
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn components(&self) -> &[Component] {
        &self.collection.components
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.collection.get(id)
    }

    /// Components whose name, type or description contain `term`
    /// (case-insensitive). A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Component> {
        let term = term.trim();
        self.collection
            .components
            .iter()
            .filter(|c| term.is_empty() || c.matches(term))
            .collect()
    }

    /// Replace the local collection with the remote one.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<&Collection> {
        self.collection = self
            .store
            .fetch_collection(&mut self.handle, &self.passphrase)
            .await?;
        Ok(&self.collection)
    }

    #[instrument(skip_all)]
    pub async fn add(&mut self, draft: ComponentDraft) -> Result<Component> {
        let component = Component::new(draft)?;
        let created = component.clone();
        self.mutate(move |collection| {
            collection.components.insert(0, component);
            Ok(())
        })
        .await?;
        Ok(created)
    }

    #[instrument(skip(self, draft))]
    pub async fn update(&mut self, id: &str, draft: ComponentDraft) -> Result<Component> {
        self.mutate(|collection| {
            let index = collection.position(id).ok_or_else(|| not_found(id))?;
            let component = &mut collection.components[index];
            component.apply_at(draft, Utc::now())?;
            Ok(component.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: &str) -> Result<Component> {
        self.mutate(|collection| {
            let index = collection.position(id).ok_or_else(|| not_found(id))?;
            Ok(collection.components.remove(index))
        })
        .await
    }

    /// Snapshot, apply, commit; restore the snapshot on any failure.
    async fn mutate<T, F>(&mut self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Collection) -> Result<T>,
    {
        let snapshot = self.collection.clone();
        let outcome = match apply(&mut self.collection) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.collection = snapshot;
                return Err(err);
            }
        };

        match self
            .store
            .commit_collection(
                &mut self.handle,
                &self.collection.components,
                &self.passphrase,
            )
            .await
        {
            Ok(commit) => {
                self.collection.last_updated = Some(commit.committed_at);
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, "commit failed; restoring previous collection");
                self.collection = snapshot;
                Err(err)
            }
        }
    }
}

fn not_found(id: &str) -> VaultError {
    VaultError::NotFound { id: id.to_string() }
}
