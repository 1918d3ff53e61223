use std::sync::RwLock;

use thiserror::Error;

use super::Credential;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("failed to persist credential: {0}")]
    Persistence(String),
}

/// Where the current credential lives.
///
/// The client owns one store for its lifetime; the interceptor reads it and
/// the authenticator (plus login) writes it. `get` never blocks and never
/// fails. `set` replaces atomically: a concurrent reader sees either the old
/// or the new credential, never a partial write.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential) -> Result<(), StoreError>;
    fn clear(&self);
}

/// In-memory reference store backed by an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    current: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        // Recover from poisoning so get truly never fails.
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set(&self, credential: Credential) -> Result<(), StoreError> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(credential);
        Ok(())
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_set_then_get_returns_stored_credential() {
        let store = MemoryCredentialStore::new();
        assert!(store.get().is_none());

        let credential = Credential::new("S1");
        store.set(credential.clone()).expect("set failed");
        assert_eq!(store.get(), Some(credential));
    }

    #[test]
    fn test_clear_empties_store() {
        let store = MemoryCredentialStore::new();
        store.set(Credential::new("S1")).expect("set failed");
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_concurrent_readers_see_whole_credentials() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set(Credential::new("A")).expect("set failed");

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    store.set(Credential::new("B")).expect("set failed");
                    store.set(Credential::new("A")).expect("set failed");
                }
            })
        };

        for _ in 0..1000 {
            let current = store.get().expect("credential missing");
            assert!(current.session_token == "A" || current.session_token == "B");
        }

        writer.join().expect("writer panicked");
    }
}
