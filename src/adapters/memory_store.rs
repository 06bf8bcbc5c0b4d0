//! In-memory cart store.
//!
//! Documents are held as loose JSON values, the way a document store
//! would, so tests can seed arbitrarily malformed records. Writes are
//! atomic per document under a versioned compare-and-swap.

use crate::domain::{Cart, CartError, CartId, Platform, RawCart};
use crate::ports::{CartStore, Versioned};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

struct Document {
    value: Value,
    version: u64,
}

/// In-memory [`CartStore`] keyed by cart id.
#[derive(Default)]
pub struct MemoryCartStore {
    documents: RwLock<HashMap<CartId, Document>>,
}

impl MemoryCartStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw document directly, bypassing validation.
    ///
    /// Exists so tests and migrations can stage malformed records.
    pub fn seed_document(&self, id: CartId, value: Value) {
        self.documents
            .write()
            .insert(id, Document { value, version: 1 });
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Whether a document for the id exists.
    pub fn contains(&self, id: CartId) -> bool {
        self.documents.read().contains_key(&id)
    }

    fn decode(id: CartId, document: &Document) -> Versioned<RawCart> {
        let mut raw: RawCart =
            serde_json::from_value(document.value.clone()).unwrap_or_default();
        // The map key is authoritative when the document body lost its id.
        raw.id.get_or_insert(id);
        Versioned {
            value: raw,
            version: document.version,
        }
    }

    fn encode(cart: &Cart) -> Result<Value, CartError> {
        serde_json::to_value(cart).map_err(|err| CartError::Store(err.to_string()))
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_all(&self) -> Result<Vec<Versioned<RawCart>>, CartError> {
        let documents = self.documents.read();
        Ok(documents
            .iter()
            .map(|(id, doc)| Self::decode(*id, doc))
            .collect())
    }

    async fn find_open(&self, platform: Platform) -> Result<Vec<Versioned<RawCart>>, CartError> {
        let documents = self.documents.read();
        Ok(documents
            .iter()
            .map(|(id, doc)| Self::decode(*id, doc))
            .filter(|record| {
                let raw = &record.value;
                raw.platform.as_deref().and_then(Platform::parse) == Some(platform)
                    && raw.is_public.unwrap_or(false)
                    && matches!(raw.status.as_deref(), Some("active" | "full"))
            })
            .collect())
    }

    async fn find_by_id(&self, id: CartId) -> Result<Option<Versioned<RawCart>>, CartError> {
        let documents = self.documents.read();
        Ok(documents.get(&id).map(|doc| Self::decode(id, doc)))
    }

    async fn insert(&self, cart: &Cart) -> Result<(), CartError> {
        let value = Self::encode(cart)?;
        let mut documents = self.documents.write();
        if documents.contains_key(&cart.id) {
            return Err(CartError::Store(format!(
                "cart {} already exists",
                cart.id
            )));
        }
        documents.insert(cart.id, Document { value, version: 1 });
        Ok(())
    }

    async fn update(&self, cart: &Cart, expected_version: u64) -> Result<(), CartError> {
        let value = Self::encode(cart)?;
        let mut documents = self.documents.write();
        let document = documents
            .get_mut(&cart.id)
            .ok_or(CartError::CartNotFound(cart.id))?;
        if document.version != expected_version {
            return Err(CartError::VersionConflict);
        }
        document.value = value;
        document.version += 1;
        Ok(())
    }

    async fn delete(&self, id: CartId) -> Result<(), CartError> {
        self.documents.write().remove(&id);
        Ok(())
    }
}
