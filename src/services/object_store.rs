// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The object (blob) store behind [`ObjectReference`] values.

use crate::model::ObjectReference;
use crate::services::ServiceError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Bytes read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Storage for binary content referenced by runtime values.
///
/// Parameter transformation is the only engine-side caller: inputs
/// dereference object references into inline blobs, outputs materialize
/// inline blobs back into references.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write bytes and return a reference to them.
    async fn write_object(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        organization_id: &str,
        execution_id: Option<&str>,
        filename: Option<&str>,
    ) -> Result<ObjectReference, ServiceError>;

    /// Read the bytes behind a reference.
    async fn read_object(&self, reference: &ObjectReference) -> Result<StoredObject, ServiceError>;
}

/// An in-memory object store keyed by generated ids.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn write_object(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        _organization_id: &str,
        _execution_id: Option<&str>,
        filename: Option<&str>,
    ) -> Result<ObjectReference, ServiceError> {
        let id = Uuid::new_v4().to_string();
        self.objects.lock().await.insert(
            id.clone(),
            StoredObject {
                data,
                mime_type: mime_type.to_string(),
            },
        );

        Ok(ObjectReference {
            id,
            mime_type: mime_type.to_string(),
            filename: filename.map(str::to_string),
        })
    }

    async fn read_object(&self, reference: &ObjectReference) -> Result<StoredObject, ServiceError> {
        self.objects
            .lock()
            .await
            .get(&reference.id)
            .cloned()
            .ok_or_else(|| ServiceError::ObjectNotFound(reference.id.clone()))
    }
}
