// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Organization credentials and integrations.

use crate::services::ServiceError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// A third-party integration an organization has connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integration {
    pub provider: String,
    pub access_token: String,
}

/// Preloads and serves an organization's secrets and integrations.
///
/// The driver calls [`CredentialProvider::initialize`] once, under a durable
/// step, before any node runs. Nodes then resolve secrets and integrations
/// through their context capabilities.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Preload everything the organization's nodes may ask for.
    async fn initialize(&self, organization_id: &str) -> Result<(), ServiceError>;

    /// Resolve a secret by name.
    async fn secret(&self, name: &str) -> Option<String>;

    /// Resolve a connected integration by name.
    async fn integration(&self, name: &str) -> Option<Integration>;
}

/// A credential provider backed by static maps.
#[derive(Default)]
pub struct StaticCredentialProvider {
    secrets: HashMap<String, String>,
    integrations: HashMap<String, Integration>,
    initialized: AtomicBool,
}

impl StaticCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    pub fn with_integration(mut self, name: impl Into<String>, integration: Integration) -> Self {
        self.integrations.insert(name.into(), integration);
        self
    }

    /// Whether `initialize` has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn initialize(&self, _organization_id: &str) -> Result<(), ServiceError> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn secret(&self, name: &str) -> Option<String> {
        self.secrets.get(name).cloned()
    }

    async fn integration(&self, name: &str) -> Option<Integration> {
        self.integrations.get(name).cloned()
    }
}
