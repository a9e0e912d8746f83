//! In-Memory Bundle Registry Implementation

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::BundleRegistryPort;
use crate::domain::function::{FunctionBundle, FunctionName};

/// 内存 bundle 注册表
pub struct InMemoryBundleRegistry {
    bundles: DashMap<FunctionName, Arc<FunctionBundle>>,
}

impl InMemoryBundleRegistry {
    pub fn new() -> Self {
        Self {
            bundles: DashMap::new(),
        }
    }
}

impl Default for InMemoryBundleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleRegistryPort for InMemoryBundleRegistry {
    fn insert(&self, bundle: FunctionBundle) -> Option<Arc<FunctionBundle>> {
        let name = bundle.name().clone();
        let replaced = self.bundles.insert(name.clone(), Arc::new(bundle));
        tracing::debug!(name = %name, replaced = replaced.is_some(), "Bundle registered");
        replaced
    }

    fn get(&self, name: &FunctionName) -> Option<Arc<FunctionBundle>> {
        self.bundles.get(name).map(|b| b.clone())
    }

    fn remove(&self, name: &FunctionName) -> Option<Arc<FunctionBundle>> {
        self.bundles.remove(name).map(|(_, bundle)| {
            tracing::debug!(name = %name, "Bundle unregistered");
            bundle
        })
    }

    fn list(&self) -> Vec<Arc<FunctionBundle>> {
        let mut bundles: Vec<Arc<FunctionBundle>> =
            self.bundles.iter().map(|entry| entry.value().clone()).collect();
        bundles.sort_by(|a, b| a.name().cmp(b.name()));
        bundles
    }

    fn len(&self) -> usize {
        self.bundles.len()
    }
}
