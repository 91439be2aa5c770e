use std::sync::Arc;

/// Storage
///
/// Name-compatibility seam for the storage interface the client bundle and older
/// tooling still refer to. All persistence lives behind `repository::Repository`;
/// nothing is routed through this trait.
pub trait Storage: Send + Sync {}

/// MemStorage
///
/// The only `Storage` implementation. Holds no state.
#[derive(Clone, Debug, Default)]
pub struct MemStorage;

impl MemStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for MemStorage {}

/// StorageState
///
/// Shared handle carried in `AppState` alongside the repository.
pub type StorageState = Arc<dyn Storage>;
