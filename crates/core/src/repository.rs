//! Generic repository contract shared by every persisted entity.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;

/// A record that is persisted and tracked by its identifier.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

/// CRUD operations over one entity type.
///
/// Reads run immediately against the store. `add`, `update` and `remove` only
/// stage a change; nothing becomes durable until the owning unit of work
/// commits.
#[async_trait]
pub trait RepositoryTrait<T: Entity>: Send + Sync {
    /// Every record, possibly empty. No ordering is guaranteed.
    async fn get_all(&self) -> Result<Vec<T>>;

    /// `Ok(None)` when no record has this id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>>;

    /// Stages an insertion.
    async fn add(&self, entity: T) -> Result<()>;

    /// Stages an in-place modification of the record named by `entity.id()`.
    /// The caller guarantees that record exists.
    fn update(&self, entity: T) -> Result<()>;

    /// Stages deletion of the record named by `entity.id()`.
    fn remove(&self, entity: T) -> Result<()>;
}
