use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChildId, ChildProfile, FamilyId, FamilyProfile};

/// Supplied profile/constraints provider.
///
/// Profile CRUD and persistence are out of scope; the engine only reads.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn child(&self, id: ChildId) -> Result<Option<ChildProfile>>;

    async fn family(&self, id: FamilyId) -> Result<Option<FamilyProfile>>;

    /// All children of a family, in stored order.
    async fn children_of(&self, family_id: FamilyId) -> Result<Vec<ChildProfile>>;
}
