use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Collaborator, Profile, SessionCheckpoint};

pub mod fs;
pub mod memory;

pub use fs::FsSessionStore;
pub use memory::MemorySessionStore;

/// Persistence for session checkpoints and accumulated results.
///
/// Called after every session mutation with the full accumulated state;
/// implementations overwrite, they never append.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_checkpoint(&self, checkpoint: &SessionCheckpoint) -> Result<()>;

    async fn save_profiles(&self, session_id: &str, profiles: &[Profile]) -> Result<()>;

    async fn save_collaborators(
        &self,
        session_id: &str,
        collaborators: &[Collaborator],
    ) -> Result<()>;
}
