pub mod chunking;
pub mod index;
pub mod model;

pub use chunking::{chunk_document, ChunkingParams};
pub use index::{IndexBuildInput, IndexBuildResult, IndexStatus, IndexStore, PolicyIndex, DEFAULT_INDEX_NAME};
pub use model::{Chunk, Document, EmbeddedChunk};
