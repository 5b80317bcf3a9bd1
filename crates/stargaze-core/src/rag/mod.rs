//! Embedding generation and README chunking.

pub mod embeddings;
pub mod splitter;

pub use embeddings::{
    cosine_similarity, DummyEmbeddingGenerator, EmbeddingGenerator, RestEmbeddingClient,
    RestEmbeddingConfig,
};
pub use splitter::TextSplitter;
