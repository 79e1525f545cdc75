//! toolrouter — semantic prompt routing and validated tool dispatch.
//!
//! Two independent pieces:
//!
//! - [`router`] picks the prompt template whose embedding is most similar to
//!   the query's.
//! - [`tools`] parses a function call out of a model response, validates its
//!   arguments against the tool's schema and invokes the handler.
//!
//! Both are synchronous and stateless per call. Embedding and completion
//! services sit behind [`embedding::Embedder`] and [`llm::CompletionClient`].

pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod router;
pub mod tools;
pub mod types;
