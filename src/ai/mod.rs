//! AI layer - completion provider, Groq client, text-to-SQL, identifier normalization.

pub mod groq;
pub mod normalize;
pub mod provider;
pub mod text_to_sql;

pub use groq::GroqProvider;
pub use normalize::IdentifierNormalizer;
pub use provider::{LlmError, LlmProvider};
pub use text_to_sql::TextToSqlEngine;
