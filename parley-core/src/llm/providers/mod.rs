//! LLM provider implementations

#[cfg(feature = "llm-groq")]
pub mod groq;

#[cfg(feature = "llm-groq")]
pub use groq::GroqProvider;
