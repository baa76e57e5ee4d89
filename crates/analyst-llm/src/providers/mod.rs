//! Concrete language-model clients

pub mod openai;

pub use openai::{OpenAIConfig, OpenAIProvider};
