//! Remote generation clients.

pub mod gemini_client;

pub use gemini_client::{GEMINI_BASE_URL, GeminiClient};
