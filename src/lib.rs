//! AI photo studio - Gemini-backed image editing, generation, analysis, and chat
//!
//! Wraps the Gemini image, Imagen, Veo, and chat APIs behind small service
//! traits and drives them from headless page controllers.

pub mod ai;
pub mod app;
pub mod credentials;
pub mod error;
pub mod history;
pub mod models;
pub mod pages;
pub mod prompts;

pub use error::{Error, Result};
