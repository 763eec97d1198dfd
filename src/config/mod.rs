//! Configuration module for Tubescribe.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    GeneralSettings, RenderSettings, Settings, TranscriptionProvider, TranscriptionSettings,
    TranslationSettings, DEFAULT_FONT_URL,
};
