//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides what it names.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SpeechLanguage
// ---------------------------------------------------------------------------

/// Locales offered for speech recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechLanguage {
    EnglishUs,
    EnglishUk,
    CantoneseHongKong,
    ChineseTraditional,
    ChineseSimplified,
}

impl SpeechLanguage {
    pub const ALL: [SpeechLanguage; 5] = [
        SpeechLanguage::EnglishUs,
        SpeechLanguage::EnglishUk,
        SpeechLanguage::CantoneseHongKong,
        SpeechLanguage::ChineseTraditional,
        SpeechLanguage::ChineseSimplified,
    ];

    /// BCP-47 tag stored in config.
    pub fn code(&self) -> &'static str {
        match self {
            SpeechLanguage::EnglishUs => "en-US",
            SpeechLanguage::EnglishUk => "en-GB",
            SpeechLanguage::CantoneseHongKong => "zh-HK",
            SpeechLanguage::ChineseTraditional => "zh-TW",
            SpeechLanguage::ChineseSimplified => "zh-CN",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SpeechLanguage::EnglishUs => "English (US)",
            SpeechLanguage::EnglishUk => "English (UK)",
            SpeechLanguage::CantoneseHongKong => "Cantonese (Hong Kong)",
            SpeechLanguage::ChineseTraditional => "Chinese (Traditional)",
            SpeechLanguage::ChineseSimplified => "Chinese (Simplified)",
        }
    }

    /// ISO-639-1 code for Whisper.
    pub fn whisper_language(&self) -> &'static str {
        match self {
            SpeechLanguage::EnglishUs | SpeechLanguage::EnglishUk => "en",
            SpeechLanguage::CantoneseHongKong
            | SpeechLanguage::ChineseTraditional
            | SpeechLanguage::ChineseSimplified => "zh",
        }
    }

    /// Case-insensitive lookup by tag; `_` is accepted for `-`.
    ///
    /// ```
    /// use voice_ledger::config::SpeechLanguage;
    ///
    /// assert_eq!(SpeechLanguage::from_code("zh_hk"), Some(SpeechLanguage::CantoneseHongKong));
    /// assert_eq!(SpeechLanguage::from_code("fr-FR"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(&code))
    }
}

// ---------------------------------------------------------------------------
// InterpreterConfig
// ---------------------------------------------------------------------------

/// Settings for the generative text interpreter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// When `false` every interpretation reports `Unavailable` and
    /// multi-entry text is never batched.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key; `None` for local providers.
    pub api_key: Option<String>,
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.0,
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// BCP-47 locale; see [`SpeechLanguage`].
    pub locale: String,
    /// GGML model file stem under the models directory.
    pub model: String,
    pub use_gpu: bool,
}

impl SpeechConfig {
    pub fn language(&self) -> Option<SpeechLanguage> {
        SpeechLanguage::from_code(&self.locale)
    }

    /// `<models_dir>/ggml-<model>.bin`
    pub fn model_path(&self, paths: &AppPaths) -> PathBuf {
        paths.models_dir.join(format!("ggml-{}.bin", self.model))
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: SpeechLanguage::EnglishUs.code().into(),
            model: "base".into(),
            use_gpu: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Drag distance from the hold origin beyond which release cancels.
    pub cancel_radius: f64,
    /// Audio past this length is not transcribed.
    pub max_recording_secs: f32,
    /// Push-to-talk key name (e.g. `"F9"`).
    pub hold_key: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cancel_radius: 32.0,
            max_recording_secs: 60.0,
            hold_key: "F9".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Currency named in interpreter instructions.
    pub currency_code: String,
    /// Glyph for synthesized categories.
    pub default_emoji: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency_code: "HKD".into(),
            default_emoji: crate::taxonomy::DEFAULT_EMOJI.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use voice_ledger::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub interpreter: InterpreterConfig,
    pub speech: SpeechConfig,
    pub capture: CaptureConfig,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
