//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::EngineError;
use crate::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_CUE_REFRESH_MS, DEFAULT_LOCALE, DEFAULT_LOG_DEDUP_SECS,
    DEFAULT_MAX_IMMEDIATE_CHARS_FOR_DIRECTION, DEFAULT_NO_SPEECH_RESTART_DELAY_SECS,
    DEFAULT_SILENCE_AUTO_FINAL_SECS,
};

/// Immutable for the lifetime of an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recognizer locale, passed through to the capture backend
    pub locale: String,
    pub cooldown_secs: f64,
    pub silence_auto_final_secs: f64,
    pub log_dedup_secs: f64,
    /// Kept for recognizers that gate short-phrase matching; the resolver itself
    /// matches every phrase length
    pub max_immediate_chars_for_direction: usize,
    pub no_speech_restart_delay_secs: f64,
    pub cue_refresh_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            silence_auto_final_secs: DEFAULT_SILENCE_AUTO_FINAL_SECS,
            log_dedup_secs: DEFAULT_LOG_DEDUP_SECS,
            max_immediate_chars_for_direction: DEFAULT_MAX_IMMEDIATE_CHARS_FOR_DIRECTION,
            no_speech_restart_delay_secs: DEFAULT_NO_SPEECH_RESTART_DELAY_SECS,
            cue_refresh_ms: DEFAULT_CUE_REFRESH_MS,
        }
    }
}

impl Config {
    /// Load from a JSON file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let config: Config = serde_json::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// Negative or NaN durations collapse to zero
    pub fn sanitized(mut self) -> Self {
        for secs in [
            &mut self.cooldown_secs,
            &mut self.silence_auto_final_secs,
            &mut self.log_dedup_secs,
            &mut self.no_speech_restart_delay_secs,
        ] {
            if !secs.is_finite() || *secs < 0.0 {
                *secs = 0.0;
            }
        }
        self
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    pub fn silence_auto_final(&self) -> Duration {
        Duration::from_secs_f64(self.silence_auto_final_secs)
    }

    pub fn log_dedup(&self) -> Duration {
        Duration::from_secs_f64(self.log_dedup_secs)
    }

    pub fn no_speech_restart_delay(&self) -> Duration {
        Duration::from_secs_f64(self.no_speech_restart_delay_secs)
    }

    pub fn cue_refresh(&self) -> Duration {
        Duration::from_millis(self.cue_refresh_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.locale, "zh-CN");
        assert_eq!(config.cooldown(), Duration::from_millis(800));
        assert_eq!(config.silence_auto_final(), Duration::from_millis(1200));
        assert_eq!(config.max_immediate_chars_for_direction, 6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"cooldown_secs": 2.0}"#).unwrap();
        assert_eq!(config.cooldown(), Duration::from_secs(2));
        assert_eq!(config.log_dedup_secs, DEFAULT_LOG_DEDUP_SECS);
    }

    #[test]
    fn test_negative_duration_clamped() {
        let config = Config::from_json(r#"{"silence_auto_final_secs": -1.0}"#).unwrap();
        assert_eq!(config.silence_auto_final(), Duration::ZERO);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(EngineError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Config::from_file("/nonexistent/voicecue.json").unwrap_err();
        assert!(matches!(err, EngineError::ConfigRead { .. }));
    }
}
