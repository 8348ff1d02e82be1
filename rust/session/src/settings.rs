use buzz7_ai::tempo::Tempo;
use buzz7_engine::game::{MatchConfig, DEFAULT_PLAYERS, ERROR_RATE, TURN_TIME};
use buzz7_engine::player::STARTING_LIVES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "BUZZ7_CONFIG";
pub const PLAYERS_ENV: &str = "BUZZ7_PLAYERS";
pub const LIVES_ENV: &str = "BUZZ7_LIVES";
pub const TURN_MS_ENV: &str = "BUZZ7_TURN_MS";
pub const ERROR_RATE_ENV: &str = "BUZZ7_ERROR_RATE";
pub const SEED_ENV: &str = "BUZZ7_SEED";
pub const AI_ENV: &str = "BUZZ7_AI";

/// Settings a match session is started from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub player_count: usize,
    pub starting_lives: u8,
    pub turn_time_ms: u64,
    pub error_rate: f64,
    pub seed: Option<u64>,
    /// Automated player policy name, see `buzz7_ai::create_ai`
    pub ai: String,
    pub think_base_ms: u64,
    pub think_min_ms: u64,
    pub think_decay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let tempo = Tempo::default();
        Self {
            player_count: DEFAULT_PLAYERS,
            starting_lives: STARTING_LIVES,
            turn_time_ms: TURN_TIME.as_millis() as u64,
            error_rate: ERROR_RATE,
            seed: None,
            ai: "baseline".into(),
            think_base_ms: tempo.base.as_millis() as u64,
            think_min_ms: tempo.min.as_millis() as u64,
            think_decay_ms: tempo.decay_per_step.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsSources {
    pub player_count: ValueSource,
    pub starting_lives: ValueSource,
    pub turn_time_ms: ValueSource,
    pub error_rate: ValueSource,
    pub seed: ValueSource,
    pub ai: ValueSource,
}

impl Default for SettingsSources {
    fn default() -> Self {
        Self {
            player_count: ValueSource::Default,
            starting_lives: ValueSource::Default,
            turn_time_ms: ValueSource::Default,
            error_rate: ValueSource::Default,
            seed: ValueSource::Default,
            ai: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsResolved {
    pub settings: Settings,
    pub sources: SettingsSources,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    player_count: Option<usize>,
    #[serde(default)]
    starting_lives: Option<u8>,
    #[serde(default)]
    turn_time_ms: Option<u64>,
    #[serde(default)]
    error_rate: Option<f64>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    ai: Option<String>,
    #[serde(default)]
    think_base_ms: Option<u64>,
    #[serde(default)]
    think_min_ms: Option<u64>,
    #[serde(default)]
    think_decay_ms: Option<u64>,
}

impl Settings {
    /// Loads defaults, then the TOML file named by `BUZZ7_CONFIG`, then the
    /// `BUZZ7_*` environment overrides.
    pub fn load() -> Result<SettingsResolved, SettingsError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::load`] with an injectable variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<SettingsResolved, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let mut sources = SettingsSources::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var(CONFIG_ENV) {
            let file = read_file(Path::new(&path))?;
            settings.apply_file(file, &mut sources);
        }

        if let Some(v) = var(PLAYERS_ENV) {
            settings.player_count = parse_env(PLAYERS_ENV, &v)?;
            sources.player_count = ValueSource::Env;
        }
        if let Some(v) = var(LIVES_ENV) {
            settings.starting_lives = parse_env(LIVES_ENV, &v)?;
            sources.starting_lives = ValueSource::Env;
        }
        if let Some(v) = var(TURN_MS_ENV) {
            settings.turn_time_ms = parse_env(TURN_MS_ENV, &v)?;
            sources.turn_time_ms = ValueSource::Env;
        }
        if let Some(v) = var(ERROR_RATE_ENV) {
            settings.error_rate = parse_env(ERROR_RATE_ENV, &v)?;
            sources.error_rate = ValueSource::Env;
        }
        if let Some(v) = var(SEED_ENV) {
            settings.seed = Some(parse_env(SEED_ENV, &v)?);
            sources.seed = ValueSource::Env;
        }
        if let Some(v) = var(AI_ENV) {
            settings.ai = v.trim().to_string();
            sources.ai = ValueSource::Env;
        }

        settings.validate()?;
        Ok(SettingsResolved { settings, sources })
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        let file: FileSettings = toml::from_str(s)?;
        let mut settings = Settings::default();
        settings.apply_file(file, &mut SettingsSources::default());
        settings.validate()?;
        Ok(settings)
    }

    fn apply_file(&mut self, file: FileSettings, sources: &mut SettingsSources) {
        if let Some(v) = file.player_count {
            self.player_count = v;
            sources.player_count = ValueSource::File;
        }
        if let Some(v) = file.starting_lives {
            self.starting_lives = v;
            sources.starting_lives = ValueSource::File;
        }
        if let Some(v) = file.turn_time_ms {
            self.turn_time_ms = v;
            sources.turn_time_ms = ValueSource::File;
        }
        if let Some(v) = file.error_rate {
            self.error_rate = v;
            sources.error_rate = ValueSource::File;
        }
        if let Some(v) = file.seed {
            self.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = file.ai {
            self.ai = v;
            sources.ai = ValueSource::File;
        }
        if let Some(v) = file.think_base_ms {
            self.think_base_ms = v;
        }
        if let Some(v) = file.think_min_ms {
            self.think_min_ms = v;
        }
        if let Some(v) = file.think_decay_ms {
            self.think_decay_ms = v;
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.match_config()
            .validate()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        if self.ai.is_empty() {
            return Err(SettingsError::InvalidValue("ai cannot be empty".into()));
        }
        if self.think_min_ms > self.think_base_ms {
            return Err(SettingsError::InvalidValue(
                "think_min_ms must not exceed think_base_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            player_count: self.player_count,
            starting_lives: self.starting_lives,
            turn_time: Duration::from_millis(self.turn_time_ms),
            error_rate: self.error_rate,
            seed: self.seed,
        }
    }

    pub fn tempo(&self) -> Tempo {
        Tempo {
            base: Duration::from_millis(self.think_base_ms),
            min: Duration::from_millis(self.think_min_ms),
            decay_per_step: Duration::from_millis(self.think_decay_ms),
        }
    }
}

fn read_file(path: &Path) -> Result<FileSettings, SettingsError> {
    let s = fs::read_to_string(path)?;
    Ok(toml::from_str(&s)?)
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue(format!("{key}: cannot parse {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let resolved = Settings::load_with(env(&[])).expect("defaults");
        assert_eq!(resolved.settings, Settings::default());
        assert_eq!(resolved.sources, SettingsSources::default());
        assert_eq!(resolved.settings.match_config(), MatchConfig::default());
        assert_eq!(resolved.settings.tempo(), Tempo::default());
    }

    #[test]
    fn env_overrides_are_tracked() {
        let resolved = Settings::load_with(env(&[
            (PLAYERS_ENV, "6"),
            (SEED_ENV, "42"),
            (ERROR_RATE_ENV, "0.5"),
            (LIVES_ENV, ""),
        ]))
        .expect("env");
        assert_eq!(resolved.settings.player_count, 6);
        assert_eq!(resolved.settings.seed, Some(42));
        assert_eq!(resolved.settings.error_rate, 0.5);
        assert_eq!(resolved.sources.player_count, ValueSource::Env);
        assert_eq!(resolved.sources.seed, ValueSource::Env);
        // empty values are ignored
        assert_eq!(resolved.sources.starting_lives, ValueSource::Default);
    }

    #[test]
    fn unparsable_env_is_rejected() {
        let err = Settings::load_with(env(&[(TURN_MS_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(msg) if msg.contains(TURN_MS_ENV)));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        for pairs in [
            [(PLAYERS_ENV, "1")],
            [(PLAYERS_ENV, "11")],
            [(LIVES_ENV, "0")],
            [(TURN_MS_ENV, "0")],
            [(ERROR_RATE_ENV, "1.5")],
        ] {
            assert!(
                Settings::load_with(env(&pairs)).is_err(),
                "{:?} should be rejected",
                pairs
            );
        }
    }

    #[test]
    fn toml_document_overrides_defaults() {
        let settings = Settings::from_toml_str(
            "player_count = 3\nturn_time_ms = 3000\nai = \"perfect\"\nthink_min_ms = 200\n",
        )
        .expect("toml");
        assert_eq!(settings.player_count, 3);
        assert_eq!(settings.turn_time_ms, 3000);
        assert_eq!(settings.ai, "perfect");
        assert_eq!(settings.tempo().min, Duration::from_millis(200));
        assert_eq!(settings.starting_lives, STARTING_LIVES);
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        assert!(matches!(
            Settings::from_toml_str("player_count = ="),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load_with(env(&[(CONFIG_ENV, "/nonexistent/buzz7.toml")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
