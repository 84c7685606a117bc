//! Named bot profiles loaded from TOML, used by both CLIs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::bot_strategy::{BotStrategy, GreedyStrategy, RandomStrategy};
use crate::error::ProfileError;
use crate::games::carcassonne::evaluator::EvalParams;

const DEFAULT_MEEPLE_CHANCE: f64 = 0.3;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BotProfile {
    pub description: Option<String>,
    /// "greedy" or "random".
    #[serde(default = "default_strategy_type")]
    pub strategy_type: String,
    /// Evaluation noise amplitude for the greedy search.
    pub jitter: Option<f64>,
    /// Chance that the random bot places a meeple.
    pub meeple_chance: Option<f64>,
}

fn default_strategy_type() -> String {
    "greedy".into()
}

impl BotProfile {
    pub fn greedy(jitter: f64) -> Self {
        Self { description: None, strategy_type: "greedy".into(), jitter: Some(jitter), meeple_chance: None }
    }

    pub fn random(meeple_chance: f64) -> Self {
        Self { description: None, strategy_type: "random".into(), jitter: None, meeple_chance: Some(meeple_chance) }
    }

    pub fn eval_params(&self) -> EvalParams {
        let d = EvalParams::default();
        EvalParams { jitter: self.jitter.unwrap_or(d.jitter) }
    }

    /// A fresh strategy seeded with `seed`.
    pub fn build_strategy(&self, seed: u64) -> Result<Box<dyn BotStrategy>, ProfileError> {
        match self.strategy_type.as_str() {
            "greedy" => Ok(Box::new(GreedyStrategy::new(seed, self.eval_params()))),
            "random" => Ok(Box::new(RandomStrategy::new(
                seed,
                self.meeple_chance.unwrap_or(DEFAULT_MEEPLE_CHANCE),
            ))),
            other => Err(ProfileError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Maps difficulty tiers to profile names.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ProductionConfig {
    pub easy: Option<String>,
    pub medium: Option<String>,
    pub hard: Option<String>,
    pub default: Option<String>,
}

impl ProductionConfig {
    pub fn resolve(&self, difficulty: &str) -> Option<&str> {
        match difficulty {
            "easy" => self.easy.as_deref(),
            "medium" => self.medium.as_deref(),
            "hard" => self.hard.as_deref(),
            _ => self.default.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct BotProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, BotProfile>,
    #[serde(default)]
    pub production: ProductionConfig,
}

impl BotProfilesFile {
    /// Profiles available when no file is found.
    pub fn builtin() -> Self {
        let profiles = HashMap::from([
            ("easy".to_string(), BotProfile::random(0.5)),
            ("medium".to_string(), BotProfile::greedy(4.0)),
            ("hard".to_string(), BotProfile::greedy(EvalParams::default().jitter)),
        ]);
        Self {
            profiles,
            production: ProductionConfig {
                easy: Some("easy".into()),
                medium: Some("medium".into()),
                hard: Some("hard".into()),
                default: Some("hard".into()),
            },
        }
    }

    /// Look a profile up by name, falling back to the difficulty tiers.
    pub fn get(&self, name: &str) -> Option<&BotProfile> {
        self.profiles
            .get(name)
            .or_else(|| self.production.resolve(name).and_then(|n| self.profiles.get(n)))
    }
}

pub fn load_profiles(path: &Path) -> Result<BotProfilesFile, ProfileError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ProfileError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&content).map_err(|source| ProfileError::Parse { path: path.to_path_buf(), source })
}

/// Try the well-known locations in order, then the built-in profiles.
pub fn load_default_profiles() -> BotProfilesFile {
    let candidates = ["bot_profiles.toml", "../bot_profiles.toml", "/etc/meeple/bot_profiles.toml"];
    load_first_found(candidates.iter().map(PathBuf::from))
}

fn load_first_found(candidates: impl IntoIterator<Item = PathBuf>) -> BotProfilesFile {
    for p in candidates {
        if !p.exists() {
            continue;
        }
        match load_profiles(&p) {
            Ok(profiles) => {
                tracing::info!(path = %p.display(), count = profiles.profiles.len(), "loaded bot profiles");
                return profiles;
            }
            Err(e) => {
                tracing::warn!(path = %p.display(), error = %e, "failed to load bot profiles");
            }
        }
    }
    tracing::info!("no bot_profiles.toml found, using built-in defaults");
    BotProfilesFile::builtin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[profiles.calm]
description = "Greedy without noise"
jitter = 0.0

[profiles.chaos]
strategy_type = "random"
meeple_chance = 0.9

[production]
easy = "chaos"
hard = "calm"
"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_profiles() {
        let file = write_temp(SAMPLE);
        let loaded = load_profiles(file.path()).unwrap();
        assert_eq!(loaded.profiles.len(), 2);

        let calm = &loaded.profiles["calm"];
        assert_eq!(calm.strategy_type, "greedy");
        assert_eq!(calm.eval_params().jitter, 0.0);
        assert_eq!(loaded.profiles["chaos"].meeple_chance, Some(0.9));

        assert_eq!(loaded.production.resolve("easy"), Some("chaos"));
        assert_eq!(loaded.production.resolve("medium"), None);
        assert_eq!(loaded.get("hard"), Some(calm));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_profiles(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ProfileError::Read { .. }));
    }

    #[test]
    fn test_parse_error() {
        let file = write_temp("[profiles.bad]\njitter = \"loud\"\n");
        let err = load_profiles(file.path()).unwrap_err();
        assert!(matches!(err, ProfileError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_unknown_strategy() {
        let profile = BotProfile { strategy_type: "mcts".into(), ..BotProfile::greedy(1.0) };
        assert!(matches!(profile.build_strategy(1), Err(ProfileError::UnknownStrategy(s)) if s == "mcts"));
        assert!(BotProfile::random(0.2).build_strategy(1).is_ok());
    }

    #[test]
    fn test_fallback_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "not [valid").unwrap();
        let loaded = load_first_found([dir.path().join("absent.toml"), broken]);
        assert_eq!(loaded, BotProfilesFile::builtin());
        assert_eq!(loaded.get("easy").unwrap().strategy_type, "random");
    }

    #[test]
    fn test_first_valid_file_wins() {
        let file = write_temp(SAMPLE);
        let loaded = load_first_found([file.path().to_path_buf()]);
        assert!(loaded.profiles.contains_key("chaos"));
    }
}
