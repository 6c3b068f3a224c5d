//! Version context attached to a stream.
//!
//! A cooked asset carries a global object version plus a set of independently
//! versioned custom feature streams. The registry that resolves those from a
//! package summary lives outside this crate; what arrives here is the resolved
//! mapping, the game the package was cooked for, and named loader options.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::traits::{ParseError, ParseResult};

/// Loader option that says whether morph target data was serialized at all
pub const MORPH_TARGET_OPTION: &str = "MorphTarget";

/// Custom version streams consulted by the morph decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureStream {
    /// Editor object version
    Editor,
    /// Fortnite main branch object version
    FortniteMain,
    /// UE5 private "frosty" stream object version
    Ue5PrivateFrostyStream,
}

impl FeatureStream {
    pub const ALL: [FeatureStream; 3] = [
        FeatureStream::Editor,
        FeatureStream::FortniteMain,
        FeatureStream::Ue5PrivateFrostyStream,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureStream::Editor => "FEditorObjectVersion",
            FeatureStream::FortniteMain => "FFortniteMainBranchObjectVersion",
            FeatureStream::Ue5PrivateFrostyStream => "FUE5PrivateFrostyStreamObjectVersion",
        }
    }
}

impl fmt::Display for FeatureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Game a package was cooked for. Only titles whose morph layout diverges
/// from the engine mainline get their own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    /// Stock engine layout
    #[default]
    Unreal,
    /// The Casting of Frank Stone
    TheCastingOfFrankStone,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Game::Unreal => f.write_str("unreal"),
            Game::TheCastingOfFrankStone => f.write_str("the_casting_of_frank_stone"),
        }
    }
}

impl FromStr for Game {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "unreal" | "ue" | "ue4" | "ue5" => Ok(Game::Unreal),
            "the_casting_of_frank_stone" | "frank_stone" => Ok(Game::TheCastingOfFrankStone),
            _ => Err(format!("Unknown game: {}", s)),
        }
    }
}

/// Version cutovers that change the morph target layout.
///
/// Each value is the first epoch of its stream that carries the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionThresholds {
    /// Object version where tangent deltas switched from packed normals to floats
    pub tangent_z_delta_format_change: i32,
    /// `FeatureStream::Editor`: section indices saved per LOD
    pub added_morph_target_section_indices: i32,
    /// `FeatureStream::FortniteMain`: engine-generated flag saved per LOD
    pub save_generated_morph_target_by_engine: i32,
    /// `FeatureStream::Ue5PrivateFrostyStream`: source deltas strippable for cooked builds
    pub strip_morph_target_source_data_for_cooked_builds: i32,
    /// `FeatureStream::FortniteMain`: custom import source filename saved per LOD
    pub morph_target_custom_import: i32,
}

impl Default for VersionThresholds {
    fn default() -> Self {
        Self {
            tangent_z_delta_format_change: 375,
            added_morph_target_section_indices: 23,
            save_generated_morph_target_by_engine: 6,
            strip_morph_target_source_data_for_cooked_builds: 10,
            morph_target_custom_import: 124,
        }
    }
}

/// Resolved versions for one decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionContext {
    /// Global object (package file) version
    pub object_version: i32,
    /// Resolved custom version per feature stream
    pub custom_versions: HashMap<FeatureStream, i32>,
    /// Game the package was cooked for
    pub game: Game,
    /// Named loader options; unset options are on
    pub options: HashMap<String, bool>,
    /// Layout cutovers
    pub thresholds: VersionThresholds,
}

impl Default for VersionContext {
    fn default() -> Self {
        Self {
            object_version: 0,
            custom_versions: HashMap::new(),
            game: Game::Unreal,
            options: HashMap::new(),
            thresholds: VersionThresholds::default(),
        }
    }
}

impl VersionContext {
    /// Start building a context
    pub fn builder() -> VersionContextBuilder {
        VersionContextBuilder::default()
    }

    /// Context where every stream reports the newest epoch
    pub fn latest() -> Self {
        let mut builder = Self::builder().object_version(i32::MAX);
        for stream in FeatureStream::ALL {
            builder = builder.custom_version(stream, i32::MAX);
        }
        builder.build()
    }

    /// Load a context from a JSON or YAML file, picked by extension
    pub fn from_file(path: &Path) -> ParseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }

    pub fn from_json(text: &str) -> ParseResult<Self> {
        serde_json::from_str(text).map_err(|e| ParseError::Config(e.to_string()))
    }

    pub fn from_yaml(text: &str) -> ParseResult<Self> {
        serde_yaml::from_str(text).map_err(|e| ParseError::Config(e.to_string()))
    }

    /// Resolved epoch of a feature stream
    pub fn custom_version(&self, stream: FeatureStream) -> ParseResult<i32> {
        self.custom_versions
            .get(&stream)
            .copied()
            .ok_or(ParseError::UnresolvedVersion(stream))
    }

    /// Whether `stream` has reached `threshold`
    pub fn is_at_least(&self, stream: FeatureStream, threshold: i32) -> ParseResult<bool> {
        Ok(self.custom_version(stream)? >= threshold)
    }

    /// Whether `stream` is still before `threshold`
    pub fn is_before(&self, stream: FeatureStream, threshold: i32) -> ParseResult<bool> {
        Ok(!self.is_at_least(stream, threshold)?)
    }

    pub fn object_version_at_least(&self, threshold: i32) -> bool {
        self.object_version >= threshold
    }

    /// Loader option lookup, defaulting to enabled
    pub fn has_option(&self, name: &str) -> bool {
        self.options.get(name).copied().unwrap_or(true)
    }
}

/// Builder for [`VersionContext`]
#[derive(Debug, Default)]
pub struct VersionContextBuilder {
    context: VersionContext,
}

impl VersionContextBuilder {
    pub fn object_version(mut self, version: i32) -> Self {
        self.context.object_version = version;
        self
    }

    pub fn custom_version(mut self, stream: FeatureStream, version: i32) -> Self {
        self.context.custom_versions.insert(stream, version);
        self
    }

    pub fn game(mut self, game: Game) -> Self {
        self.context.game = game;
        self
    }

    pub fn option(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.context.options.insert(name.into(), enabled);
        self
    }

    pub fn thresholds(mut self, thresholds: VersionThresholds) -> Self {
        self.context.thresholds = thresholds;
        self
    }

    pub fn build(self) -> VersionContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_at_threshold() {
        let ctx = VersionContext::builder()
            .custom_version(FeatureStream::Editor, 23)
            .build();

        assert!(ctx.is_at_least(FeatureStream::Editor, 23).unwrap());
        assert!(!ctx.is_before(FeatureStream::Editor, 23).unwrap());
        assert!(ctx.is_before(FeatureStream::Editor, 24).unwrap());
    }

    #[test]
    fn test_unresolved_stream_fails() {
        let ctx = VersionContext::default();
        match ctx.is_at_least(FeatureStream::FortniteMain, 1) {
            Err(ParseError::UnresolvedVersion(FeatureStream::FortniteMain)) => {}
            other => panic!("Expected UnresolvedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_options_default_on() {
        let ctx = VersionContext::builder()
            .option(MORPH_TARGET_OPTION, false)
            .build();
        assert!(!ctx.has_option(MORPH_TARGET_OPTION));
        assert!(VersionContext::default().has_option(MORPH_TARGET_OPTION));
    }

    #[test]
    fn test_latest_resolves_every_stream() {
        let ctx = VersionContext::latest();
        for stream in FeatureStream::ALL {
            assert_eq!(ctx.custom_version(stream).unwrap(), i32::MAX);
        }
    }

    #[test]
    fn test_game_from_str() {
        assert_eq!("frank-stone".parse::<Game>(), Ok(Game::TheCastingOfFrankStone));
        assert_eq!("UE5".parse::<Game>(), Ok(Game::Unreal));
        assert!("halo".parse::<Game>().is_err());
    }

    #[test]
    fn test_context_from_json() {
        let ctx = VersionContext::from_json(
            r#"{
                "object_version": 522,
                "custom_versions": { "Editor": 40, "FortniteMain": 7 },
                "game": "the_casting_of_frank_stone"
            }"#,
        )
        .unwrap();

        assert_eq!(ctx.object_version, 522);
        assert_eq!(ctx.custom_version(FeatureStream::Editor).unwrap(), 40);
        assert_eq!(ctx.game, Game::TheCastingOfFrankStone);
        assert_eq!(ctx.thresholds, VersionThresholds::default());
    }

    #[test]
    fn test_context_from_yaml() {
        let ctx = VersionContext::from_yaml(
            "object_version: 375\ncustom_versions:\n  Editor: 1\noptions:\n  MorphTarget: false\n",
        )
        .unwrap();

        assert_eq!(ctx.object_version, 375);
        assert!(!ctx.has_option(MORPH_TARGET_OPTION));
    }

    #[test]
    fn test_bad_config_is_config_error() {
        assert!(matches!(
            VersionContext::from_json("{ \"object_version\": \"x\" }"),
            Err(ParseError::Config(_))
        ));
    }
}
