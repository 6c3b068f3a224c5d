//! Layout dispatch for one LOD's morph payload.
//!
//! Historical layouts are listed as `(rule, layout)` pairs and evaluated top
//! to bottom; the first rule that holds picks the layout. Rules only consult
//! the streams they name, so selection never touches a stream that an
//! earlier rule already made irrelevant.

use std::fmt;

use crate::archive::{FeatureStream, Game, VersionContext, VersionThresholds};
use crate::traits::{ParseError, ParseResult};

/// Serialized shape of one LOD's morph payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LodLayout {
    /// Deltas and base vertex count only
    Legacy,
    /// Adds section indices
    SectionAware,
    /// Game-specific: section indices and the engine flag, nothing else
    GameVariant,
    /// Optional strip flag, deltas, count, sections, engine flag
    Mainline,
}

impl fmt::Display for LodLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LodLayout::Legacy => "legacy",
            LodLayout::SectionAware => "section-aware",
            LodLayout::GameVariant => "game-variant",
            LodLayout::Mainline => "mainline",
        };
        f.write_str(name)
    }
}

/// Predicate over a version context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutRule {
    /// Stream epoch below the threshold
    Before(FeatureStream, i32),
    /// Package cooked for this game
    GameIs(Game),
    Always,
}

impl LayoutRule {
    pub fn matches(&self, versions: &VersionContext) -> ParseResult<bool> {
        match *self {
            LayoutRule::Before(stream, threshold) => versions.is_before(stream, threshold),
            LayoutRule::GameIs(game) => Ok(versions.game == game),
            LayoutRule::Always => Ok(true),
        }
    }
}

/// Ordered rule table, built once per threshold set
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    entries: Vec<(LayoutRule, LodLayout)>,
}

impl LayoutTable {
    pub fn new(entries: Vec<(LayoutRule, LodLayout)>) -> Self {
        Self { entries }
    }

    pub fn compile(thresholds: &VersionThresholds) -> Self {
        Self::new(vec![
            (
                LayoutRule::Before(
                    FeatureStream::Editor,
                    thresholds.added_morph_target_section_indices,
                ),
                LodLayout::Legacy,
            ),
            (
                LayoutRule::Before(
                    FeatureStream::FortniteMain,
                    thresholds.save_generated_morph_target_by_engine,
                ),
                LodLayout::SectionAware,
            ),
            (LayoutRule::GameIs(Game::TheCastingOfFrankStone), LodLayout::GameVariant),
            (LayoutRule::Always, LodLayout::Mainline),
        ])
    }

    pub fn entries(&self) -> &[(LayoutRule, LodLayout)] {
        &self.entries
    }

    /// First layout whose rule holds
    pub fn select(&self, versions: &VersionContext) -> ParseResult<LodLayout> {
        for (rule, layout) in &self.entries {
            if rule.matches(versions)? {
                return Ok(*layout);
            }
        }
        Err(ParseError::UnreachableLayout(format!(
            "object version {}, game {}, custom versions {:?}",
            versions.object_version, versions.game, versions.custom_versions
        )))
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::compile(&VersionThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(editor: i32, main: i32, game: Game) -> VersionContext {
        VersionContext::builder()
            .custom_version(FeatureStream::Editor, editor)
            .custom_version(FeatureStream::FortniteMain, main)
            .game(game)
            .build()
    }

    #[test]
    fn test_select_each_layout() {
        let table = LayoutTable::default();
        assert_eq!(table.select(&context(22, 99, Game::Unreal)).unwrap(), LodLayout::Legacy);
        assert_eq!(table.select(&context(23, 5, Game::Unreal)).unwrap(), LodLayout::SectionAware);
        assert_eq!(
            table.select(&context(23, 6, Game::TheCastingOfFrankStone)).unwrap(),
            LodLayout::GameVariant
        );
        assert_eq!(table.select(&context(23, 6, Game::Unreal)).unwrap(), LodLayout::Mainline);
    }

    #[test]
    fn test_old_streams_win_over_game_variant() {
        let table = LayoutTable::default();
        assert_eq!(
            table.select(&context(0, 0, Game::TheCastingOfFrankStone)).unwrap(),
            LodLayout::Legacy
        );
    }

    #[test]
    fn test_legacy_needs_only_editor_stream() {
        let versions = VersionContext::builder()
            .custom_version(FeatureStream::Editor, 1)
            .build();
        assert_eq!(LayoutTable::default().select(&versions).unwrap(), LodLayout::Legacy);
    }

    #[test]
    fn test_missing_stream_is_unresolved() {
        let versions = VersionContext::builder()
            .custom_version(FeatureStream::Editor, 30)
            .build();
        assert!(matches!(
            LayoutTable::default().select(&versions),
            Err(ParseError::UnresolvedVersion(FeatureStream::FortniteMain))
        ));
    }

    #[test]
    fn test_table_without_fallback_reports_unreachable() {
        let table = LayoutTable::new(vec![(
            LayoutRule::GameIs(Game::TheCastingOfFrankStone),
            LodLayout::GameVariant,
        )]);
        assert!(matches!(
            table.select(&VersionContext::default()),
            Err(ParseError::UnreachableLayout(_))
        ));
    }
}
