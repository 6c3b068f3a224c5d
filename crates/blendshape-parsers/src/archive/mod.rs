//! Stream plumbing shared by the decoders: the primitive reader, the
//! resolved version context and strip-data flags.

mod reader;
mod strip;
mod versions;

pub use reader::AssetReader;
pub use strip::{global as strip_flags, StripDataFlags};
pub use versions::{
    FeatureStream, Game, VersionContext, VersionContextBuilder, VersionThresholds,
    MORPH_TARGET_OPTION,
};
