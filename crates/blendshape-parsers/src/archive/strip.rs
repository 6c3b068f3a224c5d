//! Strip-data flags written ahead of cooked payloads

use std::io::{Read, Seek};

use super::reader::AssetReader;
use crate::traits::ParseResult;

/// Global strip flag bits
pub mod global {
    pub const EDITOR: u8 = 0x1;
    pub const SERVER: u8 = 0x2;
    pub const ALL_VISUAL: u8 = 0x4;
}

/// Which parts of an object's payload were left out of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripDataFlags {
    pub global_strip_flags: u8,
    pub class_strip_flags: u8,
}

impl StripDataFlags {
    pub fn new(global_strip_flags: u8, class_strip_flags: u8) -> Self {
        Self {
            global_strip_flags,
            class_strip_flags,
        }
    }

    pub fn decode<R: Read + Seek>(reader: &mut AssetReader<R>) -> ParseResult<Self> {
        let global_strip_flags = reader.read_u8()?;
        let class_strip_flags = reader.read_u8()?;
        Ok(Self::new(global_strip_flags, class_strip_flags))
    }

    pub fn is_editor_data_stripped(&self) -> bool {
        self.global_strip_flags & global::EDITOR != 0
    }

    pub fn is_data_stripped_for_server(&self) -> bool {
        self.global_strip_flags & global::SERVER != 0
    }

    pub fn is_all_visual_data_stripped(&self) -> bool {
        self.global_strip_flags & global::ALL_VISUAL != 0
    }

    pub fn is_class_data_stripped(&self, flag: u8) -> bool {
        self.class_strip_flags & flag != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::VersionContext;
    use std::io::Cursor;

    #[test]
    fn test_decode_reads_two_bytes() {
        let mut reader = AssetReader::new(Cursor::new(vec![0x3, 0x1, 0xFF]), VersionContext::default());
        let flags = StripDataFlags::decode(&mut reader).unwrap();

        assert!(flags.is_editor_data_stripped());
        assert!(flags.is_data_stripped_for_server());
        assert!(!flags.is_all_visual_data_stripped());
        assert!(flags.is_class_data_stripped(0x1));
        assert_eq!(reader.position().unwrap(), 2);
    }
}
