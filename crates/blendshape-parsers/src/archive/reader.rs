//! Little-endian primitive reader over a seekable byte source.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use blendshape_core::{IntVector, Vec3};

use super::versions::VersionContext;
use crate::traits::{ParseError, ParseOptions, ParseResult};

/// Cursor over a serialized asset, carrying the versions it was saved with.
///
/// Owned exclusively by one decode call.
pub struct AssetReader<R> {
    inner: R,
    versions: VersionContext,
    options: ParseOptions,
}

impl<R: Read + Seek> AssetReader<R> {
    pub fn new(inner: R, versions: VersionContext) -> Self {
        Self::with_options(inner, versions, ParseOptions::default())
    }

    pub fn with_options(inner: R, versions: VersionContext, options: ParseOptions) -> Self {
        Self {
            inner,
            versions,
            options,
        }
    }

    pub fn versions(&self) -> &VersionContext {
        &self.versions
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current absolute offset
    pub fn position(&mut self) -> ParseResult<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Move to an absolute offset
    pub fn seek(&mut self, position: u64) -> ParseResult<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Move relative to the current offset
    pub fn skip(&mut self, bytes: i64) -> ParseResult<()> {
        self.inner.seek(SeekFrom::Current(bytes))?;
        Ok(())
    }

    /// Total length of the underlying stream; the cursor is left where it was
    pub fn stream_len(&mut self) -> ParseResult<u64> {
        let current = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(current))?;
        Ok(end)
    }

    pub fn read_u8(&mut self) -> ParseResult<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i32(&mut self) -> ParseResult<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> ParseResult<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> ParseResult<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    /// 32-bit boolean. Under strict validation anything other than 0 or 1
    /// is corrupt; otherwise any nonzero value reads as true.
    pub fn read_bool(&mut self) -> ParseResult<bool> {
        let offset = self.position()?;
        match self.read_i32()? {
            0 => Ok(false),
            1 => Ok(true),
            value if self.options.strict_validation => {
                Err(ParseError::InvalidBool { offset, value })
            }
            _ => Ok(true),
        }
    }

    pub fn read_vec3(&mut self) -> ParseResult<Vec3> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vec3::new(x, y, z))
    }

    pub fn read_int_vector(&mut self) -> ParseResult<IntVector> {
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        let z = self.read_i32()?;
        Ok(IntVector::new(x, y, z))
    }

    /// Length-prefixed string.
    ///
    /// A positive length counts UTF-8 bytes, a negative one UTF-16 code
    /// units; both include a trailing NUL which is dropped.
    pub fn read_string(&mut self) -> ParseResult<String> {
        let offset = self.position()?;
        let length = self.read_i32()?;

        if length == 0 {
            return Ok(String::new());
        }

        let units = length.unsigned_abs() as usize;
        if length == i32::MIN || units > self.options.max_string_length {
            return Err(ParseError::CorruptedData {
                offset,
                message: format!("string length {} out of range", length),
            });
        }

        if length > 0 {
            let mut bytes = vec![0u8; units];
            self.inner.read_exact(&mut bytes)?;
            if bytes.last() == Some(&0) {
                bytes.pop();
            }
            String::from_utf8(bytes).map_err(|e| ParseError::CorruptedData {
                offset,
                message: format!("invalid UTF-8 string: {}", e),
            })
        } else {
            let mut chars = vec![0u16; units];
            self.inner.read_u16_into::<LittleEndian>(&mut chars)?;
            if chars.last() == Some(&0) {
                chars.pop();
            }
            String::from_utf16(&chars).map_err(|e| ParseError::CorruptedData {
                offset,
                message: format!("invalid UTF-16 string: {}", e),
            })
        }
    }

    /// Length-prefixed array, decoding each element with `read_element`
    pub fn read_array<T, F>(&mut self, mut read_element: F) -> ParseResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> ParseResult<T>,
    {
        let len = self.read_array_len()?;
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(read_element(self)?);
        }
        Ok(items)
    }

    /// Length-prefixed array of `i32`
    pub fn read_i32_array(&mut self) -> ParseResult<Vec<i32>> {
        self.read_array(|r| r.read_i32())
    }

    fn read_array_len(&mut self) -> ParseResult<usize> {
        let offset = self.position()?;
        let len = self.read_i32()?;
        match usize::try_from(len) {
            Ok(len) if len <= self.options.max_array_length => Ok(len),
            _ => Err(ParseError::CorruptedData {
                offset,
                message: format!("array length {} out of range", len),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn reader(bytes: Vec<u8>) -> AssetReader<Cursor<Vec<u8>>> {
        AssetReader::new(Cursor::new(bytes), VersionContext::default())
    }

    #[test]
    fn test_read_bool_rejects_other_values() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(1).unwrap();
        bytes.write_i32::<LittleEndian>(2).unwrap();

        let mut r = reader(bytes);
        assert!(r.read_bool().unwrap());
        match r.read_bool() {
            Err(ParseError::InvalidBool { offset: 4, value: 2 }) => {}
            other => panic!("Expected InvalidBool, got {:?}", other),
        }
    }

    #[test]
    fn test_read_bool_lenient() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(-7).unwrap();

        let options = ParseOptions {
            strict_validation: false,
            ..ParseOptions::default()
        };
        let mut r = AssetReader::with_options(Cursor::new(bytes), VersionContext::default(), options);
        assert!(r.read_bool().unwrap());
    }

    #[test]
    fn test_read_string_ansi_and_utf16() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(5).unwrap();
        bytes.extend_from_slice(b"face\0");
        bytes.write_i32::<LittleEndian>(-3).unwrap();
        for unit in "hé\0".encode_utf16() {
            bytes.write_u16::<LittleEndian>(unit).unwrap();
        }
        bytes.write_i32::<LittleEndian>(0).unwrap();

        let mut r = reader(bytes);
        assert_eq!(r.read_string().unwrap(), "face");
        assert_eq!(r.read_string().unwrap(), "hé");
        assert_eq!(r.read_string().unwrap(), "");
    }

    #[test]
    fn test_read_array_negative_length() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(-1).unwrap();

        let mut r = reader(bytes);
        assert!(matches!(
            r.read_i32_array(),
            Err(ParseError::CorruptedData { offset: 0, .. })
        ));
    }

    #[test]
    fn test_truncated_read_is_eof() {
        let mut r = reader(vec![1, 2]);
        assert!(r.read_u32().unwrap_err().is_unexpected_eof());
    }

    #[test]
    fn test_skip_and_stream_len() {
        let mut r = reader(vec![0; 12]);
        r.skip(4).unwrap();
        assert_eq!(r.stream_len().unwrap(), 12);
        assert_eq!(r.position().unwrap(), 4);
    }
}
