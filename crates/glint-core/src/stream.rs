// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Little-endian binary streams used by resource serialization and archives.
//!
//! Strings and byte blobs are length-prefixed with a `u64`. Optional asset
//! identifiers are written as a `u64` where `0` means "none".

use crate::asset::AssetUUID;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors raised while reading or writing a binary stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying reader or writer failed (including unexpected end of data).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A string field did not contain valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidString,
    /// A length prefix does not fit in memory on this platform.
    #[error("length prefix {0} is too large")]
    LengthOverflow(u64),
    /// The data is structurally invalid.
    #[error("invalid data: {0}")]
    Invalid(String),
    /// The resource type does not implement binary serialization.
    #[error("binary serialization is not supported by {0}")]
    Unsupported(&'static str),
}

/// Writes primitive values to any [`Write`] implementation.
pub struct BinaryWriter<'a> {
    inner: &'a mut dyn Write,
}

impl<'a> BinaryWriter<'a> {
    /// Wraps a writer.
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self { inner }
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), StreamError> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    /// Writes a boolean as one byte (`0` or `1`).
    pub fn write_bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.write_u8(u8::from(value))
    }

    /// Writes a `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<(), StreamError> {
        self.inner.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Writes a `u64`.
    pub fn write_u64(&mut self, value: u64) -> Result<(), StreamError> {
        self.inner.write_u64::<LittleEndian>(value)?;
        Ok(())
    }

    /// Writes a `usize` widened to `u64`.
    pub fn write_usize(&mut self, value: usize) -> Result<(), StreamError> {
        self.write_u64(value as u64)
    }

    /// Writes an optional asset identifier.
    pub fn write_uuid(&mut self, value: Option<AssetUUID>) -> Result<(), StreamError> {
        self.write_u64(AssetUUID::to_raw(value))
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<(), StreamError> {
        self.write_bytes(value.as_bytes())
    }

    /// Writes a length-prefixed byte blob.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), StreamError> {
        self.write_usize(value.len())?;
        self.write_raw(value)
    }

    /// Writes bytes without a length prefix.
    pub fn write_raw(&mut self, value: &[u8]) -> Result<(), StreamError> {
        self.inner.write_all(value)?;
        Ok(())
    }
}

/// Reads primitive values written by [`BinaryWriter`].
pub struct BinaryReader<'a> {
    inner: &'a mut dyn Read,
}

impl<'a> BinaryReader<'a> {
    /// Wraps a reader.
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self { inner }
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        Ok(self.inner.read_u8()?)
    }

    /// Reads a boolean; any byte other than `0` or `1` is rejected.
    pub fn read_bool(&mut self) -> Result<bool, StreamError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamError::Invalid(format!("invalid bool byte {other}"))),
        }
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    /// Reads a `u64`.
    pub fn read_u64(&mut self) -> Result<u64, StreamError> {
        Ok(self.inner.read_u64::<LittleEndian>()?)
    }

    /// Reads a `u64` and narrows it to `usize`.
    pub fn read_usize(&mut self) -> Result<usize, StreamError> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| StreamError::LengthOverflow(value))
    }

    /// Reads an optional asset identifier.
    pub fn read_uuid(&mut self) -> Result<Option<AssetUUID>, StreamError> {
        Ok(AssetUUID::from_raw(self.read_u64()?))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        String::from_utf8(self.read_bytes()?).map_err(|_| StreamError::InvalidString)
    }

    /// Reads a length-prefixed byte blob.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, StreamError> {
        let len = self.read_u64()?;
        let mut bytes = Vec::new();
        let read = Read::take(&mut *self.inner, len).read_to_end(&mut bytes)?;
        if read as u64 != len {
            return Err(StreamError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, found {read}"),
            )));
        }
        Ok(bytes)
    }

    /// Fills `buffer` exactly.
    pub fn read_raw(&mut self, buffer: &mut [u8]) -> Result<(), StreamError> {
        self.inner.read_exact(buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_layout_is_little_endian() {
        let mut bytes = Vec::new();
        let mut writer = BinaryWriter::new(&mut bytes);
        writer.write_u32(1).unwrap();
        writer.write_str("ab").unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_mixed_values_read_back() {
        let uuid = AssetUUID::from_raw(42);
        let mut bytes = Vec::new();
        {
            let mut writer = BinaryWriter::new(&mut bytes);
            writer.write_uuid(uuid).unwrap();
            writer.write_uuid(None).unwrap();
            writer.write_bool(true).unwrap();
            writer.write_str("albedo").unwrap();
        }

        let mut cursor = Cursor::new(bytes);
        let mut reader = BinaryReader::new(&mut cursor);
        assert_eq!(reader.read_uuid().unwrap(), uuid);
        assert_eq!(reader.read_uuid().unwrap(), None);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_string().unwrap(), "albedo");
    }

    #[test]
    fn test_truncated_blob_is_an_error() {
        let mut bytes = Vec::new();
        BinaryWriter::new(&mut bytes).write_u64(1_000_000).unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);

        let mut cursor = Cursor::new(bytes);
        let mut reader = BinaryReader::new(&mut cursor);
        assert!(matches!(reader.read_bytes(), Err(StreamError::Io(_))));
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let mut cursor = Cursor::new(vec![7u8]);
        let mut reader = BinaryReader::new(&mut cursor);
        assert!(matches!(reader.read_bool(), Err(StreamError::Invalid(_))));
    }
}
