use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{UnpackError, UnpackResult};

/// Cursor over a random-access byte source where every read is exact.
///
/// A read that would run past the end fails with
/// [`UnpackError::TruncatedInput`] and never yields a short buffer. The
/// underlying handle is dropped before that error is returned.
pub struct BoundedReader<R> {
    inner: Option<R>,
    name: String,
    len: u64,
    position: u64,
}

impl<R: Read + Seek> BoundedReader<R> {
    pub fn new(mut inner: R, name: impl Into<String>) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        Ok(BoundedReader {
            inner: Some(inner),
            name: name.into(),
            len,
            position: 0,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn inner(&mut self) -> UnpackResult<&mut R> {
        match self.inner.as_mut() {
            Some(inner) => Ok(inner),
            None => Err(UnpackError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} was closed after a failed read", self.name),
            ))),
        }
    }

    fn ensure_available(&mut self, length: u64) -> UnpackResult<()> {
        let fits = self
            .position
            .checked_add(length)
            .is_some_and(|end| end <= self.len);

        if !fits {
            // Close the handle before surfacing the error
            self.inner = None;
            return Err(UnpackError::TruncatedInput {
                requested: length,
                remaining: self.remaining(),
                input: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, length: usize) -> UnpackResult<Vec<u8>> {
        self.ensure_available(length as u64)?;

        let mut buffer = vec![0u8; length];
        self.inner()?.read_exact(&mut buffer)?;
        self.position += length as u64;
        Ok(buffer)
    }

    fn read_array<const N: usize>(&mut self) -> UnpackResult<[u8; N]> {
        self.ensure_available(N as u64)?;

        let mut buf = [0u8; N];
        self.inner()?.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    pub fn read_u16_le(&mut self) -> UnpackResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> UnpackResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> UnpackResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads a signed 32-bit count or length, rejecting negative values
    pub fn read_length(&mut self, field: &'static str) -> UnpackResult<u32> {
        let value = self.read_i32_le()?;
        u32::try_from(value).map_err(|_| UnpackError::InvalidLength {
            field,
            value,
            input: self.name.clone(),
        })
    }

    /// Consumes `length` bytes without keeping them
    pub fn skip(&mut self, length: u64) -> UnpackResult<()> {
        self.ensure_available(length)?;
        let target = self.position + length;
        self.seek_to(target)
    }

    /// Repositions the cursor without reading.
    ///
    /// Seeking past the end is allowed; the next read from there reports
    /// the truncation.
    pub fn seek_to(&mut self, position: u64) -> UnpackResult<()> {
        self.inner()?.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }
}
