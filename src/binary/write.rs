#![deny(missing_docs)]

//! Write binary data
//!
//! Used by the outline re-encoder and for constructing table buffers in
//! tests. Only whole-value writes are supported; there is no placeholder
//! back-patching.

use crate::binary::{I16Be, I32Be, I64Be, U16Be, U32Be, I8, U8};
use crate::error::WriteError;

/// An in-memory buffer that implements `WriteContext`.
pub struct WriteBuffer {
    data: Vec<u8>,
}

/// Trait that describes a type that can be written to a `WriteContext` in binary form.
pub trait WriteBinary<HostType = Self> {
    /// The type of the value returned by `write`.
    type Output;

    /// Write the binary representation of Self to `ctxt`.
    fn write<C: WriteContext>(ctxt: &mut C, val: HostType) -> Result<Self::Output, WriteError>;
}

/// Trait for types that can have binary data written to them.
pub trait WriteContext {
    /// Write a `Vec` into a `WriteContext`.
    fn write_vec<T, HostType>(&mut self, vec: Vec<HostType>) -> Result<(), WriteError>
    where
        Self: Sized,
        T: WriteBinary<HostType>,
    {
        for val in vec {
            T::write(self, val)?;
        }

        Ok(())
    }

    /// Write a slice of bytes to a `WriteContext`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Write the specified number of zero bytes to the `WriteContext`.
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError>;

    /// The total number of bytes written so far.
    fn bytes_written(&self) -> usize;
}

impl WriteBuffer {
    /// Create a new, empty `WriteBuffer`.
    pub fn new() -> Self {
        WriteBuffer { data: Vec::new() }
    }

    /// The bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the bytes written.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        WriteBuffer::new()
    }
}

impl WriteContext for WriteBuffer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.data.resize(self.data.len() + count, 0);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
    }
}

impl<T> WriteBinary<T> for U8
where
    T: Into<u8>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u8 = t.into();
        ctxt.write_bytes(&[val])
    }
}

impl<T> WriteBinary<T> for I8
where
    T: Into<i8>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i8 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U16Be
where
    T: Into<u16>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u16 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I16Be
where
    T: Into<i16>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i16 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U32Be
where
    T: Into<u32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u32 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I32Be
where
    T: Into<i32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i32 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I64Be
where
    T: Into<i64>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i64 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_primitives() {
        let mut buffer = WriteBuffer::new();
        U8::write(&mut buffer, 1u8).unwrap();
        U16Be::write(&mut buffer, 0x0203u16).unwrap();
        I16Be::write(&mut buffer, -1i16).unwrap();
        U32Be::write(&mut buffer, 0x04050607u32).unwrap();
        assert_eq!(
            buffer.bytes(),
            &[1, 2, 3, 0xFF, 0xFF, 4, 5, 6, 7]
        );
        assert_eq!(buffer.bytes_written(), 9);
    }

    #[test]
    fn test_write_zeros() {
        let mut buffer = WriteBuffer::new();
        buffer.write_bytes(&[1]).unwrap();
        buffer.write_zeros(3).unwrap();
        assert_eq!(buffer.bytes(), &[1, 0, 0, 0]);
    }
}
