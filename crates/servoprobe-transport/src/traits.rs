use std::io::{Read, Write};

use crate::error::Result;

/// A connected byte stream that can report how many bytes are waiting.
///
/// The response reader polls [`ByteStream::bytes_available`] and only reads
/// when data is pending, so implementations never need to block on `read`.
pub trait ByteStream: Read + Write {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Human-readable name of the underlying device, for diagnostics.
    fn name(&self) -> Option<String> {
        None
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn name(&self) -> Option<String> {
        (**self).name()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn name(&self) -> Option<String> {
        (**self).name()
    }
}
