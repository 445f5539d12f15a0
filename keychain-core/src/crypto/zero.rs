//! Zeroization utilities for secure memory handling.

use zeroize::ZeroizeOnDrop;

/// A secure buffer that automatically zeroizes on drop
///
/// Holds padded plaintext passwords between the AEAD and the padding codec.
#[derive(ZeroizeOnDrop)]
pub struct SecureBuffer {
    data: Vec<u8>,
}

impl SecureBuffer {
    /// Create a new secure buffer from data
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Create an empty buffer that can hold `capacity` bytes without reallocating
    ///
    /// Growing past the capacity would leave an unzeroized copy behind.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Append bytes to the buffer
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Resize the buffer, filling new space with `value`
    pub fn resize(&mut self, len: usize, value: u8) {
        self.data.resize(len, value);
    }

    /// Get the length of the buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a reference to the inner data (use carefully!)
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_buffer_creation() {
        let data = vec![1, 2, 3, 4, 5];
        let buffer = SecureBuffer::new(data.clone());

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.as_bytes(), &data[..]);
    }

    #[test]
    fn test_secure_buffer_growth_within_capacity() {
        let mut buffer = SecureBuffer::with_capacity(8);
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"abc");
        buffer.resize(8, 0);

        assert_eq!(buffer.as_bytes(), b"abc\0\0\0\0\0");
    }
}
