//! # Guest memory
//!
//! A bounds-checked view of the guest's linear memory, valid for one host
//! call. Every accessor validates its `(offset, size)` pair against the
//! current memory size before touching a byte, so a guest pointer is never
//! trusted and never cached.
//!
//! Offsets arrive as guest `i32`s and are reinterpreted as `u32`; a negative
//! pointer is a very large offset and fails the check like any other.

use shimabi::Errno;
use shimabi::Iovec;

/// `true` iff `[offset, offset + object_size)` lies inside a memory of `mem_size` bytes.
pub fn check_pointer(offset: u32, object_size: usize, mem_size: usize) -> bool {
    object_size <= mem_size && offset as usize <= mem_size - object_size
}

/// Borrowed view of linear memory for the duration of a single call.
pub struct GuestMemory<'a> {
    bytes: &'a mut [u8],
}

impl<'a> GuestMemory<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// A view for guests that export no memory. Every pointer check fails.
    pub fn empty() -> Self {
        Self { bytes: Default::default() }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, offset: u32, len: usize) -> Result<std::ops::Range<usize>, Errno> {
        if check_pointer(offset, len, self.bytes.len()) {
            let start = offset as usize;
            Ok(start..start + len)
        } else {
            Err(Errno::TooBig)
        }
    }

    /// Validates a region without accessing it.
    pub fn check(&self, offset: u32, len: usize) -> Result<(), Errno> {
        self.range(offset, len).map(|_| ())
    }

    pub fn slice(&self, offset: u32, len: usize) -> Result<&[u8], Errno> {
        let range = self.range(offset, len)?;
        Ok(&self.bytes[range])
    }

    pub fn slice_mut(&mut self, offset: u32, len: usize) -> Result<&mut [u8], Errno> {
        let range = self.range(offset, len)?;
        Ok(&mut self.bytes[range])
    }

    pub fn read_bytes(&self, offset: u32, len: usize) -> Result<Vec<u8>, Errno> {
        self.slice(offset, len).map(<[u8]>::to_vec)
    }

    pub fn write_bytes(&mut self, offset: u32, data: &[u8]) -> Result<(), Errno> {
        self.slice_mut(offset, data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn read_u32(&self, offset: u32) -> Result<u32, Errno> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.slice(offset, 4)?);
        Ok(u32::from_le_bytes(raw))
    }

    pub fn read_u64(&self, offset: u32) -> Result<u64, Errno> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.slice(offset, 8)?);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<(), Errno> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, offset: u32, value: u64) -> Result<(), Errno> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Reads an array of `len` iovec records at `ptr`.
    ///
    /// Only the array is validated here; each buffer it points at is checked
    /// when it is used.
    pub fn read_iovecs(&self, ptr: u32, len: u32) -> Result<Vec<Iovec>, Errno> {
        let total = (len as usize).checked_mul(Iovec::SIZE).ok_or(Errno::TooBig)?;
        let raw = self.slice(ptr, total)?;
        Ok(raw
            .chunks_exact(Iovec::SIZE)
            .map(|chunk| {
                let mut record = [0u8; Iovec::SIZE];
                record.copy_from_slice(chunk);
                Iovec::decode(record)
            })
            .collect())
    }
}
