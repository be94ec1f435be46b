use std::cell::Cell;

/// Host supplied memory read capability.
///
/// Copies up to `buffer.len()` bytes starting at `address` into `buffer` and
/// returns how many bytes were copied. A short count means the remainder is
/// out of range or unavailable; it is not an error.
pub trait ReadMemory {
    fn read(&self, address: u32, buffer: &mut [u8]) -> usize;
}

/// Flat RAM buffer, the common case for most emulators.
impl ReadMemory for [u8] {
    fn read(&self, address: u32, buffer: &mut [u8]) -> usize {
        let start = address as usize;
        if start >= self.len() {
            return 0;
        }
        let count = buffer.len().min(self.len() - start);
        buffer[..count].copy_from_slice(&self[start..start + count]);
        count
    }
}

impl ReadMemory for Vec<u8> {
    fn read(&self, address: u32, buffer: &mut [u8]) -> usize {
        self.as_slice().read(address, buffer)
    }
}

impl<const N: usize> ReadMemory for [u8; N] {
    fn read(&self, address: u32, buffer: &mut [u8]) -> usize {
        self.as_slice().read(address, buffer)
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read(&self, address: u32, buffer: &mut [u8]) -> usize {
        (**self).read(address, buffer)
    }
}

/// Closure adapter: `|address, buffer| -> usize`.
pub struct FnMemory<F>(pub F);

impl<F> ReadMemory for FnMemory<F>
where
    F: Fn(u32, &mut [u8]) -> usize,
{
    fn read(&self, address: u32, buffer: &mut [u8]) -> usize {
        (self.0)(address, buffer)
    }
}

/// Zero-filling reader handed to the trigger evaluation engine.
///
/// Typed reads are little-endian. Short reads are counted so the frame driver
/// can log once per frame instead of once per condition.
pub struct MemoryReader<'a> {
    inner: &'a dyn ReadMemory,
    short_reads: Cell<u32>,
}

impl<'a> MemoryReader<'a> {
    pub fn new(inner: &'a dyn ReadMemory) -> Self {
        Self {
            inner,
            short_reads: Cell::new(0),
        }
    }

    /// Fill `buffer` from `address`; bytes that could not be read are zero.
    pub fn read_into(&self, address: u32, buffer: &mut [u8]) {
        let count = self.inner.read(address, buffer).min(buffer.len());
        if count < buffer.len() {
            buffer[count..].fill(0);
            self.short_reads.set(self.short_reads.get().saturating_add(1));
        }
    }

    pub fn read_u8(&self, address: u32) -> u8 {
        let mut buf = [0u8; 1];
        self.read_into(address, &mut buf);
        buf[0]
    }

    pub fn read_u16(&self, address: u32) -> u16 {
        let mut buf = [0u8; 2];
        self.read_into(address, &mut buf);
        u16::from_le_bytes(buf)
    }

    pub fn read_u24(&self, address: u32) -> u32 {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf[..3]);
        u32::from_le_bytes(buf)
    }

    pub fn read_u32(&self, address: u32) -> u32 {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf);
        u32::from_le_bytes(buf)
    }

    pub fn read_u16_be(&self, address: u32) -> u16 {
        let mut buf = [0u8; 2];
        self.read_into(address, &mut buf);
        u16::from_be_bytes(buf)
    }

    pub fn read_u32_be(&self, address: u32) -> u32 {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf);
        u32::from_be_bytes(buf)
    }

    /// Number of reads that came back short since this reader was created.
    pub fn short_reads(&self) -> u32 {
        self.short_reads.get()
    }
}
