//! Fixed layout savestate helpers
//!
//! Every peripheral serializes itself into a block of constant size with fields in a fixed order.
//! Multi-byte values are always stored big endian so that savestates can be exchanged between
//! hosts. Buffer lengths are validated by the caller (see `Palm::load_state`), the helpers below
//! panic on short buffers.

/// Implemented by all hardware blocks taking part in a savestate
pub trait SaveState {
    /// Size of the serialized state in bytes. Must not depend on the current state.
    fn state_size(&self) -> usize;

    /// Write the state into `data`, which must be at least `state_size()` bytes long
    fn save_state(&self, data: &mut [u8]);

    /// Overwrite the entire state from `data`, which must be at least `state_size()` bytes long
    fn load_state(&mut self, data: &[u8]);
}

/// Cursor writing fixed-width values into a savestate buffer
pub struct StateWriter<'a> {
    data: &'a mut [u8],
    offset: usize,
}

impl<'a> StateWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> StateWriter<'a> {
        StateWriter { data, offset: 0 }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data[self.offset] = v;
        self.offset += 1;
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.offset + bytes.len();

        self.data[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
    }

    /// Returns the remaining part of the buffer, used to chain nested blocks
    pub fn remaining(&mut self) -> &mut [u8] {
        &mut self.data[self.offset..]
    }

    /// Skip `len` bytes, typically after a nested block has been written through `remaining`
    pub fn advance(&mut self, len: usize) {
        self.offset += len;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Cursor reading fixed-width values out of a savestate buffer
pub struct StateReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> StateReader<'a> {
    pub fn new(data: &'a [u8]) -> StateReader<'a> {
        StateReader { data, offset: 0 }
    }

    pub fn read_u8(&mut self) -> u8 {
        let v = self.data[self.offset];
        self.offset += 1;
        v
    }

    /// Any non-zero byte is read back as `true`
    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    pub fn read_u16(&mut self) -> u16 {
        let v = u16::from_be_bytes(*array_ref![self.data, self.offset, 2]);
        self.offset += 2;
        v
    }

    pub fn read_u32(&mut self) -> u32 {
        let v = u32::from_be_bytes(*array_ref![self.data, self.offset, 4]);
        self.offset += 4;
        v
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn advance(&mut self, len: usize) {
        self.offset += len;
    }
}
