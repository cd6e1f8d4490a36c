use byteorder::{ByteOrder, LittleEndian};

/// Cursor over a byte slice. Reads past the end return `None` and leave
/// the offset untouched.
pub struct DataReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(data: &'a [u8]) -> DataReader<'a> {
        DataReader { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let u = *self.data.get(self.offset)?;
        self.offset += 1;
        Some(u)
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.read_bytes(2)?;
        Some(LittleEndian::read_u16(bytes))
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.data.get(self.offset..self.offset.checked_add(len)?)?;
        self.offset += len;
        Some(bytes)
    }
}

#[cfg(test)]
#[path = "./util_test.rs"]
mod util_test;
