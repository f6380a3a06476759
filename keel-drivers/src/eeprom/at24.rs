//! 24xx-series I2C EEPROM driver
//!
//! Covers the 16-bit word address parts (24xx32 up to 24xx512). Reads set
//! the word address and then read sequentially; writes are split on page
//! boundaries, and each page write is followed by ACK polling until the
//! chip finishes its internal write cycle.
//!
//! Every bus transaction is retried at most [`MAX_RETRIES`] times.

use embedded_hal::i2c::I2c;
use keel_hal::EepromBus;

/// Retries after a failed transaction
pub const MAX_RETRIES: usize = 2;

/// Largest page size supported (24xx512 has 128, clamped to this)
pub const MAX_PAGE_SIZE: usize = 64;

/// Bytes fetched per read transaction
const READ_CHUNK: usize = 64;

/// ACK polls before a page write is declared failed
///
/// A write cycle takes at most 5 ms; one poll at 100 kHz takes ~0.3 ms.
const MAX_ACK_POLLS: usize = 50;

/// Errors from the EEPROM driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum At24Error<E> {
    /// Bus error after all retries
    I2c(E),
    /// Access past the end of the chip
    OutOfRange,
    /// Chip never acknowledged after a page write
    WriteTimeout,
}

/// One or more 24xx EEPROMs on an I2C bus
pub struct At24Eeprom<I> {
    i2c: I,
    page_size: usize,
    capacity: u32,
}

impl<I: I2c> At24Eeprom<I> {
    /// 24xx128: 16 KiB, 64-byte pages
    pub fn new(i2c: I) -> Self {
        Self::with_geometry(i2c, 64, 16 * 1024)
    }

    /// Chip with the given page size and capacity in bytes
    pub fn with_geometry(i2c: I, page_size: usize, capacity: u32) -> Self {
        Self {
            i2c,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            capacity,
        }
    }

    /// Give the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether a chip acknowledges at `address`
    pub fn probe(&mut self, address: u8) -> bool {
        let mut byte = [0u8; 1];
        self.i2c.read(address, &mut byte).is_ok()
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<(), At24Error<I::Error>> {
        let end = offset as u64 + len as u64;
        if end > self.capacity as u64 {
            return Err(At24Error::OutOfRange);
        }
        Ok(())
    }

    fn retry<T>(
        &mut self,
        mut op: impl FnMut(&mut I) -> Result<T, I::Error>,
    ) -> Result<T, At24Error<I::Error>> {
        let mut attempt = 0;
        loop {
            match op(&mut self.i2c) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= MAX_RETRIES => return Err(At24Error::I2c(e)),
                Err(_) => attempt += 1,
            }
        }
    }

    fn write_page(&mut self, address: u8, offset: u32, data: &[u8]) -> Result<(), At24Error<I::Error>> {
        let mut frame: heapless::Vec<u8, { MAX_PAGE_SIZE + 2 }> = heapless::Vec::new();
        // data never exceeds one page
        let _ = frame.extend_from_slice(&(offset as u16).to_be_bytes());
        let _ = frame.extend_from_slice(data);
        self.retry(|i2c| i2c.write(address, &frame))?;

        // the chip NACKs its address until the write cycle completes
        let word = (offset as u16).to_be_bytes();
        for _ in 0..MAX_ACK_POLLS {
            if self.i2c.write(address, &word).is_ok() {
                return Ok(());
            }
        }
        Err(At24Error::WriteTimeout)
    }
}

impl<I: I2c> EepromBus for At24Eeprom<I> {
    type Error = At24Error<I::Error>;

    fn read(&mut self, address: u8, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.check_range(offset, buf.len())?;

        let mut offset = offset;
        for chunk in buf.chunks_mut(READ_CHUNK) {
            let word = (offset as u16).to_be_bytes();
            self.retry(|i2c| i2c.write_read(address, &word, chunk))?;
            offset += chunk.len() as u32;
        }
        Ok(())
    }

    fn write(&mut self, address: u8, offset: u32, data: &[u8]) -> Result<(), Self::Error> {
        self.check_range(offset, data.len())?;

        let mut offset = offset;
        let mut rest = data;
        while !rest.is_empty() {
            let room = self.page_size - offset as usize % self.page_size;
            let (page, tail) = rest.split_at(room.min(rest.len()));
            self.write_page(address, offset, page)?;
            offset += page.len() as u32;
            rest = tail;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    const ADDRESS: u8 = 0x57;

    /// One 16 KiB chip with a word address pointer
    struct MockChip {
        memory: Vec<u8>,
        pointer: usize,
        /// Transactions to fail before behaving
        fail_next: usize,
        /// Polls to NACK after a data write
        write_cycle: usize,
        busy: usize,
        transactions: usize,
        data_writes: Vec<usize>,
    }

    impl MockChip {
        fn new() -> Self {
            Self {
                memory: (0..16 * 1024).map(|i| i as u8).collect(),
                pointer: 0,
                fail_next: 0,
                write_cycle: 0,
                busy: 0,
                transactions: 0,
                data_writes: Vec::new(),
            }
        }
    }

    impl ErrorType for MockChip {
        type Error = ErrorKind;
    }

    impl I2c for MockChip {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), ErrorKind> {
            self.transactions += 1;
            let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
            if address != ADDRESS {
                return Err(nack);
            }
            if self.fail_next > 0 {
                self.fail_next -= 1;
                return Err(ErrorKind::ArbitrationLoss);
            }
            if self.busy > 0 {
                self.busy -= 1;
                return Err(nack);
            }

            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if bytes.len() >= 2 {
                            self.pointer = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
                        }
                        if bytes.len() > 2 {
                            let data = &bytes[2..];
                            self.memory[self.pointer..self.pointer + data.len()]
                                .copy_from_slice(data);
                            self.data_writes.push(data.len());
                            self.busy = self.write_cycle;
                        }
                    }
                    Operation::Read(buf) => {
                        let end = self.pointer + buf.len();
                        buf.copy_from_slice(&self.memory[self.pointer..end]);
                        self.pointer = end;
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_read_in_chunks() {
        let mut eeprom = At24Eeprom::new(MockChip::new());
        let mut buf = [0u8; 150];
        eeprom.read(ADDRESS, 0x100, &mut buf).unwrap();
        assert_eq!(buf[0], 0x00);
        assert_eq!(buf[149], 149);
        // 64 + 64 + 22
        assert_eq!(eeprom.release().transactions, 3);
    }

    #[test]
    fn test_read_out_of_range() {
        let mut eeprom = At24Eeprom::new(MockChip::new());
        let mut buf = [0u8; 16];
        assert_eq!(
            eeprom.read(ADDRESS, 16 * 1024 - 8, &mut buf),
            Err(At24Error::OutOfRange)
        );
    }

    #[test]
    fn test_read_retries_twice() {
        let mut chip = MockChip::new();
        chip.fail_next = 2;
        let mut eeprom = At24Eeprom::new(chip);
        let mut buf = [0u8; 4];
        eeprom.read(ADDRESS, 4, &mut buf).unwrap();
        assert_eq!(buf, [4, 5, 6, 7]);
    }

    #[test]
    fn test_read_gives_up_after_retries() {
        let mut chip = MockChip::new();
        chip.fail_next = 3;
        let mut eeprom = At24Eeprom::new(chip);
        let mut buf = [0u8; 4];
        assert_eq!(
            eeprom.read(ADDRESS, 0, &mut buf),
            Err(At24Error::I2c(ErrorKind::ArbitrationLoss))
        );
        assert_eq!(eeprom.release().transactions, 3);
    }

    #[test]
    fn test_absent_chip_is_an_error() {
        let mut eeprom = At24Eeprom::new(MockChip::new());
        let mut buf = [0u8; 4];
        assert!(matches!(
            eeprom.read(0x50, 0, &mut buf),
            Err(At24Error::I2c(ErrorKind::NoAcknowledge(_)))
        ));
        assert!(!eeprom.probe(0x50));
        assert!(eeprom.probe(ADDRESS));
    }

    #[test]
    fn test_write_splits_on_pages() {
        let mut chip = MockChip::new();
        chip.write_cycle = 2;
        let mut eeprom = At24Eeprom::new(chip);
        let data = [0xA5u8; 100];
        eeprom.write(ADDRESS, 60, &data).unwrap();

        let chip = eeprom.release();
        assert_eq!(chip.data_writes, vec![4, 64, 32]);
        assert!(chip.memory[60..160].iter().all(|&b| b == 0xA5));
        assert_eq!(chip.memory[59], 59);
        assert_eq!(chip.memory[160], 160);
    }

    #[test]
    fn test_write_times_out_when_chip_stays_busy() {
        let mut chip = MockChip::new();
        chip.write_cycle = MAX_ACK_POLLS + 1;
        let mut eeprom = At24Eeprom::new(chip);
        assert_eq!(
            eeprom.write(ADDRESS, 0, &[1, 2, 3]),
            Err(At24Error::WriteTimeout)
        );
    }
}
