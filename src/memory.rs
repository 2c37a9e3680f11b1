use crate::errors::Chip8Error;
use std::io;
use std::io::Read;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// where programs are loaded and execution starts
pub const PROGRAM_ADDR: u16 = 0x0200;

/// where the 16 hex glyphs live, 5 bytes each
pub const FONT_ADDR: u16 = 0x0050;

/// The CHIP-8 memory map:
///
///   0x0000-0x004f  reserved (interpreter on a real COSMAC)
///   0x0050-0x009f  font table
///   0x00a0-0x01ff  reserved
///   0x0200-0x0fff  program
///
/// Registers, the call stack and the framebuffer live outside this address
/// space, unlike on the original hardware. Programs reach memory only through
/// the interpreter, which bounds-checks every access.
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    /// zeroed RAM with the font table baked in
    pub fn new() -> Self {
        let mut m = Memory {
            bytes: Box::new([0u8; MEMORY_SIZE]),
        };
        let base = FONT_ADDR as usize;
        m.bytes[base..base + FONT.len()].copy_from_slice(&FONT);
        m
    }

    /// drain a reader into RAM starting at `addr`. fails before writing
    /// anything if the data doesn't fit
    pub fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<(), Chip8Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        // an address past the end of RAM has no room at all
        if addr as usize >= MEMORY_SIZE {
            return Err(Chip8Error::CapacityExceeded {
                size: buf.len(),
                avail: 0,
            });
        }
        let avail = MEMORY_SIZE - addr as usize;
        if buf.len() > avail {
            return Err(Chip8Error::CapacityExceeded {
                size: buf.len(),
                avail,
            });
        }
        let a = addr as usize;
        self.bytes[a..a + buf.len()].copy_from_slice(&buf);
        Ok(())
    }

    /// load a CHIP-8 program at 0x200
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        self.write_any(reader, PROGRAM_ADDR)
    }

    pub fn read_byte(&self, addr: u16) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Chip8Error::OutOfBounds { addr })
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), Chip8Error> {
        *self
            .bytes
            .get_mut(addr as usize)
            .ok_or(Chip8Error::OutOfBounds { addr })? = value;
        Ok(())
    }

    /// get a two-byte big-endian word (instruction fetch)
    pub fn read_word(&self, addr: u16) -> Result<u16, Chip8Error> {
        let hi = self.read_byte(addr)?;
        let lo = self.read_byte(addr.wrapping_add(1))?;
        Ok(((hi as u16) << 8) | lo as u16)
    }

    /// get a r/o slice of the underlying memory (sprite reads)
    pub fn read_slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let a = addr as usize;
        self.bytes
            .get(a..a + len)
            .ok_or(Chip8Error::OutOfBounds { addr })
    }

    /// copy a block into RAM, all-or-nothing
    pub fn write_slice(&mut self, addr: u16, data: &[u8]) -> Result<(), Chip8Error> {
        let a = addr as usize;
        self.bytes
            .get_mut(a..a + data.len())
            .ok_or(Chip8Error::OutOfBounds { addr })?
            .copy_from_slice(data);
        Ok(())
    }
}

const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
