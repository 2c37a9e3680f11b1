use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

/// map of the left-hand side of a qwerty keyboard onto the 4x4 hex keypad
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// reads keypresses for the host loop to latch into the interpreter
pub trait Input {
    /// keypad codes seen since the previous poll. a key only counts as held
    /// for the pass on which its event arrived, because terminals report
    /// presses but never releases
    fn poll_keys(&mut self) -> Result<&[u8], io::Error>;

    /// has the user asked to leave the emulator?
    fn quit_requested(&self) -> bool;
}

/// simple implementation of Input, using STDIN
pub struct StdinInput {
    buffer: Vec<u8>,
    keymap: HashMap<char, u8>,
    quit: bool,
}

impl StdinInput {
    pub fn new() -> Self {
        terminal::enable_raw_mode().unwrap();
        StdinInput {
            buffer: Vec::new(),
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            quit: false,
        }
    }

    fn read_stdin(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(key) => match self.keymap.get(&key) {
                        Some(mapped_key) => self.buffer.push(*mapped_key),
                        None => {
                            eprintln!("Warning: '{}' doesn't map to a CHIP-8 key", key);
                        }
                    },
                    KeyCode::Esc => self.quit = true,
                    _ => {
                        eprintln!("Warning: unknown key event received");
                    }
                },
                _ => {
                    eprintln!("Warning: unknown event received");
                }
            }
        }
        Ok(())
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        terminal::disable_raw_mode().unwrap();
    }
}

impl Input for StdinInput {
    fn poll_keys(&mut self) -> Result<&[u8], io::Error> {
        self.buffer.clear();
        self.read_stdin()?;
        Ok(self.buffer.as_slice())
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing
pub struct DummyInput {
    bytes: Vec<u8>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            bytes: Vec::from(keys),
        }
    }
}

impl Input for DummyInput {
    fn poll_keys(&mut self) -> Result<&[u8], io::Error> {
        Ok(self.bytes.as_slice())
    }

    fn quit_requested(&self) -> bool {
        false
    }
}
