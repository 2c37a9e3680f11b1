use beep::beep;
use std::error::Error;

/// The CHIP-8 has a single tone that plays while the sound timer is nonzero,
/// so the whole interface is on/off.
pub trait Sound {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn Error>>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn Error>> {
        if on != self.is_beeping {
            beep(if on { SIMPLEBEEP_PITCH } else { 0 })?;
            self.is_beeping = on;
        }
        Ok(())
    }
}

impl Drop for SimpleBeep {
    fn drop(&mut self) {
        // don't leave the speaker wailing after a panic or quit
        let _ = beep(0);
    }
}

pub struct Mute {}

impl Mute {
    pub fn new() -> Self {
        Mute {}
    }
}

impl Sound for Mute {
    fn set_active(&mut self, _on: bool) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}
