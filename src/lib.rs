///
/// ## Design
///
/// * one owned `Chip8Interpreter` value per emulation session: registers,
///   memory, call stack, timers, framebuffer and key latch are all fields of
///   it, never module statics
/// * `step()` runs exactly one fetch/decode/execute cycle and a timer tick;
///   the interpreter is untimed and the host paces calls to approximate the
///   nominal 60Hz timer rate
/// * peripherals hang off traits (`Display`, `Input`, `Sound`) so the
///   terminal frontend can be swapped for dummies in tests or for something
///   better later
/// * errors split two ways: structural violations (bad fetch, stack
///   overflow/underflow, out-of-bounds indexed access) are fatal and mutate
///   nothing, while unknown opcodes are skipped and reported so sloppy ROMs
///   keep running
///
/// Model
///
/// main
///  |-- display, input, sound
///  |-- interpreter(rom)
///  `-- step loop
///       |-- interpreter.step()
///       |-- render framebuffer if the draw flag is up, then clear it
///       |-- latch polled keys; quit on Escape
///       |-- beeper on iff the sound timer is running
///       `-- spin_sleep until the next step is due
pub mod display;
pub mod errors;
pub mod input;
pub mod interpreter;
pub mod memory;
pub mod sound;

pub use errors::Chip8Error;
pub use interpreter::Chip8Interpreter;
