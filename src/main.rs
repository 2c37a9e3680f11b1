use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Duration;

use chip8::display::{Display, MonoTermDisplay};
use chip8::input::{Input, StdinInput};
use chip8::interpreter::{Chip8Interpreter, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8::sound::{Mute, SimpleBeep, Sound};
use clap::{arg, command, value_parser, ArgAction};
use spin_sleep::SpinSleeper;

fn main() {
    let rom_arg = arg!([rom] "Path to the CHIP-8 ROM to run")
        .required(true)
        .value_parser(value_parser!(PathBuf));

    // timers decrement once per step, so 60 steps/s gives nominal timer
    // speed; most games want it turned up
    let speed_arg = arg!(-s --speed <HZ> "Interpreter steps per second")
        .value_parser(value_parser!(u64).range(1..))
        .default_value("60");

    let mute_arg = arg!(--mute "Run without the beeper").action(ArgAction::SetTrue);

    let matches = command!()
        .arg(rom_arg)
        .arg(speed_arg)
        .arg(mute_arg)
        .get_matches();
    let rom = matches.get_one::<PathBuf>("rom").unwrap();
    let speed = *matches.get_one::<u64>("speed").unwrap();
    let mute = *matches.get_one::<bool>("mute").unwrap();

    if let Err(e) = run(rom, speed, mute) {
        eprintln!("chip8: {}", e);
        exit(1);
    }
}

fn run(rom: &Path, speed: u64, mute: bool) -> Result<(), Box<dyn Error>> {
    let mut interpreter = Chip8Interpreter::new();
    let mut f = File::open(rom).map_err(|e| format!("{}: {}", rom.display(), e))?;
    interpreter.load_program(&mut f)?;

    let mut display = MonoTermDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)?;
    let mut input = StdinInput::new();
    let mut sound: Box<dyn Sound> = if mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let sleeper = SpinSleeper::default();
    let period = Duration::from_nanos(1_000_000_000 / speed);

    loop {
        match interpreter.step() {
            Ok(()) => {}
            // unknown opcodes have already been skipped; just report them
            Err(e) if !e.is_fatal() => eprintln!("Warning: {}", e),
            Err(e) => return Err(e.into()),
        }

        if interpreter.draw_flag() {
            display.draw(interpreter.framebuffer())?;
            interpreter.clear_draw_flag();
        }

        // refresh the key latch from whatever arrived since the last pass
        let pressed = input.poll_keys()?.to_vec();
        for key in 0..16u8 {
            interpreter.set_key(key as usize, pressed.contains(&key));
        }
        if input.quit_requested() {
            break;
        }

        sound.set_active(interpreter.sound_active())?;

        sleeper.sleep(period);
    }

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    Ok(())
}
