mod bits;
mod cpu;
mod driver;
mod emulator;
mod error;
mod memory;
mod ppu;
mod rom;

use std::cell::RefCell;
use std::path::Path;

use driver::{ansiterm::AnsiTerm, minifb::Minifb, termion::Termion};
use emulator::Emulator;
use error::CliError;
use ppu::{ScreenMode, SCREEN_WIDTH};

// Command line arguments
struct Args {
    rom: String,
    gui: bool,
    frame_hz: f32,
}

const HELP_MSG: &str = "\
USAGE:
    vsi16 [OPTIONS] [ROM]

ARGS:
    <ROM>    Filepath to the VSI-16 ROM image to be read by the emulator.

OPTIONS:
    -h, --help          Print this help message.
    -g, --gui           GUI mode — run this program in a native window.
    -t, --tui           TUI mode — run this program in the terminal. (default)
    -f, --freq=NUM      Set the frame rate of the emulator (Hz) to uint NUM
                          in the range 1-1000. (default: 60)";

fn parse_args() -> Result<Args, lexopt::Error> {
    parse_args_from(lexopt::Parser::from_env())
}

fn parse_args_from(mut parser: lexopt::Parser) -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut rom = None;
    let mut gui = false;
    let mut frame_hz = emulator::DEFAULT_CLOCK_FREQ;

    while let Some(arg) = parser.next()? {
        match arg {
            Short('g') | Long("gui") => gui = true,
            Short('t') | Long("tui") => gui = false,
            Short('f') | Long("freq") => {
                let hz: u32 = parser.value()?.parse()?;
                if !(1..=1000).contains(&hz) {
                    return Err("out of bounds value for option '--freq'".into());
                }
                frame_hz = hz as f32;
            }
            Value(path) if rom.is_none() => {
                rom = Some(path.string()?);
            }

            Short('h') | Long("help") => {
                println!("{}", HELP_MSG);
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Args {
        rom: rom.ok_or(
            "missing argument <ROM>\n
  Refer to --help for more information",
        )?,
        gui,
        frame_hz,
    })
}

///
///  VSI-16 should be able to run with no peripherals hooked up to it!
///
///  ```
///  let f_input = RefCell::new(NullDevice::Input);
///  let f_display = RefCell::new(NullDevice::Display);
///  let f_audio = RefCell::new(NullDevice::Audio);
///
///  let mut dummy = Emulator::with_peripherals(ScreenMode::Standard, &f_input, &f_display, &f_audio);
///  dummy.load_program("roms/demo.rom").unwrap();
///  dummy.run();
///  ```
fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let program_name = Path::new(&args.rom)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("vsi16");

    let screen_mode = ScreenMode::Standard;
    let height = screen_mode.height();

    let termion = || RefCell::new(Termion::new());
    let minifb = || RefCell::new(Minifb::new(program_name, SCREEN_WIDTH, height));
    let ansiterm = RefCell::new(AnsiTerm);

    let crashed = if args.gui {
        let gui = minifb();
        let mut emu = Emulator::with_peripherals(screen_mode, &gui, &gui, &ansiterm);
        emu.set_clock_speed(args.frame_hz);
        emu.load_program(&args.rom)?;
        emu.run();
        emu.cpu().flags().contains(cpu::CpuFlags::CRASH)
    } else {
        let tui = termion();
        let mut emu = Emulator::with_peripherals(screen_mode, &tui, &tui, &tui);
        emu.set_clock_speed(args.frame_hz);
        emu.load_program(&args.rom)?;
        emu.run();
        emu.cpu().flags().contains(cpu::CpuFlags::CRASH)
    };

    if crashed {
        std::process::exit(1);
    }

    Ok(())
}
