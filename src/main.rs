use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::fmt::WriteStyle;
use env_logger::Target;

use chip8::config::{Settings, DEFAULT_LOG_PATH};
use chip8::display::MonoTermDisplay;
use chip8::input::StdinInput;
use chip8::interpreter::{Chip8Interpreter, MIN_DISPLAY_HEIGHT, MIN_DISPLAY_WIDTH};
use chip8::memory::Chip8MemoryMap;
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::timer::DEFAULT_TICK_RATE;
use chip8::Error;

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 interpreter for the terminal", long_about = None)]
struct Args {
    #[arg(help = "Path to the ROM file to run")]
    rom: PathBuf,

    #[arg(long, default_value_t = DEFAULT_TICK_RATE, help = "Timer decrements per second")]
    tick_rate: f64,

    #[arg(long, help = "Don't beep")]
    mute: bool,

    #[arg(long, default_value = DEFAULT_LOG_PATH, help = "Where to write the log")]
    log_file: PathBuf,

    #[arg(short, long, help = "Log every instruction")]
    verbose: bool,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            rom_path: args.rom,
            tick_rate: args.tick_rate,
            mute: args.mute,
            log_path: args.log_file,
            verbose: args.verbose,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::from(Args::parse());
    if !settings.is_valid_tick_rate() {
        bail!("tick rate must be a positive number, not {}", settings.tick_rate);
    }

    // sort out the files before the terminal goes into raw mode
    let mut rom = File::open(&settings.rom_path)
        .with_context(|| format!("failed to open ROM {}", settings.rom_path.display()))?;
    init_logging(&settings)?;

    // the display and keyboard are gone by the time run returns, so the
    // terminal is back to normal before anything is printed
    match run(&settings, &mut rom) {
        Ok(()) | Err(Error::Halted) => Ok(()),
        Err(e) => Err(e).with_context(|| format!("{} stopped", settings.rom_path.display())),
    }
}

/// Log lines are appended to the log file; stdout and stderr belong to the
/// display. `RUST_LOG` still overrides the level chosen by `--verbose`.
fn init_logging(settings: &Settings) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_path)
        .with_context(|| format!("failed to open log {}", settings.log_path.display()))?;
    env_logger::Builder::new()
        .filter_level(settings.log_level())
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .try_init()
        .context("failed to start logging")
}

fn run(settings: &Settings, rom: &mut dyn io::Read) -> chip8::Result<()> {
    let mut memory = Chip8MemoryMap::new();
    let mut display = MonoTermDisplay::new(MIN_DISPLAY_WIDTH, MIN_DISPLAY_HEIGHT)?;
    let mut input = StdinInput::new()?;
    let mut interpreter = Chip8Interpreter::new(&mut memory, &mut display, &mut input)?;

    interpreter.load_program(rom)?;
    let sound: Box<dyn Sound + Send> = if settings.mute {
        Box::new(Mute::default())
    } else {
        Box::new(SimpleBeep::new())
    };
    interpreter.start_timers(settings.tick_rate, sound)?;
    interpreter.run()
}
