use anyhow::Context;
use clap::Parser;
use cursive::views::Dialog;
use cursive::CbSink;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::time::Duration;

use chip_8_vm::chip::{
    chip8::{cursive_display::Display, Chip8},
    runner::{Command, Event, Runner, RunnerConfig},
    Chip,
};

/// Runs a CHIP-8 program in the terminal.
///
/// Keys 1-4, q-r, a-f and z-v form the keypad, space releases all keys.
/// p pauses and resumes, n steps while paused, up and down change the speed,
/// backspace restarts the program and escape quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the program to load
    program: PathBuf,

    /// Sleep time after each cycle in milliseconds
    #[arg(short, long, default_value_t = 1)]
    cycle_sleep: u64,

    /// Wait for p or n before executing the first instruction
    #[arg(long)]
    paused: bool,

    /// Log level; log lines go to stderr, so redirect it when raising the level
    #[arg(short, long, default_value = "off")]
    log_level: LevelFilter,
}

/// Keyboard layout of the keypad.
const KEYPAD: [(char, u8); 16] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xC),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xD),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xE),
    ('z', 0xA),
    ('x', 0x0),
    ('c', 0xB),
    ('v', 0xF),
];

/// Forwards the runner's events to the UI thread until the runner stops.
fn forward_events(events: crossbeam_channel::Receiver<Event>, gfx_sink: CbSink) {
    let mut last_frame = Vec::new();
    for event in events.iter() {
        let update: Box<dyn FnOnce(&mut cursive::Cursive) + Send> = match event {
            Event::Frame(pixels) => {
                let display = Display::new(&pixels);
                last_frame = pixels;
                Box::new(move |s| {
                    s.pop_layer();
                    s.add_layer(display);
                })
            }
            Event::Paused(paused) => {
                let display = Display::new(&last_frame);
                Box::new(move |s| {
                    s.pop_layer();
                    if paused {
                        s.add_layer(display.paused());
                    } else {
                        s.add_layer(display);
                    }
                })
            }
            Event::Beep => {
                info!("beep");
                continue;
            }
            Event::Halted(error) => Box::new(move |s| {
                s.add_layer(Dialog::info(format!("Execution halted: {}", error)));
            }),
            Event::LoadFailed(error) => Box::new(move |s| {
                s.add_layer(Dialog::info(error));
            }),
            Event::Stopped => Box::new(|s| s.quit()),
        };
        if gfx_sink.send(update).is_err() {
            return;
        }
    }
}

/// Constructs the UI and spawns the runner and the event forwarding thread.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    SimpleLogger::new().with_level(args.log_level).init()?;

    let program = std::fs::read(&args.program)
        .with_context(|| format!("could not read program file {}", args.program.display()))?;
    let mut chip8 = Chip8::new();
    let len = chip8.load_program(&program)?;
    info!("loaded {} ({} bytes)", args.program.display(), len);

    let runner = Runner::spawn(
        chip8,
        RunnerConfig {
            cycle_sleep: Duration::from_millis(args.cycle_sleep),
            start_paused: args.paused,
            ..RunnerConfig::default()
        },
    );

    let mut siv = cursive::default();
    let events = runner.events().clone();
    let cb_sink = siv.cb_sink().clone();
    let forwarder = std::thread::spawn(move || forward_events(events, cb_sink));

    let sender = runner.commands();
    siv.add_global_callback(cursive::event::Key::Esc, move |_s| {
        // the forwarder quits the UI once the runner reports it stopped
        let _ = sender.send(Command::Stop);
    });

    for (key, pin) in KEYPAD.iter() {
        let sender = runner.commands();
        let pin = *pin;
        siv.add_global_callback(*key, move |_s| {
            let _ = sender.send(Command::Key(pin));
        });
    }

    let bindings = [
        (' ', Command::KeyRelease),
        ('p', Command::TogglePause),
        ('n', Command::Step),
    ];
    for (key, command) in bindings.iter() {
        let sender = runner.commands();
        let command = command.clone();
        siv.add_global_callback(*key, move |_s| {
            let _ = sender.send(command.clone());
        });
    }

    let sender = runner.commands();
    siv.add_global_callback(cursive::event::Key::Backspace, move |_s| {
        let _ = sender.send(Command::LoadProgram(program.clone()));
    });

    let sender = runner.commands();
    siv.add_global_callback(cursive::event::Key::Up, move |_s| {
        let _ = sender.send(Command::SpeedUp);
    });

    let sender = runner.commands();
    siv.add_global_callback(cursive::event::Key::Down, move |_s| {
        let _ = sender.send(Command::SlowDown);
    });

    siv.add_layer(Display::default());
    siv.run();

    runner
        .stop()
        .map_err(|_| anyhow::anyhow!("runner thread panicked"))?;
    let _ = forwarder.join();
    Ok(())
}
