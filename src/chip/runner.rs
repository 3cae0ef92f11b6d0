//! Drives a [`Chip`] on a dedicated thread. The thread owns the chip, so the
//! UI never touches machine state directly: it sends [`Command`]s and
//! receives [`Event`]s through channels.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, error, info};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::chip::{Chip, ExecutionError};

/// Requests sent to the runner thread. It is generic over the type
/// representing the pressed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<T> {
    /// Occurs when the key passed in the enum value was pressed.
    Key(T),

    /// Indicates that all keys are released. The text UI cannot observe
    /// key up events, so releasing is a key of its own.
    KeyRelease,

    /// Stop executing cycles until `Resume` arrives.
    Pause,

    Resume,

    /// Pause if running, resume if paused.
    TogglePause,

    /// Execute exactly one cycle while paused.
    Step,

    /// Bring the chip back into its power-on state.
    Reset,

    /// Reset the chip and load the given program.
    LoadProgram(Vec<u8>),

    /// Decreases the sleep time after each cycle.
    SpeedUp,

    /// Increases the sleep time after each cycle.
    SlowDown,

    /// Shut down.
    Stop,
}

/// Notifications sent by the runner thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The output pins changed. Carries a snapshot of all of them.
    Frame(Vec<bool>),

    /// The sound timer ran out.
    Beep,

    /// The runner switched between running and paused.
    Paused(bool),

    /// Execution stopped because of a fatal error. Only a reset or a newly
    /// loaded program gets the chip going again.
    Halted(ExecutionError),

    /// A program could not be loaded. The chip is left untouched.
    LoadFailed(String),

    /// The runner thread is about to exit.
    Stopped,
}

/// Timing configuration of the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Sleep time after each cycle.
    pub cycle_sleep: Duration,

    /// Amount by which `SpeedUp` and `SlowDown` change the sleep time.
    pub speed_step: Duration,

    /// Whether the runner waits for `Resume` or `Step` before the first cycle.
    pub start_paused: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            cycle_sleep: Duration::from_millis(1),
            speed_step: Duration::from_millis(5),
            start_paused: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Paused,
    Halted,
}

/// Represents the channels available to the event loop. It is generic
/// over the type representing the pressed keys.
struct EventLoopChannels<T> {
    /// The channel on which the commands are received.
    command_receiver: Receiver<Command<T>>,

    /// The channel to send the events to.
    event_sender: Sender<Event>,
}

impl<T> EventLoopChannels<T> {
    fn emit(&self, event: Event) {
        if self.event_sender.send(event).is_err() {
            debug!("nobody is listening for events anymore");
        }
    }
}

/// Handle to a chip running on its own thread.
pub struct Runner<C: Chip> {
    command_sender: Sender<Command<C::PinAddress>>,
    event_receiver: Receiver<Event>,
    handle: JoinHandle<C>,
}

impl<C> Runner<C>
where
    C: Chip + Send + 'static,
    C::PinAddress: Send + 'static,
{
    /// Moves `chip` onto a new thread and starts executing cycles.
    ///
    /// The command channel is unbounded, so UI callbacks never block on a
    /// runner that sleeps between cycles.
    pub fn spawn(chip: C, config: RunnerConfig) -> Self {
        let (command_sender, command_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();

        let handle = thread::spawn(move || {
            event_loop(
                chip,
                EventLoopChannels {
                    command_receiver,
                    event_sender,
                },
                config,
            )
        });

        Runner {
            command_sender,
            event_receiver,
            handle,
        }
    }

    /// Sends a command to the runner thread. Commands sent after the thread
    /// exited are dropped.
    pub fn send(&self, command: Command<C::PinAddress>) {
        if self.command_sender.send(command).is_err() {
            debug!("runner thread already exited");
        }
    }

    /// A sender that can be handed to the UI callbacks.
    pub fn commands(&self) -> Sender<Command<C::PinAddress>> {
        self.command_sender.clone()
    }

    pub fn events(&self) -> &Receiver<Event> {
        &self.event_receiver
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn step(&self) {
        self.send(Command::Step);
    }

    /// Stops the runner thread and hands the chip back.
    pub fn stop(self) -> thread::Result<C> {
        self.send(Command::Stop);
        self.handle.join()
    }
}

/// The event loop. Constantly loops over (1) process a command if there
/// is any. (2) Invoke cycle on the chip. (3) Report a changed display or a
/// beep. (4) Sleep for the cycle sleep time. (5) Start over.
///
/// While paused or halted the loop blocks on the command channel instead of
/// executing cycles.
fn event_loop<T>(mut chip: T, channels: EventLoopChannels<T::PinAddress>, config: RunnerConfig) -> T
where
    T: Chip,
{
    let mut cycle_sleep = config.cycle_sleep;
    let mut state = if config.start_paused {
        RunState::Paused
    } else {
        RunState::Running
    };
    info!("runner started ({:?})", state);
    if state == RunState::Paused {
        channels.emit(Event::Paused(true));
    }

    loop {
        let command = match state {
            RunState::Running => match channels.command_receiver.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            },
            RunState::Paused | RunState::Halted => match channels.command_receiver.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        let mut step = false;
        if let Some(command) = command {
            match command {
                Command::Key(key) => chip.set_input_pin(key, true),
                Command::KeyRelease => chip.reset_input_pins(),
                Command::Pause => {
                    if state == RunState::Running {
                        info!("paused");
                        state = RunState::Paused;
                        channels.emit(Event::Paused(true));
                    }
                }
                Command::Resume => {
                    if state == RunState::Paused {
                        info!("resumed");
                        state = RunState::Running;
                        channels.emit(Event::Paused(false));
                    }
                }
                Command::TogglePause => match state {
                    RunState::Running => {
                        info!("paused");
                        state = RunState::Paused;
                        channels.emit(Event::Paused(true));
                    }
                    RunState::Paused => {
                        info!("resumed");
                        state = RunState::Running;
                        channels.emit(Event::Paused(false));
                    }
                    RunState::Halted => {}
                },
                Command::Step => step = state == RunState::Paused,
                Command::Reset => {
                    chip.reset();
                    restart(&mut state);
                    channels.emit(Event::Frame(chip.read_output_pins().to_vec()));
                }
                Command::LoadProgram(program) => match chip.load_program(&program) {
                    Ok(len) => {
                        info!("loaded program of {} bytes", len);
                        restart(&mut state);
                        channels.emit(Event::Frame(chip.read_output_pins().to_vec()));
                    }
                    Err(e) => {
                        error!("{}", e);
                        channels.emit(Event::LoadFailed(e.to_string()));
                    }
                },
                Command::SpeedUp => {
                    cycle_sleep = speed_up(cycle_sleep, config.speed_step);
                    debug!("cycle sleep {:?}", cycle_sleep);
                }
                Command::SlowDown => {
                    cycle_sleep = slow_down(cycle_sleep, config.speed_step);
                    debug!("cycle sleep {:?}", cycle_sleep);
                }
                Command::Stop => break,
            }
        }

        if state != RunState::Running && !step {
            continue;
        }

        if let Err(e) = chip.cycle() {
            error!("execution halted: {}", e);
            state = RunState::Halted;
            channels.emit(Event::Halted(e));
            continue;
        }

        if chip.take_redraw() {
            channels.emit(Event::Frame(chip.read_output_pins().to_vec()));
        }

        if chip.take_beep() {
            channels.emit(Event::Beep);
        }

        if !step && !cycle_sleep.is_zero() {
            thread::sleep(cycle_sleep);
        }
    }

    info!("runner stopped");
    channels.emit(Event::Stopped);
    chip
}

/// Shortens the sleep by one step, but never below a single step.
fn speed_up(cycle_sleep: Duration, step: Duration) -> Duration {
    if cycle_sleep > step {
        cycle_sleep - step
    } else {
        cycle_sleep
    }
}

fn slow_down(cycle_sleep: Duration, step: Duration) -> Duration {
    cycle_sleep + step
}

/// A halted chip that got reset or reloaded may run again.
fn restart(state: &mut RunState) {
    if *state == RunState::Halted {
        *state = RunState::Running;
    }
}

#[cfg(test)]
mod tests {
    use super::{slow_down, speed_up, Command, Event, Runner, RunnerConfig};
    use crate::chip::{chip8::Chip8, ExecutionError};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn paused_runner() -> Runner<Chip8> {
        Runner::spawn(
            Chip8::new(),
            RunnerConfig {
                cycle_sleep: Duration::from_millis(0),
                start_paused: true,
                ..RunnerConfig::default()
            },
        )
    }

    fn wait_for<F: Fn(&Event) -> bool>(runner: &Runner<Chip8>, f: F) -> Event {
        loop {
            let event = runner
                .events()
                .recv_timeout(TIMEOUT)
                .expect("no matching event");
            if f(&event) {
                return event;
            }
        }
    }

    #[test]
    fn test_step_while_paused() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![
            0x6A, 0x05, // VA := 5
            0xA3, 0x00, // I := 0x300
            0xFA, 0x33, // BCD of VA
            0x12, 0x06, // jump to self
        ]));
        for _ in 0..3 {
            runner.step();
        }

        let chip = runner.stop().unwrap();
        assert_eq!(chip.register(0xA), 5);
        assert_eq!(chip.program_counter(), 0x206);
        assert_eq!(chip.memory_byte(0x300), 0);
        assert_eq!(chip.memory_byte(0x301), 0);
        assert_eq!(chip.memory_byte(0x302), 5);
    }

    #[test]
    fn test_halts_on_stack_underflow() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x00, 0xEE]));
        runner.resume();

        let event = wait_for(&runner, |event| matches!(event, Event::Halted(_)));
        assert_eq!(event, Event::Halted(ExecutionError::StackUnderflow(0x200)));

        // halted chips ignore steps until they are reset
        runner.step();
        let chip = runner.stop().unwrap();
        assert_eq!(chip.program_counter(), 0x202);
    }

    #[test]
    fn test_load_program_restarts_halted_chip() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x00, 0xEE]));
        runner.resume();
        wait_for(&runner, |event| matches!(event, Event::Halted(_)));

        runner.send(Command::LoadProgram(vec![0x00, 0xE0, 0x12, 0x02]));
        wait_for(&runner, |event| matches!(event, Event::Frame(_)));
        runner.pause();
        wait_for(&runner, |event| *event == Event::Paused(true));

        let chip = runner.stop().unwrap();
        assert!(chip.program_counter() == 0x200 || chip.program_counter() == 0x202);
    }

    #[test]
    fn test_clear_screen_emits_frame() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x00, 0xE0, 0x12, 0x00]));
        wait_for(&runner, |event| matches!(event, Event::Frame(_)));
        runner.step();

        match wait_for(&runner, |event| matches!(event, Event::Frame(_))) {
            Event::Frame(pixels) => {
                assert_eq!(pixels.len(), 64 * 32);
                assert!(pixels.iter().all(|pixel| !pixel));
            }
            _ => unreachable!(),
        }
        runner.stop().unwrap();
    }

    #[test]
    fn test_beep_when_sound_timer_runs_out() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![
            0x60, 0x02, // V0 := 2
            0xF0, 0x18, // sound timer := V0
            0x12, 0x04, // jump to self
        ]));
        for _ in 0..4 {
            runner.step();
        }

        wait_for(&runner, |event| *event == Event::Beep);
        let chip = runner.stop().unwrap();
        assert_eq!(chip.sound_timer(), 0);
    }

    #[test]
    fn test_too_large_program_is_reported() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0; 4096]));

        let event = wait_for(&runner, |event| matches!(event, Event::LoadFailed(_)));
        assert!(matches!(event, Event::LoadFailed(_)));
        runner.stop().unwrap();
    }

    #[test]
    fn test_stop_emits_stopped() {
        let runner = paused_runner();
        let events = runner.events().clone();
        let chip = runner.stop().unwrap();

        assert_eq!(chip.program_counter(), 0x200);
        assert!(events.iter().any(|event| event == Event::Stopped));
    }

    #[test]
    fn test_starting_paused_is_reported() {
        let runner = paused_runner();
        let event = runner.events().recv_timeout(TIMEOUT).unwrap();
        assert_eq!(event, Event::Paused(true));
        runner.stop().unwrap();
    }

    #[test]
    fn test_reset_restarts_halted_chip() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x12, 0x02, 0x00, 0xEE]));
        runner.step();
        runner.step();
        wait_for(&runner, |event| matches!(event, Event::Halted(_)));

        runner.send(Command::Reset);
        match wait_for(&runner, |event| matches!(event, Event::Frame(_))) {
            Event::Frame(pixels) => assert!(pixels.iter().all(|pixel| !pixel)),
            _ => unreachable!(),
        }

        // the reset wiped the program, so the chip runs from 0x200 through
        // zeroed memory until it hits the end
        let event = wait_for(&runner, |event| matches!(event, Event::Halted(_)));
        assert_eq!(event, Event::Halted(ExecutionError::OutOfBoundsFetch(0xFFE)));

        let chip = runner.stop().unwrap();
        assert_eq!(chip.program_counter(), 0xFFE);
        assert_eq!(chip.register(0), 0);
    }

    #[test]
    fn test_reset_while_paused() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x6A, 0x05]));
        runner.step();
        runner.send(Command::Reset);
        wait_for(&runner, |event| matches!(event, Event::Frame(_)));

        let chip = runner.stop().unwrap();
        assert_eq!(chip.program_counter(), 0x200);
        assert_eq!(chip.register(0xA), 0);
        assert_eq!(chip.memory_byte(0x200), 0);
    }

    #[test]
    fn test_toggle_pause() {
        let runner = paused_runner();
        wait_for(&runner, |event| *event == Event::Paused(true));
        runner.send(Command::LoadProgram(vec![0x12, 0x00]));

        runner.send(Command::TogglePause);
        wait_for(&runner, |event| matches!(event, Event::Paused(_)));
        runner.send(Command::TogglePause);
        let event = wait_for(&runner, |event| matches!(event, Event::Paused(_)));
        assert_eq!(event, Event::Paused(true));

        let chip = runner.stop().unwrap();
        assert_eq!(chip.program_counter(), 0x200);
    }

    #[test]
    fn test_toggle_pause_resumes() {
        let runner = paused_runner();
        wait_for(&runner, |event| *event == Event::Paused(true));

        runner.send(Command::TogglePause);
        let event = wait_for(&runner, |event| matches!(event, Event::Paused(_)));
        assert_eq!(event, Event::Paused(false));
        runner.stop().unwrap();
    }

    #[test]
    fn test_halted_chip_ignores_resume() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x00, 0xEE]));
        runner.resume();
        wait_for(&runner, |event| matches!(event, Event::Halted(_)));

        runner.resume();
        runner.send(Command::TogglePause);
        let chip = runner.stop().unwrap();
        assert_eq!(chip.program_counter(), 0x202);
    }

    #[test]
    fn test_cycle_sleep_adjustment() {
        let step = Duration::from_millis(5);
        assert_eq!(
            speed_up(Duration::from_millis(11), step),
            Duration::from_millis(6)
        );
        assert_eq!(
            speed_up(Duration::from_millis(6), step),
            Duration::from_millis(1)
        );
        // never drops to a single step or below
        assert_eq!(speed_up(step, step), step);
        assert_eq!(
            speed_up(Duration::from_millis(1), step),
            Duration::from_millis(1)
        );
        assert_eq!(
            slow_down(Duration::from_millis(1), step),
            Duration::from_millis(6)
        );
    }

    #[test]
    fn test_speed_commands_keep_running() {
        let runner = paused_runner();
        runner.send(Command::LoadProgram(vec![0x70, 0x01, 0x12, 0x00]));
        runner.send(Command::SlowDown);
        runner.send(Command::SpeedUp);
        runner.send(Command::SpeedUp);
        runner.step();
        runner.step();

        let chip = runner.stop().unwrap();
        assert_eq!(chip.register(0), 1);
        assert_eq!(chip.program_counter(), 0x200);
    }
}
