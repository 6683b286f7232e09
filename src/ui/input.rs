//! Keyboard control.
//!
//! Keys are read on their own thread in raw mode and forwarded to the
//! sequencer as transport commands.

use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use pt_engine::{TransportCommand, TransportHandle};
use tracing::{debug, warn};

/// Shifted digit row on a US layout; solo keys for channels 1-8.
const SOLO_KEYS: &str = "!@#$%^&*";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Key bindings, for the help line.
pub const HELP: &str = concat!(
    "left/right bpm  up/down pattern  space pause  ",
    "1-8 mute  shift+1-8 solo  u unmute all  ctrl-c quit"
);

/// Map a key press to a transport command.
///
/// Channel keys beyond `channels` are ignored.
pub fn map_key(key: KeyEvent, channels: u8) -> Option<TransportCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let channel = |index: usize| (index < channels as usize).then_some(index as u8);

    match key.code {
        KeyCode::Left => Some(TransportCommand::DecrementBpm),
        KeyCode::Right => Some(TransportCommand::IncrementBpm),
        KeyCode::Up => Some(TransportCommand::DecrementPattern),
        KeyCode::Down => Some(TransportCommand::IncrementPattern),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TransportCommand::Shutdown)
        }
        KeyCode::Char(' ') => Some(TransportCommand::TogglePlaying),
        KeyCode::Char('u') => Some(TransportCommand::UnmuteAll),
        KeyCode::Char(c @ '1'..='8') => {
            channel(c as usize - '1' as usize).map(TransportCommand::ToggleMute)
        }
        KeyCode::Char(c) => SOLO_KEYS
            .find(c)
            .and_then(channel)
            .map(TransportCommand::Solo),
        _ => None,
    }
}

/// Raw terminal mode for as long as this lives.
pub struct RawMode;

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Forward key presses until Ctrl-C or until the sequencer goes away.
pub fn spawn_input(transport: TransportHandle, channels: u8) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("ptplay-input".into())
        .spawn(move || {
            while !transport.is_closed() {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        warn!(error = %e, "keyboard poll failed");
                        break;
                    }
                }
                let key = match event::read() {
                    Ok(Event::Key(key)) => key,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "keyboard read failed");
                        break;
                    }
                };
                let Some(command) = map_key(key, channels) else {
                    continue;
                };
                if !transport.send(command) || command == TransportCommand::Shutdown {
                    break;
                }
            }
            debug!("input thread done");
        })
}
