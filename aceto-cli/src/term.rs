//! Terminal-aware I/O for interactive programs.
//!
//! Writes and line reads go straight through the plain stream adapter.
//! Single-character reads (`,`) put the terminal into raw mode when stdin
//! is a terminal, so no Enter is needed; piped input falls back to
//! reading one scalar from the stream.

use std::io::{self, IsTerminal};

use aceto_interp::io::{Io, StdIo};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

#[derive(Debug, Default)]
pub struct TermIo {
    inner: StdIo,
}

impl TermIo {
    pub fn new() -> Self {
        TermIo::default()
    }
}

impl Io for TermIo {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.inner.read_line()
    }

    fn read_char(&mut self) -> io::Result<Option<char>> {
        if io::stdin().is_terminal() {
            read_key()
        } else {
            self.inner.read_char()
        }
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.inner.write_str(s)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Read one key press in raw mode. Enter reads as a carriage return,
/// matching what a raw terminal delivers; Ctrl-C still interrupts.
fn read_key() -> io::Result<Option<char>> {
    enable_raw_mode()?;
    let result = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let _ = disable_raw_mode();
                    std::process::exit(130);
                }
                KeyCode::Char(c) => break Ok(Some(c)),
                KeyCode::Enter => break Ok(Some('\r')),
                KeyCode::Tab => break Ok(Some('\t')),
                _ => continue,
            },
            Ok(_) => continue,
            Err(e) => break Err(e),
        }
    };
    disable_raw_mode()?;
    result
}
