//! Interactive menu loop.
//!
//! One input suspension point per state: the loop moves between
//! `AwaitingChoice`, `Executing` and `Paused`. Ctrl-C or end of input ends the
//! program from any state that reads keys.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use log::debug;

use crate::app::App;

/// A key press, reduced to what the menu cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    /// Ctrl-C, or end of input (Ctrl-D / Ctrl-Z).
    Interrupt,
    Other,
}

/// Source of key presses. Errors are treated as end of input.
///
/// The shell reads keys only between `begin_input` and `end_input`, once per
/// prompt.
pub trait KeySource {
    fn next_key(&mut self) -> io::Result<Key>;

    fn begin_input(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn end_input(&mut self) {}
}

/// RAII guard that restores terminal mode on drop.
struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Reads single key presses from the terminal.
///
/// Raw mode is held for a whole prompt, so action output and editors run in
/// the normal terminal mode in between.
#[derive(Default)]
pub struct TerminalKeys {
    raw: Option<RawModeGuard>,
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Key> {
        let _transient = match self.raw {
            Some(_) => None,
            None => Some(RawModeGuard::new()?),
        };
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(map_key(key));
                }
            }
        }
    }

    fn begin_input(&mut self) -> io::Result<()> {
        if self.raw.is_none() {
            self.raw = Some(RawModeGuard::new()?);
        }
        // drop keys typed while the last action was running
        while event::poll(Duration::ZERO)? {
            event::read()?;
        }
        Ok(())
    }

    fn end_input(&mut self) {
        self.raw = None;
    }
}

fn map_key(key: KeyEvent) -> Key {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'd' | 'z') if ctrl => Key::Interrupt,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        _ => Key::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Update,
    FlushDns,
    ShowHosts,
    EditHosts,
    OpenDirectory,
    Quit,
}

impl MenuOption {
    pub const ALL: [MenuOption; 6] = [
        MenuOption::Update,
        MenuOption::FlushDns,
        MenuOption::ShowHosts,
        MenuOption::EditHosts,
        MenuOption::OpenDirectory,
        MenuOption::Quit,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        Self::ALL.get(n.checked_sub(1)?).copied()
    }

    pub fn key(self) -> char {
        let idx = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        char::from(b'1' + idx as u8)
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuOption::Update => "Update GitHub520 hosts",
            MenuOption::FlushDns => "Flush DNS cache",
            MenuOption::ShowHosts => "Show hosts file",
            MenuOption::EditHosts => "Edit hosts file",
            MenuOption::OpenDirectory => "Open hosts directory",
            MenuOption::Quit => "Quit",
        }
    }
}

/// What a key did to the pending entry.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    Echo(char),
    Erase,
    Submit(MenuOption),
    /// Enter on an empty entry; prompt again.
    Restart,
    Interrupt,
    Ignored,
}

/// Single-character confirmed entry: a valid digit, then Enter.
#[derive(Debug, Default)]
pub struct ChoiceInput {
    pending: Option<char>,
}

impl ChoiceInput {
    pub fn feed(&mut self, key: Key) -> InputEvent {
        match key {
            Key::Interrupt => InputEvent::Interrupt,
            Key::Enter => match self.pending.take().and_then(MenuOption::from_char) {
                Some(option) => InputEvent::Submit(option),
                None => InputEvent::Restart,
            },
            Key::Backspace => match self.pending.take() {
                Some(_) => InputEvent::Erase,
                None => InputEvent::Ignored,
            },
            Key::Char(c) if self.pending.is_none() && MenuOption::from_char(c).is_some() => {
                self.pending = Some(c);
                InputEvent::Echo(c)
            }
            _ => InputEvent::Ignored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingChoice,
    Executing(MenuOption),
    Paused,
}

/// How the shell ended. Both map to exit code 0.
#[derive(Debug, PartialEq, Eq)]
pub enum ShellExit {
    Quit,
    Interrupted,
}

const RULE: &str = "==================================================";

pub struct Shell<'a, K, W> {
    app: &'a App,
    keys: K,
    out: W,
}

impl<'a, K: KeySource, W: Write> Shell<'a, K, W> {
    pub fn new(app: &'a App, keys: K, out: W) -> Self {
        Self { app, keys, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn run(&mut self) -> io::Result<ShellExit> {
        self.banner()?;
        let mut state = State::AwaitingChoice;
        loop {
            state = match state {
                State::AwaitingChoice => match self.read_choice()? {
                    Some(option) => State::Executing(option),
                    None => return self.farewell(ShellExit::Interrupted),
                },
                State::Executing(MenuOption::Quit) => return self.farewell(ShellExit::Quit),
                State::Executing(option) => {
                    let ok = self.dispatch(option)?;
                    self.separator(ok)?;
                    State::Paused
                }
                State::Paused => {
                    if !self.pause()? {
                        return self.farewell(ShellExit::Interrupted);
                    }
                    queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
                    self.banner()?;
                    State::AwaitingChoice
                }
            };
        }
    }

    fn next_key(&mut self) -> Key {
        match self.keys.next_key() {
            Ok(key) => key,
            Err(e) => {
                debug!("input closed: {e}");
                Key::Interrupt
            }
        }
    }

    /// A source that cannot start a session fails its next read instead.
    fn begin_input(&mut self) {
        if let Err(e) = self.keys.begin_input() {
            debug!("input session: {e}");
        }
    }

    fn banner(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            format!("GitHub520 hosts updater v{}", env!("CARGO_PKG_VERSION")).bold()
        )?;
        writeln!(
            self.out,
            "{}",
            "Hosts data: https://github.com/521xueweihan/GitHub520".green()
        )?;
        self.out.flush()
    }

    fn read_choice(&mut self) -> io::Result<Option<MenuOption>> {
        writeln!(self.out, "\n{}", "Choose an action:".yellow())?;
        for option in MenuOption::ALL {
            writeln!(self.out, "{}. {}", option.key(), option.label())?;
        }
        self.prompt()?;
        self.begin_input();
        let choice = self.read_option();
        self.keys.end_input();
        let choice = choice?;
        if choice.is_some() {
            writeln!(self.out)?;
        }
        Ok(choice)
    }

    /// Key loop of `read_choice`; runs in raw mode, so lines end in `\r\n`.
    fn read_option(&mut self) -> io::Result<Option<MenuOption>> {
        let mut input = ChoiceInput::default();
        loop {
            match input.feed(self.next_key()) {
                InputEvent::Echo(c) => write!(self.out, "{c}")?,
                InputEvent::Erase => write!(self.out, "\u{8} \u{8}")?,
                InputEvent::Submit(option) => return Ok(Some(option)),
                InputEvent::Restart => {
                    write!(self.out, "\r\n")?;
                    self.prompt()?;
                }
                InputEvent::Interrupt => return Ok(None),
                InputEvent::Ignored => continue,
            }
            self.out.flush()?;
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "\r\n{}", "Enter an option (1-6): ".cyan())?;
        self.out.flush()
    }

    /// Wait for Enter; false if input was interrupted instead.
    fn pause(&mut self) -> io::Result<bool> {
        write!(self.out, "\nPress Enter to continue...")?;
        self.out.flush()?;
        self.begin_input();
        let resumed = loop {
            match self.next_key() {
                Key::Enter => break true,
                Key::Interrupt => break false,
                _ => continue,
            }
        };
        self.keys.end_input();
        if resumed {
            writeln!(self.out)?;
        }
        Ok(resumed)
    }

    fn separator(&mut self, ok: bool) -> io::Result<()> {
        if ok {
            writeln!(self.out, "\n{}", RULE.green())
        } else {
            writeln!(self.out, "\n{}", RULE.red())
        }
    }

    fn farewell(&mut self, exit: ShellExit) -> io::Result<ShellExit> {
        writeln!(self.out, "\n{}", "Thanks for using GitHub520. Bye!".green())?;
        if exit == ShellExit::Quit {
            writeln!(self.out, "\n{}", RULE.green())?;
        }
        self.out.flush()?;
        Ok(exit)
    }

    fn fail(&mut self, what: &str, e: impl std::fmt::Display) -> io::Result<bool> {
        writeln!(self.out, "{}", format!("{what}: {e}").red())?;
        Ok(false)
    }

    /// Run one action, reporting any failure. Returns whether it succeeded.
    fn dispatch(&mut self, option: MenuOption) -> io::Result<bool> {
        let app = self.app;
        match option {
            MenuOption::Update => {
                writeln!(self.out, "\n{}", "Updating hosts...".yellow())?;
                self.out.flush()?;
                match app.update() {
                    Ok(outcome) => {
                        writeln!(
                            self.out,
                            "{}",
                            format!("Backup saved: {}", outcome.backup.path.display()).cyan()
                        )?;
                        if !outcome.pruned.removed.is_empty() {
                            writeln!(
                                self.out,
                                "Removed {} old backup(s)",
                                outcome.pruned.removed.len()
                            )?;
                        }
                        writeln!(self.out, "{}", "hosts file updated.".green())?;
                        match outcome.dns_flush {
                            Ok(()) => writeln!(self.out, "{}", "DNS cache flushed.".green())?,
                            Err(e) => {
                                writeln!(self.out, "{}", format!("DNS flush failed: {e}").yellow())?
                            }
                        }
                        Ok(true)
                    }
                    Err(e) => self.fail("Update failed", e),
                }
            }
            MenuOption::FlushDns => {
                writeln!(self.out, "\n{}", "Flushing DNS cache...".yellow())?;
                match app.flush_dns() {
                    Ok(()) => {
                        writeln!(self.out, "{}", "DNS cache flushed.".green())?;
                        Ok(true)
                    }
                    Err(e) => self.fail("DNS flush failed", e),
                }
            }
            MenuOption::ShowHosts => match app.read_hosts() {
                Ok(content) => {
                    writeln!(self.out, "\n{}\n", "Current hosts file:".cyan())?;
                    let content = content.trim();
                    if content.is_empty() {
                        writeln!(self.out, "{}", "hosts file is empty.".yellow())?;
                    } else {
                        writeln!(self.out, "{content}")?;
                    }
                    Ok(true)
                }
                Err(e) => self.fail("Could not read hosts file", e),
            },
            MenuOption::EditHosts => {
                writeln!(self.out, "\n{}", "Opening editor...".yellow())?;
                self.out.flush()?;
                match app.edit() {
                    Ok(outcome) => {
                        writeln!(self.out, "{}", "Edit finished.".green())?;
                        match outcome.dns_flush {
                            Ok(()) => writeln!(self.out, "{}", "DNS cache flushed.".green())?,
                            Err(e) => {
                                writeln!(self.out, "{}", format!("DNS flush failed: {e}").yellow())?
                            }
                        }
                        Ok(true)
                    }
                    Err(e) => self.fail("Editing hosts failed", e),
                }
            }
            MenuOption::OpenDirectory => match app.open_directory() {
                Ok(dir) => {
                    writeln!(self.out, "{}", "Opened hosts directory:".green())?;
                    writeln!(self.out, "  {}", dir.display())?;
                    Ok(true)
                }
                Err(e) => self.fail("Could not open directory", e),
            },
            MenuOption::Quit => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_keys_round_trip() {
        for option in MenuOption::ALL {
            assert_eq!(MenuOption::from_char(option.key()), Some(option));
        }
        assert_eq!(MenuOption::from_char('0'), None);
        assert_eq!(MenuOption::from_char('7'), None);
        assert_eq!(MenuOption::from_char('x'), None);
    }

    #[test]
    fn only_first_valid_digit_is_taken() {
        let mut input = ChoiceInput::default();
        assert_eq!(input.feed(Key::Char('9')), InputEvent::Ignored);
        assert_eq!(input.feed(Key::Char('a')), InputEvent::Ignored);
        assert_eq!(input.feed(Key::Char('3')), InputEvent::Echo('3'));
        assert_eq!(input.feed(Key::Char('4')), InputEvent::Ignored);
        assert_eq!(input.feed(Key::Enter), InputEvent::Submit(MenuOption::ShowHosts));
    }

    #[test]
    fn backspace_clears_pending_entry() {
        let mut input = ChoiceInput::default();
        assert_eq!(input.feed(Key::Backspace), InputEvent::Ignored);
        assert_eq!(input.feed(Key::Char('1')), InputEvent::Echo('1'));
        assert_eq!(input.feed(Key::Backspace), InputEvent::Erase);
        assert_eq!(input.feed(Key::Char('2')), InputEvent::Echo('2'));
        assert_eq!(input.feed(Key::Enter), InputEvent::Submit(MenuOption::FlushDns));
    }

    #[test]
    fn enter_without_entry_restarts() {
        let mut input = ChoiceInput::default();
        assert_eq!(input.feed(Key::Enter), InputEvent::Restart);
        assert_eq!(input.feed(Key::Char('6')), InputEvent::Echo('6'));
        assert_eq!(input.feed(Key::Enter), InputEvent::Submit(MenuOption::Quit));
    }

    #[test]
    fn interrupt_wins_over_pending_entry() {
        let mut input = ChoiceInput::default();
        input.feed(Key::Char('1'));
        assert_eq!(input.feed(Key::Interrupt), InputEvent::Interrupt);
    }

    #[test]
    fn ctrl_c_maps_to_interrupt() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key), Key::Interrupt);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(map_key(key), Key::Char('c'));
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(map_key(key), Key::Enter);
    }
}
