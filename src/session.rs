//! Session - terminal lifecycle and key input
//!
//! One `Session` per process. It owns the stack coordinator (and through it
//! the screen and backend), the registry and the configuration.
//!
//! ```text
//! Unopened ──open()──▶ Open ──close()──▶ Closed
//!                       │ ▲
//!                       └─┘ open() returns the same root
//! ```

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::core::backend::{Backend, RawInput};
use crate::core::term::Screen;
use crate::error::{Error, Result};
use crate::ui::keymapper::{Input, Key};
use crate::ui::renderer::CrosstermBackend;
use crate::wm::{Registry, StackCoordinator, SurfaceId, Window};

/// Lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

pub struct Session<B: Backend> {
    state: SessionState,
    stack: StackCoordinator<B>,
    registry: Registry,
    config: Config,
}

impl Session<CrosstermBackend> {
    /// Session on the process's own terminal
    pub fn with_terminal(config: Config) -> Result<Self> {
        Self::new(CrosstermBackend::new(), config)
    }
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, config: Config) -> Result<Self> {
        let screen = Screen::new(backend)?;
        let stack = StackCoordinator::new(
            screen,
            config.border_chars(),
            config.window.cursor_visible,
        );
        Ok(Self {
            state: SessionState::Unopened,
            stack,
            registry: Registry::new(config.colour),
            config,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            _ => Err(Error::NotOpen),
        }
    }

    /// Enter raw display mode and build the root surface. Opening an open
    /// session returns the existing root.
    pub fn open(&mut self) -> Result<SurfaceId> {
        match self.state {
            SessionState::Open => return self.root(),
            SessionState::Closed => return Err(Error::Closed),
            SessionState::Unopened => {}
        }
        self.stack.screen_mut().enter()?;
        let root = match self.stack.create_root() {
            Ok(root) => root,
            Err(e) => {
                let _ = self.stack.screen_mut().leave();
                return Err(e);
            }
        };
        self.state = SessionState::Open;
        let size = self.stack.screen().size();
        info!("session opened ({}x{})", size.rows, size.cols);
        Ok(root)
    }

    /// Destroy every surface and restore the terminal. Returns false when
    /// the session was not open.
    pub fn close(&mut self) -> Result<bool> {
        if self.state != SessionState::Open {
            return Ok(false);
        }
        self.state = SessionState::Closed;
        self.stack.remove_all();
        let screen = self.stack.screen_mut();
        screen.reset_pairs();
        screen.leave()?;
        info!("session closed");
        Ok(true)
    }

    pub fn root(&self) -> Result<SurfaceId> {
        self.ensure_open()?;
        self.stack.root().ok_or(Error::NotOpen)
    }

    /// Handle for painting and restacking one surface
    pub fn window(&mut self, id: SurfaceId) -> Result<Window<'_, B>> {
        self.ensure_open()?;
        Window::new(id, &mut self.stack, &mut self.registry)
    }

    pub fn root_window(&mut self) -> Result<Window<'_, B>> {
        let root = self.root()?;
        self.window(root)
    }

    /// Destroy a surface and repaint what it covered
    pub fn destroy(&mut self, id: SurfaceId) -> Result<usize> {
        self.ensure_open()?;
        self.stack.destroy(id)
    }

    /// Push every pending change to the terminal in one write
    pub fn refresh(&mut self) -> Result<usize> {
        self.ensure_open()?;
        self.stack.perform_update()
    }

    /// Next pending key, `None` when there is none
    pub fn getch(&mut self) -> Result<Option<Input>> {
        self.ensure_open()?;
        let raw = self.stack.screen_mut().backend_mut().poll_key()?;
        Ok(raw.map(|raw| self.translate(raw)))
    }

    fn translate(&self, raw: RawInput) -> Input {
        match raw {
            RawInput::Char(ch) => Input::Char(ch),
            RawInput::Code(code) => match self.registry.decode(code) {
                Some(key) => Input::Key(key),
                None => Input::Code(code),
            },
        }
    }

    /// Block until a key arrives, yielding and sleeping `poll` between tries
    pub fn read_key(&mut self, poll: Duration) -> Result<Input> {
        loop {
            if let Some(input) = self.getch()? {
                debug!("key {:?}", input);
                return Ok(input);
            }
            thread::yield_now();
            thread::sleep(poll);
        }
    }

    /// `read_key` with the configured poll interval
    pub fn readch(&mut self) -> Result<Input> {
        self.read_key(self.config.poll_interval())
    }

    /// Whether the terminal can produce `key`
    pub fn is_supported(&self, key: Key) -> bool {
        self.registry
            .code_of(key)
            .is_some_and(|code| self.stack.screen().has_key(code))
    }

    pub fn stack(&self) -> &StackCoordinator<B> {
        &self.stack
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        self.stack.screen().backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.stack.screen_mut().backend_mut()
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::HeadlessBackend;
    use crate::core::term::{Point, Size};
    use crate::ui::keymapper::{KEY_DOWN, KEY_UP};

    fn session() -> Session<HeadlessBackend> {
        Session::new(HeadlessBackend::new(10, 20), Config::default()).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Unopened);
        assert!(matches!(s.refresh(), Err(Error::NotOpen)));
        assert!(!s.close().unwrap());

        let root = s.open().unwrap();
        assert!(s.backend().is_raw());
        assert_eq!(s.open().unwrap(), root);

        assert!(s.close().unwrap());
        assert!(!s.close().unwrap());
        assert!(!s.backend().is_raw());
        assert!(matches!(s.open(), Err(Error::Closed)));
        assert!(matches!(s.window(root), Err(Error::NotOpen)));
    }

    #[test]
    fn test_close_destroys_surfaces() {
        let mut s = session();
        let root = s.open().unwrap();
        s.window(root)
            .unwrap()
            .create_child(Point::new(1, 1), Size::new(2, 2))
            .unwrap();
        assert_eq!(s.stack().len(), 2);
        s.close().unwrap();
        assert!(s.stack().is_empty());
    }

    #[test]
    fn test_getch_translates_keys() {
        let mut s = session();
        s.open().unwrap();
        assert_eq!(s.getch().unwrap(), None);

        s.backend_mut().push_str("a");
        s.backend_mut().push_input(RawInput::Code(KEY_DOWN));
        s.backend_mut().push_input(RawInput::Code(0o777));
        assert_eq!(s.getch().unwrap(), Some(Input::Char('a')));
        assert_eq!(s.getch().unwrap(), Some(Input::Key(Key::Down)));
        assert_eq!(s.getch().unwrap(), Some(Input::Code(0o777)));
        assert_eq!(s.getch().unwrap(), None);
    }

    #[test]
    fn test_read_key_waits_for_input() {
        let mut s = session();
        s.open().unwrap();
        s.backend_mut().push_input(RawInput::Code(KEY_UP));
        s.backend_mut().delay_input(3);
        let polls = s.backend().poll_count();
        assert_eq!(s.read_key(Duration::from_millis(1)).unwrap(), Input::Key(Key::Up));
        // Three empty polls, then the one that finds the key
        assert_eq!(s.backend().poll_count() - polls, 4);
    }

    #[test]
    fn test_is_supported() {
        let backend = HeadlessBackend::new(4, 4).with_supported_codes(&[KEY_UP]);
        let s = Session::new(backend, Config::default()).unwrap();
        assert!(s.is_supported(Key::Up));
        assert!(!s.is_supported(Key::Down));
        assert!(!s.is_supported(Key::Suspend));
    }

    #[test]
    fn test_monochrome_config_skips_pair_registration() {
        let config = Config {
            colour: false,
            ..Config::default()
        };
        let mut s = Session::new(HeadlessBackend::new(2, 4), config).unwrap();
        let root = s.open().unwrap();
        s.window(root)
            .unwrap()
            .colour(crate::core::term::Colour::Red, crate::core::term::Colour::Black)
            .unwrap()
            .addstr("x")
            .unwrap();
        s.refresh().unwrap();
        let cell = s.backend().cell(Point::new(0, 0)).unwrap();
        assert_eq!(cell.ch, 'x');
        assert_eq!(cell.fg, None);
    }
}
