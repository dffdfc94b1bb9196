use std::{
    fmt::Write as _,
    io::{stdout, Read, Stdout, Write},
};

use crate::driver::{AudioDevice, AudioInfo, DisplayDevice, DisplayInfo, InputDevice, InputInfo, Signal};
use crate::ppu::Rgb;

pub struct Termion {
    // Input byte stream from tty stdin
    stdin: termion::AsyncReader,
    // TUI window - redirects all writes to an alternate screen and restores
    // existing terminal state upon being dropped. Raw mode is required because
    // in canonical mode, inputs are buffered until a newline or EOF is reached.
    // This means that users would have to manually hit return/enter for their
    // inputs to be received by the reader, which is not practical.
    //   - https://en.wikipedia.org/wiki/Terminal_mode
    //   - https://stackoverflow.com/questions/77397499
    screen: termion::screen::AlternateScreen<termion::raw::RawTerminal<Stdout>>,
    // Terminal width and height used to detect resizes and center accordingly
    term_size: (u16, u16), // (w, h)
    // Frame buffer used to write to screen. This is embedded within the struct
    // instead of created at each frame refresh because we get to reuse the
    // space allocated (which is roughly constant) with String::clear()
    framebuf: String,
}

impl Termion {
    pub fn new() -> Self {
        use termion::raw::IntoRawMode;
        use termion::screen::IntoAlternateScreen;

        let mut t = Termion {
            stdin: termion::async_stdin(),
            screen: stdout()
                .into_raw_mode()
                .unwrap()
                .into_alternate_screen()
                .expect("TUI screen creation failed"),
            term_size: termion::terminal_size().unwrap(),
            framebuf: String::new(),
        };

        write!(t.screen, "{}", termion::cursor::Hide).unwrap();
        t.screen.flush().unwrap();

        t
    }
}

impl InputDevice for Termion {
    fn handle_inputs(&mut self) -> Signal {
        let mut inputs = Vec::new();
        // Drain all inputs from stdin
        self.stdin.read_to_end(&mut inputs).unwrap();

        for byte in inputs {
            // Esc (ASCII 0x1B), ^C (ASCII 0x03), or 'q' to signal program exit
            if matches!(byte, 0x03 | 0x1B | b'q') {
                write!(self.screen, "{}", termion::cursor::Show).unwrap();
                return Signal::ProgramExit;
            }
        }

        Signal::None
    }

    fn device_info(&self) -> InputInfo {
        InputInfo::Termion
    }
}

impl DisplayDevice for Termion {
    fn receive_frame(&mut self, frame: &[Rgb], width: usize, height: usize) -> &mut dyn DisplayDevice {
        use termion::color;

        // Clear screen before sending next frame if terminal has resized
        if let Ok(term_size) = termion::terminal_size() {
            if self.term_size != term_size {
                self.term_size = term_size;
                write!(self.screen, "{}", termion::clear::All).unwrap();
            }
        }

        let (x_offset, y_offset) = (
            self.term_size.0.saturating_sub(width as u16) / 2,
            self.term_size.1.saturating_sub(height as u16) / 2,
        );

        self.framebuf.clear();

        for (idx, &(r, g, b)) in frame.iter().enumerate() {
            if idx % width == 0 {
                write!(
                    self.framebuf,
                    "{}",
                    termion::cursor::Goto(x_offset + 1, y_offset + (1 + idx / width) as u16)
                )
                .unwrap();
            }
            write!(self.framebuf, "{}█", color::Fg(color::Rgb(r, g, b))).unwrap();
        }

        self
    }

    fn drive_display(&mut self) {
        write!(self.screen, "{}", self.framebuf).unwrap();
        self.screen.flush().unwrap();
    }

    fn device_info(&self) -> DisplayInfo {
        DisplayInfo::Termion
    }
}

impl AudioDevice for Termion {
    fn receive_signal(&mut self, data: bool) -> &mut dyn AudioDevice {
        if data {
            write!(self.screen, "\x07").unwrap();
        }

        self
    }

    fn play_sound(&mut self) {}

    fn device_info(&self) -> AudioInfo {
        AudioInfo::Termion
    }
}
