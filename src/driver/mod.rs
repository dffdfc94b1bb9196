pub mod ansiterm;
pub mod minifb;
pub mod termion;

use crate::ppu::Rgb;

// Control signal an InputDevice hands back to the frame driver. Unlike a
// general game console, this system exposes no button/controller port in
// its memory map (SPEC_FULL.md §6) -- the only thing a host can report
// back is a quit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    None,
    ProgramExit,
}

// Model input device (e.g. keyboard, touchscreen, etc.) interfacing with our VSI-16 system
pub trait InputDevice {
    fn device_info(&self) -> InputInfo;

    fn handle_inputs(&mut self) -> Signal;
}

// Model display device (e.g. UI library window, physical screen, etc.) interfacing with our VSI-16 system
pub trait DisplayDevice {
    fn device_info(&self) -> DisplayInfo;

    fn receive_frame(&mut self, frame: &[Rgb], width: usize, height: usize) -> &mut dyn DisplayDevice;

    fn drive_display(&mut self);
}

// Model audio device (e.g. audio drivers, beeper, etc.) interfacing with our VSI-16 system
pub trait AudioDevice {
    fn device_info(&self) -> AudioInfo;

    fn receive_signal(&mut self, data: bool) -> &mut dyn AudioDevice;

    fn play_sound(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub enum InputInfo {
    Minifb,
    Termion,
    None,
}

#[derive(Debug, Clone, Copy)]
pub enum DisplayInfo {
    Minifb,
    Termion,
    None,
}

#[derive(Debug, Clone, Copy)]
pub enum AudioInfo {
    AnsiTerm,
    Termion,
    None,
}

// Model empty device -- puts `/dev/null` into perspective
#[derive(Debug, Clone, Copy)]
pub enum NullDevice {
    Input,
    Display,
    Audio,
}

impl InputDevice for NullDevice {
    fn device_info(&self) -> InputInfo {
        InputInfo::None
    }
    fn handle_inputs(&mut self) -> Signal {
        Signal::None
    }
}

impl DisplayDevice for NullDevice {
    fn device_info(&self) -> DisplayInfo {
        DisplayInfo::None
    }
    fn receive_frame(&mut self, _frame: &[Rgb], _width: usize, _height: usize) -> &mut dyn DisplayDevice {
        self
    }
    fn drive_display(&mut self) {}
}

impl AudioDevice for NullDevice {
    fn device_info(&self) -> AudioInfo {
        AudioInfo::None
    }
    fn receive_signal(&mut self, _data: bool) -> &mut dyn AudioDevice {
        self
    }
    fn play_sound(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_device_is_inert() {
        let mut input = NullDevice::Input;
        assert_eq!(input.handle_inputs(), Signal::None);

        let mut display = NullDevice::Display;
        display.receive_frame(&[], 0, 0).drive_display();

        let mut audio = NullDevice::Audio;
        audio.receive_signal(true).play_sound();
    }
}
