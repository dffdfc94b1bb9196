use crate::driver::{DisplayDevice, DisplayInfo, InputDevice, InputInfo, Signal};
use crate::ppu::Rgb;

pub struct Minifb {
    // GUI window
    window: minifb::Window,
    // Auxiliary frame buffer to convert pixels to the 32-bit format minifb::Window expects
    framebuf: Vec<u32>,
    width: usize,
    height: usize,
}

impl Minifb {
    pub fn new(name: &str, width: usize, height: usize) -> Self {
        Minifb {
            window: minifb::Window::new(
                &("VSI-16: ".to_owned() + name),
                width,
                height,
                minifb::WindowOptions {
                    resize: true,
                    scale: minifb::Scale::X4,
                    ..Default::default()
                },
            )
            .expect("GUI window creation failed"),

            framebuf: vec![0; width * height],
            width,
            height,
        }
    }
}

impl InputDevice for Minifb {
    fn handle_inputs(&mut self) -> Signal {
        // Polling get_keys() drives minifb's internal event pump, which
        // is_open() depends on -- call it even though nothing maps to a
        // button on this console.
        let _ = self.window.get_keys();

        if self.window.is_open() && !self.window.is_key_down(minifb::Key::Escape) {
            Signal::None
        } else {
            Signal::ProgramExit
        }
    }

    fn device_info(&self) -> InputInfo {
        InputInfo::Minifb
    }
}

impl DisplayDevice for Minifb {
    fn receive_frame(&mut self, frame: &[Rgb], width: usize, height: usize) -> &mut dyn DisplayDevice {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.framebuf.resize(width * height, 0);
        }

        for (idx, &(r, g, b)) in frame.iter().enumerate() {
            self.framebuf[idx] = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
        }

        self
    }

    fn drive_display(&mut self) {
        self.window
            .update_with_buffer(&self.framebuf, self.width, self.height)
            .unwrap();
    }

    fn device_info(&self) -> DisplayInfo {
        DisplayInfo::Minifb
    }
}
