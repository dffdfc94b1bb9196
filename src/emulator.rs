//! Per-frame driver: walks scanlines top to bottom, synchronizes the CPU
//! and PPU across HBlank/VBlank, and hands finished frames to the host
//! display driver.

use std::cell::RefCell;
use std::time::Duration;

use crate::cpu::{Cpu, CpuFlags, HBLANK_VECTOR, VBLANK_VECTOR};
use crate::driver::{AudioDevice, DisplayDevice, InputDevice, NullDevice, Signal};
use crate::error::RomError;
use crate::memory::Bus;
use crate::ppu::{Ppu, ScreenMode, SCREEN_WIDTH};
use crate::rom::Rom;

/// Frames per second; the teacher exposes an instruction-clock-rate knob
/// (`emu_clock_hz`) but this core is frame-stepped, not cycle-stepped, so
/// the CLI's `--freq` throttles frame cadence around this default instead.
pub const DEFAULT_CLOCK_FREQ: f32 = 60.0;

/// Safety bound on instructions executed while waiting for an HBlank/VBlank
/// handler to return. Nothing in the spec caps this — it exists so a ROM
/// that enables interrupts but never executes `RETI` cannot hang the host
/// process forever.
const MAX_HANDLER_STEPS: u32 = 1_000_000;

static NULL_INPUT: RefCell<NullDevice> = RefCell::new(NullDevice::Input);
static NULL_DISPLAY: RefCell<NullDevice> = RefCell::new(NullDevice::Display);
static NULL_SPEAKER: RefCell<NullDevice> = RefCell::new(NullDevice::Audio);

/// Owns the CPU, the memory fabric (and through it, the PPU), and the
/// host-facing device handles. Lifetime-parameterized the way the teacher's
/// `Emulator<'i, 'd, 'a>` borrows its peripherals rather than owning them,
/// so the same `Minifb`/`Termion` value can back more than one trait object
/// (input and display share a window). Peripherals are wrapped in
/// `RefCell`, following the teacher's `io_controller::{Input,Display,Audio}`
/// wrappers, since `InputDevice`/`DisplayDevice` methods take `&mut self`.
pub struct Emulator<'i, 'd, 'a> {
    cpu: Cpu,
    bus: Bus,
    frame_hz: f32,
    input: &'i RefCell<dyn InputDevice + 'i>,
    display: &'d RefCell<dyn DisplayDevice + 'd>,
    speaker: &'a RefCell<dyn AudioDevice + 'a>,
}

impl<'i, 'd, 'a> Emulator<'i, 'd, 'a> {
    pub fn new(screen_mode: ScreenMode) -> Emulator<'i, 'd, 'a> {
        Emulator::with_peripherals(screen_mode, &NULL_INPUT, &NULL_DISPLAY, &NULL_SPEAKER)
    }

    pub fn with_peripherals(
        screen_mode: ScreenMode,
        input: &'i RefCell<dyn InputDevice + 'i>,
        display: &'d RefCell<dyn DisplayDevice + 'd>,
        speaker: &'a RefCell<dyn AudioDevice + 'a>,
    ) -> Emulator<'i, 'd, 'a> {
        Emulator {
            cpu: Cpu::new(),
            bus: Bus::new(Rom::from_bytes(vec![0; 0x200]), Ppu::new(screen_mode)),
            frame_hz: DEFAULT_CLOCK_FREQ,
            input,
            display,
            speaker,
        }
    }

    pub fn set_clock_speed(&mut self, frame_hz: f32) {
        self.frame_hz = frame_hz;
    }

    /// Load a ROM from disk, resetting the CPU and PPU to their initial
    /// state. The screen mode of the previously running program carries
    /// over since it's an `Emulator` construction-time setting, not a ROM
    /// header field (`SPEC_FULL.md` §9).
    pub fn load_program(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), RomError> {
        let rom = Rom::load(path)?;
        let mode = self.bus.ppu.mode();
        self.bus = Bus::new(rom, Ppu::new(mode));
        self.cpu = Cpu::new();
        tracing::info!(title = %self.bus.rom_title(), "loaded ROM");
        Ok(())
    }

    /// Run until the host requests exit, the CPU crashes, or it executes
    /// `STOP`.
    pub fn run(&mut self) {
        let frame_period = Duration::from_secs_f32(1.0 / self.frame_hz.max(1.0));
        loop {
            if !self.run_frame() {
                break;
            }
            std::thread::sleep(frame_period);
        }
    }

    /// Render and run exactly one frame. Returns `false` when the caller
    /// should stop (CPU crashed or stopped, or the host asked to quit).
    pub fn run_frame(&mut self) -> bool {
        let height = self.bus.ppu.height();
        let mut framebuffer = Vec::with_capacity(SCREEN_WIDTH * height);

        for y in 0..height {
            framebuffer.extend(self.bus.ppu.render_scanline(y));

            if !self.sync_on_vector(HBLANK_VECTOR) {
                return false;
            }
        }

        if !self.sync_on_vector(VBLANK_VECTOR) {
            return false;
        }

        self.display
            .borrow_mut()
            .receive_frame(&framebuffer, SCREEN_WIDTH, height)
            .drive_display();

        !matches!(self.input.borrow_mut().handle_inputs(), Signal::ProgramExit)
    }

    /// Raise `vector` and run CPU instructions until the handler returns
    /// (signalled by `RETI` setting `INTERRUPT_ENABLE_NEXT`), per
    /// `SPEC_FULL.md` §4.5/§5. If interrupts are currently masked, the
    /// raise is a no-op per §4.4 — run a single instruction instead so a
    /// ROM that keeps interrupts disabled still makes forward progress.
    /// Returns `false` if the CPU is no longer running.
    fn sync_on_vector(&mut self, vector: u16) -> bool {
        if !self.cpu.interrupt(&mut self.bus, vector) {
            tracing::trace!(vector, "interrupt masked, single-stepping instead");
            self.cpu.step(&mut self.bus);
            return self.cpu.flags().contains(CpuFlags::RUN);
        }
        tracing::trace!(vector, "dispatched");

        for _ in 0..MAX_HANDLER_STEPS {
            if !self.cpu.flags().contains(CpuFlags::RUN) {
                return false;
            }
            if self.cpu.flags().contains(CpuFlags::INTERRUPT_ENABLE_NEXT) {
                return true;
            }
            self.cpu.step(&mut self.bus);
        }

        tracing::warn!(
            vector,
            steps = MAX_HANDLER_STEPS,
            "interrupt handler never returned; giving up on this scanline"
        );
        self.cpu.flags().contains(CpuFlags::RUN)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}
