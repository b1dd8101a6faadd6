//! Common interface over the chip front-ends
//!
//! Every supported chip exposes the same bus-shaped surface: an
//! address/data write port, a per-sample clock and the last generated
//! frame. Renderers hold a `Box<dyn FmChip>` and never care which
//! family is behind it.

/// A clocked FM chip with a latched register bus.
///
/// # Example
///
/// ```
/// use opfm::backend::FmChip;
/// use opfm::chips::Ym3812;
///
/// let mut chip = Ym3812::new(3_579_545);
/// chip.write_register(0x20, 0x21); // modulator flags, first channel
/// chip.clock();
/// assert_eq!(chip.get_samples().len(), 1);
/// ```
pub trait FmChip: Send {
    /// Creates the chip with the given master clock.
    fn new(master_clock: u32) -> Self
    where
        Self: Sized;

    /// Resets to power-on state: registers cleared, envelopes
    /// silenced, address latch zeroed.
    fn reset(&mut self);

    /// Bus write. Even ports latch a register address, odd ports write
    /// the data to the latched register.
    fn write_io(&mut self, port: u8, data: u8) {
        if port & 1 == 0 {
            self.latch_address(data);
        } else {
            let reg = self.latched_address();
            self.write_register(reg, data);
        }
    }

    /// Stores the register address for the next data write.
    fn latch_address(&mut self, address: u8);

    /// The currently latched register address.
    fn latched_address(&self) -> u8;

    /// Direct register write, bypassing the address latch.
    ///
    /// Unmapped registers are ignored so captured register dumps play
    /// back without filtering.
    fn write_register(&mut self, reg: u8, data: u8);

    /// Advances the chip by one output sample.
    fn clock(&mut self);

    /// The last generated frame, one value per output channel.
    fn get_samples(&self) -> &[i16];

    /// Master clock cycles consumed per output sample.
    fn sample_divisor(&self) -> u32;

    /// Master clock in Hz.
    fn master_clock(&self) -> u32;

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32 {
        self.master_clock() / self.sample_divisor()
    }

    /// Output channels per frame (1 mono, 2 stereo).
    fn output_channels(&self) -> usize {
        self.get_samples().len()
    }

    /// Renders frames into a caller-provided interleaved buffer.
    ///
    /// The buffer length must be a multiple of [`output_channels`]
    /// (trailing rest stays untouched). Prefer this in hot paths, it
    /// does not allocate.
    ///
    /// [`output_channels`]: FmChip::output_channels
    fn render_into(&mut self, buffer: &mut [i16]) {
        let step = self.output_channels();
        for frame in buffer.chunks_exact_mut(step) {
            self.clock();
            frame.copy_from_slice(self.get_samples());
        }
    }

    /// Renders a number of frames as interleaved samples.
    fn render(&mut self, frames: usize) -> Vec<i16> {
        let mut buffer = vec![0i16; frames * self.output_channels()];
        self.render_into(&mut buffer);
        buffer
    }
}
