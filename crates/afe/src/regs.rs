//! Shadow / pending register image for the four-chip AFE bank.
//!
//! Two parallel 96-byte images cover the full register space
//! (`chip * 24 + offset`): *shadow* is the chips' last confirmed state,
//! *pending* is the host-requested target. Hosts only ever mutate pending;
//! the bus driver diffs pending against shadow and writes the differences,
//! so an untouched register never costs bus traffic.
//!
//! Every pending value passes through the forced-bit policy
//! ([`platform::ads1299::constrain`]) before it can reach the bus, which
//! guarantees the shadow image never records an illegal bit pattern.

use platform::ads1299::{
    constrain, field_to_gain, gain_to_field, CF2_TEST_INTERNAL, CF3_BIAS_DRIVER, CF3_BIAS_IDLE,
    CH_ENABLE_KEEP_MASK, CH_GAIN_MASK, CH_GAIN_SHIFT, CH_INPUT_SHORT, CH_MUX_TEST, CH_POWER_DOWN,
    CH_SRB2, MISC1_SRB1, REG_BIAS_SENSN, REG_BIAS_SENSP, REG_CH1SET, REG_CONFIG2, REG_CONFIG3,
    REG_MISC1,
};
use platform::config::{AFE_COUNT, CHANNELS_PER_AFE, CHANNEL_COUNT, REGISTER_COUNT, REGS_PER_AFE};
use thiserror_no_std::Error;

/// Errors from register-image operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegError {
    /// Register index outside `0..96`.
    #[error("register index out of range")]
    IndexOutOfRange,
    /// Channel outside `1..=32`.
    #[error("channel out of range")]
    ChannelOutOfRange,
    /// Gain not one of 1, 2, 4, 6, 8, 12, 24.
    #[error("invalid gain value")]
    InvalidGain,
}

/// The shadow / pending image pair plus the changes-pending flag.
pub struct RegisterImage {
    shadow: [u8; REGISTER_COUNT],
    pending: [u8; REGISTER_COUNT],
    dirty: bool,
}

impl RegisterImage {
    /// Create a zeroed image with no pending changes.
    ///
    /// The first full register read resynchronizes both images with the
    /// hardware, so the zeroed startup state never reaches the bus.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shadow: [0; REGISTER_COUNT],
            pending: [0; REGISTER_COUNT],
            dirty: false,
        }
    }

    /// `true` while pending changes await the next apply cycle.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Request `value` for the device-wide register `index`.
    pub fn set_pending(&mut self, index: usize, value: u8) -> Result<(), RegError> {
        let slot = self
            .pending
            .get_mut(index)
            .ok_or(RegError::IndexOutOfRange)?;
        *slot = value;
        self.dirty = true;
        Ok(())
    }

    /// Copy a host payload over the start of the pending image.
    ///
    /// Bytes past the 96th are ignored.
    pub fn load_payload(&mut self, payload: &[u8]) {
        let n = payload.len().min(REGISTER_COUNT);
        #[allow(clippy::indexing_slicing)] // Safety: n <= REGISTER_COUNT and n <= payload.len()
        self.pending[..n].copy_from_slice(&payload[..n]);
        self.dirty = true;
    }

    /// Record a value read back from the hardware.
    ///
    /// Overwrites shadow *and* pending, resynchronizing both images after an
    /// external reset may have changed the chips underneath us.
    pub fn adopt_readback(&mut self, index: usize, value: u8) -> Result<(), RegError> {
        let shadow = self
            .shadow
            .get_mut(index)
            .ok_or(RegError::IndexOutOfRange)?;
        *shadow = value;
        #[allow(clippy::indexing_slicing)] // Safety: index validated by the get_mut above
        {
            self.pending[index] = value;
        }
        Ok(())
    }

    /// Pending value of `index`.
    #[must_use]
    pub fn pending(&self, index: usize) -> Option<u8> {
        self.pending.get(index).copied()
    }

    /// Shadow value of `index`.
    #[must_use]
    pub fn shadow(&self, index: usize) -> Option<u8> {
        self.shadow.get(index).copied()
    }

    /// The whole shadow image, as sent to the host by the register dump
    /// commands.
    #[must_use]
    pub const fn shadow_image(&self) -> &[u8; REGISTER_COUNT] {
        &self.shadow
    }

    /// Run every pending entry through the forced-bit policy.
    ///
    /// Called by the bus driver at the head of an apply cycle, before the
    /// diff, so illegal patterns are corrected in place and never compared —
    /// let alone written.
    pub fn apply_policy(&mut self) {
        for (index, slot) in self.pending.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)] // Safety: offset < 24
            let offset = (index % REGS_PER_AFE) as u8;
            *slot = constrain(offset, *slot);
        }
    }

    /// `true` when `index` needs a bus write.
    #[must_use]
    pub fn differs(&self, index: usize) -> bool {
        match (self.pending.get(index), self.shadow.get(index)) {
            (Some(p), Some(s)) => p != s,
            _ => false,
        }
    }

    /// Mark `index` as written: shadow takes the pending value.
    pub fn commit(&mut self, index: usize) {
        if let (Some(&p), Some(s)) = (self.pending.get(index), self.shadow.get_mut(index)) {
            *s = p;
        }
    }

    /// Clear the changes-pending flag once an apply cycle completes.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // ── Channel-level logical updates ───────────────────────────────────────

    /// Device-wide index of channel `channel`'s CHnSET register.
    fn chnset_index(channel: usize) -> Result<usize, RegError> {
        if !(1..=CHANNEL_COUNT).contains(&channel) {
            return Err(RegError::ChannelOutOfRange);
        }
        let zero_based = channel - 1;
        Ok((zero_based / CHANNELS_PER_AFE) * REGS_PER_AFE
            + REG_CH1SET as usize
            + zero_based % CHANNELS_PER_AFE)
    }

    /// Set the PGA gain for a 1-based channel.
    ///
    /// Clears the previous gain field before installing the new one; the
    /// write lands on the next apply cycle.
    pub fn set_gain(&mut self, channel: usize, gain: u8) -> Result<(), RegError> {
        let field = gain_to_field(gain).ok_or(RegError::InvalidGain)?;
        let index = Self::chnset_index(channel)?;
        #[allow(clippy::indexing_slicing)] // Safety: chnset_index is < REGISTER_COUNT
        {
            self.pending[index] &= !CH_GAIN_MASK;
            self.pending[index] |= field << CH_GAIN_SHIFT;
        }
        self.dirty = true;
        Ok(())
    }

    /// Current PGA gain of a 1-based channel, from the pending image.
    pub fn gain(&self, channel: usize) -> Result<u8, RegError> {
        let index = Self::chnset_index(channel)?;
        #[allow(clippy::indexing_slicing)] // Safety: chnset_index is < REGISTER_COUNT
        let field = (self.pending[index] & CH_GAIN_MASK) >> CH_GAIN_SHIFT;
        field_to_gain(field).ok_or(RegError::InvalidGain)
    }

    /// Enable or disable a 1-based channel as one atomic logical update.
    ///
    /// Enabling connects the normal electrode configuration (keeping the
    /// gain field), routes the channel into the bias derivation, and makes
    /// sure SRB1 is connected. Disabling powers the channel down, shorts its
    /// inputs per the datasheet's unused-channel guidance, and drops it from
    /// the bias derivation. Both directions also (re)assert the chip-level
    /// bias configuration: chip 0 drives the bias electrode, the rest keep
    /// their bias circuitry idle.
    pub fn set_channel_enabled(&mut self, channel: usize, enabled: bool) -> Result<(), RegError> {
        let chnset = Self::chnset_index(channel)?;
        let zero_based = channel - 1;
        let chip_base = (zero_based / CHANNELS_PER_AFE) * REGS_PER_AFE;
        let bias_p = chip_base + REG_BIAS_SENSP as usize;
        let bias_n = chip_base + REG_BIAS_SENSN as usize;
        let misc1 = chip_base + REG_MISC1 as usize;
        #[allow(clippy::cast_possible_truncation)] // Safety: bit index < 8
        let chan_bit = 1u8 << (zero_based % CHANNELS_PER_AFE) as u8;

        // Chip-level bias setup, reasserted on every channel update.
        for chip in 0..AFE_COUNT {
            let config3 = chip * REGS_PER_AFE + REG_CONFIG3 as usize;
            #[allow(clippy::indexing_slicing)] // Safety: config3 < REGISTER_COUNT
            {
                self.pending[config3] = if chip == 0 {
                    CF3_BIAS_DRIVER
                } else {
                    CF3_BIAS_IDLE
                };
            }
        }

        #[allow(clippy::indexing_slicing)]
        // Safety: chnset/bias_p/bias_n/misc1 all derive from a validated channel
        if enabled {
            self.pending[chnset] &= !CH_SRB2;
            self.pending[chnset] &= CH_ENABLE_KEEP_MASK;
            self.pending[bias_p] |= chan_bit;
            self.pending[bias_n] |= chan_bit;
            self.pending[misc1] = MISC1_SRB1;
        } else {
            self.pending[chnset] |= CH_POWER_DOWN;
            self.pending[chnset] |= CH_INPUT_SHORT;
            self.pending[bias_p] &= !chan_bit;
            self.pending[bias_n] &= !chan_bit;
        }
        self.dirty = true;
        Ok(())
    }

    /// Route every channel to the internal test signal.
    ///
    /// CONFIG2 selects the internally generated test source on each chip and
    /// every CHnSET is pointed at the test-signal mux input.
    pub fn enable_test_signal(&mut self) {
        for chip in 0..AFE_COUNT {
            let base = chip * REGS_PER_AFE;
            #[allow(clippy::indexing_slicing)] // Safety: base + offsets < REGISTER_COUNT
            {
                self.pending[base + REG_CONFIG2 as usize] = CF2_TEST_INTERNAL;
                for ch in 0..CHANNELS_PER_AFE {
                    self.pending[base + REG_CH1SET as usize + ch] = CH_MUX_TEST;
                }
            }
        }
        self.dirty = true;
    }
}

impl Default for RegisterImage {
    fn default() -> Self {
        Self::new()
    }
}
