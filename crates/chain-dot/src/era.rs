//! Transaction mortality.
//!
//! A mortal era is valid for `period` blocks starting at the block whose
//! number is congruent to `phase` modulo `period`. It encodes into two
//! little-endian bytes:
//!
//! ```text
//! bits 0..4   log2(period) - 1, clamped to 1..=15
//! bits 4..16  phase / quantize_factor, quantize_factor = max(period >> 12, 1)
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Immortal,
    Mortal { period: u64, phase: u64 },
}

impl Era {
    /// Mortal era anchored at `block_number`. The period is rounded up to a
    /// power of two within `4..=65536`.
    pub fn mortal(block_number: u64, period: u64) -> Self {
        let period = period
            .checked_next_power_of_two()
            .unwrap_or(1 << 16)
            .clamp(4, 1 << 16);
        let phase = block_number % period;
        let quantize_factor = (period >> 12).max(1);
        Era::Mortal {
            period,
            phase: phase / quantize_factor * quantize_factor,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Era::Immortal => vec![0],
            Era::Mortal { period, phase } => {
                let quantize_factor = (period >> 12).max(1);
                let low = u64::from(period.trailing_zeros()).saturating_sub(1).clamp(1, 15);
                let encoded = low | ((phase / quantize_factor) << 4);
                (encoded as u16).to_le_bytes().to_vec()
            }
        }
    }

    /// First block at or before `current` where this era is valid.
    pub fn birth(&self, current: u64) -> u64 {
        match *self {
            Era::Immortal => 0,
            Era::Mortal { period, phase } => {
                (current.max(phase) - phase) / period * period + phase
            }
        }
    }

    /// Block after which a transaction in this era is rejected.
    pub fn death(&self, current: u64) -> u64 {
        match *self {
            Era::Immortal => u64::MAX,
            Era::Mortal { period, .. } => self.birth(current) + period,
        }
    }
}
