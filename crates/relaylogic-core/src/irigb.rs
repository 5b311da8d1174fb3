//! IRIG-B time-code decoder.
//!
//! The input is a stream of 16-bit pulse-width counts from a capture
//! peripheral. Each count maps to a frame symbol by threshold: a 2 ms
//! pulse is a 0, 5 ms a 1, 8 ms a position reference. Two consecutive
//! reference frames mark the start of a second; 100 aligned frames form
//! one time code, decoded as BCD into seconds / minutes / hours /
//! day-of-year / year, which then aligns the embedded clock and records
//! the drift.

use log::debug;

use crate::time::Timestamp;

/// Frames per second of IRIG-B time code.
pub const SIGNAL_LEN: usize = 100;

/// One decoded frame symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Bit0,
    Bit1,
    Ref,
    Invalid,
}

/// Pulse-width IRIG-B decoder with an embedded clock.
pub struct IrigbDecoder {
    time: Timestamp,

    bit0_max: u32,
    bit1_max: u32,
    ref_max: u32,

    frames_in: [Frame; SIGNAL_LEN],
    frames_out: [Frame; 2 * SIGNAL_LEN],
    write: usize,
    decode_write: usize,
    signal_start: Option<usize>,
    buffer_flip: bool,

    drift: i64,
    aligned: bool,
}

impl IrigbDecoder {
    /// `timer_freq` is the capture counter frequency in Hz; `tolerance` is
    /// the fractional pulse-width tolerance (0.1 = 10 %).
    pub fn new(timer_freq: u32, tolerance: f32) -> Self {
        let scale = |seconds: f32| (seconds * timer_freq as f32 * (1.0 + tolerance)) as u32;
        Self {
            time: Timestamp::default(),
            bit0_max: scale(0.002),
            bit1_max: scale(0.005),
            ref_max: scale(0.008),
            frames_in: [Frame::Invalid; SIGNAL_LEN],
            frames_out: [Frame::Invalid; 2 * SIGNAL_LEN],
            write: 0,
            decode_write: 0,
            signal_start: None,
            buffer_flip: false,
            drift: 0,
            aligned: false,
        }
    }

    /// The embedded clock.
    pub fn timestamp(&self) -> &Timestamp {
        &self.time
    }

    /// Advance the embedded clock between alignments.
    pub fn tick(&mut self, subseconds: u32) {
        self.time.update(subseconds);
    }

    /// Signed microseconds of the most recent alignment.
    pub fn get_drift(&self) -> i64 {
        self.drift
    }

    /// Whether at least one full time code has aligned the clock.
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Classify a single pulse-width count.
    fn decode_frame(&self, count: u16) -> Frame {
        let count = count as u32;
        if count < self.bit0_max {
            Frame::Bit0
        } else if count < self.bit1_max {
            Frame::Bit1
        } else if count < self.ref_max {
            Frame::Ref
        } else {
            Frame::Invalid
        }
    }

    /// Consume a buffer of raw pulse-width counts.
    pub fn decode(&mut self, buffer: &[u16]) {
        for &count in buffer {
            let frame = self.decode_frame(count);
            let previous = self.frames_in[(self.write + SIGNAL_LEN - 1) % SIGNAL_LEN];
            self.frames_in[self.write] = frame;

            // Two consecutive reference frames mark the start of a second.
            if frame == Frame::Ref && previous == Frame::Ref {
                self.signal_start = Some(self.write);
            }

            if let Some(start) = self.signal_start {
                let aligned_index = (self.write + SIGNAL_LEN - start) % SIGNAL_LEN;
                let out_index = if self.buffer_flip {
                    aligned_index + SIGNAL_LEN
                } else {
                    aligned_index
                };
                self.frames_out[out_index] = frame;

                if self.decode_write == SIGNAL_LEN - 1 {
                    let half = if self.buffer_flip {
                        SIGNAL_LEN
                    } else {
                        0
                    };
                    self.decode_half(half);
                    self.buffer_flip = !self.buffer_flip;
                    // The decode-write index restarts for every half.
                    self.decode_write = 0;
                } else {
                    self.decode_write += 1;
                }
            }

            self.write = (self.write + 1) % SIGNAL_LEN;
        }
    }

    /// Validate and decode one aligned 100-frame half starting at
    /// `offset` into the double buffer.
    fn decode_half(&mut self, offset: usize) {
        let frames = &self.frames_out[offset..offset + SIGNAL_LEN];

        // Seconds: bits 1-8 with markers at 0, 5, 9.
        if frames[0] != Frame::Ref || frames[5] != Frame::Bit0 || frames[9] != Frame::Ref {
            self.invalidate();
            return;
        }
        let second = Self::from_bcd(frames, 1, 4, 1) + Self::from_bcd(frames, 6, 8, 10);

        // Minutes: bits 10-17 with markers at 14, 18, 19.
        if frames[14] != Frame::Bit0 || frames[18] != Frame::Bit0 || frames[19] != Frame::Ref {
            self.invalidate();
            return;
        }
        let minute = Self::from_bcd(frames, 10, 13, 1) + Self::from_bcd(frames, 15, 17, 10);

        // Hours: bits 20-28 with markers at 24, 27, 28, 29.
        if frames[24] != Frame::Bit0
            || frames[27] != Frame::Bit0
            || frames[28] != Frame::Bit0
            || frames[29] != Frame::Ref
        {
            self.invalidate();
            return;
        }
        let hour = Self::from_bcd(frames, 20, 23, 1) + Self::from_bcd(frames, 25, 26, 10);

        // Day of year: bits 30-41 with markers at 34, 39 and a zero block
        // through 42-48 ending at the 49 reference.
        if frames[34] != Frame::Bit0
            || frames[39] != Frame::Ref
            || frames[42..=48].iter().any(|f| *f != Frame::Bit0)
            || frames[49] != Frame::Ref
        {
            self.invalidate();
            return;
        }
        let day = Self::from_bcd(frames, 30, 33, 1)
            + Self::from_bcd(frames, 35, 38, 10)
            + Self::from_bcd(frames, 40, 41, 100);

        // Year: bits 50-58 with markers at 54 and 59.
        if frames[54] != Frame::Bit0 || frames[59] != Frame::Ref {
            self.invalidate();
            return;
        }
        let year = Self::from_bcd(frames, 50, 53, 1) + Self::from_bcd(frames, 55, 58, 10);

        // The code carries a two-digit year in the 2000 epoch and a
        // 1-based day of year; the clock is 1970-based with 0-based days.
        let clock_year = year + 2000 - 1970;
        let clock_day = day.saturating_sub(1);

        self.drift = self.time.align(
            0,
            second as u8,
            minute as u8,
            hour as u8,
            clock_day,
            clock_year,
        );
        self.aligned = true;
        debug!("irig-b aligned to {} (drift {} us)", self.time, self.drift);
    }

    /// Reconstruct a BCD field from frame bits `start..=stop` (LSB first).
    fn from_bcd(frames: &[Frame], start: usize, stop: usize, multiplier: u16) -> u16 {
        let mut value = 0u16;
        for (shift, frame) in frames[start..=stop].iter().enumerate() {
            if *frame == Frame::Bit1 {
                value += 1 << shift;
            }
        }
        value * multiplier
    }

    /// A structural violation discards the half but keeps signal tracking.
    fn invalidate(&mut self) {
        self.decode_write = 0;
    }
}
