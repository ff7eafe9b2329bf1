//! Live capture ring buffer.
//!
//! The audio callback pushes mono frames; the analysis side takes a
//! snapshot of the newest samples. Both sides hold the lock only for the
//! duration of a copy.

use parking_lot::Mutex;

pub const DEFAULT_CAPTURE_CAPACITY: usize = 2048;

#[derive(Debug)]
struct Ring {
    data: Vec<f32>,
    wpos: usize,
    written: u64,
}

#[derive(Debug)]
pub struct CaptureRing {
    inner: Mutex<Ring>,
    mask: usize,
}

impl CaptureRing {
    /// `capacity` is rounded up to a power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        CaptureRing {
            inner: Mutex::new(Ring {
                data: vec![0.0; capacity],
                wpos: 0,
                written: 0,
            }),
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Writer side, called from the capture callback.
    pub fn push(&self, samples: &[f32]) {
        let mut ring = self.inner.lock();
        for &s in samples {
            let w = ring.wpos;
            ring.data[w] = s;
            ring.wpos = (w + 1) & self.mask;
        }
        ring.written += samples.len() as u64;
    }

    /// Copy the newest `out.len()` samples, oldest first. Slots never
    /// written read as silence.
    pub fn snapshot(&self, out: &mut [f64]) {
        assert!(
            out.len() <= self.capacity(),
            "snapshot of {} samples exceeds ring capacity {}",
            out.len(),
            self.capacity()
        );
        let ring = self.inner.lock();
        let mut rpos = ring.wpos.wrapping_sub(out.len()) & self.mask;
        for o in out.iter_mut() {
            *o = ring.data[rpos] as f64;
            rpos = (rpos + 1) & self.mask;
        }
    }

    /// Total samples pushed since creation.
    pub fn written(&self) -> u64 {
        self.inner.lock().written
    }
}

impl Default for CaptureRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_CAPACITY)
    }
}
