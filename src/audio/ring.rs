//! Circular store of recent mono samples
//!
//! The audio callback owns a [`RingWriter`], the logic tick a [`RingReader`].
//! Both lock the shared buffer only for the copy itself.

use std::sync::{Arc, Mutex, MutexGuard};

/// Fixed-capacity circular buffer of mono samples in [-1, 1]
#[derive(Debug, Clone)]
pub struct RingBuffer {
    samples: Box<[f32]>,
    /// Next index to write, always < capacity
    write_pos: usize,
}

impl RingBuffer {
    /// Allocate a zero-filled buffer
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Append samples at the cursor, overwriting the oldest data
    pub fn write(&mut self, samples: &[f32]) {
        let capacity = self.capacity();
        for &s in samples {
            self.samples[self.write_pos] = sanitize(s);
            self.write_pos = (self.write_pos + 1) % capacity;
        }
    }

    /// The most recent `length` samples, oldest first
    ///
    /// `length` is clamped to the capacity.
    pub fn read_window(&self, length: usize) -> Vec<f32> {
        let mut out = Vec::new();
        self.read_window_into(length, &mut out);
        out
    }

    /// Same as [`read_window`](Self::read_window) but reuses `output`
    pub fn read_window_into(&self, length: usize, output: &mut Vec<f32>) {
        let capacity = self.capacity();
        let length = length.min(capacity);
        output.clear();
        output.reserve(length);

        let start = (self.write_pos + capacity - length) % capacity;
        if start + length <= capacity {
            output.extend_from_slice(&self.samples[start..start + length]);
        } else {
            output.extend_from_slice(&self.samples[start..]);
            output.extend_from_slice(&self.samples[..self.write_pos]);
        }
    }

    /// Zero the store and rewind the cursor
    pub fn reset(&mut self) {
        self.samples.fill(0.0);
        self.write_pos = 0;
    }
}

/// Non-finite samples become silence, everything else is clamped to [-1, 1]
#[inline]
fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Average interleaved frames down to mono
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    let mut mono = Vec::new();
    downmix_into(interleaved, channels, &mut mono);
    mono
}

/// Same as [`downmix`] but reuses `output`
pub fn downmix_into(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    let channels = channels.max(1);
    output.clear();
    if channels == 1 {
        output.extend_from_slice(interleaved);
        return;
    }
    output.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// Create a shared ring and its two ends
pub fn channel(capacity: usize) -> (RingWriter, RingReader) {
    let shared = Arc::new(Mutex::new(RingBuffer::new(capacity)));
    (
        RingWriter {
            shared: Arc::clone(&shared),
        },
        RingReader { shared },
    )
}

fn lock(shared: &Mutex<RingBuffer>) -> MutexGuard<'_, RingBuffer> {
    // A panicking writer leaves at worst a half-written fragment behind
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Producer end, handed to the audio I/O context
#[derive(Debug, Clone)]
pub struct RingWriter {
    shared: Arc<Mutex<RingBuffer>>,
}

impl RingWriter {
    /// Write mono samples
    pub fn write(&self, samples: &[f32]) {
        lock(&self.shared).write(samples);
    }

    /// Downmix an interleaved fragment and write it
    pub fn push_fragment(&self, interleaved: &[f32], channels: usize) {
        let mono = downmix(interleaved, channels);
        lock(&self.shared).write(&mono);
    }

    /// Like [`push_fragment`](Self::push_fragment), downmixing into `scratch`
    ///
    /// Once `scratch` has grown to the fragment size this never allocates,
    /// which is what the real-time capture callback needs.
    pub fn push_fragment_with(&self, interleaved: &[f32], channels: usize, scratch: &mut Vec<f32>) {
        downmix_into(interleaved, channels, scratch);
        lock(&self.shared).write(scratch);
    }
}

/// Consumer end, held by the logic tick
#[derive(Debug, Clone)]
pub struct RingReader {
    shared: Arc<Mutex<RingBuffer>>,
}

impl RingReader {
    pub fn capacity(&self) -> usize {
        lock(&self.shared).capacity()
    }

    /// Copy out the most recent `length` samples, oldest first
    pub fn read_window(&self, length: usize) -> Vec<f32> {
        lock(&self.shared).read_window(length)
    }

    /// Copy out the most recent `length` samples into `output`
    pub fn read_window_into(&self, length: usize, output: &mut Vec<f32>) {
        lock(&self.shared).read_window_into(length, output);
    }

    /// Zero the shared store (on session restart)
    pub fn reset(&self) {
        lock(&self.shared).reset();
    }
}
