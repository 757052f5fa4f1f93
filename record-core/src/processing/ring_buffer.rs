//! Circular byte buffer bridging push-style device callbacks to the
//! session's pull-style `read`.
//!
//! Capture backends receive audio on a device thread but the capture
//! loop pulls one buffer at a time, so backends park bytes here in the
//! meantime. Wrap in `Arc<parking_lot::Mutex<ByteRing>>` for
//! cross-thread access. Overflow drops the oldest bytes.

#[derive(Debug)]
pub struct ByteRing {
    storage: Vec<u8>,
    head: usize,
    tail: usize,
    len: usize,
}

impl ByteRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Append bytes, dropping the oldest data on overflow. If `data` is
    /// larger than the whole buffer, only its tail is kept.
    pub fn push(&mut self, data: &[u8]) {
        let capacity = self.storage.len();
        if data.is_empty() || capacity == 0 {
            return;
        }

        let data = if data.len() > capacity {
            &data[data.len() - capacity..]
        } else {
            data
        };

        let overflow = (self.len + data.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.head = (self.head + overflow) % capacity;
            self.len -= overflow;
        }

        for &byte in data {
            self.storage[self.tail] = byte;
            self.tail = (self.tail + 1) % capacity;
        }
        self.len += data.len();
    }

    /// Move up to `out.len()` bytes into `out`, returning the count.
    /// Returns fewer bytes (possibly zero) if less data is buffered.
    pub fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);
        let capacity = self.storage.len();
        for slot in out.iter_mut().take(count) {
            *slot = self.storage[self.head];
            self.head = (self.head + 1) % capacity;
        }
        self.len -= count;
        count
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}
