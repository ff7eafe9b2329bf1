//! Frame slicer over a mono buffer: fixed-size frames at a fixed hop.

#[derive(Debug, Clone)]
pub struct FrameSlicer<'a, T> {
    source: &'a [T],
    rpos: usize,
}

impl<'a, T: Copy + Default> FrameSlicer<'a, T> {
    pub fn new(source: &'a [T]) -> Self {
        FrameSlicer { source, rpos: 0 }
    }

    /// Borrow up to `size` samples from the cursor, then advance by `hop`.
    /// Near the end the returned slice is shorter than `size`.
    pub fn window(&mut self, size: usize, hop: usize) -> &'a [T] {
        let start = self.rpos.min(self.source.len());
        let end = (start + size).min(self.source.len());
        self.rpos += hop;
        &self.source[start..end]
    }

    /// Copy `buffer.len()` samples into `buffer`, zero-filling past the end
    /// of the source, then advance by `hop`. Returns the number of real
    /// samples copied.
    pub fn read(&mut self, hop: usize, buffer: &mut [T]) -> usize {
        let available = self.window(buffer.len(), hop);
        let (head, tail) = buffer.split_at_mut(available.len());
        head.copy_from_slice(available);
        tail.fill(T::default());
        available.len()
    }

    pub fn is_end(&self) -> bool {
        self.rpos >= self.source.len()
    }

    pub fn position(&self) -> usize {
        self.rpos
    }

    /// Number of hops needed to cover the whole source.
    pub fn frame_count(len: usize, hop: usize) -> usize {
        assert!(hop > 0, "hop must be non-zero");
        len.div_ceil(hop)
    }
}
