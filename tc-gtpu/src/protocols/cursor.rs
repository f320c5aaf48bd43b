/// Sequential walker over the linear bytes of a packet.
///
/// The cursor borrows the packet, so it cannot outlive any operation that
/// resizes the underlying buffer.  Every read is checked against the end of
/// the borrowed bytes, and the position only moves when the read succeeds.
#[derive(Debug, Clone)]
pub struct HdrCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HdrCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        HdrCursor { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the validated end.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// View the next `N` bytes without advancing.
    pub fn peek<const N: usize>(&self) -> Option<&'a [u8; N]> {
        self.data.get(self.pos..self.pos + N)?.try_into().ok()
    }

    /// Consume the next `N` bytes.
    pub fn take<const N: usize>(&mut self) -> Option<&'a [u8; N]> {
        let bytes = self.peek::<N>()?;
        self.pos += N;
        Some(bytes)
    }

    /// Advance by `n` bytes, which must all be present.
    pub fn skip(&mut self, n: usize) -> Option<()> {
        if n > self.remaining() {
            return None;
        }
        self.pos += n;
        Some(())
    }
}

/// Mutable view of the `N` bytes at `offset`, for rewriting a header that
/// an earlier parse has already validated.
pub fn header_mut<const N: usize>(data: &mut [u8], offset: usize) -> Option<&mut [u8; N]> {
    data.get_mut(offset..offset.checked_add(N)?)?.try_into().ok()
}
