//! Codec bitstream inspector seam.

/// Decides key-frame-ness from a raw codec payload.
///
/// `offset`/`len` select a sub-region of `buf`; implementations must not
/// assume the region starts at index 0 and must bounds-check it themselves.
pub trait KeyFrameInspector: Send + Sync {
    fn is_key_frame(&self, buf: &[u8], offset: usize, len: usize) -> bool;
}

impl<T: KeyFrameInspector + ?Sized> KeyFrameInspector for &T {
    fn is_key_frame(&self, buf: &[u8], offset: usize, len: usize) -> bool {
        (**self).is_key_frame(buf, offset, len)
    }
}

/// `buf[offset..offset + len]`, or `None` if it does not fit.
#[inline]
pub(crate) fn region(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    buf.get(offset..offset.checked_add(len)?)
}
