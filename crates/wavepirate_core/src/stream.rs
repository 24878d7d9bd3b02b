//! Forward-only byte source with a running cursor.

use std::io::{self, BufRead, BufReader, Read};

const DEFAULT_CAPACITY: usize = 64 * 1024;

/// A buffered, forward-only view over a reader that tracks how many bytes
/// have been consumed so far.
///
/// There is no seeking: every byte handed out through [`Read`] or consumed
/// through [`BufRead::consume`] advances [`ByteStream::position`] and is never
/// replayed.
pub struct ByteStream<R> {
    inner: BufReader<R>,
    position: u64,
}

impl<R: Read> ByteStream<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, inner),
            position: 0,
        }
    }

    /// Number of bytes consumed since the stream was opened.
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next byte, or `None` at end of input.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.fill_buf_retrying()?.first() {
            Some(&b) => b,
            None => return Ok(None),
        };
        self.consume(1);
        Ok(Some(byte))
    }

    /// Fills `buf` as far as the input allows and returns how many bytes were
    /// read. A count below `buf.len()` means the input ended.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Like [`BufRead::fill_buf`], but retries on `Interrupted`.
    pub fn fill_buf_retrying(&mut self) -> io::Result<&[u8]> {
        loop {
            match self.inner.fill_buf() {
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.inner.fill_buf()
    }
}

impl<R: Read> Read for ByteStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read> BufRead for ByteStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.position += amt as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_byte_advances_position() {
        let mut stream = ByteStream::new(&b"abc"[..]);

        assert_eq!(stream.next_byte().unwrap(), Some(b'a'));
        assert_eq!(stream.next_byte().unwrap(), Some(b'b'));
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.next_byte().unwrap(), Some(b'c'));
        assert_eq!(stream.next_byte().unwrap(), None);
        assert_eq!(stream.position(), 3);
    }

    #[test]
    fn read_up_to_spans_buffer_refills() {
        let data: Vec<u8> = (0..=255).collect();
        let mut stream = ByteStream::with_capacity(7, &data[..]);
        let mut buf = [0u8; 100];

        assert_eq!(stream.read_up_to(&mut buf).unwrap(), 100);
        assert_eq!(&buf[..], &data[..100]);
        assert_eq!(stream.position(), 100);
    }

    #[test]
    fn read_up_to_reports_short_input() {
        let mut stream = ByteStream::new(&b"RIF"[..]);
        let mut buf = [0u8; 8];

        assert_eq!(stream.read_up_to(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"RIF");
        assert_eq!(stream.read_up_to(&mut buf).unwrap(), 0);
    }

    #[test]
    fn consume_counts_towards_position() {
        let mut stream = ByteStream::new(&b"0123456789"[..]);
        let len = stream.fill_buf().unwrap().len();
        stream.consume(4);

        assert_eq!(len, 10);
        assert_eq!(stream.position(), 4);
        assert_eq!(stream.next_byte().unwrap(), Some(b'4'));
    }
}
