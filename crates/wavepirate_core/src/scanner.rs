use crate::riff::RIFF_TAG;
use crate::stream::ByteStream;
use memchr::memchr;
use std::io::{self, BufRead, Read};

/// Streaming single-pattern matcher.
///
/// Bytes are fed one at a time through a Knuth-Morris-Pratt automaton, so a
/// broken partial match falls back to the longest prefix that is still
/// alive instead of restarting from scratch. For patterns without repeated
/// prefixes (such as `RIFF`) the fallback is always "reset, then check the
/// same byte against the first pattern byte".
///
/// After a full match the automaton keeps its overlap progress, so an
/// occurrence that overlaps the previous one is still reported by the next
/// call. Call [`PatternScanner::reset`] whenever bytes were consumed from the
/// stream without going through the scanner.
#[derive(Debug, Clone)]
pub struct PatternScanner {
    pattern: Box<[u8]>,
    failure: Box<[usize]>,
    progress: usize,
}

impl PatternScanner {
    /// # Panics
    ///
    /// Panics if `pattern` is empty.
    #[must_use]
    pub fn new(pattern: &[u8]) -> Self {
        assert!(!pattern.is_empty(), "scan pattern must not be empty");
        Self {
            pattern: pattern.into(),
            failure: failure_links(pattern),
            progress: 0,
        }
    }

    #[must_use]
    pub fn riff() -> Self {
        Self::new(&RIFF_TAG)
    }

    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Length of the pattern prefix matched so far.
    #[inline]
    #[must_use]
    pub fn progress(&self) -> usize {
        self.progress
    }

    #[inline]
    pub fn reset(&mut self) {
        self.progress = 0;
    }

    /// Advances the automaton by one byte; returns `true` when that byte
    /// completes the pattern.
    pub fn feed(&mut self, byte: u8) -> bool {
        while self.progress > 0 && byte != self.pattern[self.progress] {
            self.progress = self.failure[self.progress - 1];
        }
        if byte == self.pattern[self.progress] {
            self.progress += 1;
        }
        if self.progress == self.pattern.len() {
            self.progress = self.failure[self.progress - 1];
            return true;
        }
        false
    }

    /// Consumes bytes until the pattern has been fully matched.
    ///
    /// Returns `Ok(true)` with the stream positioned just past the match, or
    /// `Ok(false)` once the input is exhausted.
    pub fn advance_to_next_match<R: Read>(
        &mut self,
        stream: &mut ByteStream<R>,
    ) -> io::Result<bool> {
        let first = self.pattern[0];

        loop {
            let buf = stream.fill_buf_retrying()?;
            if buf.is_empty() {
                return Ok(false);
            }

            let mut used = 0;
            let mut matched = false;
            while used < buf.len() {
                // Idle bytes other than the first pattern byte leave the
                // automaton at zero, so they can be skipped wholesale.
                if self.progress == 0 {
                    match memchr(first, &buf[used..]) {
                        Some(skip) => used += skip,
                        None => {
                            used = buf.len();
                            break;
                        }
                    }
                }

                let byte = buf[used];
                used += 1;
                if self.feed(byte) {
                    matched = true;
                    break;
                }
            }

            stream.consume(used);
            if matched {
                return Ok(true);
            }
        }
    }
}

/// `links[i]` is the length of the longest proper prefix of
/// `pattern[..=i]` that is also a suffix of it.
fn failure_links(pattern: &[u8]) -> Box<[usize]> {
    let mut links = vec![0usize; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = links[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        links[i] = k;
    }
    links.into_boxed_slice()
}
