//! Sequential RIFF/WAVE carving loop.
//!
//! Per candidate the loop moves through
//! `seeking -> reading header -> copying payload -> seeking`. A short or
//! mismatched header sends it straight back to seeking; running out of input
//! while seeking ends the run, running out while copying fails it.

use crate::error::{ExtractError, Result};
use crate::riff::{HEADER_TAIL_LEN, RIFF_TAG, RiffHeader};
use crate::scanner::PatternScanner;
use crate::stream::ByteStream;
use crate::traits::SinkFactory;
use std::fmt;
use std::io::{BufRead, Read, Write};
use tracing::{debug, info};

/// Why a `RIFF` tag did not lead to an extracted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The input ended before the size field and form type were complete.
    ShortHeader,
    /// The form type is not `WAVE`.
    TagMismatch,
    /// The declared size is too small to contain the form type itself.
    UndersizedRecord,
}

impl SkipReason {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ShortHeader => "short header",
            Self::TagMismatch => "not a WAVE form",
            Self::UndersizedRecord => "declared size below 4",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A record that was copied out and finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub sequence: u32,
    /// Source offset of the leading `RIFF` tag.
    pub offset: u64,
    pub declared_size: u32,
}

impl ExtractedRecord {
    /// Bytes written to the output: declared size plus tag and size field.
    #[inline]
    #[must_use]
    pub fn record_size(&self) -> u64 {
        u64::from(self.declared_size) + 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionEvent {
    CandidateSkipped { offset: u64, reason: SkipReason },
    RecordExtracted(ExtractedRecord),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub extracted: u32,
    pub skipped: u32,
    pub bytes_scanned: u64,
}

enum Candidate {
    Wave { header: RiffHeader, payload_len: u64 },
    Skip(SkipReason),
}

/// Carves every RIFF/WAVE record out of one source.
///
/// The extractor owns the source for its whole lifetime. Counters survive a
/// failed run, so [`Extractor::extracted`] still tells how many files were
/// finalized before the error.
pub struct Extractor<R> {
    stream: ByteStream<R>,
    scanner: PatternScanner,
    extracted: u32,
    skipped: u32,
}

impl<R: Read> Extractor<R> {
    /// Creates an extractor positioned at the start of `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - Any reader; it is wrapped in a [`ByteStream`] and only
    ///   ever read forward
    ///
    /// # Returns
    ///
    /// An extractor with zeroed counters. Nothing is read until
    /// [`Extractor::run`] or [`Extractor::run_with`] is called, so
    /// construction cannot fail.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use wavepirate_core::{Extractor, MemorySinks};
    ///
    /// let mut sinks = MemorySinks::new();
    /// let summary = Extractor::new(&disk_image[..]).run(&mut sinks)?;
    /// println!("{} WAVE file(s) recovered", summary.extracted);
    /// ```
    pub fn new(source: R) -> Self {
        Self::with_stream(ByteStream::new(source))
    }

    pub fn with_stream(stream: ByteStream<R>) -> Self {
        Self {
            stream,
            scanner: PatternScanner::riff(),
            extracted: 0,
            skipped: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn extracted(&self) -> u32 {
        self.extracted
    }

    #[inline]
    #[must_use]
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Bytes consumed from the source so far.
    #[inline]
    #[must_use]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            extracted: self.extracted,
            skipped: self.skipped,
            bytes_scanned: self.stream.position(),
        }
    }

    pub fn run<S: SinkFactory>(&mut self, sinks: &mut S) -> Result<RunSummary> {
        self.run_with(sinks, |_| {})
    }

    /// Scans to the end of the source, reporting each skipped candidate and
    /// each finalized record to `on_event`.
    pub fn run_with<S, F>(&mut self, sinks: &mut S, mut on_event: F) -> Result<RunSummary>
    where
        S: SinkFactory,
        F: FnMut(&ExtractionEvent),
    {
        while self.scanner.advance_to_next_match(&mut self.stream)? {
            let offset = self.stream.position() - RIFF_TAG.len() as u64;

            let (header, payload_len) = match self.read_candidate()? {
                Candidate::Wave {
                    header,
                    payload_len,
                } => (header, payload_len),
                Candidate::Skip(reason) => {
                    self.skipped += 1;
                    debug!("Skipping RIFF tag at offset {}: {}", offset, reason);
                    on_event(&ExtractionEvent::CandidateSkipped { offset, reason });
                    continue;
                }
            };

            let record = ExtractedRecord {
                sequence: self.extracted + 1,
                offset,
                declared_size: header.declared_size(),
            };
            debug!(
                "Copying RIFF WAVE record {} from offset {}",
                record.sequence, offset
            );

            self.extract(sinks, &record, &header, payload_len)?;
            self.extracted = record.sequence;
            info!(
                "RIFF WAVE record {} extracted from offset {} ({} bytes)",
                record.sequence,
                offset,
                record.record_size()
            );
            on_event(&ExtractionEvent::RecordExtracted(record));
        }

        Ok(self.summary())
    }

    fn read_candidate(&mut self) -> Result<Candidate> {
        let mut tail = [0u8; HEADER_TAIL_LEN];
        let read = self.stream.read_up_to(&mut tail)?;
        // These bytes never went through the automaton.
        self.scanner.reset();

        if read < tail.len() {
            return Ok(Candidate::Skip(SkipReason::ShortHeader));
        }

        let header = RiffHeader::from_tail(tail);
        if !header.is_wave() {
            return Ok(Candidate::Skip(SkipReason::TagMismatch));
        }

        Ok(match header.payload_len() {
            Some(payload_len) => Candidate::Wave {
                header,
                payload_len,
            },
            None => Candidate::Skip(SkipReason::UndersizedRecord),
        })
    }

    fn extract<S: SinkFactory>(
        &mut self,
        sinks: &mut S,
        record: &ExtractedRecord,
        header: &RiffHeader,
        payload_len: u64,
    ) -> Result<()> {
        let sequence = record.sequence;
        let mut sink = sinks
            .create(sequence)
            .map_err(|source| ExtractError::SinkUnavailable { sequence, source })?;

        match self.copy_record(&mut sink, record, header, payload_len) {
            Ok(()) => sinks
                .finish(sequence, sink)
                .map_err(|source| ExtractError::SinkWrite { sequence, source }),
            Err(e) => {
                sinks.abandon(sequence, sink);
                Err(e)
            }
        }
    }

    fn copy_record<W: Write>(
        &mut self,
        sink: &mut W,
        record: &ExtractedRecord,
        header: &RiffHeader,
        payload_len: u64,
    ) -> Result<()> {
        let sequence = record.sequence;
        let write_err = move |source| ExtractError::SinkWrite { sequence, source };

        sink.write_all(&header.to_bytes()).map_err(write_err)?;

        let mut remaining = payload_len;
        while remaining > 0 {
            let chunk = self.stream.fill_buf_retrying()?;
            if chunk.is_empty() {
                return Err(ExtractError::TruncatedPayload {
                    sequence,
                    offset: record.offset,
                    expected: payload_len,
                    copied: payload_len - remaining,
                });
            }

            let n = usize::try_from(remaining).map_or(chunk.len(), |r| r.min(chunk.len()));
            sink.write_all(&chunk[..n]).map_err(write_err)?;
            self.stream.consume(n);
            remaining -= n as u64;
        }

        Ok(())
    }
}

/// Runs a fresh [`Extractor`] over `source` and returns the number of files
/// written.
pub fn extract_all<R: Read, S: SinkFactory>(source: R, sinks: &mut S) -> Result<u32> {
    Extractor::new(source).run(sinks).map(|summary| summary.extracted)
}
