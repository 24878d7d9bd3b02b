//! Output port for extracted records.
//!
//! The extraction loop knows nothing about paths or directories. It asks a
//! [`SinkFactory`] for one writable sink per record and hands the sink back
//! once the record is complete, so the same loop can write to files, to
//! memory, or nowhere at all.

use std::io::{self, Write};

/// Creates and finalizes one output sink per extracted record.
///
/// Sequence numbers start at 1 and increase by one for every record that is
/// finalized. A sequence number is reused only if the previous sink with that
/// number was abandoned, which ends the run.
///
/// # Example
///
/// ```ignore
/// struct CountingSinks(usize);
///
/// impl SinkFactory for CountingSinks {
///     type Sink = std::io::Sink;
///
///     fn create(&mut self, _sequence: u32) -> std::io::Result<Self::Sink> {
///         Ok(std::io::sink())
///     }
///
///     fn finish(&mut self, _sequence: u32, _sink: Self::Sink) -> std::io::Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait SinkFactory {
    /// Writable destination for a single record.
    type Sink: Write;

    /// Opens a fresh sink for record number `sequence`.
    fn create(&mut self, sequence: u32) -> io::Result<Self::Sink>;

    /// Finalizes a sink whose record has been written completely.
    ///
    /// Implementations should flush and persist here; an error is treated
    /// as a failed write of the record.
    fn finish(&mut self, sequence: u32, sink: Self::Sink) -> io::Result<()>;

    /// Discards a sink whose record could not be completed.
    ///
    /// The default implementation just drops it.
    fn abandon(&mut self, sequence: u32, sink: Self::Sink) {
        let _ = sequence;
        drop(sink);
    }
}
