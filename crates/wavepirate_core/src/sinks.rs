use crate::traits::SinkFactory;
use std::io;

/// Keeps every finalized record in memory, in sequence order.
#[derive(Debug, Default)]
pub struct MemorySinks {
    records: Vec<Vec<u8>>,
}

impl MemorySinks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Vec<u8>> {
        self.records
    }
}

impl SinkFactory for MemorySinks {
    type Sink = Vec<u8>;

    fn create(&mut self, _sequence: u32) -> io::Result<Self::Sink> {
        Ok(Vec::new())
    }

    fn finish(&mut self, sequence: u32, sink: Self::Sink) -> io::Result<()> {
        debug_assert_eq!(sequence as usize, self.records.len() + 1);
        self.records.push(sink);
        Ok(())
    }
}

/// Throws record bytes away. Used for dry runs.
#[derive(Debug, Default)]
pub struct DiscardSinks;

impl DiscardSinks {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SinkFactory for DiscardSinks {
    type Sink = io::Sink;

    fn create(&mut self, _sequence: u32) -> io::Result<Self::Sink> {
        Ok(io::sink())
    }

    fn finish(&mut self, _sequence: u32, _sink: Self::Sink) -> io::Result<()> {
        Ok(())
    }
}
