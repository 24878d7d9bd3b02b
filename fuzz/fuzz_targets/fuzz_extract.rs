#![no_main]

use libfuzzer_sys::fuzz_target;
use wavepirate_core::{Extractor, MemorySinks};

fuzz_target!(|data: &[u8]| {
    let mut sinks = MemorySinks::new();
    let mut extractor = Extractor::new(data);
    let _ = extractor.run(&mut sinks);

    assert_eq!(sinks.records().len() as u32, extractor.extracted());
    for record in sinks.records() {
        assert_eq!(&record[..4], b"RIFF");
        assert_eq!(&record[8..12], b"WAVE");
        let declared = u32::from_le_bytes([record[4], record[5], record[6], record[7]]);
        assert_eq!(record.len() as u64, u64::from(declared) + 8);
    }
});
