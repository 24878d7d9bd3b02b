#![no_main]

use libfuzzer_sys::fuzz_target;
use wavepirate_core::{ByteStream, PatternScanner};

fuzz_target!(|input: (Vec<u8>, Vec<u8>)| {
    let (pattern, haystack) = input;
    if pattern.is_empty() || pattern.len() > 16 {
        return;
    }

    let expected: Vec<u64> = haystack
        .windows(pattern.len())
        .enumerate()
        .filter(|(_, w)| *w == pattern.as_slice())
        .map(|(i, _)| i as u64)
        .collect();

    let mut scanner = PatternScanner::new(&pattern);
    let mut stream = ByteStream::with_capacity(7, &haystack[..]);
    let mut found = Vec::new();
    while scanner.advance_to_next_match(&mut stream).unwrap() {
        found.push(stream.position() - pattern.len() as u64);
    }

    assert_eq!(found, expected);
});
