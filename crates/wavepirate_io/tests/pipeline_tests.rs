use std::fs;
use tempfile::tempdir;

use wavepirate_core::{ExtractError, Extractor, extract_all};
use wavepirate_io::{DirectorySinks, SourceFile, base_name};

fn create_test_wave(payload_len: usize, seed: u32) -> Vec<u8> {
    let mut wave = Vec::with_capacity(payload_len + 12);
    wave.extend_from_slice(b"RIFF");
    wave.extend_from_slice(&(payload_len as u32 + 4).to_le_bytes());
    wave.extend_from_slice(b"WAVE");
    for i in 0..payload_len {
        let byte = ((i as u32).wrapping_mul(131).wrapping_add(seed) % 251) as u8;
        wave.push(if byte == b'R' { 0 } else { byte });
    }
    wave
}

fn create_test_disk(size: usize, waves: &[(usize, &[u8])]) -> Vec<u8> {
    let mut disk: Vec<u8> = (0..size)
        .map(|i| ((i.wrapping_mul(97).wrapping_add(13)) % 256) as u8)
        .map(|b| if b == b'R' { 0 } else { b })
        .collect();
    for &(offset, wave) in waves {
        disk[offset..offset + wave.len()].copy_from_slice(wave);
    }
    disk
}

#[test]
fn test_full_extraction_pipeline() {
    let dir = tempdir().unwrap();
    let disk_path = dir.path().join("test_disk.img");
    let output_dir = dir.path().join("recovered");

    let first = create_test_wave(40_000, 1);
    let second = create_test_wave(123_457, 2);
    let disk = create_test_disk(1024 * 1024, &[(4096, &first[..]), (512 * 1024, &second[..])]);
    fs::write(&disk_path, &disk).unwrap();

    let source = SourceFile::open(&disk_path).unwrap();
    let mut sinks = DirectorySinks::new(&output_dir, base_name(&disk_path)).unwrap();
    let summary = Extractor::new(source).run(&mut sinks).unwrap();

    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.bytes_scanned, disk.len() as u64);

    let written = sinks.written();
    assert_eq!(written[0].path, output_dir.join("test_disk.img_1.wav"));
    assert_eq!(written[1].path, output_dir.join("test_disk.img_2.wav"));
    assert_eq!(fs::read(&written[0].path).unwrap(), first);
    assert_eq!(fs::read(&written[1].path).unwrap(), second);
    assert_eq!(written[1].size, second.len() as u64);
}

#[test]
fn test_truncated_record_leaves_only_finished_files() {
    let dir = tempdir().unwrap();
    let disk_path = dir.path().join("cut.bin");
    let output_dir = dir.path().join("out");

    let complete = create_test_wave(1000, 3);
    let cut = create_test_wave(50_000, 4);
    let mut disk = create_test_disk(2000, &[(100, &complete[..])]);
    disk.extend_from_slice(&cut[..20_000]);
    fs::write(&disk_path, &disk).unwrap();

    let source = SourceFile::open(&disk_path).unwrap();
    let mut sinks = DirectorySinks::new(&output_dir, base_name(&disk_path)).unwrap();
    let mut extractor = Extractor::new(source);
    let err = extractor.run(&mut sinks).unwrap_err();

    assert!(matches!(err, ExtractError::TruncatedPayload { sequence: 2, .. }));
    assert_eq!(extractor.extracted(), 1);
    assert!(output_dir.join("cut.bin_1.wav").exists());
    assert!(!output_dir.join("cut.bin_2.wav").exists());
}

#[test]
fn test_extracted_file_rescans_to_itself() {
    let dir = tempdir().unwrap();
    let disk_path = dir.path().join("disk.img");
    let wave = create_test_wave(9000, 5);
    fs::write(&disk_path, create_test_disk(20_000, &[(777, &wave[..])])).unwrap();

    let first_out = dir.path().join("first");
    let source = SourceFile::open(&disk_path).unwrap();
    let mut sinks = DirectorySinks::new(&first_out, base_name(&disk_path)).unwrap();
    assert_eq!(extract_all(source, &mut sinks).unwrap(), 1);
    let extracted = sinks.into_written().remove(0);

    let second_out = dir.path().join("second");
    let source = SourceFile::open(&extracted.path).unwrap();
    let mut sinks = DirectorySinks::new(&second_out, base_name(&extracted.path)).unwrap();
    assert_eq!(extract_all(source, &mut sinks).unwrap(), 1);
    let again = &sinks.written()[0];

    assert_eq!(again.path, second_out.join("disk.img_1.wav_1.wav"));
    assert_eq!(again.sha256, extracted.sha256);
    assert_eq!(fs::read(&again.path).unwrap(), wave);
}

#[test]
fn test_second_run_refuses_to_clobber() {
    let dir = tempdir().unwrap();
    let disk_path = dir.path().join("disk.img");
    fs::write(&disk_path, create_test_wave(10, 6)).unwrap();
    let output_dir = dir.path().join("out");

    let mut sinks = DirectorySinks::new(&output_dir, "disk.img").unwrap();
    extract_all(SourceFile::open(&disk_path).unwrap(), &mut sinks).unwrap();

    let mut sinks = DirectorySinks::new(&output_dir, "disk.img").unwrap();
    let err = extract_all(SourceFile::open(&disk_path).unwrap(), &mut sinks).unwrap_err();
    assert!(matches!(err, ExtractError::SinkUnavailable { sequence: 1, .. }));

    let mut sinks = DirectorySinks::new(&output_dir, "disk.img")
        .unwrap()
        .overwrite(true);
    assert_eq!(
        extract_all(SourceFile::open(&disk_path).unwrap(), &mut sinks).unwrap(),
        1
    );
}
