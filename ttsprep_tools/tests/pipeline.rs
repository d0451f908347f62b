//! End-to-end runs of both stages.

use std::fs;
use std::path::Path;

use ttsprep_tools::{
    ManifestRecord, PipelineError, PrepConfig, PrepError, SpeakerPolicy, run_pipeline,
};

fn config() -> PrepConfig {
    PrepConfig {
        language: Some("tw".to_string()),
        speaker_policy: Some(SpeakerPolicy::Simple),
        ..Default::default()
    }
}

fn write_pair(root: &Path, dir: &str, stem: &str, text: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{stem}.wav")), stem.as_bytes()).unwrap();
    fs::write(dir.join(format!("{stem}.normalized.txt")), text).unwrap();
}

#[test]
fn nested_duplicates_become_flat_manifest() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_pair(input.path(), "a/1", "001", "hi");
    write_pair(input.path(), "a/2", "001", "bye");

    let summary = run_pipeline(input.path(), output.path(), &config())?;
    assert_eq!(summary.flatten.indexed, 2);
    assert_eq!(summary.manifest.written, 2);

    assert!(output.path().join("wavs/001.wav").is_file());
    assert!(output.path().join("wavs/001_1.wav").is_file());

    let index = fs::read_to_string(output.path().join("train.txt"))?;
    assert_eq!(index, "wavs/001.wav | hi\nwavs/001_1.wav | bye\n");

    let manifest = fs::read_to_string(output.path().join("train.jsonl"))?;
    let records: Vec<ManifestRecord> = manifest
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text, "hi");
    assert_eq!(records[1].text, "bye");
    for record in &records {
        let audio = Path::new(&record.audio);
        assert!(audio.is_absolute());
        assert!(audio.is_file());
        assert_eq!(record.language, "tw");
    }
    // the collision suffix gives the renamed copy an underscore token
    let speakers: Vec<&str> = records.iter().map(|r| r.speaker.as_str()).collect();
    assert_eq!(speakers, vec!["unknown", "001"]);
    assert_ne!(records[0].id, records[1].id);
    Ok(())
}

#[test]
fn manifest_rerun_from_index_alone() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_pair(input.path(), "spk", "1089_1000_004074_000003", "first");
    write_pair(input.path(), "spk", "1089_1000_004074_000004", "second");
    run_pipeline(input.path(), output.path(), &config())?;

    let composite = PrepConfig {
        speaker_policy: Some(SpeakerPolicy::Composite),
        ..config()
    };
    let options =
        ttsprep_tools::ManifestOptions::from_config(&composite, Some(output.path().to_path_buf()))?;
    let rerun = output.path().join("rerun.jsonl");
    let summary =
        ttsprep_tools::build_manifest(&output.path().join("train.txt"), &rerun, &options)?;
    assert_eq!(summary.written, 2);

    let speakers: Vec<String> = fs::read_to_string(&rerun)?
        .lines()
        .map(|l| serde_json::from_str::<ManifestRecord>(l).map(|r| r.speaker))
        .collect::<Result<_, _>>()?;
    assert_eq!(speakers, vec!["000003_1089", "000004_1089"]);
    Ok(())
}

#[test]
fn unset_speaker_policy_stops_before_copying() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    let output = tempfile::tempdir()?;
    write_pair(input.path(), "a", "001", "hi");

    let config = PrepConfig {
        speaker_policy: None,
        ..config()
    };
    let err = run_pipeline(input.path(), output.path(), &config).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Precondition(PrepError::SpeakerPolicyUnset)
    ));
    assert!(!output.path().join("wavs").exists());
    Ok(())
}

#[test]
fn missing_input_root_is_reported() -> anyhow::Result<()> {
    let output = tempfile::tempdir()?;
    let missing = output.path().join("does-not-exist");
    let target = output.path().join("out");

    let err = run_pipeline(&missing, &target, &config()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Precondition(PrepError::InputRootMissing(_))
    ));
    assert!(!target.exists());
    Ok(())
}
