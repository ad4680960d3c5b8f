use std::fs;
use std::path::Path;
use tempfile::TempDir;
use uniphore_prep::config::Config;
use uniphore_prep::error::PrepError;
use uniphore_prep::manifest::{RecordingSet, SupervisionSet};
use uniphore_prep::prepare::prepare_corpus;
use uniphore_prep::schema::{resolve, SchemaLayout};

const AFI_SUBSET: &str = "AFI_en-us_demo_Dataset";
const JPT_SUBSET: &str = "JPT_en-us_demo_Dataset";
const BROKEN_SUBSET: &str = "JPT_en-us_broken_Dataset";

/// 無音のステレオWAVを書き出す
fn write_wav(path: &Path, seconds: u32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(8000 * seconds * 2) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// (id, channel, recording_id, begin, duration, text) からTSV行を組み立てる
fn tsv_line(layout: &SchemaLayout, fields: (&str, &str, &str, &str, &str, &str)) -> String {
    let (id, channel, recording_id, begin, duration, text) = fields;
    let mut row = vec!["-".to_string(); layout.required_width()];
    row[layout.transcription_id] = id.to_string();
    row[layout.channel] = channel.to_string();
    row[layout.begin_time] = begin.to_string();
    row[layout.end_time] = "00:00:00".to_string();
    row[layout.duration] = duration.to_string();
    row[layout.transcript] = text.to_string();
    row[layout.recording_id] = recording_id.to_string();
    row[layout.left.id] = "agent-1".to_string();
    row[layout.left.gender] = "female".to_string();
    row[layout.left.age] = "34".to_string();
    row[layout.left.living_country] = "US".to_string();
    row[layout.left.accent] = "general".to_string();
    row[layout.left.role] = "agent".to_string();
    row[layout.right.id] = "customer-9".to_string();
    row[layout.right.gender] = "male".to_string();
    row[layout.right.age] = "51".to_string();
    row[layout.right.living_country] = "IN".to_string();
    row[layout.right.accent] = "south-asian".to_string();
    row[layout.right.role] = "customer".to_string();
    row.join("\t")
}

fn write_subset(corpus_dir: &Path, subset: &str, audio: &[&str], rows: &[(&str, &str, &str, &str, &str, &str)]) {
    let layout = resolve(subset).unwrap();
    let audio_dir = corpus_dir.join(subset).join("Audio");
    fs::create_dir_all(&audio_dir).unwrap();
    for name in audio {
        write_wav(&audio_dir.join(format!("{}.wav", name)), 30);
    }

    let header: Vec<String> = (0..layout.required_width()).map(|i| format!("col{}", i)).collect();
    let mut content = header.join("\t");
    content.push('\n');
    for row in rows {
        content.push_str(&tsv_line(&layout, *row));
        content.push('\n');
    }
    fs::write(corpus_dir.join(subset).join("combined.tsv"), content).unwrap();
}

fn build_corpus(corpus_dir: &Path) {
    let rows = [
        ("utt-1", "1", "call_01", "00:00:01.5", "00:00:02.25", "Hello, thanks for calling!"),
        ("utt-2", "2", "call_01", "00:00:04", "00:00:03", "Hi — I'd like help."),
        ("utt-3", "1", "call_02", "00:00:10.0", "00:00:05.5", "Sure."),
    ];
    write_subset(corpus_dir, AFI_SUBSET, &["call_02", "call_01"], &rows);
    write_subset(corpus_dir, JPT_SUBSET, &["call_01", "call_02"], &rows);
    write_subset(
        corpus_dir,
        BROKEN_SUBSET,
        &["call_01"],
        &[("utt-1", "1", "call_99", "00:00:01", "00:00:01", "orphan")],
    );
}

fn config(subsets: &[&str]) -> Config {
    let mut config = Config::default();
    config.corpus.subsets = subsets.iter().map(|s| s.to_string()).collect();
    config
}

#[test]
fn test_prepare_both_layout_families() {
    let corpus = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_corpus(corpus.path());

    let report = prepare_corpus(
        corpus.path(),
        Some(output.path()),
        true,
        &config(&[AFI_SUBSET, JPT_SUBSET]),
    )
    .unwrap();
    assert!(report.is_success());

    let afi = &report.manifests[AFI_SUBSET];
    let jpt = &report.manifests[JPT_SUBSET];
    assert_eq!(afi.recordings.len(), 2);
    assert_eq!(afi.supervisions.len(), 3);

    // 列配置が違っても同じ内容なら同じスーパービジョンになる
    let afi_segments: Vec<_> = afi.supervisions.iter().cloned().collect();
    let jpt_segments: Vec<_> = jpt.supervisions.iter().cloned().collect();
    assert_eq!(afi_segments, jpt_segments);

    let first = afi.supervisions.get("utt-1").unwrap();
    assert_eq!(first.channel, 0);
    assert_eq!(first.start, 1.5);
    assert_eq!(first.duration, 2.25);
    assert_eq!(first.text, "hello thanks for calling");
    assert_eq!(first.speaker, "agent-1");
    assert_eq!(first.custom["role"], "agent");

    let second = afi.supervisions.get("utt-2").unwrap();
    assert_eq!(second.channel, 1);
    assert_eq!(second.speaker, "customer-9");
    assert_eq!(second.gender, "male");
    assert_eq!(second.custom["living_country"], "IN");
    assert_eq!(second.text, "hi  id like help");

    let recording_ids: Vec<_> = afi.recordings.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(recording_ids, vec!["call_01", "call_02"]);

    // 保存したマニフェストを読み戻す
    let recordings = RecordingSet::from_file(
        output.path().join(format!("uniphore_recordings_{}.jsonl.gz", AFI_SUBSET)),
    )
    .unwrap();
    let supervisions = SupervisionSet::from_file(
        output.path().join(format!("uniphore_supervisions_{}.jsonl.gz", JPT_SUBSET)),
    )
    .unwrap();
    assert_eq!(recordings.len(), 2);
    assert_eq!(recordings.get("call_01").unwrap().duration, 30.0);
    assert_eq!(supervisions.len(), 3);
}

#[test]
fn test_failed_subset_does_not_stop_others() {
    let corpus = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_corpus(corpus.path());

    let report = prepare_corpus(
        corpus.path(),
        Some(output.path()),
        false,
        &config(&[BROKEN_SUBSET, AFI_SUBSET, "not a subset"]),
    )
    .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.manifests.len(), 1);
    assert!(report.manifests.contains_key(AFI_SUBSET));

    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].subset_id, BROKEN_SUBSET);
    assert!(matches!(report.failures[0].error, PrepError::CrossValidation(_)));
    assert_eq!(report.failures[1].subset_id, "not a subset");
    assert!(matches!(report.failures[1].error, PrepError::SchemaResolution(_)));

    // 失敗したサブセットは何も保存しない
    let names: Vec<_> = fs::read_dir(output.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.contains(AFI_SUBSET)));
}

#[test]
fn test_rerun_is_byte_identical() {
    let corpus = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_corpus(corpus.path());
    let config = config(&[AFI_SUBSET, JPT_SUBSET]);

    let read_all = |dir: &Path| {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| (e.file_name(), fs::read(e.path()).unwrap()))
            .collect();
        files.sort();
        files
    };

    prepare_corpus(corpus.path(), Some(output.path()), false, &config).unwrap();
    let first = read_all(output.path());

    prepare_corpus(corpus.path(), Some(output.path()), false, &config).unwrap();
    let second = read_all(output.path());

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn test_output_dir_is_created() {
    let corpus = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_corpus(corpus.path());
    let nested = output.path().join("a").join("b");

    let report = prepare_corpus(corpus.path(), Some(nested.as_path()), false, &config(&[JPT_SUBSET])).unwrap();
    assert!(report.is_success());
    assert!(nested.join(format!("uniphore_supervisions_{}.jsonl.gz", JPT_SUBSET)).exists());
}

#[test]
fn test_missing_corpus_dir() {
    let output = TempDir::new().unwrap();
    let result = prepare_corpus(&output.path().join("missing"), None, false, &Config::default());
    assert!(matches!(result, Err(PrepError::InputPath(_))));
}
