use crate::error::{PrepError, PrepResult};
use crate::manifest::{RecordingSet, SupervisionSet};
use crate::types::{Recording, SupervisionSegment};

/// 音声長とスーパービジョン終了時刻の許容誤差（秒）
pub const DEFAULT_TOLERANCE_SECONDS: f64 = 0.025;

fn fail(message: String) -> PrepResult<()> {
    Err(PrepError::CrossValidation(message))
}

/// レコーディング単体の検証
pub fn validate_recording(recording: &Recording) -> PrepResult<()> {
    if recording.sampling_rate == 0 {
        return fail(format!("レコーディング {}: サンプリングレートが0です", recording.id));
    }
    if !(recording.duration > 0.0) {
        return fail(format!(
            "レコーディング {}: 長さが正ではありません ({})",
            recording.id, recording.duration
        ));
    }
    if recording.num_channels() == 0 {
        return fail(format!("レコーディング {}: チャンネルがありません", recording.id));
    }
    Ok(())
}

/// スーパービジョン単体の検証
pub fn validate_supervision(segment: &SupervisionSegment) -> PrepResult<()> {
    if !(segment.start >= 0.0) {
        return fail(format!(
            "スーパービジョン {}: 開始時刻が負です ({})",
            segment.id, segment.start
        ));
    }
    if !(segment.duration > 0.0) {
        return fail(format!(
            "スーパービジョン {}: 長さが正ではありません ({})",
            segment.id, segment.duration
        ));
    }
    Ok(())
}

/// レコーディングとスーパービジョンの整合性を検証
///
/// 最初に見つかった違反でエラーを返す。
///
/// # 検証内容
///
/// - 各レコーディング: サンプリングレート、長さ、チャンネル数
/// - 各スーパービジョン: 開始時刻 >= 0、長さ > 0
/// - 参照先のレコーディングが存在すること
/// - 終了時刻がレコーディングの長さ + `tolerance` を超えないこと
/// - チャンネルがレコーディングのチャンネルに含まれること
pub fn validate_recordings_and_supervisions(
    recordings: &RecordingSet,
    supervisions: &SupervisionSet,
    tolerance: f64,
) -> PrepResult<()> {
    for recording in recordings.iter() {
        validate_recording(recording)?;
    }

    for segment in supervisions.iter() {
        validate_supervision(segment)?;

        let Some(recording) = recordings.get(&segment.recording_id) else {
            return fail(format!(
                "スーパービジョン {}: レコーディング {:?} が存在しません",
                segment.id, segment.recording_id
            ));
        };

        if segment.end() > recording.duration + tolerance {
            return fail(format!(
                "スーパービジョン {}: 終了時刻 {:.3}秒 がレコーディング {} の長さ {:.3}秒 を超えています",
                segment.id,
                segment.end(),
                recording.id,
                recording.duration
            ));
        }

        if !recording.channel_ids.contains(&segment.channel) {
            return fail(format!(
                "スーパービジョン {}: チャンネル {} はレコーディング {} に存在しません (チャンネル数 {})",
                segment.id,
                segment.channel,
                recording.id,
                recording.num_channels()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioSource;
    use std::collections::BTreeMap;

    fn recording(id: &str, duration: f64, channels: usize) -> Recording {
        let channel_ids: Vec<usize> = (0..channels).collect();
        Recording {
            id: id.to_string(),
            sources: vec![AudioSource {
                kind: "file".to_string(),
                channels: channel_ids.clone(),
                source: format!("{}.wav", id),
            }],
            sampling_rate: 8000,
            num_samples: (duration * 8000.0) as u64,
            duration,
            channel_ids,
        }
    }

    fn segment(id: &str, recording_id: &str, start: f64, duration: f64, channel: usize) -> SupervisionSegment {
        SupervisionSegment {
            id: id.to_string(),
            recording_id: recording_id.to_string(),
            start,
            duration,
            channel,
            text: String::new(),
            language: "en-us".to_string(),
            speaker: "spk".to_string(),
            gender: "male".to_string(),
            custom: BTreeMap::new(),
        }
    }

    fn check(recordings: Vec<Recording>, segments: Vec<SupervisionSegment>) -> PrepResult<()> {
        let recordings = RecordingSet::from_recordings(recordings).unwrap();
        let supervisions = SupervisionSet::from_segments(segments).unwrap();
        validate_recordings_and_supervisions(&recordings, &supervisions, DEFAULT_TOLERANCE_SECONDS)
    }

    #[test]
    fn test_consistent_manifests() {
        let result = check(
            vec![recording("a", 10.0, 2), recording("b", 5.0, 2)],
            vec![segment("s1", "a", 0.0, 9.0, 0), segment("s2", "b", 1.0, 4.0, 1)],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_recording() {
        let result = check(vec![recording("a", 10.0, 2)], vec![segment("s1", "zzz", 0.0, 1.0, 0)]);
        match result {
            Err(PrepError::CrossValidation(message)) => assert!(message.contains("zzz")),
            other => panic!("Expected CrossValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_end_beyond_recording() {
        // 許容誤差内は OK
        assert!(check(vec![recording("a", 10.0, 2)], vec![segment("s1", "a", 9.0, 1.02, 0)]).is_ok());
        // 許容誤差を超えるとエラー
        assert!(matches!(
            check(vec![recording("a", 10.0, 2)], vec![segment("s1", "a", 9.0, 1.5, 0)]),
            Err(PrepError::CrossValidation(_))
        ));
    }

    #[test]
    fn test_channel_beyond_recording() {
        let result = check(vec![recording("mono", 10.0, 1)], vec![segment("s1", "mono", 0.0, 1.0, 1)]);
        assert!(matches!(result, Err(PrepError::CrossValidation(_))));
    }

    #[test]
    fn test_invalid_segment_bounds() {
        for (start, duration) in [(-0.5, 1.0), (0.0, 0.0), (0.0, -1.0), (f64::NAN, 1.0)] {
            let result = check(vec![recording("a", 10.0, 2)], vec![segment("s1", "a", start, duration, 0)]);
            assert!(
                matches!(result, Err(PrepError::CrossValidation(_))),
                "start={} duration={}",
                start,
                duration
            );
        }
    }

    #[test]
    fn test_invalid_recording() {
        let mut broken = recording("a", 10.0, 2);
        broken.sampling_rate = 0;
        assert!(check(vec![broken], vec![]).is_err());

        assert!(check(vec![recording("empty", 0.0, 2)], vec![]).is_err());
        assert!(check(vec![recording("a", 10.0, 0)], vec![]).is_err());
    }
}
