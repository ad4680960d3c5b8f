use crate::error::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// TSVの1行（ヘッダ以外）
///
/// タブ区切りでパースされた列の並び。
pub type RawRow = Vec<String>;

/// ステレオ会話音声のチャンネル
///
/// TSV上では `"1"`（左）または `"2"`（右）で表現される。
///
/// # Examples
///
/// ```
/// # use uniphore_prep::types::Channel;
/// let channel = Channel::parse("utt-1", "2").unwrap();
/// assert_eq!(channel, Channel::Right);
/// assert_eq!(channel.index(), 1);
///
/// assert!(Channel::parse("utt-1", "0").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// チャンネル1（左）
    Left,
    /// チャンネル2（右）
    Right,
}

impl Channel {
    /// TSVのチャンネル列をパース
    ///
    /// 前後の空白も含めて厳密に `"1"` / `"2"` のみを受け付ける。
    /// それ以外の値を補正することはない。
    pub fn parse(row_id: &str, value: &str) -> PrepResult<Self> {
        match value {
            "1" => Ok(Channel::Left),
            "2" => Ok(Channel::Right),
            other => Err(PrepError::ChannelValue {
                row_id: row_id.to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// 0始まりのチャンネルインデックス（チャンネル値 - 1）
    pub fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

/// スーパービジョン（時間区間付きの書き起こしセグメント）
///
/// TSVの1行から1つ生成され、生成後は変更されない。
///
/// # JSON出力例
///
/// ```json
/// {
///   "id": "utt-0001",
///   "recording_id": "call_0001",
///   "start": 3723.5,
///   "duration": 7.25,
///   "channel": 0,
///   "text": "hello world",
///   "language": "en-us",
///   "speaker": "spk-17",
///   "gender": "female",
///   "custom": {"accent": "us", "age": "30", "living_country": "us", "role": "agent"}
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupervisionSegment {
    pub id: String,
    pub recording_id: String,

    /// 開始時刻（秒）
    pub start: f64,

    /// 区間長（秒）
    pub duration: f64,

    /// 0始まりのチャンネルインデックス
    pub channel: usize,

    pub text: String,
    pub language: String,
    pub speaker: String,
    pub gender: String,

    /// 話者の付随属性（accent, age, living_country, role, ...）
    ///
    /// キー順で出力されるため、シリアライズ結果は常に同じになる。
    pub custom: BTreeMap<String, String>,
}

impl SupervisionSegment {
    /// 終了時刻（秒）
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// 音声ファイルの参照情報
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioSource {
    /// ソース種別（常に "file"）
    #[serde(rename = "type")]
    pub kind: String,

    /// このソースが提供するチャンネル
    pub channels: Vec<usize>,

    /// ファイルパス
    pub source: String,
}

/// レコーディング（物理的な音声ファイル1つ）
///
/// 内容はすべて音声プローブから得られ、TSVには依存しない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// ファイル名（拡張子なし）から導出したID
    pub id: String,
    pub sources: Vec<AudioSource>,

    /// サンプリングレート (Hz)
    pub sampling_rate: u32,

    /// チャンネルあたりのサンプル数
    pub num_samples: u64,

    /// 長さ（秒）
    pub duration: f64,

    pub channel_ids: Vec<usize>,
}

impl Recording {
    /// チャンネル数
    pub fn num_channels(&self) -> usize {
        self.channel_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse() {
        assert_eq!(Channel::parse("a", "1").unwrap().index(), 0);
        assert_eq!(Channel::parse("a", "2").unwrap().index(), 1);

        for bad in ["0", "3", "", " 1", "01", "left"] {
            match Channel::parse("a", bad) {
                Err(PrepError::ChannelValue { value, .. }) => assert_eq!(value, bad),
                other => panic!("Expected ChannelValue error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_supervision_json_serialization() {
        let mut custom = BTreeMap::new();
        custom.insert("role".to_string(), "agent".to_string());
        custom.insert("accent".to_string(), "us".to_string());

        let segment = SupervisionSegment {
            id: "utt-1".to_string(),
            recording_id: "call-1".to_string(),
            start: 1.5,
            duration: 2.0,
            channel: 1,
            text: "hello".to_string(),
            language: "en-us".to_string(),
            speaker: "spk-1".to_string(),
            gender: "male".to_string(),
            custom,
        };

        let json = serde_json::to_string(&segment).unwrap();
        // custom はキー順に並ぶ
        assert!(json.contains(r#""custom":{"accent":"us","role":"agent"}"#));
        assert_eq!(segment.end(), 3.5);

        let parsed: SupervisionSegment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, segment);
    }

    #[test]
    fn test_recording_source_type_field() {
        let recording = Recording {
            id: "call-1".to_string(),
            sources: vec![AudioSource {
                kind: "file".to_string(),
                channels: vec![0, 1],
                source: "/data/call-1.wav".to_string(),
            }],
            sampling_rate: 8000,
            num_samples: 16000,
            duration: 2.0,
            channel_ids: vec![0, 1],
        };

        let value = serde_json::to_value(&recording).unwrap();
        assert_eq!(value["sources"][0]["type"], "file");
        assert_eq!(recording.num_channels(), 2);
    }
}
