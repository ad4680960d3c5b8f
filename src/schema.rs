//! サブセット名からTSVの列レイアウトを決定する
//!
//! 同じ書き起こし表が、サブセットの命名規則によって2種類の異なる
//! 列配置で配布されている。どちらの配置を使うかはサブセット名の
//! 先頭にあるファミリーコード（`AFI_...`, `JPT_...` など）で決まる。
//!
//! | 列            | レイアウトA (`AFI`) | レイアウトB (その他) |
//! |---------------|---------------------|----------------------|
//! | transcription_id | 0                | 0                    |
//! | channel       | 1                   | 1                    |
//! | begin / end   | 2 / 3               | 3 / 4                |
//! | transcript    | 4                   | 6                    |
//! | duration      | 5                   | 5                    |
//! | recording_id  | 6                   | 7                    |
//! | ch1 話者      | role 12, id..accent 15-19 | id 13, native 14, role 15, age 16, gender 17, country 18, accent 19 |
//! | ch2 話者      | role 13, id..accent 20-24 | id 20, native 21, role 22, age 23, gender 24, country 25, accent 26 |
//!
//! 列の順序はファミリーごとに異なる（レイアウトBは age の後に gender が来る）。
//! これは配布形式そのものの違いなので、そのまま保持する。

use crate::error::{PrepError, PrepResult};
use crate::types::Channel;
use regex_lite::Regex;
use std::sync::OnceLock;

/// レイアウトAを使うファミリーコード
pub const AFI_FAMILY_CODE: &str = "AFI";

/// 既知のレイアウトファミリー
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutFamily {
    /// `AFI_` で始まるサブセット
    Afi,
    /// それ以外のファミリーコードを持つサブセット
    Standard,
}

/// 1チャンネル分の話者属性の列位置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeakerColumns {
    pub id: usize,
    pub gender: usize,
    pub age: usize,
    pub living_country: usize,
    pub accent: usize,
    pub role: usize,
    /// ネイティブ話者かどうか（レイアウトBのみ）
    pub native: Option<usize>,
}

impl SpeakerColumns {
    fn indices(&self) -> impl Iterator<Item = usize> {
        [
            Some(self.id),
            Some(self.gender),
            Some(self.age),
            Some(self.living_country),
            Some(self.accent),
            Some(self.role),
            self.native,
        ]
        .into_iter()
        .flatten()
    }
}

/// TSV列レイアウト
///
/// 論理フィールド名から0始まりの列番号への対応表。
/// ファミリーごとに1つだけ存在し、値として比較できる。
///
/// # Examples
///
/// ```
/// # use uniphore_prep::schema::{resolve, LayoutFamily};
/// let layout = resolve("AFI_en-us_multi-spontaneous_healthcare-retail_v01_Dataset").unwrap();
/// assert_eq!(layout.family, LayoutFamily::Afi);
/// assert_eq!(layout.transcript, 4);
///
/// let layout = resolve("JPT_en-us_multi-spontaneous_banking_v01_Dataset_1_Dataset").unwrap();
/// assert_eq!(layout.family, LayoutFamily::Standard);
/// assert_eq!(layout.transcript, 6);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemaLayout {
    pub family: LayoutFamily,
    pub transcription_id: usize,
    pub channel: usize,
    pub begin_time: usize,
    pub end_time: usize,
    pub duration: usize,
    pub transcript: usize,
    pub recording_id: usize,
    /// チャンネル1（左）の話者属性
    pub left: SpeakerColumns,
    /// チャンネル2（右）の話者属性
    pub right: SpeakerColumns,
}

impl LayoutFamily {
    /// ファミリーに対応する列レイアウト
    pub fn layout(self) -> SchemaLayout {
        match self {
            LayoutFamily::Afi => SchemaLayout {
                family: self,
                transcription_id: 0,
                channel: 1,
                begin_time: 2,
                end_time: 3,
                transcript: 4,
                duration: 5,
                recording_id: 6,
                left: SpeakerColumns {
                    role: 12,
                    id: 15,
                    gender: 16,
                    age: 17,
                    living_country: 18,
                    accent: 19,
                    native: None,
                },
                right: SpeakerColumns {
                    role: 13,
                    id: 20,
                    gender: 21,
                    age: 22,
                    living_country: 23,
                    accent: 24,
                    native: None,
                },
            },
            LayoutFamily::Standard => SchemaLayout {
                family: self,
                transcription_id: 0,
                channel: 1,
                begin_time: 3,
                end_time: 4,
                duration: 5,
                transcript: 6,
                recording_id: 7,
                left: SpeakerColumns {
                    id: 13,
                    native: Some(14),
                    role: 15,
                    age: 16,
                    gender: 17,
                    living_country: 18,
                    accent: 19,
                },
                right: SpeakerColumns {
                    id: 20,
                    native: Some(21),
                    role: 22,
                    age: 23,
                    gender: 24,
                    living_country: 25,
                    accent: 26,
                },
            },
        }
    }
}

impl SchemaLayout {
    /// チャンネルに対応する話者属性の列位置
    pub fn speaker(&self, channel: Channel) -> &SpeakerColumns {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    /// レイアウトが参照するすべての列番号
    pub fn indices(&self) -> Vec<usize> {
        let mut indices = vec![
            self.transcription_id,
            self.channel,
            self.begin_time,
            self.end_time,
            self.duration,
            self.transcript,
            self.recording_id,
        ];
        indices.extend(self.left.indices());
        indices.extend(self.right.indices());
        indices
    }

    /// このレイアウトで行をデコードするのに必要な最小列数
    pub fn required_width(&self) -> usize {
        self.indices().into_iter().max().map_or(0, |max| max + 1)
    }
}

/// ファミリーコードを取り出すパターン（先頭の英数字 + `_`）
const FAMILY_CODE_PATTERN: &str = "^([A-Za-z0-9]+)_";

fn family_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 固定パターンのため失敗しない
    RE.get_or_init(|| Regex::new(FAMILY_CODE_PATTERN).expect("family code pattern is valid"))
}

/// サブセット名からレイアウトファミリーを判定
pub fn family_of(subset_id: &str) -> PrepResult<LayoutFamily> {
    let code = family_code_regex()
        .captures(subset_id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| PrepError::SchemaResolution(subset_id.to_string()))?;

    if code == AFI_FAMILY_CODE {
        Ok(LayoutFamily::Afi)
    } else {
        Ok(LayoutFamily::Standard)
    }
}

/// サブセット名から列レイアウトを決定
///
/// 同じ入力に対しては常に同じ値のレイアウトを返す純粋関数。
///
/// # Errors
///
/// サブセット名にファミリーコードがない場合は `SchemaResolution` を返す。
/// その場合、呼び出し側は行のデコードに進んではならない。
pub fn resolve(subset_id: &str) -> PrepResult<SchemaLayout> {
    let family = family_of(subset_id)?;
    log::debug!("サブセット {} のレイアウト: {:?}", subset_id, family);
    Ok(family.layout())
}
