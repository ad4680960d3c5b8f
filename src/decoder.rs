//! 書き起こし表の1行をスーパービジョンに変換する
//!
//! 行の読み方はサブセットの列レイアウトに従い、チャンネル列の値
//! （`"1"` / `"2"`）で左右どちらの話者属性を使うかが決まる。
//!
//! 時刻列の扱いは非対称になっている。
//!
//! - 開始時刻 ([`convert_time`]): `HH:MM:SS(.frac)` の全フィールドから経過秒数を求める
//! - 区間長 ([`convert_duration`]): 秒フィールドのみを使い、時・分は無視する
//!
//! 配布データの区間長は時・分が常に0のため、どちらも同じ値になる。
//! 形式が崩れた時刻はどちらも `TimeFormat` として扱う。

use crate::error::{PrepError, PrepResult};
use crate::schema::SchemaLayout;
use crate::types::{Channel, SupervisionSegment};
use std::collections::BTreeMap;

/// スーパービジョンに付与する言語タグ
pub const LANGUAGE: &str = "en-us";

/// 話者属性マップのキー
pub const ATTR_ACCENT: &str = "accent";
pub const ATTR_ROLE: &str = "role";
pub const ATTR_LIVING_COUNTRY: &str = "living_country";
pub const ATTR_AGE: &str = "age";

/// TSVの1行をスーパービジョンにデコード
///
/// チャンネル列の値で左右どちらの話者属性を読むかを切り替え、
/// 時刻列を秒に変換する。ストレージには一切触れない。
///
/// # Arguments
///
/// * `row` - ヘッダ以外のTSV行
/// * `layout` - サブセットに対応する列レイアウト
/// * `normalize_text` - true の場合、書き起こしテキストを [`normalize`] する
///
/// # Errors
///
/// - 列数が足りない場合は `RowTooShort`
/// - チャンネルが `"1"` / `"2"` 以外の場合は `ChannelValue`
/// - 時刻が `HH:MM:SS(.frac)` 形式でない場合は `TimeFormat`
///
/// # Examples
///
/// ```
/// # use uniphore_prep::decoder::decode;
/// # use uniphore_prep::schema::LayoutFamily;
/// let layout = LayoutFamily::Afi.layout();
/// let mut row = vec![String::new(); layout.required_width()];
/// row[0] = "utt-1".into();
/// row[1] = "2".into();
/// row[2] = "00:01:00.5".into();
/// row[4] = "Hello there.".into();
/// row[5] = "00:00:03.0".into();
/// row[6] = "call-1".into();
/// row[20] = "spk-b".into();
///
/// let segment = decode(&row, &layout, true).unwrap();
/// assert_eq!(segment.channel, 1);
/// assert_eq!(segment.start, 60.5);
/// assert_eq!(segment.duration, 3.0);
/// assert_eq!(segment.speaker, "spk-b");
/// assert_eq!(segment.text, "hello there");
/// ```
pub fn decode(row: &[String], layout: &SchemaLayout, normalize_text: bool) -> PrepResult<SupervisionSegment> {
    let row_id = row
        .get(layout.transcription_id)
        .map(String::as_str)
        .unwrap_or_default();

    let required = layout.required_width();
    if row.len() < required {
        return Err(PrepError::RowTooShort {
            row_id: row_id.to_string(),
            width: row.len(),
            required,
        });
    }

    let channel = Channel::parse(row_id, &row[layout.channel])?;
    let speaker = layout.speaker(channel);

    let text = if normalize_text {
        normalize(&row[layout.transcript])
    } else {
        row[layout.transcript].clone()
    };

    let mut custom = BTreeMap::new();
    custom.insert(ATTR_ACCENT.to_string(), row[speaker.accent].clone());
    custom.insert(ATTR_ROLE.to_string(), row[speaker.role].clone());
    custom.insert(ATTR_LIVING_COUNTRY.to_string(), row[speaker.living_country].clone());
    custom.insert(ATTR_AGE.to_string(), row[speaker.age].clone());

    Ok(SupervisionSegment {
        id: row_id.to_string(),
        recording_id: row[layout.recording_id].clone(),
        start: convert_time(&row[layout.begin_time])?,
        duration: convert_duration(&row[layout.duration])?,
        channel: channel.index(),
        text,
        language: LANGUAGE.to_string(),
        speaker: row[speaker.id].clone(),
        gender: row[speaker.gender].clone(),
        custom,
    })
}

/// `HH:MM:SS(.frac)` を3つのフィールドに分割
fn split_timestamp(time: &str) -> PrepResult<(u64, u64, f64)> {
    let invalid = || PrepError::TimeFormat(time.to_string());

    let fields: Vec<&str> = time.trim().split(':').collect();
    let [hours, minutes, seconds] = fields.as_slice() else {
        return Err(invalid());
    };

    let hours: u64 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    Ok((hours, minutes, seconds))
}

/// 開始時刻を経過秒数に変換
///
/// `hours * 3600 + minutes * 60 + seconds`
///
/// 時・分の換算が `u64` に収まらない場合は `TimeFormat` を返す。
///
/// ```
/// # use uniphore_prep::decoder::convert_time;
/// assert_eq!(convert_time("01:02:03.5").unwrap(), 3723.5);
/// ```
pub fn convert_time(time: &str) -> PrepResult<f64> {
    let (hours, minutes, seconds) = split_timestamp(time)?;
    let whole = hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .ok_or_else(|| PrepError::TimeFormat(time.to_string()))?;
    Ok(whole as f64 + seconds)
}

/// 区間長を秒数に変換
///
/// 秒フィールドのみを使用し、時・分フィールドは無視する。
/// 配布データでは時・分は常に0だが、[`convert_time`] とは意図的に
/// 非対称になっている。
///
/// ```
/// # use uniphore_prep::decoder::convert_duration;
/// assert_eq!(convert_duration("00:00:07.25").unwrap(), 7.25);
/// assert_eq!(convert_duration("02:10:07.25").unwrap(), 7.25);
/// ```
pub fn convert_duration(time: &str) -> PrepResult<f64> {
    let (_, _, seconds) = split_timestamp(time)?;
    Ok(seconds)
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || ('\u{2010}'..='\u{2027}').contains(&c)
        || ('\u{2030}'..='\u{205E}').contains(&c)
}

/// 書き起こしテキストの正規化
///
/// 句読点をすべて削除してから小文字化する。
///
/// # 注意
///
/// ハイフンやアポストロフィなど意味を持つ記号も削除され、元には戻せない。
/// 必要な場合にのみ有効にするオプション。
///
/// ```
/// # use uniphore_prep::decoder::normalize;
/// assert_eq!(normalize("Hello, World! — it's fine."), "hello world  its fine");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_punctuation(c))
        .collect::<String>()
        .to_lowercase()
}
