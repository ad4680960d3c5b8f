//! レコーディング / スーパービジョンのマニフェスト
//!
//! マニフェストは gzip 圧縮した JSON Lines（1行1レコード）として保存する。
//! gzip ヘッダの時刻とファイル名は固定しているため、同じ内容からは
//! 常に同じバイト列が生成される。

use crate::error::{PrepError, PrepResult};
use crate::types::{Recording, SupervisionSegment};
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// マニフェストの種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManifestKind {
    Recordings,
    Supervisions,
}

impl ManifestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ManifestKind::Recordings => "recordings",
            ManifestKind::Supervisions => "supervisions",
        }
    }
}

/// マニフェストのファイル名
///
/// `{corpus}_{kind}_{subset_id}.jsonl.gz`
///
/// ```
/// # use uniphore_prep::manifest::{manifest_file_name, ManifestKind};
/// assert_eq!(
///     manifest_file_name("uniphore", ManifestKind::Recordings, "AFI_x"),
///     "uniphore_recordings_AFI_x.jsonl.gz"
/// );
/// ```
pub fn manifest_file_name(corpus: &str, kind: ManifestKind, subset_id: &str) -> String {
    format!("{}_{}_{}.jsonl.gz", corpus, kind.as_str(), subset_id)
}

/// 同一ID集合を持つマニフェストの要素
trait Identified {
    const KIND: &'static str;
    fn id(&self) -> &str;
}

impl Identified for Recording {
    const KIND: &'static str = "recording";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for SupervisionSegment {
    const KIND: &'static str = "supervision";
    fn id(&self) -> &str {
        &self.id
    }
}

/// 要素の並びからIDの索引を作る（重複はエラー）
fn index_by_id<T: Identified>(items: &[T]) -> PrepResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if index.insert(item.id().to_string(), i).is_some() {
            return Err(PrepError::DuplicateId {
                kind: T::KIND,
                id: item.id().to_string(),
            });
        }
    }
    Ok(index)
}

/// レコーディングの集合
///
/// 挿入順を保持し、IDで検索できる。IDの重複は許さない。
#[derive(Clone, Debug, Default)]
pub struct RecordingSet {
    recordings: Vec<Recording>,
    index: HashMap<String, usize>,
}

impl RecordingSet {
    pub fn from_recordings(recordings: Vec<Recording>) -> PrepResult<Self> {
        let index = index_by_id(&recordings)?;
        Ok(Self { recordings, index })
    }

    pub fn get(&self, id: &str) -> Option<&Recording> {
        self.index.get(id).map(|&i| &self.recordings[i])
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recording> {
        self.recordings.iter()
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> PrepResult<()> {
        write_jsonl_gz(path.as_ref(), &self.recordings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        Self::from_recordings(read_jsonl_gz(path.as_ref())?)
    }
}

/// スーパービジョンの集合
///
/// TSVの行順を保持する。IDの重複は許さない。
#[derive(Clone, Debug, Default)]
pub struct SupervisionSet {
    segments: Vec<SupervisionSegment>,
    index: HashMap<String, usize>,
}

impl SupervisionSet {
    pub fn from_segments(segments: Vec<SupervisionSegment>) -> PrepResult<Self> {
        let index = index_by_id(&segments)?;
        Ok(Self { segments, index })
    }

    pub fn get(&self, id: &str) -> Option<&SupervisionSegment> {
        self.index.get(id).map(|&i| &self.segments[i])
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SupervisionSegment> {
        self.segments.iter()
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> PrepResult<()> {
        write_jsonl_gz(path.as_ref(), &self.segments)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        Self::from_segments(read_jsonl_gz(path.as_ref())?)
    }
}

fn write_jsonl_gz<T: Serialize>(path: &Path, items: &[T]) -> PrepResult<()> {
    let file = File::create(path)?;
    // mtime = 0、ファイル名なしの固定ヘッダ
    let mut writer = GzBuilder::new()
        .mtime(0)
        .write(BufWriter::new(file), Compression::default());

    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }

    let mut inner = writer.finish()?;
    inner.flush()?;
    Ok(())
}

fn read_jsonl_gz<T: DeserializeOwned>(path: &Path) -> PrepResult<Vec<T>> {
    let reader = BufReader::new(GzDecoder::new(File::open(path)?));
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line)?);
    }
    Ok(items)
}

fn suffixed_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// 一時ファイルを本来のパスへ移動する
///
/// 既存のファイルは `.bak` に退避し、その退避先を返す。
/// 移動に失敗した場合は退避したファイルを元に戻す。
fn install(tmp: &Path, path: &Path) -> PrepResult<Option<PathBuf>> {
    let backup = if path.is_file() {
        let backup = suffixed_path(path, ".bak");
        fs::rename(path, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(tmp, path) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, path);
        }
        return Err(e.into());
    }
    Ok(backup)
}

/// `install` で配置したファイルを取り消し、退避したファイルを戻す
fn uninstall(path: &Path, backup: Option<PathBuf>) {
    let _ = fs::remove_file(path);
    if let Some(backup) = backup {
        let _ = fs::rename(&backup, path);
    }
}

/// 1サブセット分のマニフェストを保存
///
/// 両方のファイルを一時ファイルに書き出してからリネームする。
/// どの段階で失敗しても一時ファイルは削除され、出力先は呼び出し前の状態
/// （既存のマニフェストがあればそのペア、なければ何もない状態）に戻る。
///
/// # Returns
///
/// (レコーディングのパス, スーパービジョンのパス)
pub fn write_pair(
    output_dir: &Path,
    corpus: &str,
    subset_id: &str,
    recordings: &RecordingSet,
    supervisions: &SupervisionSet,
) -> PrepResult<(PathBuf, PathBuf)> {
    let recordings_path =
        output_dir.join(manifest_file_name(corpus, ManifestKind::Recordings, subset_id));
    let supervisions_path =
        output_dir.join(manifest_file_name(corpus, ManifestKind::Supervisions, subset_id));
    let recordings_tmp = suffixed_path(&recordings_path, ".tmp");
    let supervisions_tmp = suffixed_path(&supervisions_path, ".tmp");

    let remove_temps = || {
        let _ = fs::remove_file(&recordings_tmp);
        let _ = fs::remove_file(&supervisions_tmp);
    };

    let written = recordings
        .to_file(&recordings_tmp)
        .and_then(|_| supervisions.to_file(&supervisions_tmp));
    if let Err(e) = written {
        remove_temps();
        return Err(e);
    }

    let supervisions_backup = match install(&supervisions_tmp, &supervisions_path) {
        Ok(backup) => backup,
        Err(e) => {
            remove_temps();
            return Err(e);
        }
    };
    let recordings_backup = match install(&recordings_tmp, &recordings_path) {
        Ok(backup) => backup,
        Err(e) => {
            log::warn!("マニフェストの配置に失敗したため元に戻します: {:?}", recordings_path);
            uninstall(&supervisions_path, supervisions_backup);
            remove_temps();
            return Err(e);
        }
    };

    for backup in [supervisions_backup, recordings_backup].into_iter().flatten() {
        let _ = fs::remove_file(backup);
    }

    log::info!("マニフェストを保存: {:?}", recordings_path);
    log::info!("マニフェストを保存: {:?}", supervisions_path);

    Ok((recordings_path, supervisions_path))
}
