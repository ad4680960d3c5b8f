use crate::error::{PrepError, PrepResult};
use crate::types::{AudioSource, Recording};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 音声ファイルのメタデータ
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioInfo {
    /// サンプリングレート (Hz)
    pub sampling_rate: u32,
    /// チャンネルあたりのサンプル数
    pub num_samples: u64,
    /// チャンネル数
    pub num_channels: u16,
}

impl AudioInfo {
    /// 長さ（秒）
    pub fn duration(&self) -> f64 {
        if self.sampling_rate == 0 {
            return 0.0;
        }
        self.num_samples as f64 / self.sampling_rate as f64
    }
}

/// 音声ファイルのメタデータ取得（プローブ）の共通トレイト
///
/// コア処理は音声のバイト列を直接解析しない。
/// サブセット内のファイルは並列にプローブされるため `Sync` が必要。
pub trait AudioProbe: Sync {
    fn probe(&self, path: &Path) -> PrepResult<AudioInfo>;
}

/// WAVヘッダからメタデータを読み取るプローブ
#[derive(Clone, Copy, Debug, Default)]
pub struct WavProbe;

impl AudioProbe for WavProbe {
    fn probe(&self, path: &Path) -> PrepResult<AudioInfo> {
        let reader = hound::WavReader::open(path).map_err(|e| PrepError::Audio {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let spec = reader.spec();

        Ok(AudioInfo {
            sampling_rate: spec.sample_rate,
            // WavReader::duration はチャンネルあたりのサンプル数
            num_samples: u64::from(reader.duration()),
            num_channels: spec.channels,
        })
    }
}

/// ディレクトリ直下の音声ファイルを探索する
///
/// 拡張子は大文字小文字を含めて完全一致で比較する（`wav` は `a.WAV` に一致しない）。
/// 結果はパスの辞書順に並べ替えて返すため、実行ごとに同じ順序になる。
pub struct AudioScanner {
    extension: String,
}

impl AudioScanner {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// 音声ファイルのパス一覧を取得
    ///
    /// # Errors
    ///
    /// ディレクトリが読めない場合にエラーを返す。
    pub fn scan(&self, dir: &Path) -> PrepResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .map(|ext| ext == self.extension.as_str())
                .unwrap_or(false);
            if matches {
                log::debug!("音声ファイル: {:?}", entry.path());
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// 音声ファイル1つからレコーディングを作成
///
/// IDはファイル名（拡張子なし）。
pub fn recording_from_file(path: &Path, probe: &dyn AudioProbe) -> PrepResult<Recording> {
    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| PrepError::Audio {
            path: path.to_path_buf(),
            reason: "ファイル名がありません".to_string(),
        })?;

    let info = probe.probe(path)?;
    let channel_ids: Vec<usize> = (0..usize::from(info.num_channels)).collect();

    Ok(Recording {
        id,
        sources: vec![AudioSource {
            kind: "file".to_string(),
            channels: channel_ids.clone(),
            source: path.to_string_lossy().into_owned(),
        }],
        sampling_rate: info.sampling_rate,
        num_samples: info.num_samples,
        duration: info.duration(),
        channel_ids,
    })
}

/// 複数の音声ファイルからレコーディングを作成
///
/// プローブは並列に行うが、結果の順序は入力の順序と同じ。
pub fn recordings_from_files(paths: &[PathBuf], probe: &dyn AudioProbe) -> PrepResult<Vec<Recording>> {
    paths
        .par_iter()
        .map(|path| recording_from_file(path, probe))
        .collect()
}
