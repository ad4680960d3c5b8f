//! サブセット単位のマニフェスト作成
//!
//! ```text
//! [サブセット名] → schema::resolve → [SchemaLayout]
//!                                          ↓
//! [combined.tsv] → tsv::read_file → decoder::decode (行ごと) → [SupervisionSet]
//!                                                                    ↓
//! [Audio/*.wav]  → AudioScanner → AudioProbe → [RecordingSet] → validate → write_pair
//! ```

use crate::audio::{self, AudioProbe, AudioScanner, WavProbe};
use crate::config::Config;
use crate::decoder;
use crate::error::{PrepError, PrepResult};
use crate::manifest::{self, RecordingSet, SupervisionSet};
use crate::schema::{self, SchemaLayout};
use crate::tsv;
use crate::types::RawRow;
use crate::validate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 1サブセット分のマニフェスト（レコーディングとスーパービジョンの組）
#[derive(Clone, Debug)]
pub struct SubsetManifests {
    pub recordings: RecordingSet,
    pub supervisions: SupervisionSet,
}

/// マニフェスト作成のオプション
#[derive(Clone, Copy, Debug)]
pub struct AssembleOptions {
    /// 書き起こしテキストを正規化する
    pub normalize_text: bool,
    /// 不正な行をスキップする（false の場合はサブセットを失敗させる）
    pub skip_invalid_rows: bool,
    /// 整合性チェックの許容誤差（秒）
    pub tolerance_seconds: f64,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            normalize_text: false,
            skip_invalid_rows: false,
            tolerance_seconds: validate::DEFAULT_TOLERANCE_SECONDS,
        }
    }
}

impl AssembleOptions {
    pub fn from_config(config: &Config, normalize_text: bool) -> Self {
        Self {
            normalize_text,
            skip_invalid_rows: config.decode.skip_invalid_rows,
            tolerance_seconds: config.validation.tolerance_seconds,
        }
    }
}

/// IDの重複はサブセットの整合性エラーとして扱う
fn as_cross_validation(err: PrepError) -> PrepError {
    match err {
        PrepError::DuplicateId { .. } => PrepError::CrossValidation(err.to_string()),
        other => other,
    }
}

/// 音声ファイル一覧と書き起こし表からマニフェストを作成
///
/// 1. 音声ファイルをパスの辞書順に並べ、レコーディングを作成
/// 2. サブセット名から列レイアウトを決定（1回のみ）
/// 3. 各行をファイル順にデコード
/// 4. 両者の整合性を検証
///
/// ストレージには書き込まない。
///
/// # Errors
///
/// - `SchemaResolution`: サブセット名に対応するレイアウトがない
/// - `ChannelValue` / `RowTooShort` / `TimeFormat`: 不正な行（`skip_invalid_rows` が false の場合）
/// - `CrossValidation`: 整合性チェックの失敗、またはIDの重複
pub fn assemble(
    subset_id: &str,
    audio_files: &[PathBuf],
    rows: &[RawRow],
    options: &AssembleOptions,
    probe: &dyn AudioProbe,
) -> PrepResult<SubsetManifests> {
    let layout = schema::resolve(subset_id)?;
    assemble_with_layout(subset_id, &layout, audio_files, rows, options, probe)
}

/// 解決済みのレイアウトでマニフェストを作成
fn assemble_with_layout(
    subset_id: &str,
    layout: &SchemaLayout,
    audio_files: &[PathBuf],
    rows: &[RawRow],
    options: &AssembleOptions,
    probe: &dyn AudioProbe,
) -> PrepResult<SubsetManifests> {
    let mut audio_files = audio_files.to_vec();
    audio_files.sort();
    let recordings = audio::recordings_from_files(&audio_files, probe)?;
    let recordings = RecordingSet::from_recordings(recordings).map_err(as_cross_validation)?;

    let mut segments = Vec::with_capacity(rows.len());
    for row in rows {
        match decoder::decode(row, layout, options.normalize_text) {
            Ok(segment) => segments.push(segment),
            Err(e) if options.skip_invalid_rows && e.is_row_scoped() => {
                log::warn!("サブセット {}: 行をスキップします: {}", subset_id, e);
            }
            Err(e) => return Err(e),
        }
    }
    let supervisions = SupervisionSet::from_segments(segments).map_err(as_cross_validation)?;

    validate::validate_recordings_and_supervisions(&recordings, &supervisions, options.tolerance_seconds)?;

    log::info!(
        "サブセット {}: レコーディング {} 件, スーパービジョン {} 件",
        subset_id,
        recordings.len(),
        supervisions.len()
    );

    Ok(SubsetManifests {
        recordings,
        supervisions,
    })
}

/// コーパスディレクトリ内の1サブセットを処理
///
/// `<corpus_dir>/<subset_id>/<audio_dir>/*.<ext>` の音声と
/// `<corpus_dir>/<subset_id>/<transcript_file>` の書き起こし表を読み込む。
/// `output_dir` が指定された場合、検証に成功したマニフェストのみ保存する。
pub fn prepare_subset(
    corpus_dir: &Path,
    subset_id: &str,
    output_dir: Option<&Path>,
    config: &Config,
    options: &AssembleOptions,
    probe: &dyn AudioProbe,
) -> PrepResult<SubsetManifests> {
    log::info!("サブセットを処理中: {}", subset_id);

    // ファイルを読む前にレイアウトを決定する
    let layout = schema::resolve(subset_id)?;

    let subset_dir = corpus_dir.join(subset_id);
    let audio_files = AudioScanner::new(&config.corpus.audio_extension)
        .scan(&subset_dir.join(&config.corpus.audio_dir))?;
    let rows = tsv::read_file(subset_dir.join(&config.corpus.transcript_file))?;

    let manifests = assemble_with_layout(subset_id, &layout, &audio_files, &rows, options, probe)?;

    if let Some(output_dir) = output_dir {
        manifest::write_pair(
            output_dir,
            &config.corpus.name,
            subset_id,
            &manifests.recordings,
            &manifests.supervisions,
        )?;
    }

    Ok(manifests)
}

/// 失敗したサブセット
#[derive(Debug)]
pub struct SubsetFailure {
    pub subset_id: String,
    pub error: PrepError,
}

/// コーパス全体の処理結果
#[derive(Debug, Default)]
pub struct CorpusReport {
    /// 成功したサブセットのマニフェスト
    pub manifests: BTreeMap<String, SubsetManifests>,
    /// 失敗したサブセット（設定の順）
    pub failures: Vec<SubsetFailure>,
}

impl CorpusReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 設定されたすべてのサブセットを処理（WAVプローブを使用）
pub fn prepare_corpus(
    corpus_dir: &Path,
    output_dir: Option<&Path>,
    normalize_text: bool,
    config: &Config,
) -> PrepResult<CorpusReport> {
    prepare_corpus_with(corpus_dir, output_dir, normalize_text, config, &WavProbe)
}

/// 設定されたすべてのサブセットを処理
///
/// エラーはサブセット単位で扱う。あるサブセットが失敗しても
/// 他のサブセットの処理は継続し、保存済みのマニフェストは取り消さない。
///
/// # Errors
///
/// コーパスディレクトリが存在しない場合（`InputPath`）、
/// または出力ディレクトリを作成できない場合のみエラーを返す。
pub fn prepare_corpus_with(
    corpus_dir: &Path,
    output_dir: Option<&Path>,
    normalize_text: bool,
    config: &Config,
    probe: &dyn AudioProbe,
) -> PrepResult<CorpusReport> {
    if !corpus_dir.is_dir() {
        return Err(PrepError::InputPath(corpus_dir.to_path_buf()));
    }

    if let Some(output_dir) = output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let options = AssembleOptions::from_config(config, normalize_text);
    let mut report = CorpusReport::default();

    for subset_id in &config.corpus.subsets {
        match prepare_subset(corpus_dir, subset_id, output_dir, config, &options, probe) {
            Ok(manifests) => {
                report.manifests.insert(subset_id.clone(), manifests);
            }
            Err(error) => {
                log::error!("サブセット {} の処理に失敗: {}", subset_id, error);
                report.failures.push(SubsetFailure {
                    subset_id: subset_id.clone(),
                    error,
                });
            }
        }
    }

    Ok(report)
}
