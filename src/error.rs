use std::path::PathBuf;
use thiserror::Error;

/// コーパス準備処理のエラー
///
/// エラーはサブセット単位で扱われる。`InputPath` 以外のエラーは
/// 発生したサブセットのみを失敗させ、他のサブセットの処理は継続する。
#[derive(Debug, Error)]
pub enum PrepError {
    /// コーパスルートが存在しない、またはディレクトリではない
    #[error("コーパスディレクトリが見つかりません: {0:?}")]
    InputPath(PathBuf),

    /// サブセット名がどのレイアウトファミリーにも一致しない
    #[error("サブセット {0:?} に対応するTSVレイアウトがありません")]
    SchemaResolution(String),

    /// チャンネル列の値が "1" / "2" 以外
    #[error("行 {row_id:?}: チャンネルは 1 または 2 である必要があります (値: {value:?})")]
    ChannelValue { row_id: String, value: String },

    /// 行の列数がレイアウトの要求より少ない
    #[error("行 {row_id:?}: 列数 {width} はレイアウトの要求 {required} に足りません")]
    RowTooShort {
        row_id: String,
        width: usize,
        required: usize,
    },

    /// `HH:MM:SS(.frac)` 形式ではない時刻文字列
    #[error("時刻の形式が不正です: {0:?}")]
    TimeFormat(String),

    /// レコーディングとスーパービジョンの整合性エラー
    #[error("整合性チェックに失敗: {0}")]
    CrossValidation(String),

    /// マニフェスト内でIDが重複している
    #[error("{kind} のIDが重複しています: {id:?}")]
    DuplicateId { kind: &'static str, id: String },

    /// 音声ファイルのメタデータ取得に失敗
    #[error("音声ファイルの読み込みに失敗 {path:?}: {reason}")]
    Audio { path: PathBuf, reason: String },

    /// TSVファイルのパースに失敗
    #[error("TSVのパースに失敗: {0}")]
    Tsv(#[from] csv::Error),

    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),
}

/// コーパス準備処理の Result 型
pub type PrepResult<T> = Result<T, PrepError>;

impl PrepError {
    /// サブセット全体ではなく、1行だけの問題かどうか
    ///
    /// `skip_invalid_rows` が有効な場合、これらのエラーを持つ行は
    /// 警告を出してスキップされる。
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            PrepError::ChannelValue { .. } | PrepError::RowTooShort { .. } | PrepError::TimeFormat(_)
        )
    }
}
