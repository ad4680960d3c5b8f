use crate::validate::DEFAULT_TOLERANCE_SECONDS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// コーパス構成
///
/// サブセットのディレクトリ構成とマニフェスト名に関する設定。
///
/// # デフォルト値
///
/// - `name`: "uniphore" (マニフェストファイル名の先頭)
/// - `subsets`: 開発用の3サブセット
/// - `audio_dir`: "Audio"
/// - `transcript_file`: "combined.tsv"
/// - `audio_extension`: "wav"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_name")]
    pub name: String,
    #[serde(default = "default_subsets")]
    pub subsets: Vec<String>,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
    #[serde(default = "default_transcript_file")]
    pub transcript_file: String,
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
}

/// 行デコード設定
///
/// # デフォルト値
///
/// - `skip_invalid_rows`: false (不正な行があるとサブセット全体を失敗させる)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecodeConfig {
    /// true の場合、不正な行は警告を出してスキップする（値の補正はしない）
    #[serde(default)]
    pub skip_invalid_rows: bool,
}

/// 整合性チェック設定
///
/// # デフォルト値
///
/// - `tolerance_seconds`: 0.025 秒
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: f64,
}

/// 出力設定
///
/// # デフォルト値
///
/// - `log_level`: "info"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 開発用サブセット
pub const DEV_SUBSETS: [&str; 3] = [
    "AFI_en-us_multi-spontaneous_healthcare-retail_v01_Dataset",
    "JPT_en-us_multi-spontaneous_banking_v01_Dataset_1_Dataset",
    "JPT_en-us_multi-spontaneous_insurance_v01_Dataset_1_Dataset",
];

// Default functions
fn default_corpus_name() -> String {
    "uniphore".to_string()
}

fn default_subsets() -> Vec<String> {
    DEV_SUBSETS.iter().map(|s| s.to_string()).collect()
}

fn default_audio_dir() -> String {
    "Audio".to_string()
}

fn default_transcript_file() -> String {
    "combined.tsv".to_string()
}

fn default_audio_extension() -> String {
    "wav".to_string()
}

fn default_tolerance_seconds() -> f64 {
    DEFAULT_TOLERANCE_SECONDS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            name: default_corpus_name(),
            subsets: default_subsets(),
            audio_dir: default_audio_dir(),
            transcript_file: default_transcript_file(),
            audio_extension: default_audio_extension(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance_seconds: default_tolerance_seconds(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use uniphore_prep::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// 既存のファイルは上書きされる。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    /// ファイルが存在しない場合はエラーにならず、デフォルト設定を返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::debug!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}
