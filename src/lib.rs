//! uniphore-prep - Uniphore 会話音声コーパスのマニフェスト作成
//!
//! サブセットごとのディレクトリに置かれた音声ファイルと、タブ区切りの
//! 書き起こし表から、レコーディングとスーパービジョン（時間区間付きの
//! 書き起こし）の2つのマニフェストを作成する。
//!
//! # 主な機能
//!
//! - **レイアウト判定**: サブセット名のファミリーコードから書き起こし表の列配置を決定
//! - **行デコード**: チャンネルに応じた話者属性の選択、時刻の秒への変換、テキストの正規化
//! - **整合性チェック**: スーパービジョンが参照するレコーディング・チャンネル・長さを検証
//! - **マニフェスト出力**: `{corpus}_{kind}_{subset}.jsonl.gz` 形式で保存（同じ入力なら同じバイト列）
//!
//! # アーキテクチャ
//!
//! ```text
//! [サブセット名] → [schema] ─────────┐
//!                                    ↓
//! [combined.tsv] → [tsv] → [decoder (行ごと)] → [SupervisionSet] ─┐
//!                                                                  ↓
//! [Audio/*.wav]  → [audio (探索 + プローブ)] → [RecordingSet] → [validate] → [manifest]
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use std::path::Path;
//! use uniphore_prep::config::Config;
//! use uniphore_prep::prepare::prepare_corpus;
//!
//! let config = Config::load_or_default("config.toml").unwrap();
//! let report = prepare_corpus(
//!     Path::new("/data/uniphore"),
//!     Some(Path::new("manifests")),
//!     false,
//!     &config,
//! )
//! .unwrap();
//!
//! for (subset, manifests) in &report.manifests {
//!     println!("{}: {} supervisions", subset, manifests.supervisions.len());
//! }
//! ```

pub mod audio;
pub mod config;
pub mod decoder;
pub mod error;
pub mod manifest;
pub mod prepare;
pub mod schema;
pub mod tsv;
pub mod types;
pub mod validate;
