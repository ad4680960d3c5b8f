use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use uniphore_prep::config::Config;
use uniphore_prep::prepare::prepare_corpus;

/// Uniphore コーパスのマニフェストを作成する
#[derive(Parser, Debug)]
#[command(name = "uniphore-prep")]
#[command(about = "Prepare recording and supervision manifests for the Uniphore corpus")]
#[command(version)]
struct Args {
    /// コーパスのルートディレクトリ
    #[arg(required_unless_present = "generate_config")]
    corpus_dir: Option<PathBuf>,

    /// マニフェストの出力先（存在しなければ作成）
    #[arg(required_unless_present = "generate_config")]
    output_dir: Option<PathBuf>,

    /// 句読点を削除して小文字化する（ハイフンやアポストロフィも削除される）
    #[arg(long)]
    normalize_text: bool,

    /// 設定ファイル
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// デフォルト設定ファイルを生成して終了
    #[arg(long, value_name = "FILE")]
    generate_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 設定ファイル生成モード
    if let Some(path) = &args.generate_config {
        Config::write_default(path)?;
        println!("設定ファイルを生成しました: {:?}", path);
        return Ok(());
    }

    // 設定を読み込み
    let config = Config::load_or_default(&args.config)?;

    // ロガーを初期化
    env_logger::Builder::from_env(Env::default().default_filter_or(config.output.log_level.as_str()))
        .format_timestamp(None)
        .init();

    let (Some(corpus_dir), Some(output_dir)) = (&args.corpus_dir, &args.output_dir) else {
        anyhow::bail!("コーパスディレクトリと出力ディレクトリを指定してください");
    };

    log::info!("uniphore-prep を開始します");
    log::debug!("設定: {:?}", config);

    let report = prepare_corpus(corpus_dir, Some(output_dir.as_path()), args.normalize_text, &config)
        .with_context(|| format!("コーパスの処理に失敗: {:?}", corpus_dir))?;

    for failure in &report.failures {
        log::error!("失敗: {} ({})", failure.subset_id, failure.error);
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} / {} サブセットの処理に失敗しました",
            report.failures.len(),
            config.corpus.subsets.len()
        );
    }

    log::info!("{} サブセットのマニフェストを作成しました", report.manifests.len());
    Ok(())
}
