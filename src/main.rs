use biblink::{cli, config, cover, error, export, loader, matcher};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Match {
            left,
            right,
            output,
            format,
            no_covers,
            concurrency,
            timeout,
            normalize_titles,
            cover_policy,
            dump_gated,
        } => {
            println!("📚 biblink - 書誌レコード照合\n");

            let mut config = config;
            if no_covers {
                config.skip_covers = true;
            }
            if let Some(n) = concurrency {
                config.image_fetch_concurrency = n;
            }
            if let Some(secs) = timeout {
                config.image_fetch_timeout_secs = secs;
            }
            if normalize_titles {
                config.normalize_titles = true;
            }
            if let Some(policy) = cover_policy {
                config.cover_failure_policy = policy;
            }
            config.validate()?;

            // 1. 読み込み
            println!("[1/3] テーブルを読み込み中...");
            let left_records = loader::load_records(&left)?;
            let right_records = loader::load_records(&right)?;
            println!(
                "✔ 左 {}件 / 右 {}件（候補ペア {}件）\n",
                left_records.len(),
                right_records.len(),
                left_records.len() * right_records.len()
            );

            // 2. 照合
            println!(
                "[2/3] 照合中...{}",
                if config.skip_covers { " (カバー画像比較なし)" } else { "" }
            );
            let matcher = if config.skip_covers {
                matcher::Matcher::without_covers(config)?
            } else {
                let resolver = Arc::new(cover::ImageResolver::http(&config)?);
                matcher::Matcher::new(config, resolver)?.with_progress(cover_progress_bar())
            };
            let result = matcher.run(&left_records, &right_records).await?;
            print_summary(&result.summary);

            if let Some(path) = dump_gated {
                export::csv::generate_gated_csv(&result.gated, &path)?;
                println!("✔ ゲート通過ペア {}件を保存: {}\n", result.gated.len(), path.display());
            }

            // 3. 出力
            println!("[3/3] 結果を保存中...");
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let written = export::export_results(&result, format, &output_dir, "tableC")?;
            println!("✔ {}件を保存: {}", result.len(), written.display());

            println!("\n✅ 照合完了");
        }

        Commands::Config { show, init } => {
            if init {
                if config_path.exists() {
                    println!("設定ファイルは既に存在します: {}", config_path.display());
                } else {
                    Config::default().save_to(&config_path)?;
                    println!("✔ デフォルト設定を書き出しました: {}", config_path.display());
                }
            }

            if show || !init {
                print_config(&config, &config_path);
            }
        }
    }

    Ok(())
}

/// ログ初期化（RUST_LOG があればそれを優先）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "biblink=debug" } else { "biblink=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cover_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("  カバー画像 [{bar:30}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

fn print_summary(summary: &matcher::MatchSummary) {
    println!(
        "✔ ゲート通過 {}件 / 不通過 {}件",
        summary.gated_in, summary.rejected
    );
    println!(
        "  不通過理由: タイトル {} / 著者 {} / 言語 {}",
        summary.rejected_title, summary.rejected_author, summary.rejected_language
    );
    if let Some((min, max)) = summary.year_range {
        println!("  発行年範囲: {}〜{}", min, max);
    }
    println!("  発行年欠損ペア: {}件", summary.missing_year_pairs);
    println!(
        "  カバー比較 {}件 / フォールバック {}件（URLなし {} / 一時的 {} / 恒久的 {}）",
        summary.cover_compared,
        summary.cover_fallbacks(),
        summary.cover_fallback_missing,
        summary.cover_fallback_transient,
        summary.cover_fallback_permanent
    );
    println!(
        "  取得失敗URL: 一時的 {} / 恒久的 {}",
        summary.failed_cover_urls_transient, summary.failed_cover_urls_permanent
    );
    println!("  画像取得回数: {}\n", summary.image_fetches);
}

fn print_config(config: &Config, path: &Path) {
    println!("設定: {}", path.display());
    println!("  タイトル閾値: {}", config.title_threshold);
    println!("  著者閾値: {}", config.author_threshold);
    println!(
        "  重み: タイトル {} / 著者 {} / 発行年 {} / カバー {}",
        config.weight_title, config.weight_author, config.weight_year, config.weight_cover
    );
    println!(
        "  画像サイズ: {}x{}",
        config.cover_canonical_size.0, config.cover_canonical_size.1
    );
    println!("  同時取得数: {}", config.image_fetch_concurrency);
    println!("  タイムアウト: {}秒", config.image_fetch_timeout_secs);
    println!("  リクエスト間隔: {}ms", config.image_min_request_interval_ms);
    println!("  タイトル正規化: {}", if config.normalize_titles { "有効" } else { "無効" });
    println!("  カバー比較不能時: {}", config.cover_failure_policy);
    println!("  カバー比較: {}", if config.skip_covers { "無効" } else { "有効" });
}
