use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use tphoto_renamer_core::{collect_media_paths, execute_plan, load_config, plan_renames, ExifTool};

#[derive(Debug, Parser)]
#[command(name = "tphoto-renamer-cli")]
#[command(about = "撮影日時とコンテンツハッシュで写真・動画ファイルを一括リネームします")]
struct Cli {
    #[arg(short, long, default_value_t = false)]
    force: bool,
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,
    #[arg(value_name = "GLOB_PATTERN")]
    patterns: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    let patterns = if cli.patterns.is_empty() {
        config.default_patterns
    } else {
        cli.patterns
    };

    let media_paths = collect_media_paths(&patterns)?;
    if media_paths.is_empty() {
        anyhow::bail!("グロブパターンに一致するファイルがありません");
    }

    let mut exiftool = ExifTool::locate(config.exiftool_path.as_deref())?;
    let plan = plan_renames(media_paths, &mut exiftool)?;
    if plan.is_empty() {
        println!("リネーム対象はありません。");
        return Ok(());
    }

    if cli.dry_run {
        return Ok(());
    }
    if !cli.force && !confirm()? {
        return Ok(());
    }

    let result = execute_plan(&plan)?;
    eprintln!(
        "完了: リネーム {}件 / 重複削除 {}件",
        result.renamed, result.removed_duplicates
    );
    Ok(())
}

fn confirm() -> Result<bool> {
    print!("続行しますか [y/n]? ");
    io::stdout().flush().context("標準出力に書き込めませんでした")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("確認入力を読めませんでした")?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
