//! 監視対象アドレス一覧の読み込み
//!
//! 1行1アドレス。前後の空白は取り除き、空行は読み飛ばす。

use scraper_common::error::{ScraperError, ScraperResult};
use std::path::Path;

/// テキストからアドレス列を取り出す
pub fn parse_sites(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// ファイルからアドレス列を読み込む
///
/// 読めないファイルや空の一覧は起動を中止すべき設定エラーになる。
pub fn load_sites(path: &Path) -> ScraperResult<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ScraperError::Config(format!("failed to read sites file {}: {e}", path.display()))
    })?;

    let sites = parse_sites(&text);
    if sites.is_empty() {
        return Err(ScraperError::Config(format!(
            "sites file {} contains no addresses",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), count = sites.len(), "Loaded sites");
    Ok(sites)
}
