use crate::utils::error::Result;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// How many candidates the picker offers.
pub const CANDIDATE_COUNT: usize = 5;

/// 列出資料夾中最近修改的檔案（新到舊），資料夾不存在時回傳空清單
pub fn latest_files(directory: &Path, extension: &str, count: usize) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("⚠️ Input folder '{}' does not exist", directory.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);

        if !matches || !entry.file_type()?.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        candidates.push((modified, path));
    }

    // 同時間的檔案依名稱排序，確保順序穩定
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    Ok(candidates
        .into_iter()
        .take(count)
        .map(|(_, path)| path)
        .collect())
}

/// 顯示編號選單並讀取一行輸入；空白或無效輸入回傳 None（改用範例檔）
pub fn select_file<R: BufRead, W: Write>(
    files: &[PathBuf],
    file_type: &str,
    input: &mut R,
    output: &mut W,
) -> Result<Option<PathBuf>> {
    if files.is_empty() {
        writeln!(
            output,
            "No {} files found. Using default example file from example folder.",
            file_type
        )?;
        return Ok(None);
    }

    writeln!(
        output,
        "Select a {} file by number (leave blank to use default example file from example folder):",
        file_type
    )?;
    for (i, file) in files.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, file.display())?;
    }
    write!(output, "Enter number: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let selection = match line.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= files.len() => Some(files[n - 1].clone()),
        _ => None,
    };

    Ok(selection)
}
