//! 扫描主流程与并行调度
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::definitions::DefinitionSet;
use crate::engine::{scan_file, FileOutcome};
use crate::error::DefinitionLoadError;
use crate::matcher::KeywordMatcher;
use crate::options::ScanOptions;
use crate::report::{FailedFile, FileMatches, ScanReport, SkippedFile};

/// worker -> writer 的单文件结果
enum Outcome {
    Matches(Vec<String>),
    Skipped(String),
    Failed(String),
}

/// 扫描一段文本，返回命中的算法标识符集合
pub fn scan_text(
    text: &str,
    defs: &DefinitionSet,
    opts: &ScanOptions,
) -> Result<BTreeSet<String>, DefinitionLoadError> {
    let matcher = KeywordMatcher::new(defs, opts.match_mode())?;
    Ok(matcher.scan_str(text))
}

/// 批量扫描输入（文件或目录，目录递归展开），生成报告
/// 稳定性保证：
/// - 文件级：先收集文件并按路径排序，报告顺序可复现
/// - 文件内：命中标识符按字典序输出
/// 失败语义：不存在/不可读的输入记入 failures 后继续，批次不中断。
pub fn scan_inputs(
    inputs: &[PathBuf],
    defs: &DefinitionSet,
    opts: &ScanOptions,
) -> Result<ScanReport, DefinitionLoadError> {
    let matcher = Arc::new(KeywordMatcher::new(defs, opts.match_mode())?);
    let mut report = ScanReport::default();

    // 展开输入：目录递归收集，文件直接入列；坏输入就地计入 failures
    let mut files: Vec<PathBuf> = Vec::new();
    for input in inputs {
        match std::fs::metadata(input) {
            Ok(md) if md.is_dir() => {
                for entry in WalkDir::new(input) {
                    let entry = match entry {
                        Ok(e) => e,
                        Err(err) => {
                            let path = err.path().map(|p| p.to_path_buf()).unwrap_or_else(|| input.clone());
                            report.failures.push(FailedFile { path, error: err.to_string() });
                            continue;
                        }
                    };
                    if entry.file_type().is_file() { files.push(entry.into_path()); }
                }
            }
            Ok(_) => files.push(input.clone()),
            Err(err) => {
                report.failures.push(FailedFile { path: input.clone(), error: err.to_string() });
            }
        }
    }
    files.sort();
    files.dedup();

    // 决策：线程数 > 1 且有多个文件时走并行调度，否则串行
    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    if threads > 1 && files.len() > 1 {
        scan_parallel(&files, &matcher, opts, &mut report, threads);
    } else {
        for path in &files {
            let outcome = scan_one(path, &matcher, opts);
            record(&mut report, path, outcome);
        }
    }

    report.stats.files_skipped = report.skipped.len();
    report.stats.files_failed = report.failures.len();
    Ok(report)
}

/// 单文件扫描：大小过滤 → 引擎扫描 → 归一化为 Outcome
fn scan_one(path: &Path, matcher: &KeywordMatcher, opts: &ScanOptions) -> Outcome {
    if let Some(max) = opts.max_file_size {
        match std::fs::metadata(path) {
            Ok(md) if md.len() > max => {
                return Outcome::Skipped(format!("file size {} exceeds limit {}", md.len(), max));
            }
            Ok(_) => {}
            Err(err) => return Outcome::Failed(err.to_string()),
        }
    }
    match scan_file(path, matcher) {
        Ok(FileOutcome::Scanned(hits)) => Outcome::Matches(
            hits.into_iter().map(|i| matcher.id_at(i).to_string()).collect(),
        ),
        Ok(FileOutcome::Binary) => Outcome::Skipped("binary file".to_string()),
        Err(err) => Outcome::Failed(err.to_string()),
    }
}

/// 把单文件结果写入报告（唯一 writer，报告无共享可变访问）
fn record(report: &mut ScanReport, path: &Path, outcome: Outcome) {
    match outcome {
        Outcome::Matches(algorithms) => {
            report.stats.files_scanned += 1;
            report.stats.matches_total += algorithms.len();
            report.results.push(FileMatches { path: path.to_path_buf(), algorithms });
        }
        Outcome::Skipped(reason) => {
            report.skipped.push(SkippedFile { path: path.to_path_buf(), reason });
        }
        Outcome::Failed(error) => {
            report.failures.push(FailedFile { path: path.to_path_buf(), error });
        }
    }
}

/// 并行调度：
/// - 后台线程内建 Rayon 线程池并行扫描，worker 经通道回传 (idx, Outcome)
/// - 当前线程作为唯一 writer，按 idx 重排后写入报告，保证顺序稳定
fn scan_parallel(
    files: &[PathBuf],
    matcher: &Arc<KeywordMatcher>,
    opts: &ScanOptions,
    report: &mut ScanReport,
    threads: usize,
) {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    type Msg = (usize /*idx*/, Outcome);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let matcher = Arc::clone(matcher);
    let opts = opts.clone();
    let files_vec: Vec<(usize, PathBuf)> = files
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.clone()))
        .collect();

    let scan_thread = std::thread::spawn(move || {
        let run = |idx: usize, path: &Path| {
            let _ = tx.send((idx, scan_one(path, &matcher, &opts)));
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| {
                files_vec.par_iter().for_each(|(idx, path)| run(*idx, path));
            }),
            // 线程池构建失败时退化为串行，结果不变
            Err(_) => files_vec.iter().for_each(|(idx, path)| run(*idx, path)),
        }
        // 结束后 Sender 被丢弃，writer 随之收到关闭信号
    });

    // Writer：维护 next_idx 与缓存，按序写入
    use std::collections::BTreeMap;
    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, Outcome> = BTreeMap::new();

    while let Ok((idx, outcome)) = rx.recv() {
        buffer.insert(idx, outcome);
        while let Some(outcome) = buffer.remove(&next_idx) {
            record(report, &files[next_idx], outcome);
            next_idx += 1;
        }
    }

    let _ = scan_thread.join();

    // 最终冲刷残余（理论上缓冲应已清空）
    while let Some(outcome) = buffer.remove(&next_idx) {
        record(report, &files[next_idx], outcome);
        next_idx += 1;
    }
}
