//! 文件扫描引擎（小文件整读 + 大文件分块）
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::FileReadError;
use crate::matcher::KeywordMatcher;

/// 小文件阈值（字节）。小文件整读，超出则分块扫描。
pub(crate) const SMALL_FILE_MAX: u64 = 1024 * 1024; // 1 MiB
/// 分块大小（字节）
pub(crate) const CHUNK_SIZE: usize = 4 * 1024 * 1024; // 4 MiB
/// 二进制嗅探的采样长度
const BINARY_SNIFF_LEN: usize = 8192;

/// 单个文件的扫描结果
#[derive(Debug, Clone)]
pub(crate) enum FileOutcome {
    /// 扫描完成，携带命中的定义索引
    Scanned(BTreeSet<usize>),
    /// 判定为二进制，按跳过策略处理
    Binary,
}

/// 扫描单个文件：整读或分块由文件大小决定
pub(crate) fn scan_file(path: &Path, matcher: &KeywordMatcher) -> Result<FileOutcome, FileReadError> {
    let md = std::fs::metadata(path)
        .map_err(|source| FileReadError { path: path.to_path_buf(), source })?;
    if md.len() <= SMALL_FILE_MAX {
        scan_file_whole(path, matcher)
    } else {
        scan_file_chunked(path, matcher)
    }
}

/// 整读扫描（小文件路径）
fn scan_file_whole(path: &Path, matcher: &KeywordMatcher) -> Result<FileOutcome, FileReadError> {
    let buf = std::fs::read(path)
        .map_err(|source| FileReadError { path: path.to_path_buf(), source })?;
    if is_probably_binary(&buf) {
        return Ok(FileOutcome::Binary);
    }
    let mut hits: BTreeSet<usize> = BTreeSet::new();
    matcher.scan_indices(&buf, &mut hits);
    Ok(FileOutcome::Scanned(hits))
}

/// 分块扫描（大文件路径）
fn scan_file_chunked(path: &Path, matcher: &KeywordMatcher) -> Result<FileOutcome, FileReadError> {
    let file = File::open(path)
        .map_err(|source| FileReadError { path: path.to_path_buf(), source })?;
    scan_chunks(BufReader::new(file), matcher, CHUNK_SIZE)
        .map_err(|source| FileReadError { path: path.to_path_buf(), source })
}

/// 在任意 reader 上执行分块扫描
/// 块尾保留“最长关键字 - 1”字节的重叠区域，保证关键字不会因跨块被漏检。
fn scan_chunks<R: Read>(
    mut reader: R,
    matcher: &KeywordMatcher,
    chunk_size: usize,
) -> std::io::Result<FileOutcome> {
    let overlap = matcher.max_keyword_len().saturating_sub(1);
    let mut buf = vec![0u8; chunk_size];
    let mut carry: Vec<u8> = Vec::new();
    let mut hits: BTreeSet<usize> = BTreeSet::new();
    let mut first = true;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 { break; }
        let mut chunk: Vec<u8> = Vec::with_capacity(carry.len() + n);
        if !carry.is_empty() { chunk.extend_from_slice(&carry); }
        chunk.extend_from_slice(&buf[..n]);

        // 对首个块做二进制判定；若疑似二进制，跳过整个文件。
        // 只抽样前 8KiB，避免超大 chunk 误判。
        if first {
            first = false;
            let sample_len = chunk.len().min(BINARY_SNIFF_LEN);
            if is_probably_binary(&chunk[..sample_len]) {
                return Ok(FileOutcome::Binary);
            }
        }

        matcher.scan_indices(&chunk, &mut hits);

        // 更新 carry：保留当前 chunk 的末尾重叠区域
        let total_len = carry.len() + n;
        let keep = overlap.min(total_len);
        if keep > 0 {
            carry = chunk[total_len - keep..].to_vec();
        } else {
            carry.clear();
        }
    }

    Ok(FileOutcome::Scanned(hits))
}

/// 判定缓冲区是否“明显是二进制”
/// 策略（保守，尽量不误杀文本）：
/// - 只要包含任何 NUL 字节（0x00）即认为二进制；
/// - 否则计算可打印 ASCII 比例（包含 tab/CR/LF），低于 25% 则认为二进制。
fn is_probably_binary(buf: &[u8]) -> bool {
    if buf.is_empty() { return false; }
    if buf.iter().any(|&b| b == 0) { return true; }
    let printable = buf
        .iter()
        .filter(|&&b| matches!(b, 0x09 | 0x0A | 0x0D) || (0x20..=0x7E).contains(&b))
        .count();
    let ratio = printable as f32 / (buf.len() as f32);
    ratio < 0.25
}
