//! 原子文件写入 - 基础设施层
//!
//! 先写入同目录下的临时文件并 fsync，再 rename 覆盖目标文件。
//! 读者只会看到旧内容或完整的新内容，不会看到写了一半的文件。

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// 原子地用 `contents` 替换 `path`
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    sync_dir(dir);
    debug!("已写入 {} ({} 字节)", path.display(), contents.len());
    Ok(())
}

/// rename 之后同步目录项；部分平台不支持打开目录，忽略失败
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = std::fs::File::open(dir) {
        let _ = handle.sync_all();
    }
    #[cfg(not(unix))]
    let _ = dir;
}
