use crate::models::{ProxyHandle, WorkItem};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从文本文件加载待处理条目，每行一个
///
/// 空行和 `#` 开头的注释行会被跳过
pub async fn load_work_items(path: &Path) -> Result<Vec<WorkItem>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取条目文件: {}", path.display()))?;

    let items: Vec<WorkItem> = meaningful_lines(&content).map(WorkItem::from).collect();

    tracing::info!("成功加载 {} 个条目: {}", items.len(), path.display());
    Ok(items)
}

/// 从文本文件加载代理列表，保持文件中的顺序
///
/// 格式错误的行记录警告后跳过
pub async fn load_proxies(path: &Path) -> Result<Vec<ProxyHandle>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取代理文件: {}", path.display()))?;

    let mut proxies = Vec::new();
    for line in meaningful_lines(&content) {
        match line.parse::<ProxyHandle>() {
            Ok(proxy) => proxies.push(proxy),
            Err(e) => tracing::warn!("跳过无效代理: {}", e),
        }
    }

    tracing::info!("成功加载 {} 个代理: {}", proxies.len(), path.display());
    Ok(proxies)
}

fn meaningful_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_work_items_skips_blank_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# header\nalpha\n\n  beta  \n#gamma\ndelta").unwrap();

        let items = load_work_items(file.path()).await.unwrap();
        assert_eq!(
            items,
            vec![WorkItem::from("alpha"), WorkItem::from("beta"), WorkItem::from("delta")]
        );
    }

    #[tokio::test]
    async fn test_load_proxies_keeps_order_and_skips_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a:1\nbroken\nb:2:u:p\nc:3").unwrap();

        let proxies = load_proxies(file.path()).await.unwrap();
        let hosts: Vec<&str> = proxies.iter().map(|p| p.host.as_str()).collect();
        assert_eq!(hosts, vec!["a", "b", "c"]);
        assert_eq!(proxies[1].username.as_deref(), Some("u"));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = load_work_items(Path::new("/definitely/not/here.txt")).await;
        assert!(result.is_err());
    }
}
