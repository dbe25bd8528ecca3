//! Slug 生成

use std::future::Future;

use crate::error::{CommerceError, Result};

/// 同名冲突时最多尝试的后缀数量
const MAX_SUFFIX: u32 = 1000;

/// 将名称转为 URL 友好的 slug：小写字母数字，其余字符折叠为单个连字符
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// 生成不重复的 slug，冲突时依次追加 -2、-3 ...
pub async fn unique_slug<F, Fut>(name: &str, mut exists: F) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let base = slugify(name);

    for n in 1..=MAX_SUFFIX {
        let candidate = if n == 1 {
            base.clone()
        } else {
            format!("{}-{}", base, n)
        };

        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    Err(CommerceError::Internal(format!(
        "无法为 {} 生成唯一 slug",
        base
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Beras Premium 25kg"), "beras-premium-25kg");
        assert_eq!(slugify("  Minyak -- Goreng!! "), "minyak-goreng");
        assert_eq!(slugify("Gula & Kopi"), "gula-kopi");
        assert_eq!(slugify("***"), "item");
    }

    #[tokio::test]
    async fn test_unique_slug_appends_suffix() {
        let taken = ["tips-grosir".to_string(), "tips-grosir-2".to_string()];

        let slug = unique_slug("Tips Grosir", |candidate| {
            let hit = taken.contains(&candidate);
            async move { Ok(hit) }
        })
        .await
        .unwrap();

        assert_eq!(slug, "tips-grosir-3");
    }

    #[tokio::test]
    async fn test_unique_slug_free_base() {
        let slug = unique_slug("Kopi Bubuk", |_| async { Ok(false) })
            .await
            .unwrap();
        assert_eq!(slug, "kopi-bubuk");
    }
}
