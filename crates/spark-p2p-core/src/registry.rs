//! 以协议标识索引、保持插入顺序的注册表。
//!
//! # 教案级注释
//! - **意图 (Why)**：复用器与安全传输在协商时按“本地偏好顺序”逐个尝试，因此注册表既要能按标识查找，
//!   又要保留登记顺序；
//! - **契约 (What)**：
//!   - 标识唯一，重复插入返回 [`RegistryError::Duplicate`] 且不修改注册表；
//!   - [`ProtocolRegistry::iter`] 与 [`ProtocolRegistry::ids`] 按插入顺序输出；
//!   - [`ProtocolRegistry::negotiate`] 返回第一个对端也支持的本地条目；
//! - **风险提示 (Trade-offs)**：条目数量通常为个位数，查找采用线性扫描，不维护额外索引。

use core::fmt;
use std::sync::Arc;

use thiserror::Error;

/// 协议标识，如 `/yamux/1.0.0`。
pub type ProtocolId = Arc<str>;

/// 注册表写入错误。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// 标识已被占用。
    #[error("protocol `{id}` already registered")]
    Duplicate { id: String },
}

/// 按插入顺序保存 `(标识, 实例)` 的注册表。
pub struct ProtocolRegistry<T: ?Sized> {
    entries: Vec<(ProtocolId, Arc<T>)>,
}

impl<T: ?Sized> Default for ProtocolRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> Clone for ProtocolRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ProtocolRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: ?Sized> ProtocolRegistry<T> {
    /// 创建空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条目。
    pub fn insert(&mut self, id: impl Into<ProtocolId>, value: Arc<T>) -> Result<(), RegistryError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(RegistryError::Duplicate { id: id.to_string() });
        }
        self.entries.push((id, value));
        Ok(())
    }

    /// 按标识查找。
    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry.as_ref() == id)
            .map(|(_, value)| value)
    }

    /// 是否包含标识。
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// 按插入顺序遍历。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.entries.iter().map(|(id, value)| (id.as_ref(), value))
    }

    /// 按插入顺序遍历标识。
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_ref())
    }

    /// 条目数量。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 依本地偏好选出第一个对端也支持的条目。
    pub fn negotiate<'a, I>(&self, remote: I) -> Option<(&str, &Arc<T>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let remote: Vec<&str> = remote.into_iter().collect();
        self.iter().find(|(id, _)| remote.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_rejects_duplicates() {
        let mut registry: ProtocolRegistry<str> = ProtocolRegistry::new();
        registry.insert("/b", Arc::from("second")).expect("首次登记");
        registry.insert("/a", Arc::from("first")).expect("首次登记");

        assert_eq!(registry.ids().collect::<Vec<_>>(), ["/b", "/a"]);
        assert_eq!(
            registry.insert("/a", Arc::from("again")),
            Err(RegistryError::Duplicate { id: "/a".into() })
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("/a").map(|v| v.as_ref()), Some("first"));
    }

    #[test]
    fn negotiation_follows_local_preference() {
        let mut registry: ProtocolRegistry<str> = ProtocolRegistry::new();
        registry.insert("/yamux/1.0.0", Arc::from("yamux")).unwrap();
        registry.insert("/mplex/6.7.0", Arc::from("mplex")).unwrap();

        let chosen = registry.negotiate(["/mplex/6.7.0", "/yamux/1.0.0"]);
        assert_eq!(chosen.map(|(id, _)| id), Some("/yamux/1.0.0"));
        assert!(registry.negotiate(["/quic"]).is_none());
    }
}
