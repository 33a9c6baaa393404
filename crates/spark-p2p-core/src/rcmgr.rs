//! 资源管理器契约。
//!
//! 装配阶段只关心“传输能否读到某个作用域的上限”，配额记账由运行期实现负责。

use std::collections::BTreeMap;

/// 资源作用域。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ResourceScope {
    /// 全局连接数。
    Connections,
    /// 全局流数。
    Streams,
    /// 单节点连接数。
    ConnectionsPerPeer,
    /// 单连接流数。
    StreamsPerConnection,
}

/// 资源管理器。
pub trait ResourceManager: Send + Sync + 'static {
    /// 作用域上限，`None` 表示不限。
    fn limit_for(&self, scope: ResourceScope) -> Option<u32>;
}

/// 不设任何上限。
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResourceManager;

impl ResourceManager for NullResourceManager {
    fn limit_for(&self, _scope: ResourceScope) -> Option<u32> {
        None
    }
}

/// 固定上限表。
#[derive(Clone, Debug, Default)]
pub struct FixedLimits {
    limits: BTreeMap<ResourceScope, u32>,
}

impl FixedLimits {
    /// 空上限表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置作用域上限。
    pub fn with_limit(mut self, scope: ResourceScope, limit: u32) -> Self {
        self.limits.insert(scope, limit);
        self
    }
}

impl ResourceManager for FixedLimits {
    fn limit_for(&self, scope: ResourceScope) -> Option<u32> {
        self.limits.get(&scope).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_limits_only_cap_configured_scopes() {
        let limits = FixedLimits::new()
            .with_limit(ResourceScope::Connections, 128)
            .with_limit(ResourceScope::StreamsPerConnection, 16)
            .with_limit(ResourceScope::Connections, 64);
        assert_eq!(limits.limit_for(ResourceScope::Connections), Some(64));
        assert_eq!(limits.limit_for(ResourceScope::StreamsPerConnection), Some(16));
        assert_eq!(limits.limit_for(ResourceScope::Streams), None);
        assert_eq!(limits.limit_for(ResourceScope::ConnectionsPerPeer), None);
    }

    #[test]
    fn null_manager_never_limits() {
        for scope in [
            ResourceScope::Connections,
            ResourceScope::Streams,
            ResourceScope::ConnectionsPerPeer,
            ResourceScope::StreamsPerConnection,
        ] {
            assert_eq!(NullResourceManager.limit_for(scope), None);
        }
    }
}
