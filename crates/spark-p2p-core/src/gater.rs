//! 连接门控：在拨号与接入阶段决定是否放行。

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::{identity::PeerId, multiaddr::Multiaddr};

/// 连接门控策略。
///
/// 默认实现全部放行，具体策略只需覆盖关心的钩子。
pub trait ConnectionGater: Send + Sync + 'static {
    /// 是否允许向该节点发起拨号。
    fn intercept_peer_dial(&self, _peer: &PeerId) -> bool {
        true
    }

    /// 是否允许向该节点的指定地址拨号。
    fn intercept_addr_dial(&self, _peer: &PeerId, _addr: &Multiaddr) -> bool {
        true
    }

    /// 是否接受来自该地址的入站连接。
    fn intercept_accept(&self, _remote: &Multiaddr) -> bool {
        true
    }
}

/// 全部放行的门控，装配未显式配置门控时使用。
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAllGater;

impl ConnectionGater for AllowAllGater {}

/// 按节点拒绝拨号的门控，拒绝名单可在运行期更新。
#[derive(Debug, Default)]
pub struct DenyPeersGater {
    denied: RwLock<HashSet<PeerId>>,
}

impl DenyPeersGater {
    /// 以初始拒绝名单构造。
    pub fn new(denied: impl IntoIterator<Item = PeerId>) -> Self {
        Self {
            denied: RwLock::new(denied.into_iter().collect()),
        }
    }

    /// 追加拒绝节点，返回是否为新增。
    pub fn deny(&self, peer: PeerId) -> bool {
        self.denied.write().insert(peer)
    }

    /// 移出拒绝名单，返回是否曾被拒绝。
    pub fn allow(&self, peer: &PeerId) -> bool {
        self.denied.write().remove(peer)
    }
}

impl ConnectionGater for DenyPeersGater {
    fn intercept_peer_dial(&self, peer: &PeerId) -> bool {
        !self.denied.read().contains(peer)
    }

    fn intercept_addr_dial(&self, peer: &PeerId, _addr: &Multiaddr) -> bool {
        self.intercept_peer_dial(peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PrivateKey;

    #[test]
    fn deny_list_can_be_updated_at_runtime() {
        let peer = PrivateKey::from_secret(b"p".to_vec())
            .expect("非空私钥")
            .peer_id();
        let gater = DenyPeersGater::default();
        assert!(gater.intercept_peer_dial(&peer));

        assert!(gater.deny(peer));
        assert!(!gater.deny(peer), "重复拒绝不应视为新增");
        assert!(!gater.intercept_peer_dial(&peer));

        assert!(gater.allow(&peer));
        assert!(gater.intercept_peer_dial(&peer));
        assert!(AllowAllGater.intercept_accept(&"/ip4/1.1.1.1/tcp/1".parse().unwrap()));
    }
}
