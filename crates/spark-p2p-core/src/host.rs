//! 宿主、网络与地址簿契约。
//!
//! # 教案级注释
//! - **意图 (Why)**：传输/复用器构造函数通过这些契约读取“本节点”的上下文，而无需依赖具体宿主实现；
//! - **体系位置 (Where)**：[`Host`] 是装配流程唯一必需的输入，其余可注入值（网络、节点标识、地址簿、
//!   密钥）都可以从宿主推导；
//! - **契约 (What)**：所有 trait 对象要求 `Send + Sync + 'static`，以便在装配完成后被运行时跨线程共享；
//! - **风险提示 (Trade-offs)**：[`LocalHost`] 与 [`MemoryPeerStore`] 只保存内存状态，进程重启即丢失。

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    identity::{PeerId, PrivateKey, PublicKey},
    multiaddr::Multiaddr,
};

/// 节点地址簿。
pub trait PeerStore: Send + Sync + 'static {
    /// 为节点追加地址，重复地址会被忽略。
    fn add_addrs(&self, peer: PeerId, addrs: &[Multiaddr]);

    /// 节点当前已知的地址。
    fn addrs(&self, peer: &PeerId) -> Vec<Multiaddr>;

    /// 登记节点密钥；私钥仅对本节点有意义。
    fn add_keys(&self, peer: PeerId, private: Option<PrivateKey>, public: PublicKey);

    /// 读取私钥。
    fn private_key(&self, peer: &PeerId) -> Option<PrivateKey>;

    /// 读取公钥。
    fn public_key(&self, peer: &PeerId) -> Option<PublicKey>;

    /// 已登记的节点集合。
    fn peers(&self) -> Vec<PeerId>;
}

/// 网络层视图。
pub trait Network: Send + Sync + 'static {
    /// 本节点标识。
    fn local_peer(&self) -> PeerId;

    /// 共享的地址簿。
    fn peer_store(&self) -> Arc<dyn PeerStore>;

    /// 本节点声明的监听地址。
    fn listen_addrs(&self) -> Vec<Multiaddr>;
}

/// 宿主契约，装配流程的根输入。
pub trait Host: Send + Sync + 'static {
    /// 本节点标识。
    fn id(&self) -> PeerId;

    /// 网络层视图。
    fn network(&self) -> Arc<dyn Network>;

    /// 地址簿。
    fn peer_store(&self) -> Arc<dyn PeerStore>;
}

#[derive(Debug, Default)]
struct PeerRecord {
    addrs: Vec<Multiaddr>,
    private: Option<PrivateKey>,
    public: Option<PublicKey>,
}

/// 基于 `DashMap` 的内存地址簿。
///
/// # 教案式注释
/// - **意图 (Why)**：装配阶段与运行期可能并发读写地址簿，分片锁避免全局互斥；
/// - **风险 (Trade-offs)**：读取接口返回克隆值，避免把分片 guard 泄露给调用方。
#[derive(Debug, Default)]
pub struct MemoryPeerStore {
    records: DashMap<PeerId, PeerRecord>,
}

impl MemoryPeerStore {
    /// 创建空地址簿。
    pub fn new() -> Self {
        Self::default()
    }
}

impl PeerStore for MemoryPeerStore {
    fn add_addrs(&self, peer: PeerId, addrs: &[Multiaddr]) {
        let mut record = self.records.entry(peer).or_default();
        for addr in addrs {
            if !record.addrs.contains(addr) {
                record.addrs.push(addr.clone());
            }
        }
    }

    fn addrs(&self, peer: &PeerId) -> Vec<Multiaddr> {
        self.records
            .get(peer)
            .map(|record| record.addrs.clone())
            .unwrap_or_default()
    }

    fn add_keys(&self, peer: PeerId, private: Option<PrivateKey>, public: PublicKey) {
        let mut record = self.records.entry(peer).or_default();
        if private.is_some() {
            record.private = private;
        }
        record.public = Some(public);
    }

    fn private_key(&self, peer: &PeerId) -> Option<PrivateKey> {
        self.records.get(peer).and_then(|record| record.private.clone())
    }

    fn public_key(&self, peer: &PeerId) -> Option<PublicKey> {
        self.records.get(peer).and_then(|record| record.public.clone())
    }

    fn peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.records.iter().map(|entry| *entry.key()).collect();
        peers.sort();
        peers
    }
}

/// 仅保存本地状态的网络视图。
#[derive(Clone)]
pub struct LocalNetwork {
    local: PeerId,
    peer_store: Arc<dyn PeerStore>,
    listen_addrs: Vec<Multiaddr>,
}

impl core::fmt::Debug for LocalNetwork {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalNetwork")
            .field("local", &self.local)
            .field("listen_addrs", &self.listen_addrs)
            .finish_non_exhaustive()
    }
}

impl Network for LocalNetwork {
    fn local_peer(&self) -> PeerId {
        self.local
    }

    fn peer_store(&self) -> Arc<dyn PeerStore> {
        Arc::clone(&self.peer_store)
    }

    fn listen_addrs(&self) -> Vec<Multiaddr> {
        self.listen_addrs.clone()
    }
}

/// 以私钥与监听地址构造的本地宿主。
///
/// # 教案式注释
/// - **契约 (What)**：构造时即把自身密钥与地址写入地址簿，保证注入 `PrivateKey`/`PublicKey`
///   的构造函数总能读到值；
/// - **使用场景 (Where)**：嵌入式应用与测试中作为装配输入。
#[derive(Clone)]
pub struct LocalHost {
    id: PeerId,
    network: Arc<LocalNetwork>,
}

impl core::fmt::Debug for LocalHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalHost")
            .field("id", &self.id)
            .field("listen_addrs", &self.network.listen_addrs)
            .finish()
    }
}

impl LocalHost {
    /// 使用内存地址簿创建宿主。
    pub fn new(key: PrivateKey, listen_addrs: Vec<Multiaddr>) -> Self {
        Self::with_peer_store(key, listen_addrs, Arc::new(MemoryPeerStore::new()))
    }

    /// 使用外部提供的地址簿创建宿主。
    pub fn with_peer_store(
        key: PrivateKey,
        listen_addrs: Vec<Multiaddr>,
        peer_store: Arc<dyn PeerStore>,
    ) -> Self {
        let id = key.peer_id();
        let public = key.public().clone();
        peer_store.add_keys(id, Some(key), public);
        peer_store.add_addrs(id, &listen_addrs);
        let network = Arc::new(LocalNetwork {
            local: id,
            peer_store,
            listen_addrs,
        });
        Self { id, network }
    }
}

impl Host for LocalHost {
    fn id(&self) -> PeerId {
        self.id
    }

    fn network(&self) -> Arc<dyn Network> {
        let network: Arc<dyn Network> = self.network.clone();
        network
    }

    fn peer_store(&self) -> Arc<dyn PeerStore> {
        self.network.peer_store()
    }
}
