//! 参数语义类别与各角色允许的类别集合。

use core::fmt;

/// 构造函数参数的语义类别。
///
/// 参数按“类型所属类别”而非参数名与上下文匹配。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ArgCategory {
    /// 宿主本身。
    Host,
    /// 网络层视图。
    Network,
    /// 本节点标识。
    PeerId,
    /// 本节点私钥。
    PrivateKey,
    /// 本节点公钥。
    PublicKey,
    /// 地址簿。
    PeerStore,
    /// 连接升级器。
    Upgrader,
    /// 连接门控。
    ConnectionGater,
    /// 私网密钥（可能未配置）。
    Psk,
    /// 资源管理器。
    ResourceManager,
    /// 地址过滤器。
    AddrFilter,
    /// 已装配的安全传输集合。
    SecurityTransports,
    /// 已装配的流复用器集合。
    StreamMuxers,
}

impl ArgCategory {
    /// 稳定的小写名称，用于日志字段。
    pub const fn as_str(self) -> &'static str {
        match self {
            ArgCategory::Host => "host",
            ArgCategory::Network => "network",
            ArgCategory::PeerId => "peer_id",
            ArgCategory::PrivateKey => "private_key",
            ArgCategory::PublicKey => "public_key",
            ArgCategory::PeerStore => "peer_store",
            ArgCategory::Upgrader => "upgrader",
            ArgCategory::ConnectionGater => "connection_gater",
            ArgCategory::Psk => "psk",
            ArgCategory::ResourceManager => "resource_manager",
            ArgCategory::AddrFilter => "addr_filter",
            ArgCategory::SecurityTransports => "security_transports",
            ArgCategory::StreamMuxers => "stream_muxers",
        }
    }
}

impl fmt::Display for ArgCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 有序的类别集合，描述某一角色的构造函数可以声明哪些参数。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArgTypeSet {
    categories: &'static [ArgCategory],
}

impl ArgTypeSet {
    /// 以静态切片构造。
    pub const fn new(categories: &'static [ArgCategory]) -> Self {
        Self { categories }
    }

    /// 是否允许该类别。
    pub fn contains(&self, category: ArgCategory) -> bool {
        self.categories.contains(&category)
    }

    /// 按声明顺序遍历。
    pub fn iter(&self) -> impl Iterator<Item = ArgCategory> + '_ {
        self.categories.iter().copied()
    }

    /// 类别数量。
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// 是否为空集合。
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// 流复用器构造函数可声明的参数。
pub const MUXER_ARGS: ArgTypeSet = ArgTypeSet::new(&[
    ArgCategory::Host,
    ArgCategory::Network,
    ArgCategory::PeerId,
    ArgCategory::PeerStore,
]);

/// 安全传输构造函数可声明的参数：在复用器集合之上增加密钥与已装配的复用器。
pub const SECURITY_ARGS: ArgTypeSet = ArgTypeSet::new(&[
    ArgCategory::Host,
    ArgCategory::Network,
    ArgCategory::PeerId,
    ArgCategory::PeerStore,
    ArgCategory::PrivateKey,
    ArgCategory::PublicKey,
    ArgCategory::StreamMuxers,
]);

/// 传输构造函数可声明的参数：全部类别。
pub const TRANSPORT_ARGS: ArgTypeSet = ArgTypeSet::new(&[
    ArgCategory::Host,
    ArgCategory::Network,
    ArgCategory::PeerId,
    ArgCategory::PeerStore,
    ArgCategory::PrivateKey,
    ArgCategory::PublicKey,
    ArgCategory::Upgrader,
    ArgCategory::ConnectionGater,
    ArgCategory::Psk,
    ArgCategory::ResourceManager,
    ArgCategory::AddrFilter,
    ArgCategory::SecurityTransports,
    ArgCategory::StreamMuxers,
]);
