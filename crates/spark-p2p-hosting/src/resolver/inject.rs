//! 装配上下文与可注入参数。
//!
//! # 教案级注释
//! - **意图 (Why)**：构造函数只声明自己需要的参数，其余值不应被强行传入；
//!   因此每个可注入类型自行声明所属类别，并知道如何从 [`BuildContext`] 中取出自己；
//! - **体系位置 (Where)**：[`BuildContext`] 由 `StackBuilder` 在每个装配阶段创建，阶段越靠后可用值越多：
//!   复用器阶段只有宿主，安全阶段追加复用器集合，传输阶段拥有全部值；
//! - **契约 (What)**：
//!   - [`Injectable::CATEGORIES`] 通常只有一个元素；声明多个类别的类型在解析时若同时命中多个允许类别，
//!     会被判定为歧义并拒绝；
//!   - [`Injectable::inject`] 只在解析通过之后调用，若上下文缺少对应值返回 [`InjectError`]；
//! - **风险提示 (Trade-offs)**：注入值均为廉价克隆（`Arc` 或小型值），构造函数拿到的是共享句柄而非独占所有权。

use std::sync::Arc;

use spark_p2p_core::{
    AddrFilter, ConnectionGater, Host, Multiplexer, Network, PeerId, PeerStore, PrivateKey,
    ProtocolRegistry, Psk, PublicKey, ResourceManager, SecurityTransport, Upgrader,
};
use thiserror::Error;

use super::category::ArgCategory;

/// 注入阶段的错误。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InjectError {
    /// 当前阶段的上下文没有该类别的值。
    #[error("{category} is not available at this assembly stage")]
    Unavailable { category: ArgCategory },
    /// 地址簿中缺少本节点的密钥。
    #[error("peer store holds no {category} for local peer {peer}")]
    MissingKey { category: ArgCategory, peer: PeerId },
}

/// 装配阶段可供注入的值池。
#[derive(Clone)]
pub struct BuildContext {
    host: Arc<dyn Host>,
    upgrader: Option<Arc<Upgrader>>,
    gater: Option<Arc<dyn ConnectionGater>>,
    psk: Option<Option<Psk>>,
    resource_manager: Option<Arc<dyn ResourceManager>>,
    addr_filter: Option<AddrFilter>,
    security: Option<ProtocolRegistry<dyn SecurityTransport>>,
    muxers: Option<ProtocolRegistry<dyn Multiplexer>>,
}

impl core::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BuildContext")
            .field("host", &self.host.id())
            .field("upgrader", &self.upgrader.is_some())
            .field("gater", &self.gater.is_some())
            .field("psk", &self.psk)
            .field("resource_manager", &self.resource_manager.is_some())
            .field("addr_filter", &self.addr_filter)
            .field("security", &self.security)
            .field("muxers", &self.muxers)
            .finish()
    }
}

impl BuildContext {
    /// 仅含宿主的上下文。
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            upgrader: None,
            gater: None,
            psk: None,
            resource_manager: None,
            addr_filter: None,
            security: None,
            muxers: None,
        }
    }

    /// 追加升级器。
    pub fn with_upgrader(mut self, upgrader: Arc<Upgrader>) -> Self {
        self.upgrader = Some(upgrader);
        self
    }

    /// 追加连接门控。
    pub fn with_gater(mut self, gater: Arc<dyn ConnectionGater>) -> Self {
        self.gater = Some(gater);
        self
    }

    /// 声明私网密钥的配置结果；`None` 表示公网。
    pub fn with_psk(mut self, psk: Option<Psk>) -> Self {
        self.psk = Some(psk);
        self
    }

    /// 追加资源管理器。
    pub fn with_resource_manager(mut self, resource_manager: Arc<dyn ResourceManager>) -> Self {
        self.resource_manager = Some(resource_manager);
        self
    }

    /// 追加地址过滤器。
    pub fn with_addr_filter(mut self, filter: AddrFilter) -> Self {
        self.addr_filter = Some(filter);
        self
    }

    /// 追加已装配的安全传输集合。
    pub fn with_security(mut self, security: ProtocolRegistry<dyn SecurityTransport>) -> Self {
        self.security = Some(security);
        self
    }

    /// 追加已装配的流复用器集合。
    pub fn with_muxers(mut self, muxers: ProtocolRegistry<dyn Multiplexer>) -> Self {
        self.muxers = Some(muxers);
        self
    }

    /// 宿主。
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }
}

fn unavailable(category: ArgCategory) -> InjectError {
    InjectError::Unavailable { category }
}

/// 可从 [`BuildContext`] 注入的参数类型。
pub trait Injectable: Sized + 'static {
    /// 该类型所属的类别。
    const CATEGORIES: &'static [ArgCategory];

    /// 从上下文取值。
    fn inject(ctx: &BuildContext) -> Result<Self, InjectError>;
}

impl Injectable for Arc<dyn Host> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::Host];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        Ok(Arc::clone(&ctx.host))
    }
}

impl Injectable for Arc<dyn Network> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::Network];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        Ok(ctx.host.network())
    }
}

impl Injectable for PeerId {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::PeerId];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        Ok(ctx.host.id())
    }
}

impl Injectable for Arc<dyn PeerStore> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::PeerStore];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        Ok(ctx.host.peer_store())
    }
}

impl Injectable for PrivateKey {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::PrivateKey];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        let peer = ctx.host.id();
        ctx.host
            .peer_store()
            .private_key(&peer)
            .ok_or(InjectError::MissingKey {
                category: ArgCategory::PrivateKey,
                peer,
            })
    }
}

impl Injectable for PublicKey {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::PublicKey];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        let peer = ctx.host.id();
        ctx.host
            .peer_store()
            .public_key(&peer)
            .ok_or(InjectError::MissingKey {
                category: ArgCategory::PublicKey,
                peer,
            })
    }
}

impl Injectable for Arc<Upgrader> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::Upgrader];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.upgrader
            .clone()
            .ok_or_else(|| unavailable(ArgCategory::Upgrader))
    }
}

impl Injectable for Arc<dyn ConnectionGater> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::ConnectionGater];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.gater
            .clone()
            .ok_or_else(|| unavailable(ArgCategory::ConnectionGater))
    }
}

impl Injectable for Option<Psk> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::Psk];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.psk.ok_or_else(|| unavailable(ArgCategory::Psk))
    }
}

impl Injectable for Arc<dyn ResourceManager> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::ResourceManager];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.resource_manager
            .clone()
            .ok_or_else(|| unavailable(ArgCategory::ResourceManager))
    }
}

impl Injectable for AddrFilter {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::AddrFilter];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.addr_filter
            .clone()
            .ok_or_else(|| unavailable(ArgCategory::AddrFilter))
    }
}

impl Injectable for ProtocolRegistry<dyn SecurityTransport> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::SecurityTransports];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.security
            .clone()
            .ok_or_else(|| unavailable(ArgCategory::SecurityTransports))
    }
}

impl Injectable for ProtocolRegistry<dyn Multiplexer> {
    const CATEGORIES: &'static [ArgCategory] = &[ArgCategory::StreamMuxers];

    fn inject(ctx: &BuildContext) -> Result<Self, InjectError> {
        ctx.muxers
            .clone()
            .ok_or_else(|| unavailable(ArgCategory::StreamMuxers))
    }
}
