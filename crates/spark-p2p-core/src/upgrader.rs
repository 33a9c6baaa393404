//! 连接升级器：把原始连接提升为“已加密 + 已复用”连接所需的全部组件。
//!
//! # 教案级注释
//! - **意图 (Why)**：传输构造函数通常不关心安全握手与流复用的细节，只需持有一个升级器即可；
//!   因此升级器在传输之前完成装配，并作为可注入值交给传输构造函数；
//! - **契约 (What)**：升级器创建后只读；协商方法按本地偏好顺序挑选双方共同支持的协议；
//! - **风险提示 (Trade-offs)**：启用 PSK 时，所有连接在安全握手前都需要额外一轮私网加密，
//!   调用方应在日志中只输出 [`Psk::fingerprint`]。

use core::fmt;
use std::sync::Arc;

use crate::{
    capability::{Multiplexer, SecurityTransport},
    gater::ConnectionGater,
    pnet::Psk,
    rcmgr::ResourceManager,
    registry::ProtocolRegistry,
};

/// 连接升级器。
#[derive(Clone)]
pub struct Upgrader {
    security: ProtocolRegistry<dyn SecurityTransport>,
    muxers: ProtocolRegistry<dyn Multiplexer>,
    psk: Option<Psk>,
    gater: Arc<dyn ConnectionGater>,
    resource_manager: Arc<dyn ResourceManager>,
}

impl fmt::Debug for Upgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upgrader")
            .field("security", &self.security)
            .field("muxers", &self.muxers)
            .field("psk", &self.psk)
            .finish_non_exhaustive()
    }
}

impl Upgrader {
    /// 以装配好的组件构造升级器。
    pub fn new(
        security: ProtocolRegistry<dyn SecurityTransport>,
        muxers: ProtocolRegistry<dyn Multiplexer>,
        psk: Option<Psk>,
        gater: Arc<dyn ConnectionGater>,
        resource_manager: Arc<dyn ResourceManager>,
    ) -> Self {
        Self {
            security,
            muxers,
            psk,
            gater,
            resource_manager,
        }
    }

    /// 安全传输注册表。
    pub fn security(&self) -> &ProtocolRegistry<dyn SecurityTransport> {
        &self.security
    }

    /// 流复用器注册表。
    pub fn muxers(&self) -> &ProtocolRegistry<dyn Multiplexer> {
        &self.muxers
    }

    /// 私网密钥。
    pub fn psk(&self) -> Option<&Psk> {
        self.psk.as_ref()
    }

    /// 连接门控。
    pub fn gater(&self) -> &Arc<dyn ConnectionGater> {
        &self.gater
    }

    /// 资源管理器。
    pub fn resource_manager(&self) -> &Arc<dyn ResourceManager> {
        &self.resource_manager
    }

    /// 与对端协商安全协议。
    pub fn negotiate_security<'a, I>(&self, remote: I) -> Option<(&str, &Arc<dyn SecurityTransport>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.security.negotiate(remote)
    }

    /// 与对端协商流复用协议。
    pub fn negotiate_muxer<'a, I>(&self, remote: I) -> Option<(&str, &Arc<dyn Multiplexer>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.muxers.negotiate(remote)
    }
}
