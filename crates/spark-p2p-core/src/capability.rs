//! 装配产物的能力接口：传输、流复用器与安全传输。
//!
//! # 教案级注释
//! - **意图 (Why)**：装配流程只负责“构造并登记”，不参与实际 I/O，因此这里的接口仅暴露
//!   选路与协商所需的描述信息；真正的拨号/监听由具体实现自行扩展；
//! - **契约 (What)**：三个 trait 均要求 `Send + Sync + 'static`，产物以 `Arc<dyn _>` 形式共享；
//! - **实现提示 (How)**：为 `Arc<T>` 提供委托实现，构造函数返回共享句柄时无需额外包装。

use std::sync::Arc;

use crate::{identity::PeerId, multiaddr::Multiaddr};

/// 网络传输，例如 TCP、QUIC。
pub trait Transport: Send + Sync + 'static {
    /// 该传输处理的协议名，如 `["tcp"]`。
    fn protocols(&self) -> &[&'static str];

    /// 是否能拨号到该地址。
    fn can_dial(&self, addr: &Multiaddr) -> bool;

    /// 是否为代理型传输（如中继）。
    fn is_proxy(&self) -> bool {
        false
    }
}

/// 流复用器，例如 yamux、mplex。
pub trait Multiplexer: Send + Sync + 'static {
    /// 实现名称，仅用于诊断。
    fn kind(&self) -> &str;
}

/// 安全传输，例如 noise、tls。
pub trait SecurityTransport: Send + Sync + 'static {
    /// 实现名称，仅用于诊断。
    fn kind(&self) -> &str;

    /// 握手时声明的本地身份。
    fn local_peer(&self) -> PeerId;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn protocols(&self) -> &[&'static str] {
        (**self).protocols()
    }

    fn can_dial(&self, addr: &Multiaddr) -> bool {
        (**self).can_dial(addr)
    }

    fn is_proxy(&self) -> bool {
        (**self).is_proxy()
    }
}

impl<T: Multiplexer + ?Sized> Multiplexer for Arc<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }
}

impl<T: SecurityTransport + ?Sized> SecurityTransport for Arc<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn local_peer(&self) -> PeerId {
        (**self).local_peer()
    }
}
