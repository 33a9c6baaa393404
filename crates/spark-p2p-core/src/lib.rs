#![deny(unsafe_code)]

//! # spark-p2p-core
//!
//! ## 定位与职责（Why）
//! - 定义点对点宿主装配流程所消费的协作方契约：身份、宿主/网络/地址簿、连接门控、私网密钥、
//!   地址过滤、资源管理，以及装配产物的能力接口（传输、流复用器、安全传输）；
//! - 这些类型在装配阶段被视为不透明输入，由 `spark-p2p-hosting` 注入到用户提供的构造函数中。
//!
//! ## 架构嵌入（Where）
//! - `identity`/`multiaddr`：基础值类型；
//! - `host`/`gater`/`pnet`/`filter`/`rcmgr`：宿主侧协作方；
//! - `capability`/`registry`/`upgrader`：装配产物与其组织方式。
//!
//! ## 风险提示（Trade-offs）
//! - 本 crate 不执行任何网络 I/O，能力接口只覆盖选路与协商所需的描述信息。

pub mod capability;
pub mod filter;
pub mod gater;
pub mod host;
pub mod identity;
pub mod multiaddr;
pub mod pnet;
pub mod rcmgr;
pub mod registry;
pub mod upgrader;

pub use capability::{Multiplexer, SecurityTransport, Transport};
pub use filter::{AddrFilter, FilterError, IpPrefix};
pub use gater::{AllowAllGater, ConnectionGater, DenyPeersGater};
pub use host::{Host, LocalHost, LocalNetwork, MemoryPeerStore, Network, PeerStore};
pub use identity::{IdentityError, PeerId, PrivateKey, PublicKey};
pub use multiaddr::{Multiaddr, MultiaddrError};
pub use pnet::{Psk, PskError};
pub use rcmgr::{FixedLimits, NullResourceManager, ResourceManager, ResourceScope};
pub use registry::{ProtocolId, ProtocolRegistry, RegistryError};
pub use upgrader::Upgrader;

/// 用户构造函数返回的错误类型。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
