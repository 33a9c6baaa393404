#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

//! # spark-p2p-hosting
//!
//! ## 定位与职责（Why）
//! - 把用户登记的传输、流复用器与安全传输构造器装配成可用的点对点协议栈；
//! - 构造器可以是现成实例，也可以是只声明部分依赖的函数：装配流程按参数类型注入宿主、
//!   升级器、门控、私网密钥等值，并在登记时拒绝无法满足的参数声明。
//!
//! ## 架构嵌入（Where）
//! - `resolver`：参数类别、装配上下文与构造器解析；
//! - `aggregate`：批量构造、唯一性检查与按地址选路的 [`TransportSet`]；
//! - `catalog`/`builder`/`config`：面向使用者的登记入口、分阶段装配与声明式配置；
//! - `error`：统一错误与稳定错误码。
//!
//! ## 使用示例（How）
//! ```ignore
//! let mut builder = StackBuilder::new();
//! builder
//!     .configure_muxers(|c| { c.register("/yamux/1.0.0", || Ok::<_, BoxError>(Yamux))?; Ok(()) })?
//!     .configure_security(|c| { c.register("/noise", Noise::new)?; Ok(()) })?
//!     .configure_transports(|c| { c.register("/tcp", TcpTransport::new)?; Ok(()) })?
//!     .apply_config(&StackConfig::from_path("stack.toml")?)?;
//! let stack = builder.build(host)?;
//! ```
//!
//! ## 风险提示（Trade-offs）
//! - 装配是一次性的同步过程，产物创建后不可修改；需要热更新时应重新装配整个协议栈。

pub mod aggregate;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod resolver;

pub use aggregate::{
    IdentifiedConstructor, TransportSet, aggregate, check_unique, invoke_all, make_muxers,
    make_security, make_transports,
};
pub use builder::{AssembledStack, StackBuilder};
pub use catalog::ConstructorCatalog;
pub use config::StackConfig;
pub use error::{
    AssemblyError, ConfigError, ConstructorInvocationError, DuplicateIdentifierError, ShapeError,
};
pub use resolver::{
    ArgCategory, ArgTypeSet, BoundParameter, BuildContext, Constructor, ConstructorSpec,
    InjectError, Injectable, MuxerRole, Produce, ResolvedConstructor, Role, SecurityRole,
    TransportRole, resolve_fn, resolve_instance,
};
