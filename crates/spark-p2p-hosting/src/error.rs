//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义装配流程的错误语义：构造器形态不合法、批次内标识重复、构造函数调用失败、配置加载失败；
//! - 每个错误都携带角色与位置等上下文，运维无需复现即可定位是哪一个构造器出了问题。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`，实现 `Send + Sync + 'static`；
//! - [`AssemblyError`] 聚合全部细分错误，并通过 [`AssemblyError::code`] 暴露稳定的点分错误码，
//!   供日志字段与告警规则使用。

use std::path::PathBuf;

use spark_p2p_core::{BoxError, FilterError, PskError, RegistryError};
use thiserror::Error;

use crate::resolver::ArgCategory;

/// 构造器形态错误，在登记时即被发现。
///
/// # 教案式说明
/// - **意图 (Why)**：构造函数声明的参数必须能被当前角色唯一地满足；
/// - **契约 (What)**：`index` 为出错参数的位置，`type_name` 为其类型名；
/// - **风险 (Trade-offs)**：`type_name` 来自 `core::any::type_name`，格式不保证稳定，只用于人工排障。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ShapeError {
    /// 参数类型不属于该角色允许的任何类别。
    #[error("{role} constructor argument #{index} (`{type_name}`) is not an injectable value for this role")]
    UnexpectedArgument {
        role: &'static str,
        index: usize,
        type_name: &'static str,
    },

    /// 参数类型同时命中多个允许类别。
    #[error("{role} constructor argument #{index} (`{type_name}`) is ambiguous between {candidates:?}")]
    AmbiguousArgument {
        role: &'static str,
        index: usize,
        type_name: &'static str,
        candidates: Vec<ArgCategory>,
    },

    /// 两个参数绑定到同一类别。
    #[error("{role} constructor argument #{index} (`{type_name}`) repeats category {category} already bound by argument #{first}")]
    DuplicateArgument {
        role: &'static str,
        index: usize,
        first: usize,
        type_name: &'static str,
        category: ArgCategory,
    },
}

/// 同一批次中出现重复标识。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("duplicate {role} identifier `{id}` at positions {first} and {second}")]
pub struct DuplicateIdentifierError {
    /// 角色名。
    pub role: &'static str,
    /// 重复的标识。
    pub id: String,
    /// 第一次出现的位置。
    pub first: usize,
    /// 再次出现的位置。
    pub second: usize,
}

/// 构造函数调用失败。
///
/// 原始错误通过 `source` 链保留，调用方可以向下转型检查具体类型。
#[derive(Debug, Error)]
#[error("{role} constructor `{id}` (position {index}) failed: {source}")]
pub struct ConstructorInvocationError {
    /// 角色名。
    pub role: &'static str,
    /// 失败构造器的标识。
    pub id: String,
    /// 失败构造器在批次中的位置。
    pub index: usize,
    /// 构造函数返回的原始错误。
    #[source]
    pub source: BoxError,
}

/// 配置加载错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件或密钥文件失败。
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文本不是合法的 TOML 或字段不匹配。
    #[error("invalid stack configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// 私网密钥格式错误。
    #[error("invalid private network key: {0}")]
    Psk(#[from] PskError),

    /// 地址过滤规则格式错误。
    #[error("invalid address filter `{rule}`: {source}")]
    Filter {
        rule: String,
        #[source]
        source: FilterError,
    },

    /// 同时给出了内联密钥与密钥文件。
    #[error("`psk` and `psk_file` are mutually exclusive")]
    ConflictingPsk,
}

/// 装配流程的统一错误。
///
/// # 教案式说明
/// - **意图 (Why)**：`StackBuilder` 的每一步都可能失败，统一枚举让调用方只需处理一种错误类型；
/// - **执行 (How)**：细分错误经 `From` 自动转换，`?` 即可传播；
/// - **契约 (What)**：[`AssemblyError::code`] 的返回值一经发布即保持稳定。
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// 构造器形态不合法。
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// 批次内标识重复。
    #[error(transparent)]
    DuplicateIdentifier(#[from] DuplicateIdentifierError),

    /// 构造函数调用失败。
    #[error(transparent)]
    Invocation(#[from] ConstructorInvocationError),

    /// 写入注册表失败。
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// 配置引用了未登记的标识。
    #[error("configuration selects unknown {role} `{id}`")]
    UnknownProtocol { role: &'static str, id: String },

    /// 没有任何安全传输且未显式允许明文。
    #[error("no security transport configured; set `insecure = true` to allow plaintext connections")]
    NoSecurity,

    /// 配置加载失败。
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AssemblyError {
    /// 稳定的点分错误码。
    pub fn code(&self) -> &'static str {
        match self {
            AssemblyError::Shape(ShapeError::UnexpectedArgument { .. }) => {
                "assembly.shape.unexpected_argument"
            }
            AssemblyError::Shape(ShapeError::AmbiguousArgument { .. }) => {
                "assembly.shape.ambiguous_argument"
            }
            AssemblyError::Shape(ShapeError::DuplicateArgument { .. }) => {
                "assembly.shape.duplicate_argument"
            }
            AssemblyError::DuplicateIdentifier(_) => "assembly.aggregate.duplicate_identifier",
            AssemblyError::Invocation(_) => "assembly.aggregate.invocation_failed",
            AssemblyError::Registry(_) => "assembly.registry.duplicate",
            AssemblyError::UnknownProtocol { .. } => "assembly.config.unknown_protocol",
            AssemblyError::NoSecurity => "assembly.security.none",
            AssemblyError::Config(_) => "assembly.config.invalid",
        }
    }
}
