//! 批量调用构造器，并把产物组织成按标识索引的集合。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 宿主需要“一次性”得到全部传输、复用器或安全传输；任何一个构造失败都意味着配置不可用，
//!   因此批量构造采用快速失败语义，不返回部分结果；
//! - 标识重复属于纯配置错误，必须在调用任何构造函数之前发现，避免构造函数的副作用
//!   （例如绑定端口）在注定失败的批次中发生。
//!
//! ## 逻辑（How）
//! 1. [`check_unique`]：一次 `HashSet` 扫描，遇到第一个重复标识即返回 [`DuplicateIdentifierError`]；
//! 2. [`invoke_all`]：按批次顺序调用，第一个失败即中止，错误携带标识与位置；
//! 3. [`aggregate`]：组合以上两步，并把产物写入保持顺序的 [`ProtocolRegistry`]。
//!
//! ## 契约（What）
//! - 空批次返回空集合，不视为错误；
//! - 输出集合的迭代顺序与批次顺序一致，复用器与安全传输的协商偏好由此决定；
//! - 构造函数在调用线程上同步执行，不引入额外并发。

use std::collections::HashMap;
use std::sync::Arc;

use spark_p2p_core::{
    AddrFilter, Multiaddr, Multiplexer, ProtocolId, ProtocolRegistry, SecurityTransport,
    Transport,
};
use tracing::{info, warn};

use crate::{
    error::{AssemblyError, ConstructorInvocationError, DuplicateIdentifierError},
    resolver::{BuildContext, MuxerRole, ResolvedConstructor, Role, SecurityRole, TransportRole},
};

/// 带标识的已解析构造器。
pub struct IdentifiedConstructor<R: Role> {
    /// 协议标识。
    pub id: ProtocolId,
    /// 已解析的构造器。
    pub constructor: ResolvedConstructor<R>,
}

impl<R: Role> IdentifiedConstructor<R> {
    /// 组合标识与构造器。
    pub fn new(id: impl Into<ProtocolId>, constructor: ResolvedConstructor<R>) -> Self {
        Self {
            id: id.into(),
            constructor,
        }
    }
}

impl<R: Role> Clone for IdentifiedConstructor<R> {
    fn clone(&self) -> Self {
        Self {
            id: Arc::clone(&self.id),
            constructor: self.constructor.clone(),
        }
    }
}

impl<R: Role> core::fmt::Debug for IdentifiedConstructor<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentifiedConstructor")
            .field("id", &self.id)
            .field("constructor", &self.constructor)
            .finish()
    }
}

/// 检查批次内标识唯一，不调用任何构造函数。
pub fn check_unique<R: Role>(
    batch: &[IdentifiedConstructor<R>],
) -> Result<(), DuplicateIdentifierError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(batch.len());
    for (index, entry) in batch.iter().enumerate() {
        if let Some(first) = seen.insert(entry.id.as_ref(), index) {
            warn!(
                role = R::LABEL,
                id = %entry.id,
                code = "assembly.aggregate.duplicate_identifier",
                "duplicate identifier in batch"
            );
            return Err(DuplicateIdentifierError {
                role: R::LABEL,
                id: entry.id.to_string(),
                first,
                second: index,
            });
        }
    }
    Ok(())
}

/// 按顺序调用批次中的构造器，第一个失败即中止。
pub fn invoke_all<R: Role>(
    ctx: &BuildContext,
    batch: &[IdentifiedConstructor<R>],
) -> Result<Vec<(ProtocolId, Arc<R::Object>)>, ConstructorInvocationError> {
    let mut produced = Vec::with_capacity(batch.len());
    for (index, entry) in batch.iter().enumerate() {
        match entry.constructor.invoke(ctx) {
            Ok(object) => produced.push((Arc::clone(&entry.id), object)),
            Err(source) => {
                warn!(
                    role = R::LABEL,
                    id = %entry.id,
                    index,
                    code = "assembly.aggregate.invocation_failed",
                    error = %source,
                    "constructor failed"
                );
                return Err(ConstructorInvocationError {
                    role: R::LABEL,
                    id: entry.id.to_string(),
                    index,
                    source,
                });
            }
        }
    }
    Ok(produced)
}

/// 校验唯一性、调用全部构造器，并按批次顺序登记产物。
pub fn aggregate<R: Role>(
    ctx: &BuildContext,
    batch: &[IdentifiedConstructor<R>],
) -> Result<ProtocolRegistry<R::Object>, AssemblyError> {
    check_unique(batch)?;
    let mut registry = ProtocolRegistry::new();
    for (id, object) in invoke_all(ctx, batch)? {
        registry.insert(id, object)?;
    }
    info!(
        role = R::LABEL,
        count = registry.len(),
        ids = ?registry.ids().collect::<Vec<_>>(),
        "aggregated constructors"
    );
    Ok(registry)
}

/// 构造全部流复用器。
pub fn make_muxers(
    ctx: &BuildContext,
    batch: &[IdentifiedConstructor<MuxerRole>],
) -> Result<ProtocolRegistry<dyn Multiplexer>, AssemblyError> {
    aggregate(ctx, batch)
}

/// 构造全部安全传输。
pub fn make_security(
    ctx: &BuildContext,
    batch: &[IdentifiedConstructor<SecurityRole>],
) -> Result<ProtocolRegistry<dyn SecurityTransport>, AssemblyError> {
    aggregate(ctx, batch)
}

/// 构造全部传输，并附带地址过滤器以便按地址选路。
pub fn make_transports(
    ctx: &BuildContext,
    batch: &[IdentifiedConstructor<TransportRole>],
    filter: AddrFilter,
) -> Result<TransportSet, AssemblyError> {
    let registry = aggregate(ctx, batch)?;
    Ok(TransportSet { registry, filter })
}

/// 已装配的传输集合。
///
/// # 教案式说明
/// - **意图 (Why)**：拨号时需要“给定地址选出一个传输”，集合同时持有地址过滤器，
///   被过滤的地址不会匹配任何传输；
/// - **契约 (What)**：[`TransportSet::for_addr`] 按登记顺序返回第一个能拨号的传输。
#[derive(Clone, Debug, Default)]
pub struct TransportSet {
    registry: ProtocolRegistry<dyn Transport>,
    filter: AddrFilter,
}

impl TransportSet {
    /// 为地址选择传输。
    pub fn for_addr(&self, addr: &Multiaddr) -> Option<&Arc<dyn Transport>> {
        if self.filter.denies(addr) {
            return None;
        }
        self.registry
            .iter()
            .map(|(_, transport)| transport)
            .find(|transport| transport.can_dial(addr))
    }

    /// 按标识查找。
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Transport>> {
        self.registry.get(id)
    }

    /// 按登记顺序遍历。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Transport>)> {
        self.registry.iter()
    }

    /// 传输数量。
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 底层注册表。
    pub fn transports(&self) -> &ProtocolRegistry<dyn Transport> {
        &self.registry
    }

    /// 地址过滤器。
    pub fn filter(&self) -> &AddrFilter {
        &self.filter
    }
}
