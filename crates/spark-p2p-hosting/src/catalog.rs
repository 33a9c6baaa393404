//! 构造器目录：`configure_*` 闭包登记构造器的地方。

use std::sync::Arc;

use spark_p2p_core::ProtocolId;
use tracing::debug;

use crate::{
    aggregate::IdentifiedConstructor,
    error::{AssemblyError, ShapeError},
    resolver::{Constructor, ConstructorSpec, Role},
};

/// 某一角色的构造器目录，保持登记顺序。
///
/// # 教案级注释
/// - **意图 (Why)**：构造器形态错误应在登记时立即暴露，而不是推迟到 `build`；
///   因此每次登记都会同步解析；
/// - **契约 (What)**：
///   - 目录允许暂存重复标识，重复在装配时由唯一性检查报告，保证错误信息包含两个位置；
///   - [`ConstructorCatalog::select`] 按给定标识重新排序并裁剪条目，未知标识返回错误且不修改目录；
/// - **风险提示 (Trade-offs)**：条目以 `Vec` 保存，查找为线性扫描；目录规模通常只有个位数。
pub struct ConstructorCatalog<R: Role> {
    entries: Vec<IdentifiedConstructor<R>>,
}

impl<R: Role> Default for ConstructorCatalog<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R: Role> Clone for ConstructorCatalog<R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<R: Role> core::fmt::Debug for ConstructorCatalog<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConstructorCatalog")
            .field("role", &R::LABEL)
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

impl<R: Role> ConstructorCatalog<R> {
    /// 创建空目录。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记构造函数，立即校验参数形态。
    pub fn register<Args, F>(
        &mut self,
        id: impl Into<ProtocolId>,
        constructor: F,
    ) -> Result<&mut Self, ShapeError>
    where
        F: Constructor<R, Args>,
        Args: 'static,
    {
        self.register_spec(id, ConstructorSpec::function(constructor))
    }

    /// 登记现成实例。
    pub fn register_instance(
        &mut self,
        id: impl Into<ProtocolId>,
        instance: Arc<R::Object>,
    ) -> &mut Self {
        let id = id.into();
        debug!(role = R::LABEL, id = %id, "registered instance");
        self.entries.push(IdentifiedConstructor::new(
            id,
            crate::resolver::resolve_instance(instance),
        ));
        self
    }

    /// 登记未解析的构造器。
    pub fn register_spec(
        &mut self,
        id: impl Into<ProtocolId>,
        spec: ConstructorSpec<R>,
    ) -> Result<&mut Self, ShapeError> {
        let id = id.into();
        let resolved = spec.resolve()?;
        debug!(role = R::LABEL, id = %id, "registered constructor");
        self.entries.push(IdentifiedConstructor::new(id, resolved));
        Ok(self)
    }

    /// 只保留给定标识，并按给定顺序排列。
    ///
    /// 若同一标识登记过多次，保留全部同名条目，交由装配时的唯一性检查报告。
    pub fn select<I, S>(&mut self, ids: I) -> Result<(), AssemblyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = Vec::with_capacity(self.entries.len());
        for id in ids {
            let id = id.as_ref();
            let before = selected.len();
            selected.extend(
                self.entries
                    .iter()
                    .filter(|entry| entry.id.as_ref() == id)
                    .cloned(),
            );
            if selected.len() == before {
                return Err(AssemblyError::UnknownProtocol {
                    role: R::LABEL,
                    id: id.to_owned(),
                });
            }
        }
        self.entries = selected;
        Ok(())
    }

    /// 按登记顺序遍历标识。
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_ref())
    }

    /// 已登记的条目。
    pub fn entries(&self) -> &[IdentifiedConstructor<R>] {
        &self.entries
    }

    /// 条目数量。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
