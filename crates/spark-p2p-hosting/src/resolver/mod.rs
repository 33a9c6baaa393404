//! 构造器解析：把“现成实例或任意形态的构造函数”规整为统一的可调用对象。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 宿主配置阶段接收的构造器形态各异，装配流程却只希望面对一种接口：
//!   “给我上下文，还你产物或错误”；
//! - 参数形态的校验必须在登记时一次性完成，让配置错误在任何网络活动开始之前暴露。
//!
//! ## 逻辑（How）
//! 1. [`ConstructorSpec::Instance`]：已构造的实例直接包装为“忽略上下文、原样返回”的解析结果，
//!    实例永远不会被再次调用或修改；
//! 2. [`ConstructorSpec::function`]：记录函数声明的参数列表，[`ConstructorSpec::resolve`]
//!    逐个检查类别是否被角色允许、是否歧义、是否与前面的参数重复绑定；
//! 3. 校验通过后生成 [`ResolvedConstructor`]，其 `invoke` 只注入函数声明过的参数，顺序与声明一致。
//!
//! ## 契约（What）
//! - 解析失败返回 [`ShapeError`]，不产出任何解析结果；
//! - 解析结果可廉价克隆，内部以 `Arc` 共享；
//! - 解析本身是同步、无副作用的。

pub mod category;
pub mod constructor;
pub mod inject;

use core::fmt;
use std::sync::Arc;

use spark_p2p_core::BoxError;
use tracing::debug;

use crate::error::ShapeError;

pub use category::{ArgCategory, ArgTypeSet, MUXER_ARGS, SECURITY_ARGS, TRANSPORT_ARGS};
pub use constructor::{
    Constructor, MuxerRole, Parameter, Produce, Role, SecurityRole, TransportRole,
};
pub use inject::{BuildContext, InjectError, Injectable};

use constructor::{ErasedConstructor, FnConstructor};

/// 解析通过后绑定到具体类别的参数。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BoundParameter {
    /// 参数位置。
    pub index: usize,
    /// 参数类型名。
    pub type_name: &'static str,
    /// 绑定到的类别。
    pub category: ArgCategory,
}

/// 尚未解析的构造器：现成实例或函数。
pub enum ConstructorSpec<R: Role> {
    /// 已构造的实例。
    Instance(Arc<R::Object>),
    /// 函数及其声明的参数。
    Function {
        /// 声明顺序的参数列表。
        parameters: Vec<Parameter>,
        /// 擦除参数元组后的函数。
        func: FunctionHandle<R>,
    },
}

/// 擦除后的构造函数句柄。
pub struct FunctionHandle<R: Role>(Arc<dyn ErasedConstructor<R>>);

impl<R: Role> Clone for FunctionHandle<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R: Role> fmt::Debug for ConstructorSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorSpec::Instance(_) => f
                .debug_tuple("ConstructorSpec::Instance")
                .field(&R::LABEL)
                .finish(),
            ConstructorSpec::Function { parameters, .. } => f
                .debug_struct("ConstructorSpec::Function")
                .field("role", &R::LABEL)
                .field("parameters", parameters)
                .finish(),
        }
    }
}

impl<R: Role> ConstructorSpec<R> {
    /// 包装现成实例。
    pub fn instance(instance: Arc<R::Object>) -> Self {
        ConstructorSpec::Instance(instance)
    }

    /// 包装构造函数，记录其参数声明。
    pub fn function<Args, F>(func: F) -> Self
    where
        F: Constructor<R, Args>,
        Args: 'static,
    {
        ConstructorSpec::Function {
            parameters: F::parameters(),
            func: FunctionHandle(Arc::new(FnConstructor::<F, Args>::new(func))),
        }
    }

    /// 校验参数形态并生成统一的可调用对象。
    pub fn resolve(self) -> Result<ResolvedConstructor<R>, ShapeError> {
        match self {
            ConstructorSpec::Instance(instance) => {
                debug!(role = R::LABEL, "resolved pre-built instance");
                Ok(ResolvedConstructor {
                    inner: Resolved::Instance(instance),
                })
            }
            ConstructorSpec::Function { parameters, func } => {
                let plan = bind_parameters::<R>(&parameters)?;
                debug!(
                    role = R::LABEL,
                    plan = ?plan.iter().map(|p| p.category.as_str()).collect::<Vec<_>>(),
                    "resolved constructor function"
                );
                Ok(ResolvedConstructor {
                    inner: Resolved::Function {
                        plan: plan.into(),
                        func: func.0,
                    },
                })
            }
        }
    }
}

/// 解析一个现成实例。
pub fn resolve_instance<R: Role>(instance: Arc<R::Object>) -> ResolvedConstructor<R> {
    ResolvedConstructor {
        inner: Resolved::Instance(instance),
    }
}

/// 解析一个构造函数。
pub fn resolve_fn<R, Args, F>(func: F) -> Result<ResolvedConstructor<R>, ShapeError>
where
    R: Role,
    F: Constructor<R, Args>,
    Args: 'static,
{
    ConstructorSpec::<R>::function(func).resolve()
}

/// 逐个参数校验并绑定类别。
///
/// - 无任何允许类别：[`ShapeError::UnexpectedArgument`]；
/// - 命中多个允许类别：[`ShapeError::AmbiguousArgument`]；
/// - 与前面的参数绑定到同一类别：[`ShapeError::DuplicateArgument`]。
fn bind_parameters<R: Role>(parameters: &[Parameter]) -> Result<Vec<BoundParameter>, ShapeError> {
    let permitted = R::PERMITTED;
    let mut bound: Vec<BoundParameter> = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        let matches: Vec<ArgCategory> = parameter
            .categories
            .iter()
            .copied()
            .filter(|category| permitted.contains(*category))
            .collect();
        let category = match matches.as_slice() {
            [] => {
                return Err(ShapeError::UnexpectedArgument {
                    role: R::LABEL,
                    index: parameter.index,
                    type_name: parameter.type_name,
                });
            }
            [single] => *single,
            _ => {
                return Err(ShapeError::AmbiguousArgument {
                    role: R::LABEL,
                    index: parameter.index,
                    type_name: parameter.type_name,
                    candidates: matches,
                });
            }
        };
        if let Some(first) = bound.iter().find(|p| p.category == category) {
            return Err(ShapeError::DuplicateArgument {
                role: R::LABEL,
                index: parameter.index,
                first: first.index,
                type_name: parameter.type_name,
                category,
            });
        }
        bound.push(BoundParameter {
            index: parameter.index,
            type_name: parameter.type_name,
            category,
        });
    }
    Ok(bound)
}

enum Resolved<R: Role> {
    Instance(Arc<R::Object>),
    Function {
        plan: Arc<[BoundParameter]>,
        func: Arc<dyn ErasedConstructor<R>>,
    },
}

impl<R: Role> Clone for Resolved<R> {
    fn clone(&self) -> Self {
        match self {
            Resolved::Instance(instance) => Resolved::Instance(Arc::clone(instance)),
            Resolved::Function { plan, func } => Resolved::Function {
                plan: Arc::clone(plan),
                func: Arc::clone(func),
            },
        }
    }
}

/// 统一形态的构造器。
pub struct ResolvedConstructor<R: Role> {
    inner: Resolved<R>,
}

impl<R: Role> Clone for ResolvedConstructor<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Role> fmt::Debug for ResolvedConstructor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConstructor")
            .field("role", &R::LABEL)
            .field("instance", &self.is_instance())
            .field("parameters", &self.parameters())
            .finish()
    }
}

impl<R: Role> ResolvedConstructor<R> {
    /// 调用构造器。实例形态直接返回同一个 `Arc`。
    pub fn invoke(&self, ctx: &BuildContext) -> Result<Arc<R::Object>, BoxError> {
        match &self.inner {
            Resolved::Instance(instance) => Ok(Arc::clone(instance)),
            Resolved::Function { func, .. } => func.construct(ctx),
        }
    }

    /// 是否为现成实例。
    pub fn is_instance(&self) -> bool {
        matches!(self.inner, Resolved::Instance(_))
    }

    /// 绑定后的参数计划；实例形态为空。
    pub fn parameters(&self) -> &[BoundParameter] {
        match &self.inner {
            Resolved::Instance(_) => &[],
            Resolved::Function { plan, .. } => &plan[..],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use spark_p2p_core::{
        ConnectionGater, Host, LocalHost, Multiaddr, Multiplexer, Network, PeerId, PeerStore,
        PrivateKey, Psk, Transport, Upgrader,
    };

    use super::*;

    struct Named(&'static str);

    impl Multiplexer for Named {
        fn kind(&self) -> &str {
            self.0
        }
    }

    impl Transport for Named {
        fn protocols(&self) -> &[&'static str] {
            &["mem"]
        }

        fn can_dial(&self, addr: &Multiaddr) -> bool {
            addr.has_protocol("memory")
        }
    }

    fn host() -> Arc<dyn Host> {
        let key = PrivateKey::from_secret(b"resolver".to_vec()).expect("非空私钥");
        Arc::new(LocalHost::new(key, Vec::new()))
    }

    #[test]
    fn zero_argument_functions_resolve_with_an_empty_plan() {
        let resolved = resolve_fn::<MuxerRole, _, _>(|| Ok::<_, BoxError>(Named("noop")))
            .expect("零参数构造函数应解析成功");
        assert!(!resolved.is_instance());
        assert!(resolved.parameters().is_empty());
        let muxer = resolved
            .invoke(&BuildContext::new(host()))
            .expect("构造函数不会失败");
        assert_eq!(muxer.kind(), "noop");
    }

    #[test]
    fn arguments_are_supplied_in_declared_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let resolved = resolve_fn::<MuxerRole, _, _>(
            move |store: Arc<dyn PeerStore>, id: PeerId, _net: Arc<dyn Network>| {
                record
                    .lock()
                    .expect("锁未中毒")
                    .push((id, store.private_key(&id).is_some()));
                Ok::<_, BoxError>(Named("ordered"))
            },
        )
        .expect("复用器允许地址簿、节点标识与网络");

        let categories: Vec<ArgCategory> =
            resolved.parameters().iter().map(|p| p.category).collect();
        assert_eq!(
            categories,
            [
                ArgCategory::PeerStore,
                ArgCategory::PeerId,
                ArgCategory::Network
            ]
        );

        let host = host();
        resolved
            .invoke(&BuildContext::new(Arc::clone(&host)))
            .expect("构造函数不会失败");
        assert_eq!(*seen.lock().expect("锁未中毒"), vec![(host.id(), true)]);
    }

    #[test]
    fn muxers_may_not_request_transport_only_values() {
        let err = resolve_fn::<MuxerRole, _, _>(|_host: Arc<dyn Host>, _u: Arc<Upgrader>| {
            Ok::<_, BoxError>(Named("bad"))
        })
        .expect_err("复用器不允许注入升级器");
        assert!(matches!(
            err,
            ShapeError::UnexpectedArgument {
                role: "muxer",
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn the_same_category_cannot_be_bound_twice() {
        let err = resolve_fn::<TransportRole, _, _>(
            |_a: Arc<dyn ConnectionGater>, _psk: Option<Psk>, _b: Arc<dyn ConnectionGater>| {
                Ok::<_, BoxError>(Named("dup"))
            },
        )
        .expect_err("同一类别重复出现应被拒绝");
        assert!(matches!(
            err,
            ShapeError::DuplicateArgument {
                index: 2,
                first: 0,
                category: ArgCategory::ConnectionGater,
                ..
            }
        ));
    }

    struct KeyMaterial;

    impl Injectable for KeyMaterial {
        const CATEGORIES: &'static [ArgCategory] =
            &[ArgCategory::PrivateKey, ArgCategory::PublicKey];

        fn inject(_ctx: &BuildContext) -> Result<Self, InjectError> {
            Ok(KeyMaterial)
        }
    }

    #[test]
    fn types_matching_several_permitted_categories_are_ambiguous() {
        let err = resolve_fn::<TransportRole, _, _>(|_k: KeyMaterial| Ok::<_, BoxError>(Named("k")))
            .expect_err("同时命中私钥与公钥类别应视为歧义");
        match err {
            ShapeError::AmbiguousArgument { candidates, .. } => assert_eq!(
                candidates,
                [ArgCategory::PrivateKey, ArgCategory::PublicKey]
            ),
            other => panic!("意外的错误: {other:?}"),
        }

        // 复用器角色只允许其中零个类别，因此报告为非法参数而非歧义。
        let err = resolve_fn::<MuxerRole, _, _>(|_k: KeyMaterial| Ok::<_, BoxError>(Named("k")))
            .expect_err("复用器不允许密钥类别");
        assert!(matches!(err, ShapeError::UnexpectedArgument { .. }));
    }

    #[test]
    fn instances_are_returned_without_copying() {
        let instance: Arc<dyn Multiplexer> = Arc::new(Named("shared"));
        let resolved = ConstructorSpec::<MuxerRole>::instance(Arc::clone(&instance))
            .resolve()
            .expect("实例总能解析");
        assert!(resolved.is_instance());
        let produced = resolved
            .invoke(&BuildContext::new(host()))
            .expect("实例形态不会失败");
        assert!(Arc::ptr_eq(&produced, &instance));
    }
}
