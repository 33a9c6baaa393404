//! 角色、产物转换与函数形态的构造器契约。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 构造函数的参数形态各不相同：有的只要宿主，有的要升级器 + 门控 + 私网密钥；
//!   [`Constructor`] 以静态类型描述“函数声明了哪些参数”，取代运行期反射；
//! - 角色（传输/复用器/安全传输）决定允许的参数集合与产物类型，由 [`Role`] 统一描述。
//!
//! ## 逻辑（How）
//! - 通过宏为 0..=8 元的 `Fn(A1, .., An) -> Result<X, E>` 实现 [`Constructor`]：
//!   - [`Constructor::parameters`] 按声明顺序列出每个参数的类型名与类别，供解析阶段校验；
//!   - [`Constructor::construct`] 逐个从 [`BuildContext`] 注入参数并调用函数；
//! - 产物经 [`Produce`] 转换为角色的共享对象（`Arc<dyn Transport>` 等）。
//!
//! ## 契约（What）
//! - 返回值必须是 `Result<X, E>`，`X` 实现角色能力 trait，`E: Into<BoxError>`；
//!   返回形态错误在编译期即被拒绝，不存在运行期的返回值校验；
//! - 参数类型必须实现 [`Injectable`]；是否被当前角色允许在解析阶段判定。

use core::marker::PhantomData;
use std::sync::Arc;

use spark_p2p_core::{BoxError, Multiplexer, SecurityTransport, Transport};

use super::{
    category::{ArgCategory, ArgTypeSet, MUXER_ARGS, SECURITY_ARGS, TRANSPORT_ARGS},
    inject::{BuildContext, Injectable},
};

/// 装配角色。
pub trait Role: Send + Sync + 'static {
    /// 角色产物的共享对象类型。
    type Object: ?Sized + Send + Sync + 'static;

    /// 日志与错误中使用的角色名。
    const LABEL: &'static str;

    /// 角色允许的参数类别。
    const PERMITTED: ArgTypeSet;
}

/// 传输角色。
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportRole;

/// 流复用器角色。
#[derive(Clone, Copy, Debug, Default)]
pub struct MuxerRole;

/// 安全传输角色。
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityRole;

impl Role for TransportRole {
    type Object = dyn Transport;
    const LABEL: &'static str = "transport";
    const PERMITTED: ArgTypeSet = TRANSPORT_ARGS;
}

impl Role for MuxerRole {
    type Object = dyn Multiplexer;
    const LABEL: &'static str = "muxer";
    const PERMITTED: ArgTypeSet = MUXER_ARGS;
}

impl Role for SecurityRole {
    type Object = dyn SecurityTransport;
    const LABEL: &'static str = "security";
    const PERMITTED: ArgTypeSet = SECURITY_ARGS;
}

/// 构造函数产物到角色对象的转换。
pub trait Produce<R: Role> {
    /// 包装为共享对象。
    fn into_object(self) -> Arc<R::Object>;
}

impl<X: Transport> Produce<TransportRole> for X {
    fn into_object(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }
}

impl<X: Multiplexer> Produce<MuxerRole> for X {
    fn into_object(self) -> Arc<dyn Multiplexer> {
        Arc::new(self)
    }
}

impl<X: SecurityTransport> Produce<SecurityRole> for X {
    fn into_object(self) -> Arc<dyn SecurityTransport> {
        Arc::new(self)
    }
}

/// 构造函数声明的单个参数。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Parameter {
    /// 参数位置，从 0 开始。
    pub index: usize,
    /// 参数类型名，仅用于诊断。
    pub type_name: &'static str,
    /// 参数类型声明的类别。
    pub categories: &'static [ArgCategory],
}

impl Parameter {
    /// 描述类型 `T` 位于 `index` 处的参数。
    pub fn of<T: Injectable>(index: usize) -> Self {
        Self {
            index,
            type_name: core::any::type_name::<T>(),
            categories: T::CATEGORIES,
        }
    }
}

/// 函数形态的构造器。
///
/// `Args` 为参数类型元组，仅用于区分不同元数的实现。
pub trait Constructor<R: Role, Args>: Send + Sync + 'static {
    /// 按声明顺序列出参数。
    fn parameters() -> Vec<Parameter>;

    /// 注入参数并调用构造函数。
    fn construct(&self, ctx: &BuildContext) -> Result<Arc<R::Object>, BoxError>;
}

macro_rules! impl_constructor {
    ($($ty:ident),*) => {
        impl<R, F, X, E, $($ty,)*> Constructor<R, ($($ty,)*)> for F
        where
            R: Role,
            F: Fn($($ty),*) -> Result<X, E> + Send + Sync + 'static,
            X: Produce<R>,
            E: Into<BoxError>,
            $($ty: Injectable,)*
        {
            fn parameters() -> Vec<Parameter> {
                #[allow(unused_mut)]
                let mut parameters = Vec::new();
                $(
                    let index = parameters.len();
                    parameters.push(Parameter::of::<$ty>(index));
                )*
                parameters
            }

            #[allow(non_snake_case, unused_variables)]
            fn construct(&self, ctx: &BuildContext) -> Result<Arc<R::Object>, BoxError> {
                $(
                    let $ty = <$ty as Injectable>::inject(ctx)?;
                )*
                let value = (self)($($ty),*).map_err(Into::into)?;
                Ok(value.into_object())
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

/// 擦除 `Args` 后的构造器，便于以 trait 对象存储。
pub(crate) trait ErasedConstructor<R: Role>: Send + Sync {
    fn construct(&self, ctx: &BuildContext) -> Result<Arc<R::Object>, BoxError>;
}

pub(crate) struct FnConstructor<F, Args> {
    func: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> FnConstructor<F, Args> {
    pub(crate) fn new(func: F) -> Self {
        Self {
            func,
            _args: PhantomData,
        }
    }
}

impl<R, F, Args> ErasedConstructor<R> for FnConstructor<F, Args>
where
    R: Role,
    F: Constructor<R, Args>,
    Args: 'static,
{
    fn construct(&self, ctx: &BuildContext) -> Result<Arc<R::Object>, BoxError> {
        self.func.construct(ctx)
    }
}
