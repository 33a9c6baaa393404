use core::fmt;
use std::sync::Arc;

use spark_p2p_core::{
    AddrFilter, AllowAllGater, ConnectionGater, Host, NullResourceManager, Psk, ResourceManager,
    Upgrader,
};
use tracing::{info, warn};

use crate::{
    aggregate::{TransportSet, make_muxers, make_security, make_transports},
    catalog::ConstructorCatalog,
    config::StackConfig,
    error::AssemblyError,
    resolver::{BuildContext, MuxerRole, SecurityRole, TransportRole},
};

/// `StackBuilder` 分阶段装配流复用器、安全传输、升级器与传输。
///
/// # 教案级注释
/// - **设计目标 (Why)**
///   - 传输构造函数往往依赖升级器，升级器依赖安全传输与复用器，安全传输又可能需要读取复用器集合；
///     Builder 固定这一依赖顺序，用户只需登记构造器；
///   - 构造器形态错误在 `configure_*` 阶段即被报告，`build` 只可能因构造函数本身失败或配置不完整而失败。
/// - **体系位置 (Where)**
///   - 属于 `spark-p2p-hosting` crate 的入口类型；
///   - `build` 接收宿主并产生 [`AssembledStack`]，交给运行时负责拨号与监听。
/// - **关键流程 (How)**
///   1. `configure_muxers` / `configure_security` / `configure_transports`：向对应目录登记构造器；
///   2. `with_*`：提供私网密钥、连接门控、资源管理器、地址过滤器；
///   3. `apply_config`：按配置挑选并排序已登记的构造器，载入密钥与过滤规则；
///   4. `build`：复用器 → 安全传输（上下文含复用器集合）→ 升级器 → 传输（上下文含全部值）。
/// - **契约说明 (What)**
///   - 所有配置步骤均返回 `Result<&mut Self, AssemblyError>`，便于链式调用与错误传播；
///   - 没有任何安全传输时，除非显式允许明文，`build` 返回 [`AssemblyError::NoSecurity`]，
///     且不会调用任何构造函数。
/// - **风险提示 (Trade-offs)**
///   - 构造函数在 `build` 的调用线程上同步执行，若其中包含耗时操作需注意不要阻塞启动流程；
///   - 未设置门控与资源管理器时分别使用放行一切的 [`AllowAllGater`] 与不设限的 [`NullResourceManager`]。
pub struct StackBuilder {
    muxers: ConstructorCatalog<MuxerRole>,
    security: ConstructorCatalog<SecurityRole>,
    transports: ConstructorCatalog<TransportRole>,
    psk: Option<Psk>,
    gater: Arc<dyn ConnectionGater>,
    resource_manager: Arc<dyn ResourceManager>,
    addr_filter: AddrFilter,
    insecure: bool,
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self {
            muxers: ConstructorCatalog::new(),
            security: ConstructorCatalog::new(),
            transports: ConstructorCatalog::new(),
            psk: None,
            gater: Arc::new(AllowAllGater),
            resource_manager: Arc::new(NullResourceManager),
            addr_filter: AddrFilter::new(),
            insecure: false,
        }
    }
}

impl fmt::Debug for StackBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuilder")
            .field("muxers", &self.muxers)
            .field("security", &self.security)
            .field("transports", &self.transports)
            .field("psk", &self.psk)
            .field("addr_filter", &self.addr_filter)
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}

impl StackBuilder {
    /// 创建空的 Builder。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记流复用器构造器。
    ///
    /// # 教案级注释
    /// - **输入参数**：`configure` 闭包接收复用器目录的可变引用；
    /// - **执行逻辑 (How)**：立即执行闭包，登记时即完成参数形态校验，错误经 `?` 转换为 [`AssemblyError`]；
    /// - **返回值 (What)**：链式返回 `&mut Self`。
    pub fn configure_muxers<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut ConstructorCatalog<MuxerRole>) -> Result<(), AssemblyError>,
    {
        configure(&mut self.muxers)?;
        Ok(self)
    }

    /// 登记安全传输构造器。
    ///
    /// 安全传输构造函数可以声明 `ProtocolRegistry<dyn Multiplexer>` 参数，读取已装配的复用器集合。
    pub fn configure_security<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut ConstructorCatalog<SecurityRole>) -> Result<(), AssemblyError>,
    {
        configure(&mut self.security)?;
        Ok(self)
    }

    /// 登记传输构造器。
    pub fn configure_transports<F>(&mut self, configure: F) -> Result<&mut Self, AssemblyError>
    where
        F: FnOnce(&mut ConstructorCatalog<TransportRole>) -> Result<(), AssemblyError>,
    {
        configure(&mut self.transports)?;
        Ok(self)
    }

    /// 启用私有网络。
    pub fn with_psk(&mut self, psk: Psk) -> &mut Self {
        self.psk = Some(psk);
        self
    }

    /// 设置连接门控。
    pub fn with_connection_gater(&mut self, gater: Arc<dyn ConnectionGater>) -> &mut Self {
        self.gater = gater;
        self
    }

    /// 设置资源管理器。
    pub fn with_resource_manager(&mut self, resource_manager: Arc<dyn ResourceManager>) -> &mut Self {
        self.resource_manager = resource_manager;
        self
    }

    /// 设置地址过滤器，替换此前的规则。
    pub fn with_addr_filter(&mut self, filter: AddrFilter) -> &mut Self {
        self.addr_filter = filter;
        self
    }

    /// 允许在没有安全传输时建立明文连接。
    pub fn allow_insecure(&mut self, insecure: bool) -> &mut Self {
        self.insecure = insecure;
        self
    }

    /// 按配置挑选构造器，并载入密钥与过滤规则。
    ///
    /// # 教案级注释
    /// - **执行逻辑 (How)**：先在副本上完成全部挑选与解析，全部成功后才写回 Builder；
    /// - **契约 (What)**：
    ///   - 任一列表引用未登记的标识时返回 [`AssemblyError::UnknownProtocol`]，Builder 保持原状；
    ///   - 配置中的密钥覆盖此前通过 [`StackBuilder::with_psk`] 设置的值，未配置时保留原值；
    ///   - 配置中的过滤规则追加到现有规则之后；`insecure` 只能被配置打开，不会被关闭。
    pub fn apply_config(&mut self, config: &StackConfig) -> Result<&mut Self, AssemblyError> {
        let mut muxers = self.muxers.clone();
        let mut security = self.security.clone();
        let mut transports = self.transports.clone();
        if !config.muxers.is_empty() {
            muxers.select(&config.muxers)?;
        }
        if !config.security.is_empty() {
            security.select(&config.security)?;
        }
        if !config.transports.is_empty() {
            transports.select(&config.transports)?;
        }
        let psk = config.resolve_psk()?;
        let mut addr_filter = self.addr_filter.clone();
        for prefix in config.addr_filter()?.prefixes() {
            addr_filter.deny(*prefix);
        }

        self.muxers = muxers;
        self.security = security;
        self.transports = transports;
        if psk.is_some() {
            self.psk = psk;
        }
        self.addr_filter = addr_filter;
        self.insecure |= config.insecure;
        Ok(self)
    }

    /// 装配完整的协议栈。
    ///
    /// # 教案级注释
    /// - **执行步骤**
    ///   1. 检查安全传输是否为空；为空且未允许明文时立即失败；
    ///   2. 以仅含宿主的上下文构造复用器；
    ///   3. 追加复用器集合后构造安全传输；
    ///   4. 以安全传输、复用器、密钥、门控与资源管理器组装 [`Upgrader`]；
    ///   5. 以完整上下文构造传输，并附带地址过滤器。
    /// - **前置条件**：`host` 的地址簿中登记了本节点密钥（[`spark_p2p_core::LocalHost`] 会自动登记）；
    /// - **后置条件**：任何一步失败都不会返回部分结果。
    pub fn build(self, host: Arc<dyn Host>) -> Result<AssembledStack, AssemblyError> {
        let StackBuilder {
            muxers,
            security,
            transports,
            psk,
            gater,
            resource_manager,
            addr_filter,
            insecure,
        } = self;

        if security.is_empty() {
            if !insecure {
                warn!(code = "assembly.security.none", "refusing to build without security");
                return Err(AssemblyError::NoSecurity);
            }
            warn!(peer = %host.id(), "building an insecure stack: connections will be plaintext");
        }

        let ctx = BuildContext::new(Arc::clone(&host));
        let muxer_registry = make_muxers(&ctx, muxers.entries())?;

        let ctx = ctx.with_muxers(muxer_registry.clone());
        let security_registry = make_security(&ctx, security.entries())?;

        let upgrader = Arc::new(Upgrader::new(
            security_registry.clone(),
            muxer_registry,
            psk,
            Arc::clone(&gater),
            Arc::clone(&resource_manager),
        ));

        let ctx = ctx
            .with_security(security_registry)
            .with_upgrader(Arc::clone(&upgrader))
            .with_gater(gater)
            .with_psk(psk)
            .with_resource_manager(resource_manager)
            .with_addr_filter(addr_filter.clone());
        let transports = make_transports(&ctx, transports.entries(), addr_filter)?;

        let fingerprint = psk.map(|key| key.fingerprint());
        info!(
            peer = %host.id(),
            muxers = ?upgrader.muxers().ids().collect::<Vec<_>>(),
            security = ?upgrader.security().ids().collect::<Vec<_>>(),
            transports = ?transports.transports().ids().collect::<Vec<_>>(),
            psk = fingerprint.as_deref().unwrap_or("none"),
            "assembled stack"
        );

        Ok(AssembledStack {
            host,
            upgrader,
            transports,
        })
    }
}

/// 装配产物。
#[derive(Clone)]
pub struct AssembledStack {
    host: Arc<dyn Host>,
    upgrader: Arc<Upgrader>,
    transports: TransportSet,
}

impl fmt::Debug for AssembledStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledStack")
            .field("peer", &self.host.id())
            .field("upgrader", &self.upgrader)
            .field("transports", &self.transports)
            .finish()
    }
}

impl AssembledStack {
    /// 宿主。
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// 升级器。
    pub fn upgrader(&self) -> &Arc<Upgrader> {
        &self.upgrader
    }

    /// 传输集合。
    pub fn transports(&self) -> &TransportSet {
        &self.transports
    }
}
