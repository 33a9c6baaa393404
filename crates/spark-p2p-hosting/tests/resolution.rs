//! 构造器解析的端到端行为。
//!
//! # 教案级注释
//! - **核心目标 (Why)**：验证解析结果只注入构造函数声明的参数、按声明顺序注入，
//!   现成实例原样返回，以及非法参数声明在登记时即被拒绝；
//! - **结构说明 (How)**：每个测试以 [`LocalHost`] 为根输入，手工拼装传输阶段的完整 [`BuildContext`]，
//!   构造函数通过共享的 `Mutex` 记录实际收到的值；
//! - **合同与边界 (What)**：测试不经过 `StackBuilder`，只覆盖 `resolver` 模块的公开接口。

use std::sync::{Arc, Mutex};

use spark_p2p_core::{
    AddrFilter, BoxError, ConnectionGater, DenyPeersGater, FixedLimits, Host, LocalHost,
    Multiaddr, Multiplexer, PeerId, PrivateKey, ProtocolRegistry, Psk, PublicKey,
    ResourceManager, ResourceScope, SecurityTransport, Transport, Upgrader,
};
use spark_p2p_hosting::{
    ArgCategory, BuildContext, ConstructorSpec, InjectError, MuxerRole, SecurityRole, ShapeError,
    TransportRole, resolve_fn,
};

struct Probe;

impl Transport for Probe {
    fn protocols(&self) -> &[&'static str] {
        &["probe"]
    }

    fn can_dial(&self, _addr: &Multiaddr) -> bool {
        false
    }
}

struct Plain(PeerId);

impl SecurityTransport for Plain {
    fn kind(&self) -> &str {
        "plain"
    }

    fn local_peer(&self) -> PeerId {
        self.0
    }
}

struct Mux;

impl Multiplexer for Mux {
    fn kind(&self) -> &str {
        "mux"
    }
}

fn host() -> Arc<dyn Host> {
    let key = PrivateKey::from_secret(b"resolution".to_vec()).expect("非空私钥");
    Arc::new(LocalHost::new(key, Vec::new()))
}

fn full_context(host: Arc<dyn Host>, psk: Option<Psk>) -> (BuildContext, Arc<Upgrader>) {
    let gater: Arc<dyn ConnectionGater> = Arc::new(DenyPeersGater::default());
    let rcmgr: Arc<dyn ResourceManager> =
        Arc::new(FixedLimits::new().with_limit(ResourceScope::Connections, 64));
    let upgrader = Arc::new(Upgrader::new(
        ProtocolRegistry::new(),
        ProtocolRegistry::new(),
        psk,
        Arc::clone(&gater),
        Arc::clone(&rcmgr),
    ));
    let ctx = BuildContext::new(host)
        .with_muxers(ProtocolRegistry::new())
        .with_security(ProtocolRegistry::new())
        .with_upgrader(Arc::clone(&upgrader))
        .with_gater(gater)
        .with_psk(psk)
        .with_resource_manager(rcmgr)
        .with_addr_filter(AddrFilter::new());
    (ctx, upgrader)
}

#[test]
fn instances_bypass_injection_and_keep_identity() {
    let instance: Arc<dyn Transport> = Arc::new(Probe);
    let resolved = ConstructorSpec::<TransportRole>::instance(Arc::clone(&instance))
        .resolve()
        .expect("实例总能解析");

    // 仅含宿主的上下文也足够，实例不读取任何值。
    let ctx = BuildContext::new(host());
    for _ in 0..3 {
        let produced = resolved.invoke(&ctx).expect("实例形态不会失败");
        assert!(Arc::ptr_eq(&produced, &instance));
    }
}

#[test]
fn only_declared_values_are_injected_in_declared_order() {
    #[derive(Debug, PartialEq)]
    enum Seen {
        Psk(Option<[u8; 32]>),
        Upgrader(bool),
        Peer(PeerId),
        Limit(Option<u32>),
    }

    let psk = Psk::from_bytes([7; 32]);
    let host = host();
    let (ctx, upgrader) = full_context(Arc::clone(&host), Some(psk));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let expected_upgrader = Arc::clone(&upgrader);
    let resolved = resolve_fn::<TransportRole, _, _>(
        move |psk: Option<Psk>,
              upgrader: Arc<Upgrader>,
              peer: PeerId,
              rcmgr: Arc<dyn ResourceManager>| {
            let mut seen = record.lock().expect("锁未中毒");
            seen.push(Seen::Psk(psk.map(|key| *key.as_bytes())));
            seen.push(Seen::Upgrader(Arc::ptr_eq(&upgrader, &expected_upgrader)));
            seen.push(Seen::Peer(peer));
            seen.push(Seen::Limit(rcmgr.limit_for(ResourceScope::Connections)));
            Ok::<_, BoxError>(Probe)
        },
    )
    .expect("传输允许全部类别");

    assert_eq!(
        resolved
            .parameters()
            .iter()
            .map(|p| p.category)
            .collect::<Vec<_>>(),
        [
            ArgCategory::Psk,
            ArgCategory::Upgrader,
            ArgCategory::PeerId,
            ArgCategory::ResourceManager
        ]
    );

    resolved.invoke(&ctx).expect("上下文完整");
    assert_eq!(
        *seen.lock().expect("锁未中毒"),
        vec![
            Seen::Psk(Some([7; 32])),
            Seen::Upgrader(true),
            Seen::Peer(host.id()),
            Seen::Limit(Some(64)),
        ]
    );
}

#[test]
fn security_constructors_receive_key_material() {
    let host = host();
    let resolved = resolve_fn::<SecurityRole, _, _>(|key: PrivateKey, public: PublicKey| {
        assert_eq!(key.public(), &public);
        Ok::<_, BoxError>(Plain(public.to_peer_id()))
    })
    .expect("安全传输允许密钥类别");

    let produced = resolved
        .invoke(&BuildContext::new(Arc::clone(&host)))
        .expect("地址簿中已有本节点密钥");
    assert_eq!(produced.local_peer(), host.id());
}

#[test]
fn role_permissions_are_enforced_at_resolution() {
    let err = resolve_fn::<SecurityRole, _, _>(|_u: Arc<Upgrader>| {
        Ok::<_, BoxError>(Plain(PeerId::from_bytes([0; 32])))
    })
    .expect_err("安全传输不可注入升级器");
    assert_eq!(
        err,
        ShapeError::UnexpectedArgument {
            role: "security",
            index: 0,
            type_name: core::any::type_name::<Arc<Upgrader>>(),
        }
    );

    let err = resolve_fn::<MuxerRole, _, _>(|_id: PeerId, _key: PrivateKey| {
        Ok::<_, BoxError>(Mux)
    })
    .expect_err("复用器不可注入私钥");
    assert!(matches!(
        err,
        ShapeError::UnexpectedArgument { index: 1, .. }
    ));
    assert!(err.to_string().contains("muxer constructor argument #1"));
}

#[test]
fn repeated_categories_are_rejected() {
    let err = resolve_fn::<MuxerRole, _, _>(|_a: PeerId, _b: Arc<dyn Host>, _c: PeerId| {
        Ok::<_, BoxError>(Mux)
    })
    .expect_err("重复的节点标识参数");
    assert!(matches!(
        err,
        ShapeError::DuplicateArgument {
            index: 2,
            first: 0,
            category: ArgCategory::PeerId,
            ..
        }
    ));
}

#[test]
fn missing_stage_values_surface_as_invocation_errors() {
    let resolved = resolve_fn::<TransportRole, _, _>(|_u: Arc<Upgrader>| Ok::<_, BoxError>(Probe))
        .expect("传输允许升级器");
    let err = match resolved.invoke(&BuildContext::new(host())) {
        Ok(_) => panic!("缺少升级器时不应构造成功"),
        Err(err) => err,
    };
    let inject = err
        .downcast_ref::<InjectError>()
        .expect("应为注入错误");
    assert_eq!(
        inject,
        &InjectError::Unavailable {
            category: ArgCategory::Upgrader
        }
    );
}

#[test]
fn constructor_errors_are_passed_through_untouched() {
    #[derive(Debug, thiserror::Error)]
    #[error("address already in use")]
    struct AddrInUse;

    let resolved =
        resolve_fn::<TransportRole, _, _>(|| Err::<Probe, _>(AddrInUse)).expect("零参数");
    let err = match resolved.invoke(&BuildContext::new(host())) {
        Ok(_) => panic!("构造函数必然失败"),
        Err(err) => err,
    };
    assert!(err.downcast_ref::<AddrInUse>().is_some());
}
