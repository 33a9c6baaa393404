//! 节点身份：密钥材料与 `PeerId`。
//!
//! # 教案级注释
//! - **意图 (Why)**：装配阶段的构造函数经常需要“本节点是谁”这一信息（安全握手、地址簿登记等），
//!   因此身份类型必须足够轻量，可以被廉价克隆并注入到任意构造函数；
//! - **契约 (What)**：
//!   - [`PrivateKey`] 持有秘密字节，[`PrivateKey::public`] 以确定性方式派生公钥；
//!   - [`PeerId`] 为公钥字节的 SHA-256 摘要，字符串形式为 64 位小写十六进制；
//! - **风险提示 (Trade-offs)**：派生算法只承担“稳定映射”的职责，并不提供签名能力；
//!   需要真实签名的安全传输应在自身构造函数中持有独立的密码学实现。

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// `PeerId` 的字节长度。
pub const PEER_ID_LEN: usize = 32;

/// 解析身份字符串时的错误。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum IdentityError {
    /// 输入不是合法的十六进制字符串。
    #[error("peer id `{input}` is not valid hex")]
    InvalidHex { input: String },
    /// 长度不符合 [`PEER_ID_LEN`]。
    #[error("peer id must be {} bytes, got {actual}", PEER_ID_LEN)]
    InvalidLength { actual: usize },
    /// 私钥材料为空。
    #[error("private key material must not be empty")]
    EmptyKey,
}

/// 公钥字节。
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PublicKey {
    bytes: Arc<[u8]>,
}

impl PublicKey {
    /// 以原始字节构造公钥。
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// 原始字节视图。
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 由公钥派生的节点标识。
    pub fn to_peer_id(&self) -> PeerId {
        PeerId::from_public_key(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&hex::encode(&self.bytes))
            .finish()
    }
}

/// 私钥材料。
///
/// `Debug` 输出不会暴露秘密字节，仅打印其对应的 `PeerId`。
#[derive(Clone, Eq, PartialEq)]
pub struct PrivateKey {
    secret: Arc<[u8]>,
    public: PublicKey,
}

impl PrivateKey {
    /// 以秘密字节构造私钥，并同步派生公钥。
    pub fn from_secret(secret: impl Into<Arc<[u8]>>) -> Result<Self, IdentityError> {
        let secret: Arc<[u8]> = secret.into();
        if secret.is_empty() {
            return Err(IdentityError::EmptyKey);
        }
        let digest = Sha256::new()
            .chain_update(b"spark-p2p/public/")
            .chain_update(&secret)
            .finalize();
        let public = PublicKey::from_bytes(digest.to_vec());
        Ok(Self { secret, public })
    }

    /// 秘密字节。调用方负责避免将其写入日志。
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// 对应的公钥。
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// 对应的节点标识。
    pub fn peer_id(&self) -> PeerId {
        self.public.to_peer_id()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("peer_id", &self.peer_id())
            .finish_non_exhaustive()
    }
}

/// 节点标识，公钥的 SHA-256 摘要。
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PeerId([u8; PEER_ID_LEN]);

impl PeerId {
    /// 从公钥派生。
    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut bytes = [0u8; PEER_ID_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// 直接以摘要字节构造。
    pub const fn from_bytes(bytes: [u8; PEER_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// 摘要字节。
    pub fn as_bytes(&self) -> &[u8; PEER_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 截断展示，避免日志过长。
        let full = hex::encode(self.0);
        write!(f, "PeerId({}…)", &full[..12])
    }
}

impl FromStr for PeerId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s).map_err(|_| IdentityError::InvalidHex {
            input: s.to_owned(),
        })?;
        let bytes: [u8; PEER_ID_LEN] =
            raw.as_slice()
                .try_into()
                .map_err(|_| IdentityError::InvalidLength { actual: raw.len() })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_is_stable_for_the_same_secret() {
        let a = PrivateKey::from_secret(b"node-a".to_vec()).expect("非空私钥");
        let b = PrivateKey::from_secret(b"node-a".to_vec()).expect("非空私钥");
        let c = PrivateKey::from_secret(b"node-c".to_vec()).expect("非空私钥");
        assert_eq!(a.peer_id(), b.peer_id());
        assert_ne!(a.peer_id(), c.peer_id());
    }

    #[test]
    fn peer_id_display_parses_back() {
        let id = PrivateKey::from_secret(b"node-a".to_vec())
            .expect("非空私钥")
            .peer_id();
        let parsed: PeerId = id.to_string().parse().expect("十六进制形式应可解析");
        assert_eq!(parsed, id);
    }

    #[test]
    fn malformed_peer_ids_are_rejected() {
        assert!(matches!(
            "zz".parse::<PeerId>(),
            Err(IdentityError::InvalidHex { .. })
        ));
        assert_eq!(
            "abcd".parse::<PeerId>(),
            Err(IdentityError::InvalidLength { actual: 2 })
        );
    }

    #[test]
    fn empty_secret_is_refused_and_debug_hides_secret() {
        assert_eq!(
            PrivateKey::from_secret(Vec::new()),
            Err(IdentityError::EmptyKey)
        );
        let key = PrivateKey::from_secret(b"top-secret".to_vec()).expect("非空私钥");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains(&hex::encode(b"top-secret")));
        assert!(rendered.contains("peer_id"));
    }
}
