//! 私有网络预共享密钥（PSK）。
//!
//! # 教案级注释
//! - **意图 (Why)**：私有网络要求所有连接在握手前先以共享密钥加密，传输构造函数因此可能需要读取 PSK；
//! - **格式 (What)**：v1 密钥文件由三行组成：
//!   1. `/key/swarm/psk/1.0.0/` 头；
//!   2. 编码声明：`/base16/`（十六进制）或 `/base64/`（标准字母表、带填充）；
//!   3. 编码后的 32 字节密钥；
//! - **风险提示 (Trade-offs)**：`/bin/` 编码要求密钥行是任意字节，无法放进 `&str` 输入，这里直接拒绝。

use core::fmt;

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

/// 密钥字节长度。
pub const PSK_LEN: usize = 32;

const PSK_V1_HEADER: &str = "/key/swarm/psk/1.0.0/";

/// PSK 解码错误。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PskError {
    /// 首行不是 v1 头。
    #[error("expected psk header `{}`, found `{found}`", PSK_V1_HEADER)]
    InvalidHeader { found: String },
    /// 编码声明不受支持。
    #[error("psk encoding `{encoding}` is not supported, use `/base16/` or `/base64/`")]
    UnsupportedEncoding { encoding: String },
    /// 密钥行不是合法十六进制。
    #[error("psk key line is not valid hex")]
    InvalidHex,
    /// 密钥行不是合法 base64。
    #[error("psk key line is not valid base64")]
    InvalidBase64,
    /// 密钥长度错误。
    #[error("psk must be {} bytes, got {actual}", PSK_LEN)]
    InvalidLength { actual: usize },
    /// 文件缺少必要的行。
    #[error("psk file is truncated: missing {missing}")]
    Truncated { missing: &'static str },
}

/// 32 字节的私网密钥。
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Psk([u8; PSK_LEN]);

impl Psk {
    /// 直接以字节构造。
    pub const fn from_bytes(bytes: [u8; PSK_LEN]) -> Self {
        Self(bytes)
    }

    /// 密钥字节。
    pub fn as_bytes(&self) -> &[u8; PSK_LEN] {
        &self.0
    }

    /// 解析 v1 密钥文件内容。
    pub fn decode_v1(text: &str) -> Result<Self, PskError> {
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        let header = lines.next().ok_or(PskError::Truncated { missing: "header" })?;
        if header != PSK_V1_HEADER {
            return Err(PskError::InvalidHeader {
                found: header.to_owned(),
            });
        }

        let encoding = lines.next().ok_or(PskError::Truncated {
            missing: "encoding",
        })?;
        let decode: fn(&str) -> Result<Vec<u8>, PskError> = match encoding {
            "/base16/" => |key| hex::decode(key).map_err(|_| PskError::InvalidHex),
            "/base64/" => |key| {
                general_purpose::STANDARD
                    .decode(key)
                    .map_err(|_| PskError::InvalidBase64)
            },
            _ => {
                return Err(PskError::UnsupportedEncoding {
                    encoding: encoding.to_owned(),
                });
            }
        };

        let key = lines.next().ok_or(PskError::Truncated { missing: "key" })?;
        let raw = decode(key)?;
        let bytes: [u8; PSK_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| PskError::InvalidLength { actual: raw.len() })?;
        Ok(Self(bytes))
    }

    /// 以 v1 格式编码，便于生成密钥文件。
    pub fn encode_v1(&self) -> String {
        format!("{PSK_V1_HEADER}\n/base16/\n{}\n", hex::encode(self.0))
    }

    /// 密钥指纹（前 4 字节十六进制），可安全写入日志。
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Psk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Psk({}…)", self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "e8d6fdcbd6d1e0a1c2b3a4958677685948372615f4e3d2c1b0a9f8e7d6c5b4a3";

    #[test]
    fn decodes_base16_file() {
        let text = format!("/key/swarm/psk/1.0.0/\n/base16/\n{KEY_HEX}\n");
        let psk = Psk::decode_v1(&text).expect("合法 PSK 文件");
        assert_eq!(hex::encode(psk.as_bytes()), KEY_HEX);
        assert_eq!(Psk::decode_v1(&psk.encode_v1()), Ok(psk));
    }

    #[test]
    fn decodes_base64_file() {
        let bytes = hex::decode(KEY_HEX).expect("合法十六进制");
        let text = format!(
            "/key/swarm/psk/1.0.0/\n/base64/\n{}\n",
            general_purpose::STANDARD.encode(&bytes)
        );
        let psk = Psk::decode_v1(&text).expect("合法 base64 PSK 文件");
        assert_eq!(psk.as_bytes().as_slice(), bytes.as_slice());
        assert_eq!(
            Psk::decode_v1("/key/swarm/psk/1.0.0/\n/base64/\n!!!!"),
            Err(PskError::InvalidBase64)
        );
        assert_eq!(
            Psk::decode_v1("/key/swarm/psk/1.0.0/\n/base64/\nAAAA"),
            Err(PskError::InvalidLength { actual: 3 })
        );
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(matches!(
            Psk::decode_v1("/key/swarm/psk/2.0.0/\n/base16/\n00"),
            Err(PskError::InvalidHeader { .. })
        ));
        assert!(matches!(
            Psk::decode_v1("/key/swarm/psk/1.0.0/\n/bin/\nAAAA"),
            Err(PskError::UnsupportedEncoding { .. })
        ));
        assert_eq!(
            Psk::decode_v1("/key/swarm/psk/1.0.0/\n/base16/\nabcd"),
            Err(PskError::InvalidLength { actual: 2 })
        );
        assert_eq!(
            Psk::decode_v1("/key/swarm/psk/1.0.0/\n/base16/\nxyz"),
            Err(PskError::InvalidHex)
        );
        assert_eq!(
            Psk::decode_v1("/key/swarm/psk/1.0.0/"),
            Err(PskError::Truncated {
                missing: "encoding"
            })
        );
    }

    #[test]
    fn debug_output_only_shows_fingerprint() {
        let psk = Psk::from_bytes([7u8; PSK_LEN]);
        assert_eq!(format!("{psk:?}"), "Psk(07070707…)");
    }
}
