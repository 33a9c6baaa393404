//! 自描述地址（multiaddr）的最小文本实现。
//!
//! 只覆盖装配阶段需要的能力：按段解析、读取首个 IP、判断协议栈。二进制编码不在此处实现。

use core::fmt;
use core::str::FromStr;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// 地址解析错误。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MultiaddrError {
    /// 地址必须以 `/` 开头。
    #[error("multiaddr `{input}` must start with `/`")]
    MissingLeadingSlash { input: String },
    /// 协议段缺少取值。
    #[error("protocol `{protocol}` in `{input}` expects a value")]
    MissingValue { input: String, protocol: String },
    /// IP 段无法解析。
    #[error("`{value}` is not a valid {protocol} address")]
    InvalidIp { protocol: String, value: String },
    /// 端口段不是 0..=65535 的整数。
    #[error("`{value}` is not a valid {protocol} port")]
    InvalidPort { protocol: String, value: String },
    /// 出现空的协议段，如 `//`。
    #[error("multiaddr `{input}` contains an empty protocol segment")]
    EmptySegment { input: String },
    /// 空地址。
    #[error("multiaddr must contain at least one protocol")]
    Empty,
}

/// 地址中的一个协议段；无取值协议（如 `quic-v1`）的 `value` 为 `None`。
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct Segment {
    protocol: String,
    value: Option<String>,
}

/// 不带取值的协议名集合。
const VALUELESS: &[&str] = &[
    "quic",
    "quic-v1",
    "ws",
    "wss",
    "webtransport",
    "webrtc",
    "webrtc-direct",
    "p2p-circuit",
    "tls",
    "noise",
    "http",
    "https",
];

/// 已解析的地址。
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Multiaddr {
    segments: Vec<Segment>,
}

impl Multiaddr {
    /// 依次遍历协议名。
    pub fn protocols(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|segment| segment.protocol.as_str())
    }

    /// 是否包含指定协议。
    pub fn has_protocol(&self, protocol: &str) -> bool {
        self.protocols().any(|p| p == protocol)
    }

    /// 首段为 `ip4`/`ip6` 时返回其地址。
    pub fn ip(&self) -> Option<IpAddr> {
        let head = self.segments.first()?;
        match head.protocol.as_str() {
            "ip4" | "ip6" => head.value.as_deref()?.parse().ok(),
            _ => None,
        }
    }
}

impl FromStr for Multiaddr {
    type Err = MultiaddrError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let rest = input
            .strip_prefix('/')
            .ok_or_else(|| MultiaddrError::MissingLeadingSlash {
                input: input.to_owned(),
            })?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(MultiaddrError::Empty);
        }
        let mut parts = rest.split('/');
        let mut segments = Vec::new();
        while let Some(protocol) = parts.next() {
            if protocol.is_empty() {
                return Err(MultiaddrError::EmptySegment {
                    input: input.to_owned(),
                });
            }
            if VALUELESS.contains(&protocol) {
                segments.push(Segment {
                    protocol: protocol.to_owned(),
                    value: None,
                });
                continue;
            }
            let value = parts.next().ok_or_else(|| MultiaddrError::MissingValue {
                input: input.to_owned(),
                protocol: protocol.to_owned(),
            })?;
            validate(protocol, value)?;
            segments.push(Segment {
                protocol: protocol.to_owned(),
                value: Some(value.to_owned()),
            });
        }
        if segments.is_empty() {
            return Err(MultiaddrError::Empty);
        }
        Ok(Self { segments })
    }
}

/// 校验已知协议的取值：IP 段必须是对应族的地址，端口段必须能放进 `u16`。
fn validate(protocol: &str, value: &str) -> Result<(), MultiaddrError> {
    let valid = match protocol {
        "ip4" => value.parse::<Ipv4Addr>().is_ok(),
        "ip6" => value.parse::<Ipv6Addr>().is_ok(),
        "tcp" | "udp" => {
            return value
                .parse::<u16>()
                .map(drop)
                .map_err(|_| MultiaddrError::InvalidPort {
                    protocol: protocol.to_owned(),
                    value: value.to_owned(),
                });
        }
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(MultiaddrError::InvalidIp {
            protocol: protocol.to_owned(),
            value: value.to_owned(),
        })
    }
}

impl fmt::Display for Multiaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.protocol)?;
            if let Some(value) = &segment.value {
                write!(f, "/{value}")?;
            }
        }
        Ok(())
    }
}
