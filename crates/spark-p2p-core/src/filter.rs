//! 地址过滤：按 IP 前缀拒绝拨号目标。

use core::fmt;
use core::str::FromStr;
use std::net::IpAddr;

use thiserror::Error;

use crate::multiaddr::Multiaddr;

/// CIDR 解析错误。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FilterError {
    /// 缺少 `/len` 部分。
    #[error("`{input}` is not in `ip/len` form")]
    MissingPrefixLength { input: String },
    /// IP 部分非法。
    #[error("`{input}` does not start with a valid ip address")]
    InvalidIp { input: String },
    /// 前缀长度超出地址位宽。
    #[error("prefix length {len} exceeds {max} bits")]
    PrefixTooLong { len: u8, max: u8 },
}

/// 单条 IP 前缀。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct IpPrefix {
    network: IpAddr,
    len: u8,
}

impl IpPrefix {
    /// 判断地址是否落在前缀内。
    ///
    /// `::ffff:a.b.c.d` 形式的地址先还原为 IPv4 再与 v4 前缀比较，其余 v4 与 v6 组合互不匹配。
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                prefix_eq(&net.octets(), &ip.octets(), self.len)
            }
            (IpAddr::V4(net), IpAddr::V6(ip)) => ip
                .to_ipv4_mapped()
                .is_some_and(|ip| prefix_eq(&net.octets(), &ip.octets(), self.len)),
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                prefix_eq(&net.octets(), &ip.octets(), self.len)
            }
            _ => false,
        }
    }
}

fn prefix_eq(a: &[u8], b: &[u8], len: u8) -> bool {
    let full = usize::from(len / 8);
    if a[..full] != b[..full] {
        return false;
    }
    let rest = len % 8;
    if rest == 0 {
        return true;
    }
    let mask = 0xffu8 << (8 - rest);
    (a[full] & mask) == (b[full] & mask)
}

impl FromStr for IpPrefix {
    type Err = FilterError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (ip, len) = input
            .split_once('/')
            .ok_or_else(|| FilterError::MissingPrefixLength {
                input: input.to_owned(),
            })?;
        let network: IpAddr = ip.parse().map_err(|_| FilterError::InvalidIp {
            input: input.to_owned(),
        })?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let len: u8 = len.parse().map_err(|_| FilterError::MissingPrefixLength {
            input: input.to_owned(),
        })?;
        if len > max {
            return Err(FilterError::PrefixTooLong { len, max });
        }
        Ok(Self { network, len })
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.len)
    }
}

/// 拒绝名单形式的地址过滤器。
///
/// 不含 IP 的地址（如 `/dns4/...`）不会被拒绝，解析后的地址由拨号路径再次过滤。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AddrFilter {
    denied: Vec<IpPrefix>,
}

impl AddrFilter {
    /// 空过滤器，放行一切。
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 CIDR 文本列表构造。
    pub fn parse<I, S>(entries: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denied = entries
            .into_iter()
            .map(|entry| entry.as_ref().parse())
            .collect::<Result<Vec<IpPrefix>, _>>()?;
        Ok(Self { denied })
    }

    /// 追加一条拒绝前缀。
    pub fn deny(&mut self, prefix: IpPrefix) {
        if !self.denied.contains(&prefix) {
            self.denied.push(prefix);
        }
    }

    /// 地址是否被拒绝。
    pub fn denies(&self, addr: &Multiaddr) -> bool {
        addr.ip()
            .is_some_and(|ip| self.denied.iter().any(|prefix| prefix.contains(ip)))
    }

    /// 已配置的前缀。
    pub fn prefixes(&self) -> &[IpPrefix] {
        &self.denied
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.denied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(text: &str) -> Multiaddr {
        text.parse().expect("合法地址")
    }

    #[test]
    fn denies_addresses_inside_configured_prefixes() {
        let filter = AddrFilter::parse(["10.0.0.0/8", "192.168.1.128/25", "fd00::/8"])
            .expect("合法 CIDR");
        assert!(filter.denies(&addr("/ip4/10.20.30.40/tcp/1")));
        assert!(filter.denies(&addr("/ip4/192.168.1.200/tcp/1")));
        assert!(!filter.denies(&addr("/ip4/192.168.1.100/tcp/1")));
        assert!(filter.denies(&addr("/ip6/fd12::1/udp/1/quic-v1")));
        assert!(!filter.denies(&addr("/dns4/example.com/tcp/1")));

        assert!(filter.denies(&addr("/ip6/::ffff:10.1.2.3/tcp/1")));
        assert!(!filter.denies(&addr("/ip6/::ffff:11.1.2.3/tcp/1")));
        // 兼容形式 `::a.b.c.d` 不是映射地址。
        assert!(!filter.denies(&addr("/ip6/::10.1.2.3/tcp/1")));
    }

    #[test]
    fn rejects_invalid_cidr_entries() {
        assert!(matches!(
            AddrFilter::parse(["10.0.0.0"]),
            Err(FilterError::MissingPrefixLength { .. })
        ));
        assert_eq!(
            AddrFilter::parse(["10.0.0.0/33"]),
            Err(FilterError::PrefixTooLong { len: 33, max: 32 })
        );
        assert!(matches!(
            AddrFilter::parse(["nope/8"]),
            Err(FilterError::InvalidIp { .. })
        ));
    }
}
