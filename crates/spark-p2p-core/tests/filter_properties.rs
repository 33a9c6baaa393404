//! 地址过滤与私网密钥的性质验证。
//!
//! - **核心目标 (Why)**：前缀匹配是位运算，边界（非整字节前缀、/0、/32）最容易出错；
//!   随机地址与随机前缀长度比手写用例更能覆盖这些边界；
//! - **断言 (What)**：
//!   1. 以地址自身为网络号的前缀总是包含该地址；
//!   2. 仅在前缀范围内翻转一位的地址不被包含，范围外翻转则仍被包含；
//!   3. IPv4 地址写成 `::ffff:` 映射形式后，过滤结果与原形式一致；
//!   4. 私网密钥的 v1 文本能被原样解码。

use std::net::{IpAddr, Ipv4Addr};

use proptest::prelude::*;
use spark_p2p_core::{AddrFilter, IpPrefix, Multiaddr, Psk};

fn prefix(ip: Ipv4Addr, len: u8) -> IpPrefix {
    format!("{ip}/{len}").parse().expect("合法前缀")
}

proptest! {
    #[test]
    fn a_prefix_contains_its_own_network(raw in any::<u32>(), len in 0u8..=32) {
        let ip = Ipv4Addr::from(raw);
        prop_assert!(prefix(ip, len).contains(IpAddr::V4(ip)));
    }

    #[test]
    fn flipping_a_bit_inside_the_prefix_escapes_it(
        raw in any::<u32>(),
        len in 1u8..=32,
        bit_seed in any::<u8>(),
    ) {
        let ip = Ipv4Addr::from(raw);
        let bit = u32::from(bit_seed) % 32;
        let flipped = Ipv4Addr::from(raw ^ (1u32 << (31 - bit)));
        let inside = bit < u32::from(len);
        prop_assert_eq!(prefix(ip, len).contains(IpAddr::V4(flipped)), !inside);
    }

    #[test]
    fn filters_only_apply_to_ip_addresses(raw in any::<u32>(), port in any::<u16>()) {
        let ip = Ipv4Addr::from(raw);
        let filter = AddrFilter::parse(["0.0.0.0/0"]).expect("合法前缀");
        let addr: Multiaddr = format!("/ip4/{ip}/tcp/{port}").parse().expect("合法地址");
        prop_assert!(filter.denies(&addr));

        let dns: Multiaddr = format!("/dns4/example.com/tcp/{port}").parse().expect("合法地址");
        prop_assert!(!filter.denies(&dns));
    }

    #[test]
    fn mapped_ipv6_form_matches_like_ipv4(
        raw in any::<u32>(),
        net_raw in any::<u32>(),
        len in 0u8..=32,
        port in any::<u16>(),
    ) {
        let ip = Ipv4Addr::from(raw);
        let filter = AddrFilter::parse([prefix(Ipv4Addr::from(net_raw), len).to_string()])
            .expect("合法前缀");
        let plain: Multiaddr = format!("/ip4/{ip}/tcp/{port}").parse().expect("合法地址");
        let mapped: Multiaddr = format!("/ip6/{}/tcp/{port}", ip.to_ipv6_mapped())
            .parse()
            .expect("合法地址");
        prop_assert_eq!(filter.denies(&mapped), filter.denies(&plain));
    }

    #[test]
    fn psk_text_decodes_to_the_same_key(bytes in any::<[u8; 32]>()) {
        let psk = Psk::from_bytes(bytes);
        prop_assert_eq!(Psk::decode_v1(&psk.encode_v1()), Ok(psk));
    }
}
