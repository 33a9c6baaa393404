//! 声明式装配配置。
//!
//! # 教案级注释
//! - **意图 (Why)**：运维希望在不重新编译的情况下调整协议偏好、启用私网或屏蔽地址段；
//!   构造器本身由代码登记，配置只负责“挑选与排序”以及提供密钥和过滤规则；
//! - **契约 (What)**：
//!   - 列表为空表示沿用登记顺序；非空时只保留列出的标识并按列出顺序排列；
//!   - `psk` 与 `psk_file` 至多出现一个，内容均为 v1 base16 密钥文本；
//!   - 未识别的字段被拒绝，避免拼写错误被静默忽略；
//! - **风险提示 (Trade-offs)**：配置只在 `apply_config` 时读取一次，运行期修改文件不会生效。
//!
//! ```toml
//! muxers = ["/yamux/1.0.0"]
//! security = ["/noise"]
//! transports = ["/tcp", "/quic-v1"]
//! psk_file = "/etc/spark/swarm.key"
//! addr_filters = ["10.0.0.0/8"]
//! insecure = false
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use spark_p2p_core::{AddrFilter, IpPrefix, Psk};

use crate::error::ConfigError;

/// 装配配置。
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// 流复用器标识，按偏好排序。
    pub muxers: Vec<String>,
    /// 安全传输标识，按偏好排序。
    pub security: Vec<String>,
    /// 传输标识。
    pub transports: Vec<String>,
    /// 内联的私网密钥文本。
    pub psk: Option<String>,
    /// 私网密钥文件路径。
    pub psk_file: Option<PathBuf>,
    /// 拒绝拨号的 CIDR 前缀。
    pub addr_filters: Vec<String>,
    /// 允许不配置任何安全传输。
    pub insecure: bool,
}

impl StackConfig {
    /// 解析 TOML 文本。
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// 读取并解析 TOML 文件。
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        Self::from_toml_str(&text)
    }

    /// 解析私网密钥；两处都未配置时返回 `None`。
    pub fn resolve_psk(&self) -> Result<Option<Psk>, ConfigError> {
        match (&self.psk, &self.psk_file) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingPsk),
            (Some(text), None) => Ok(Some(Psk::decode_v1(text)?)),
            (None, Some(path)) => Ok(Some(Psk::decode_v1(&read(path)?)?)),
            (None, None) => Ok(None),
        }
    }

    /// 构造地址过滤器。
    pub fn addr_filter(&self) -> Result<AddrFilter, ConfigError> {
        let mut filter = AddrFilter::new();
        for rule in &self.addr_filters {
            let prefix: IpPrefix = rule.parse().map_err(|source| ConfigError::Filter {
                rule: rule.clone(),
                source,
            })?;
            filter.deny(prefix);
        }
        Ok(filter)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
