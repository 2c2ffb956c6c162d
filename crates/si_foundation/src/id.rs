// crates/si_foundation/src/id.rs

//! 站点标识
//!
//! 观测站（浮标、传感器）的强类型标识，按字典序排序，
//! 与时间共同构成观测表的主键。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 站点ID
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// 创建站点ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 字典序最小的ID，用作范围查询的下界
    pub fn min_value() -> Self {
        Self(String::new())
    }

    /// 获取字符串表示
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LocationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_value_sorts_first() {
        let a = LocationId::new("0");
        assert!(LocationId::min_value() < a);
        assert!(LocationId::min_value() <= LocationId::new(""));
    }

    #[test]
    fn test_display() {
        assert_eq!(LocationId::from("42035").to_string(), "42035");
    }
}
