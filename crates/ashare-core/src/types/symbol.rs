//! 标的定义。
//!
//! `Symbol` 表示一只 A 股标的：6 位交易所代码加展示名称。
//! 代码与名称共同构成标识，作为批量获取结果映射的键。

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 股标的（代码 + 名称）。
///
/// 代码为 6 位数字字符串，由外部提供，本身不做合法性校验。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 交易所代码（如 "600000"、"000001"）
    pub code: String,
    /// 展示名称（如 "浦发银行"）
    pub name: String,
}

impl Symbol {
    /// 创建新标的。
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// 是否为科创板标的（688 开头）。
    pub fn is_star_market(&self) -> bool {
        self.code.starts_with("688")
    }

    /// 是否为创业板标的（300 开头）。
    pub fn is_chinext(&self) -> bool {
        self.code.starts_with("300")
    }

    /// 名称是否带 ST 标记（含 *ST）。
    pub fn is_st(&self) -> bool {
        self.name.to_uppercase().contains("ST")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("600000", "浦发银行");
        assert_eq!(symbol.to_string(), "600000 浦发银行");
    }

    #[test]
    fn test_board_classification() {
        assert!(Symbol::new("688981", "中芯国际").is_star_market());
        assert!(Symbol::new("300750", "宁德时代").is_chinext());
        assert!(!Symbol::new("600519", "贵州茅台").is_star_market());
        assert!(!Symbol::new("600519", "贵州茅台").is_chinext());
    }

    #[test]
    fn test_st_flag() {
        assert!(Symbol::new("600005", "ST 武钢").is_st());
        assert!(Symbol::new("000010", "*st 美丽").is_st());
        assert!(!Symbol::new("000001", "平安银行").is_st());
    }
}
