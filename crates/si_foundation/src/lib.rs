// crates/si_foundation/src/lib.rs

//! SpatialInterp Foundation Layer
//!
//! 基础层，提供整个工作区共享的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`id`]: 强类型站点标识
//! - [`time`]: 时间区间与时长解析
//!
//! # 示例
//!
//! ```
//! use si_foundation::{LocationId, TimeRange, parse_duration};
//! use chrono::{TimeZone, Utc};
//!
//! let loc = LocationId::new("41001");
//! assert_eq!(loc.as_str(), "41001");
//!
//! let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();
//! let range = TimeRange::new(start, end).unwrap();
//! assert!(range.contains(start));
//! assert!(!range.contains(end));
//!
//! assert_eq!(parse_duration("6h").unwrap().num_hours(), 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod time;

// 重导出常用类型
pub use error::{SiError, SiResult};
pub use id::LocationId;
pub use time::{parse_duration, TimeRange, Timestamp};
