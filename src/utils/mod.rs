//! PhotoSpace 工具模块

pub mod error;
pub mod imaging;
pub mod sanitize;
