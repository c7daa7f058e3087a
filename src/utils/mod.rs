//! # 常用接口模块
//!
//! 本模块提供单元测试用的断言宏和少量文件工具

pub mod macro_for_unit_test;

pub use macro_for_unit_test::file_size_in_byte;
