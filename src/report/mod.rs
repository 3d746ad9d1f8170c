//! 报告：保存/加载汇总结果，以及文本输出

mod print;
mod store;

pub use print::render;
pub use store::{export_json, load, save};
