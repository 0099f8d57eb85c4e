use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod completion;
pub mod document;
pub mod marker;
pub mod syntax;
pub mod transaction;

pub type Tendril = SmartString<LazyCompact>;
