pub mod actions;
pub mod explain;
pub mod info;
pub mod serve;
pub mod validate;
