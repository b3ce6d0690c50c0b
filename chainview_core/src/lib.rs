pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod poll;
pub mod session;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;
