pub mod action;
pub mod annotator;
pub mod audit;
pub mod build;
pub mod changelog;
pub mod config;
pub mod fs_host;
pub mod index;
pub mod paths;
pub mod render;
pub mod store;
pub mod svn;
pub mod trigger;
pub mod util;
pub mod warn;

#[cfg(test)]
pub mod test_support;
