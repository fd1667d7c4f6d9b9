#![doc = include_str!("../README.md")]
#![allow(missing_docs, clippy::missing_errors_doc)]

pub mod align;
pub mod analyzer;
pub mod config;
pub mod convert;
pub mod document;
pub mod format;
pub mod lang;
pub mod odoriji;
pub mod reading;
pub mod replay;
pub mod store;
pub mod validate;

pub use config::Config;
use {analyzer::Analyzer, foldhash::fast::RandomState};

/// [`indexmap::IndexMap`] using the [`foldhash::fast::RandomState`] hasher.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, RandomState>;

/// Converts verse into kana and validates its structure.
///
/// Owns a single [`Analyzer`], which is reused for every call.
#[derive(derive_more::Debug)]
pub struct Engine {
    #[debug(skip)]
    analyzer: Box<dyn Analyzer>,
    config: Config,
}

impl Engine {
    #[must_use]
    pub fn new(analyzer: impl Analyzer + 'static, config: Config) -> Self {
        Self {
            analyzer: Box::new(analyzer),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}
