//! Ordered chain of translators; the first one that recognizes a failure wins.

use super::translator::{PersistenceExceptionTranslator, Translation};
use crate::error::BoxError;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ChainedExceptionTranslator {
    delegates: Vec<Arc<dyn PersistenceExceptionTranslator>>,
}

impl ChainedExceptionTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, translator: Arc<dyn PersistenceExceptionTranslator>) -> Self {
        self.delegates.push(translator);
        self
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl PersistenceExceptionTranslator for ChainedExceptionTranslator {
    fn translate_if_possible(&self, err: BoxError) -> Translation {
        let mut err = err;
        for delegate in &self.delegates {
            match delegate.translate_if_possible(err) {
                Translation::Translated(e) => return Translation::Translated(e),
                Translation::Unrecognized(back) => err = back,
            }
        }
        Translation::Unrecognized(err)
    }
}
