//! Startup wiring. Decides, once, which components exist:
//!
//! - the template is created when the 2-Way SQL engine is available, a data source exists and
//!   the application did not supply its own template;
//! - the exception translator is created when the engine is available, the application did not
//!   supply its own translator and `exception-translation-enabled` is true.
//!
//! A missing prerequisite is not an error; the component is simply absent.

use crate::config::{validate, ClioneSqlProperties};
use crate::datasource::TransactionAwareDataSource;
use crate::error::{AppError, ClioneError, ConfigError};
use crate::template::ClioneSqlTemplate;
use crate::translate::{ClioneSqlExceptionTranslator, PersistenceExceptionTranslator, Translation};
use std::sync::Arc;

pub struct ClioneSqlAutoConfiguration {
    library_present: bool,
    properties: ClioneSqlProperties,
    data_source: Option<TransactionAwareDataSource>,
    template: Option<ClioneSqlTemplate>,
    exception_translator: Option<Arc<dyn PersistenceExceptionTranslator>>,
}

impl ClioneSqlAutoConfiguration {
    pub fn new(properties: ClioneSqlProperties) -> Self {
        Self {
            library_present: true,
            properties,
            data_source: None,
            template: None,
            exception_translator: None,
        }
    }

    /// Whether the 2-Way SQL engine is available to this process.
    pub fn with_library_present(mut self, present: bool) -> Self {
        self.library_present = present;
        self
    }

    pub fn with_data_source(mut self, data_source: impl Into<TransactionAwareDataSource>) -> Self {
        self.data_source = Some(data_source.into());
        self
    }

    /// Application-supplied template; suppresses the automatic one.
    pub fn with_template(mut self, template: ClioneSqlTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Application-supplied translator; suppresses the automatic one.
    pub fn with_exception_translator(mut self, translator: Arc<dyn PersistenceExceptionTranslator>) -> Self {
        self.exception_translator = Some(translator);
        self
    }

    pub fn configure(self) -> Result<ClioneSqlBeans, ConfigError> {
        let Self {
            library_present,
            properties,
            data_source,
            template,
            exception_translator,
        } = self;

        if !library_present {
            tracing::warn!("2-Way SQL engine not available, skipping template and exception translator");
            return Ok(ClioneSqlBeans {
                properties,
                template,
                exception_translator,
            });
        }
        validate(&properties)?;

        let template = match (template, data_source) {
            (Some(user), _) => {
                tracing::info!("using application-supplied template");
                Some(user)
            }
            (None, Some(ds)) => {
                tracing::info!(pool_size = ds.pool().size(), "creating template");
                Some(ClioneSqlTemplate::new(ds, properties.clone()))
            }
            (None, None) => {
                tracing::warn!("no data source, template not created");
                None
            }
        };

        let exception_translator = match exception_translator {
            Some(user) => {
                tracing::info!("using application-supplied exception translator");
                Some(user)
            }
            None if properties.is_exception_translation_enabled() => {
                tracing::info!("creating exception translator");
                Some(Arc::new(ClioneSqlExceptionTranslator::new()) as Arc<dyn PersistenceExceptionTranslator>)
            }
            None => {
                tracing::info!("exception translation disabled");
                None
            }
        };

        Ok(ClioneSqlBeans {
            properties,
            template,
            exception_translator,
        })
    }
}

/// Components produced at startup.
#[derive(Clone)]
pub struct ClioneSqlBeans {
    pub properties: ClioneSqlProperties,
    pub template: Option<ClioneSqlTemplate>,
    pub exception_translator: Option<Arc<dyn PersistenceExceptionTranslator>>,
}

impl ClioneSqlBeans {
    pub fn template(&self) -> Option<&ClioneSqlTemplate> {
        self.template.as_ref()
    }

    pub fn exception_translator(&self) -> Option<&Arc<dyn PersistenceExceptionTranslator>> {
        self.exception_translator.as_ref()
    }

    /// Translate when a translator is configured; otherwise the native error is kept.
    pub fn translate_error(&self, err: ClioneError) -> AppError {
        let Some(translator) = &self.exception_translator else {
            return AppError::Clione(err);
        };
        match translator.translate_if_possible(Box::new(err)) {
            Translation::Translated(e) => AppError::DataAccess(e),
            Translation::Unrecognized(original) => match original.downcast::<ClioneError>() {
                Ok(e) => AppError::Clione(*e),
                Err(other) => AppError::Internal(other.to_string()),
            },
        }
    }

    pub fn translate_result<T>(&self, result: Result<T, ClioneError>) -> Result<T, AppError> {
        result.map_err(|e| self.translate_error(e))
    }
}
