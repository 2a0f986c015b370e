//! Form Controller: draft state, field errors and the submit lifecycle for
//! creating or updating one record.

use async_trait::async_trait;
use shared::error::FieldErrors;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    api::{DraftApi, RemoteError},
    drafts::{DraftFieldError, FormDraft},
    entity::Editable,
};

/// Notified after a successful save; list views reload in response.
#[async_trait]
pub trait SaveListener<T>: Send + Sync {
    async fn saved(&self, entity: &T);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode<Id> {
    Create,
    Edit(Id),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Local rules failed; nothing was sent.
    Invalid,
    /// The backend answered with field errors, now in the error map.
    Rejected,
    Saved(T),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form is not open")]
    Closed,
    #[error(transparent)]
    Field(#[from] DraftFieldError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub struct FormController<T: Editable, A> {
    api: A,
    open: bool,
    mode: FormMode<T::Id>,
    draft: T::Draft,
    errors: FieldErrors,
}

impl<T, A> FormController<T, A>
where
    T: Editable,
    A: DraftApi<T>,
{
    pub fn new(api: A) -> Self {
        Self {
            api,
            open: false,
            mode: FormMode::Create,
            draft: T::Draft::default(),
            errors: FieldErrors::new(),
        }
    }

    pub fn open_create(&mut self) {
        self.reset(FormMode::Create, T::Draft::default());
    }

    /// Always starts from a fresh copy of `entity`, discarding any prior edits.
    pub fn open_edit(&mut self, entity: &T) {
        self.reset(FormMode::Edit(entity.id()), entity.to_draft());
    }

    /// Follows a change of the selected record while the form is open. The
    /// draft is rebuilt only when the target identity actually changes.
    pub fn retarget(&mut self, target: Option<&T>) {
        if !self.open {
            return;
        }
        let next = target.map(|entity| entity.id());
        let current = match self.mode {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(id),
        };
        if next == current {
            return;
        }
        match target {
            Some(entity) => self.open_edit(entity),
            None => self.open_create(),
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> FormMode<T::Id> {
        self.mode
    }

    pub fn draft(&self) -> &T::Draft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        self.draft.set_field(name, value)?;
        self.errors.remove(name);
        Ok(())
    }

    pub fn validate(&mut self) -> bool {
        self.errors = self.draft.validate();
        self.errors.is_empty()
    }

    pub async fn submit(
        &mut self,
        listener: &dyn SaveListener<T>,
    ) -> Result<SubmitOutcome<T>, FormError> {
        if !self.open {
            return Err(FormError::Closed);
        }
        if !self.validate() {
            debug!(
                resource = T::RESOURCE,
                fields = ?self.errors.keys().collect::<Vec<_>>(),
                "form invalid; not submitting"
            );
            return Ok(SubmitOutcome::Invalid);
        }

        let result = match self.mode {
            FormMode::Create => self.api.create(&self.draft).await,
            FormMode::Edit(id) => self.api.update(id, &self.draft).await,
        };

        match result {
            Ok(entity) => {
                info!(resource = T::RESOURCE, id = %entity.id(), "record saved");
                listener.saved(&entity).await;
                self.open = false;
                Ok(SubmitOutcome::Saved(entity))
            }
            Err(err) => match err.field_errors() {
                Some(fields) => {
                    debug!(resource = T::RESOURCE, "backend rejected form fields");
                    self.errors = fields;
                    Ok(SubmitOutcome::Rejected)
                }
                None => Err(err.into()),
            },
        }
    }

    fn reset(&mut self, mode: FormMode<T::Id>, draft: T::Draft) {
        self.mode = mode;
        self.draft = draft;
        self.errors.clear();
        self.open = true;
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
