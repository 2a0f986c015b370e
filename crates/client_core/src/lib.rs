//! Headless core of the brokerage admin console: a typed REST client, a
//! time-boxed list cache, and the list/form controllers that drive every
//! entity view.

pub mod api;
pub mod cache;
pub mod clock;
pub mod context;
pub mod detail;
pub mod drafts;
pub mod entity;
pub mod export;
pub mod form;
pub mod list;
pub mod validation;
pub mod view;

pub use api::{ApiClient, DraftApi, EntityApi, RemoteError};
pub use cache::{LocalCache, Snapshot, DEFAULT_CACHE_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ConsoleContext, Theme};
pub use detail::{load_company_detail, resolve, CompanyDetail, Detail};
pub use drafts::{BenefitDraft, CompanyDraft, DraftFieldError, FormDraft, IndustryDraft};
pub use entity::{Editable, Entity, FieldValue};
pub use export::{export_filename, DirectorySink, DownloadSink};
pub use form::{FormController, FormError, FormMode, SaveListener, SubmitOutcome};
pub use list::{ExportOutcome, ListController, ListError, LoadState, ReloadOutcome};
pub use view::{DerivedView, ListQuery, RowState, SortDirection};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
