use super::*;
use crate::{
    drafts::CompanyDraft,
    test_support::{company, transport_error, validation_error, FakeApi},
};
use serde_json::json;
use shared::domain::{Company, CompanyId, RecordStatus};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

type Form = FormController<Company, Arc<FakeApi<Company>>>;

#[derive(Default)]
struct SaveLog {
    saved: Mutex<Vec<CompanyId>>,
}

#[async_trait]
impl SaveListener<Company> for SaveLog {
    async fn saved(&self, entity: &Company) {
        self.saved.lock().unwrap().push(entity.id);
    }
}

fn form() -> (Arc<FakeApi<Company>>, Form) {
    let api = Arc::new(FakeApi::with_items(Vec::new()));
    (api.clone(), FormController::new(api))
}

fn fill_valid_company(form: &mut Form) {
    for (name, value) in [
        ("company_name", "Acme Mining"),
        ("address", "1 Harbour Road"),
        ("industry", "2"),
        ("contact_person", "Jane Doe"),
        ("email", "jane@acme.co"),
        ("phone", "+254 700 000 000"),
        ("website", "https://acme.co"),
    ] {
        form.set_field(name, value).expect("known field");
    }
}

#[tokio::test]
async fn invalid_form_is_not_sent() {
    let (api, mut form) = form();
    let listener = SaveLog::default();
    form.open_create();
    fill_valid_company(&mut form);
    form.set_field("company_name", "").expect("field");

    let outcome = form.submit(&listener).await.expect("submit");

    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert_eq!(form.error("company_name"), Some("Company name is required"));
    assert_eq!(api.save_calls.load(Ordering::SeqCst), 0);
    assert!(form.is_open());
    assert!(listener.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn successful_create_notifies_and_closes() {
    let (api, mut form) = form();
    let listener = SaveLog::default();
    let created = company(41, "Acme Mining", "Mining", "Jane Doe", "jane@acme.co");
    api.respond_to_save(Ok(created.clone()));
    form.open_create();
    fill_valid_company(&mut form);

    let outcome = form.submit(&listener).await.expect("submit");

    assert_eq!(outcome, SubmitOutcome::Saved(created));
    assert_eq!(*listener.saved.lock().unwrap(), vec![CompanyId(41)]);
    assert_eq!(api.save_calls.load(Ordering::SeqCst), 1);
    assert!(!form.is_open());
}

#[tokio::test]
async fn backend_field_errors_fill_the_error_map() {
    let (api, mut form) = form();
    let listener = SaveLog::default();
    api.respond_to_save(Err(validation_error(
        "companies/",
        json!({
            "email": ["company with this email already exists."],
            "phone": "Invalid phone number."
        }),
    )));
    form.open_create();
    fill_valid_company(&mut form);

    let outcome = form.submit(&listener).await.expect("submit");

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert_eq!(
        form.error("email"),
        Some("company with this email already exists.")
    );
    assert_eq!(form.error("phone"), Some("Invalid phone number."));
    assert!(form.is_open());
    assert!(listener.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failure_is_returned_and_form_stays_open() {
    let (api, mut form) = form();
    api.respond_to_save(Err(transport_error("companies/")));
    form.open_create();
    fill_valid_company(&mut form);

    let err = form
        .submit(&SaveLog::default())
        .await
        .expect_err("must fail");

    assert!(matches!(err, FormError::Remote(RemoteError::Transport { .. })));
    assert!(form.is_open());
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn submitting_a_closed_form_fails() {
    let (_api, mut form) = form();
    let err = form
        .submit(&SaveLog::default())
        .await
        .expect_err("closed");
    assert!(matches!(err, FormError::Closed));
}

#[test]
fn editing_a_field_clears_only_its_error() {
    let (_api, mut form) = form();
    form.open_create();
    assert!(!form.validate());
    assert!(form.error("email").is_some());
    assert!(form.error("phone").is_some());

    form.set_field("email", "jane@acme.co").expect("field");

    assert!(form.error("email").is_none());
    assert!(form.error("phone").is_some());
}

#[test]
fn open_edit_copies_the_record_and_discards_prior_edits() {
    let (_api, mut form) = form();
    let record = company(7, "Acme Mining", "Mining", "Jane Doe", "jane@acme.co");

    form.open_edit(&record);
    form.set_field("company_name", "Renamed").expect("field");
    form.close();
    form.open_edit(&record);

    assert_eq!(form.mode(), FormMode::Edit(CompanyId(7)));
    assert_eq!(form.draft(), &record.to_draft());
    assert_eq!(form.draft().company_name, "Acme Mining");
    assert_eq!(form.draft().industry, record.industry.0.to_string());
}

#[test]
fn retarget_rebuilds_only_on_identity_change() {
    let (_api, mut form) = form();
    let first = company(1, "Acme Mining", "Mining", "Jane Doe", "jane@acme.co");
    let second = company(2, "Baobab Foods", "Agriculture", "Sam", "sam@baobab.co");

    form.open_edit(&first);
    form.set_field("remark", "in progress").expect("field");

    form.retarget(Some(&first));
    assert_eq!(form.draft().remark, "in progress");

    form.retarget(Some(&second));
    assert_eq!(form.mode(), FormMode::Edit(CompanyId(2)));
    assert_eq!(form.draft().company_name, "Baobab Foods");

    form.retarget(None);
    assert_eq!(form.mode(), FormMode::Create);
    assert_eq!(form.draft(), &CompanyDraft::default());
}

#[test]
fn retarget_is_ignored_while_closed() {
    let (_api, mut form) = form();
    let record = company(1, "Acme Mining", "Mining", "Jane Doe", "jane@acme.co");
    form.retarget(Some(&record));
    assert!(!form.is_open());
    assert_eq!(form.mode(), FormMode::Create);
}

#[test]
fn unknown_and_malformed_fields_are_errors() {
    let (_api, mut form) = form();
    form.open_create();
    assert!(matches!(
        form.set_field("favourite_colour", "teal"),
        Err(FormError::Field(DraftFieldError::Unknown(_)))
    ));
    assert!(matches!(
        form.set_field("status", "retired"),
        Err(FormError::Field(DraftFieldError::InvalidValue { .. }))
    ));
    form.set_field("status", "inactive").expect("status");
    assert_eq!(form.draft().status, RecordStatus::Inactive);
}

#[tokio::test]
async fn edit_submits_an_update() {
    let (api, mut form) = form();
    let record = company(3, "Acme Mining", "Mining", "Jane Doe", "jane@acme.co");
    let mut updated = record.clone();
    updated.company_name = "Acme Mining Group".to_string();
    api.respond_to_save(Ok(updated.clone()));

    struct Counter(AtomicUsize);
    #[async_trait]
    impl SaveListener<Company> for Counter {
        async fn saved(&self, _entity: &Company) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
    let counter = Arc::new(Counter(AtomicUsize::new(0)));

    form.open_edit(&record);
    form.set_field("company_name", "Acme Mining Group").expect("field");
    let outcome = form.submit(counter.as_ref()).await.expect("submit");

    assert_eq!(outcome, SubmitOutcome::Saved(updated));
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[test]
fn clearing_an_optional_field_sends_null_on_update() {
    let (_api, mut form) = form();
    let mut record = company(7, "Acme Mining", "Mining", "Jane Doe", "jane@acme.co");
    record.website = Some("https://acme.co".into());
    record.remark = Some("key account".into());

    form.open_edit(&record);
    form.set_field("website", "").expect("field");

    let body = serde_json::to_value(form.draft().payload()).expect("json");
    let keys = body.as_object().expect("object");
    assert!(keys.contains_key("website"));
    assert_eq!(body["website"], serde_json::Value::Null);
    assert_eq!(body["remark"], json!("key account"));
}
