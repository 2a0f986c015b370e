//! In-memory `EntityApi` double and record builders shared by controller tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use shared::{
    domain::{
        Company, CompanyId, Industry, IndustryDetail, IndustryId, RecordStatus, Scheme, SchemeId,
    },
    error::ApiError,
    protocol::{ExportRequest, StatusAction},
};
use tokio::sync::{oneshot, Notify};

use crate::{
    api::{DraftApi, EntityApi, RemoteError},
    entity::{Editable, Entity},
};

pub(crate) struct FakeApi<T: Entity> {
    pub items: Mutex<Vec<T>>,
    pub list_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    list_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    pub deleted: Mutex<Vec<T::Id>>,
    pub transitions: Mutex<Vec<(T::Id, StatusAction)>>,
    pub export_requests: Mutex<Vec<ExportRequest>>,
    pub export_gated: AtomicBool,
    pub export_gate: Notify,
    pub save_calls: AtomicUsize,
    pub next_save: Mutex<Option<Result<T, RemoteError>>>,
}

impl<T: Entity> FakeApi<T> {
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            list_calls: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            list_gates: Mutex::new(VecDeque::new()),
            deleted: Mutex::new(Vec::new()),
            transitions: Mutex::new(Vec::new()),
            export_requests: Mutex::new(Vec::new()),
            export_gated: AtomicBool::new(false),
            export_gate: Notify::new(),
            save_calls: AtomicUsize::new(0),
            next_save: Mutex::new(None),
        }
    }

    pub fn set_items(&self, items: Vec<T>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// The next list call answers with the items as of call time, but only
    /// once the returned sender fires.
    pub fn gate_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn respond_to_save(&self, response: Result<T, RemoteError>) {
        *self.next_save.lock().unwrap() = Some(response);
    }
}

pub(crate) fn transport_error(path: &str) -> RemoteError {
    RemoteError::Transport {
        path: path.to_string(),
        message: "connection refused".to_string(),
    }
}

pub(crate) fn validation_error(path: &str, body: serde_json::Value) -> RemoteError {
    RemoteError::Status {
        path: path.to_string(),
        error: ApiError::new(400, body),
    }
}

#[async_trait]
impl<T: Entity> EntityApi<T> for FakeApi<T> {
    async fn list(&self, _filter: &T::Filter) -> Result<Vec<T>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.items.lock().unwrap().clone();
        let failing = self.fail_list.load(Ordering::SeqCst);
        let gate = self.list_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if failing {
            return Err(transport_error(T::RESOURCE));
        }
        Ok(snapshot)
    }

    async fn retrieve(&self, id: T::Id) -> Result<T, RemoteError> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                path: format!("{}/{id}/", T::RESOURCE),
                error: ApiError::new(404, json!({ "detail": "Not found." })),
            })
    }

    async fn delete(&self, id: T::Id) -> Result<(), RemoteError> {
        self.items.lock().unwrap().retain(|item| item.id() != id);
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn transition(&self, id: T::Id, action: StatusAction) -> Result<(), RemoteError> {
        self.transitions.lock().unwrap().push((id, action));
        Ok(())
    }

    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, RemoteError> {
        self.export_requests.lock().unwrap().push(request.clone());
        if self.export_gated.load(Ordering::SeqCst) {
            self.export_gate.notified().await;
        }
        Ok(b"%PDF-1.7 fake".to_vec())
    }
}

#[async_trait]
impl<T: Editable> DraftApi<T> for FakeApi<T> {
    async fn create(&self, _draft: &T::Draft) -> Result<T, RemoteError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.next_save
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(transport_error("create")))
    }

    async fn update(&self, _id: T::Id, _draft: &T::Draft) -> Result<T, RemoteError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.next_save
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(transport_error("update")))
    }
}

pub(crate) fn company(id: i64, name: &str, industry: &str, contact: &str, email: &str) -> Company {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    Company {
        id: CompanyId(id),
        company_name: name.to_string(),
        address: "1 Harbour Road".to_string(),
        industry: IndustryId(id % 3 + 1),
        industry_detail: Some(IndustryDetail {
            id: IndustryId(id % 3 + 1),
            industry_name: industry.to_string(),
        }),
        contact_person: contact.to_string(),
        email: email.to_string(),
        phone: "+254700000000".to_string(),
        website: None,
        remark: None,
        created_at: stamp,
        updated_at: stamp,
        status: RecordStatus::Active,
    }
}

pub(crate) fn industry(id: i64, name: &str) -> Industry {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    Industry {
        id: IndustryId(id),
        industry_name: name.to_string(),
        description: None,
        created_at: stamp,
        updated_at: stamp,
        status: RecordStatus::Active,
    }
}

pub(crate) fn industries(count: i64) -> Vec<Industry> {
    (1..=count)
        .map(|id| industry(id, &format!("Industry {id:02}")))
        .collect()
}

pub(crate) fn scheme(id: i64, name: &str, company: i64) -> Scheme {
    Scheme {
        id: SchemeId(id),
        scheme_name: name.to_string(),
        card_code: format!("SC{id:03}"),
        description: String::new(),
        company: CompanyId(company),
        status: RecordStatus::Active,
    }
}
