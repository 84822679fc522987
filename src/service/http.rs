use std::time::Duration;

use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;

use super::wire::{
    ImageUpload, MedicationRequest, TranslateRequest, TranslateResponse, UpdateProfileRequest,
};
use super::{MedicationService, ServiceError};
use crate::config;
use crate::models::{
    decode_medication_list, AddOutcome, Medication, MedicationDraft, Profile, SafetyResult,
};

const PROFILE_GET_PATH: &str = "/api/profile/get";
const PROFILE_UPDATE_PATH: &str = "/api/profile/update";
const MED_LIST_PATH: &str = "/api/med/list";
const MED_CHECK_PATH: &str = "/api/med/check";
const MED_ADD_PATH: &str = "/api/med/add";
const SCAN_PATH: &str = "/api/scanner/scan";
const TRANSLATE_PATH: &str = "/api/translator/translate";

/// Multipart field the scanner endpoint reads the image from.
const SCAN_FIELD: &str = "image";

/// JSON-over-HTTP client for the remote medication service.
pub struct HttpMedicationService {
    base_url: String,
    client: Client,
}

impl HttpMedicationService {
    /// Client for the service at `base_url`. Only the TCP connect is bounded.
    pub fn new(base_url: &str, connect_timeout_secs: u64) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(None)
            .build()
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client configured from `MEDTRACK_API_URL` / `MEDTRACK_CONNECT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::new(&config::api_base_url(), config::connect_timeout_secs())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_connect() {
            ServiceError::Connection(self.base_url.clone())
        } else {
            ServiceError::HttpClient(e.to_string())
        }
    }

    /// Turn a non-2xx response into `ServiceError::Status`.
    fn ensure_success(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        response
            .json()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))
    }
}

impl MedicationService for HttpMedicationService {
    fn get_profile(&self, patient_id: &str) -> Result<Option<Profile>, ServiceError> {
        let _span = tracing::info_span!("get_profile", patient_id).entered();
        let response = self
            .client
            .get(self.url(PROFILE_GET_PATH))
            .query(&[("id", patient_id)])
            .send()
            .map_err(|e| self.transport_error(e))?;

        let body = Self::ensure_success(response)?
            .text()
            .map_err(|e| self.transport_error(e))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ServiceError::ResponseParsing(e.to_string())),
            _ => Err(ServiceError::ResponseParsing(
                "profile body is not a JSON object".to_string(),
            )),
        }
    }

    fn update_profile(&self, patient_id: &str, profile: &Profile) -> Result<(), ServiceError> {
        let _span = tracing::info_span!("update_profile", patient_id).entered();
        let response = self
            .client
            .post(self.url(PROFILE_UPDATE_PATH))
            .json(&UpdateProfileRequest {
                id: patient_id,
                profile,
            })
            .send()
            .map_err(|e| self.transport_error(e))?;

        Self::ensure_success(response)?;
        Ok(())
    }

    fn list_medications(&self, patient_id: &str) -> Result<Vec<Medication>, ServiceError> {
        let _span = tracing::info_span!("list_medications", patient_id).entered();
        let response = self
            .client
            .get(self.url(MED_LIST_PATH))
            .query(&[("id", patient_id)])
            .send()
            .map_err(|e| self.transport_error(e))?;

        let body: serde_json::Value = Self::read_json(Self::ensure_success(response)?)?;
        let medications = decode_medication_list(body);
        tracing::debug!(count = medications.len(), "Medication list received");
        Ok(medications)
    }

    fn check_safety(
        &self,
        patient_id: &str,
        draft: &MedicationDraft,
    ) -> Result<SafetyResult, ServiceError> {
        let _span =
            tracing::info_span!("check_safety", patient_id, drug = %draft.drug_name).entered();
        let response = self
            .client
            .post(self.url(MED_CHECK_PATH))
            .json(&MedicationRequest {
                id: patient_id,
                medication: draft,
            })
            .send()
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(Self::ensure_success(response)?)
    }

    fn add_medication(
        &self,
        patient_id: &str,
        draft: &MedicationDraft,
    ) -> Result<AddOutcome, ServiceError> {
        let _span =
            tracing::info_span!("add_medication", patient_id, drug = %draft.drug_name).entered();
        let response = self
            .client
            .post(self.url(MED_ADD_PATH))
            .json(&MedicationRequest {
                id: patient_id,
                medication: draft,
            })
            .send()
            .map_err(|e| self.transport_error(e))?;

        // The outcome is carried by the body shape, whatever the status code.
        let status = response.status();
        let body = response.text().map_err(|e| self.transport_error(e))?;
        tracing::debug!(status = status.as_u16(), "Add-medication response received");
        Ok(AddOutcome::from_body(&body))
    }

    fn extract_from_image(&self, image: &ImageUpload) -> Result<serde_json::Value, ServiceError> {
        let _span = tracing::info_span!(
            "extract_from_image",
            file_name = %image.file_name,
            image_size = image.bytes.len(),
        )
        .entered();
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;
        let form = multipart::Form::new().part(SCAN_FIELD, part);

        let response = self
            .client
            .post(self.url(SCAN_PATH))
            .multipart(form)
            .send()
            .map_err(|e| self.transport_error(e))?;

        Self::read_json(Self::ensure_success(response)?)
    }

    fn translate(&self, request: &TranslateRequest) -> Result<Option<String>, ServiceError> {
        let _span = tracing::info_span!("translate", drug = %request.drug_name).entered();
        let response = self
            .client
            .post(self.url(TRANSLATE_PATH))
            .json(request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let parsed: TranslateResponse = Self::read_json(Self::ensure_success(response)?)?;
        Ok(parsed.translation.filter(|t| !t.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use super::*;
    use crate::models::SafetyStatus;

    type Seen = Arc<Mutex<Vec<Value>>>;

    /// Serve `router` on an ephemeral local port from a background runtime.
    fn spawn_fake_service(router: Router) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router).await.unwrap();
            });
        });

        format!("http://{addr}")
    }

    fn client(base_url: &str) -> HttpMedicationService {
        HttpMedicationService::new(base_url, 5).unwrap()
    }

    fn draft() -> MedicationDraft {
        MedicationDraft {
            drug_name: "Aspirin".into(),
            dosage: "81mg".into(),
            frequency: "Once daily".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            instructions: "With water".into(),
        }
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let svc = client("http://localhost:3000/");
        assert_eq!(svc.base_url(), "http://localhost:3000");
        assert_eq!(svc.url(MED_ADD_PATH), "http://localhost:3000/api/med/add");
    }

    #[test]
    fn get_profile_sends_patient_id() {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/profile/get",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(json!(params));
                    Json(json!({"name":"Jane Doe","age":40,"allergies":[],"conditions":[]}))
                }
            }),
        );
        let svc = client(&spawn_fake_service(router));

        let profile = svc.get_profile("demo_patient_123").unwrap().unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.age, 40);
        assert_eq!(seen.lock().unwrap()[0]["id"], "demo_patient_123");
    }

    #[test]
    fn get_profile_empty_body_is_none() {
        let router = Router::new().route("/api/profile/get", get(|| async { "" }));
        let svc = client(&spawn_fake_service(router));
        assert_eq!(svc.get_profile("p").unwrap(), None);
    }

    #[test]
    fn get_profile_null_body_is_none() {
        let router = Router::new().route("/api/profile/get", get(|| async { Json(Value::Null) }));
        let svc = client(&spawn_fake_service(router));
        assert_eq!(svc.get_profile("p").unwrap(), None);
    }

    #[test]
    fn get_profile_array_body_is_parse_error() {
        let router =
            Router::new().route("/api/profile/get", get(|| async { Json(json!(["Jane"])) }));
        let svc = client(&spawn_fake_service(router));
        assert!(matches!(
            svc.get_profile("p"),
            Err(ServiceError::ResponseParsing(_))
        ));
    }

    #[test]
    fn get_profile_tolerates_null_age() {
        let router = Router::new().route(
            "/api/profile/get",
            get(|| async { Json(json!({"name":"Jane Doe","age":null})) }),
        );
        let svc = client(&spawn_fake_service(router));
        let profile = svc.get_profile("p").unwrap().unwrap();
        assert!(profile.is_populated());
        assert_eq!(profile.age, 0);
    }

    #[test]
    fn update_profile_posts_shaped_body() {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/profile/update",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    StatusCode::OK
                }
            }),
        );
        let svc = client(&spawn_fake_service(router));
        let profile = Profile {
            name: "Jane".into(),
            age: 40,
            allergies: vec!["peanuts".into(), "shellfish".into()],
            conditions: vec![],
        };

        svc.update_profile("demo_patient_123", &profile).unwrap();

        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(body["id"], "demo_patient_123");
        assert_eq!(body["profile"]["allergies"], json!(["peanuts", "shellfish"]));
    }

    #[test]
    fn update_profile_failure_carries_server_text() {
        let router = Router::new().route(
            "/api/profile/update",
            post(|| async { (StatusCode::BAD_REQUEST, "Age must be positive") }),
        );
        let svc = client(&spawn_fake_service(router));

        let err = svc.update_profile("p", &Profile::default()).unwrap_err();
        match err {
            ServiceError::Status { status, ref body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Age must be positive");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn list_medications_decodes_and_null_is_empty() {
        let router = Router::new()
            .route(
                "/api/med/list",
                get(|| async {
                    Json(json!([
                        {"id":"a","drug_name":"Aspirin","dosage":"81mg","taken":true},
                        {"id":7,"name":"Metformin","safety_status":"danger"}
                    ]))
                }),
            );
        let svc = client(&spawn_fake_service(router));
        let meds = svc.list_medications("p").unwrap();
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[1].id.as_str(), "7");
        assert_eq!(meds[1].safety_status, SafetyStatus::Danger);

        let null_router = Router::new().route("/api/med/list", get(|| async { Json(Value::Null) }));
        let svc = client(&spawn_fake_service(null_router));
        assert!(svc.list_medications("p").unwrap().is_empty());
    }

    #[test]
    fn list_medications_keeps_records_around_a_bad_one() {
        let router = Router::new().route(
            "/api/med/list",
            get(|| async {
                Json(json!([
                    {"id":"a","drug_name":"Aspirin"},
                    {"drug_name":"NoId"},
                    {"id":"c","drug_name":"Cetirizine","start_date":20250601}
                ]))
            }),
        );
        let svc = client(&spawn_fake_service(router));
        let meds = svc.list_medications("p").unwrap();
        let ids: Vec<_> = meds.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(meds[1].start_date, None);
    }

    #[test]
    fn list_medications_error_status() {
        let router = Router::new().route(
            "/api/med/list",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let svc = client(&spawn_fake_service(router));
        assert!(matches!(
            svc.list_medications("p"),
            Err(ServiceError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn add_medication_outcomes() {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/med/add",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let drug = body["medication"]["drug_name"].as_str().unwrap_or_default().to_string();
                    recorder.lock().unwrap().push(body);
                    if drug == "Warfarin" {
                        (StatusCode::OK, Json(json!({"status":"CRITICAL","message":"Bleeding risk"})))
                    } else {
                        (StatusCode::OK, Json(json!({"medication":{"id":"new-1","drug_name":drug}})))
                    }
                }
            }),
        );
        let svc = client(&spawn_fake_service(router));

        let outcome = svc.add_medication("demo_patient_123", &draft()).unwrap();
        assert!(matches!(outcome, AddOutcome::Added(ref m) if m.id.as_str() == "new-1"));

        let mut risky = draft();
        risky.drug_name = "Warfarin".into();
        let outcome = svc.add_medication("demo_patient_123", &risky).unwrap();
        assert_eq!(outcome, AddOutcome::Blocked("Bleeding risk".into()));

        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(body["id"], "demo_patient_123");
        assert_eq!(body["medication"]["start_date"], "2025-06-01");
        assert_eq!(body["medication"]["frequency"], "Once daily");
    }

    #[test]
    fn add_medication_server_error_is_failed_outcome() {
        let router = Router::new().route(
            "/api/med/add",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable") }),
        );
        let svc = client(&spawn_fake_service(router));
        assert_eq!(
            svc.add_medication("p", &draft()).unwrap(),
            AddOutcome::Failed("database unavailable".into())
        );
    }

    #[test]
    fn check_safety_decodes_result() {
        let router = Router::new().route(
            "/api/med/check",
            post(|| async {
                Json(json!({"status":"WARNING","message":"Monitor","interactions":["aspirin + ibuprofen"]}))
            }),
        );
        let svc = client(&spawn_fake_service(router));
        let result = svc.check_safety("p", &draft()).unwrap();
        assert_eq!(result.status, SafetyStatus::Warning);
        assert_eq!(result.interactions, vec!["aspirin + ibuprofen"]);
    }

    #[test]
    fn extract_sends_multipart_image_field() {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/scanner/scan",
            post(move |mut multipart: Multipart| {
                let recorder = recorder.clone();
                async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().unwrap_or_default().to_string();
                        let content_type = field.content_type().unwrap_or_default().to_string();
                        let bytes = field.bytes().await.unwrap();
                        recorder.lock().unwrap().push(json!({
                            "name": name,
                            "file_name": file_name,
                            "content_type": content_type,
                            "len": bytes.len(),
                        }));
                    }
                    Json(json!({"name":"Amoxicillin","dosage":"500mg","confidence":0.91,"extra":"kept"}))
                }
            }),
        );
        let svc = client(&spawn_fake_service(router));
        let upload = ImageUpload::new("label.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0]);

        let body = svc.extract_from_image(&upload).unwrap();
        assert_eq!(body["name"], "Amoxicillin");
        assert_eq!(body["extra"], "kept");

        let field = seen.lock().unwrap()[0].clone();
        assert_eq!(field["name"], "image");
        assert_eq!(field["file_name"], "label.jpg");
        assert_eq!(field["content_type"], "image/jpeg");
        assert_eq!(field["len"], 4);
    }

    #[test]
    fn translate_posts_fields_and_reads_translation() {
        let seen: Seen = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/translator/translate",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    Json(json!({"translation":"Tomar con comida"}))
                }
            }),
        );
        let svc = client(&spawn_fake_service(router));
        let request = TranslateRequest {
            drug_name: "Ibuprofen".into(),
            dosage: "200mg".into(),
            instructions: "Take with food".into(),
        };

        assert_eq!(svc.translate(&request).unwrap().as_deref(), Some("Tomar con comida"));
        let body = seen.lock().unwrap()[0].clone();
        assert_eq!(
            body,
            json!({"drug_name":"Ibuprofen","dosage":"200mg","instructions":"Take with food"})
        );
    }

    #[test]
    fn translate_without_translation_is_none() {
        let router = Router::new().route("/api/translator/translate", post(|| async { Json(json!({})) }));
        let svc = client(&spawn_fake_service(router));
        let request = TranslateRequest {
            drug_name: "A".into(),
            dosage: "B".into(),
            instructions: "C".into(),
        };
        assert_eq!(svc.translate(&request).unwrap(), None);
    }

    #[test]
    fn unreachable_service_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let svc = client(&format!("http://127.0.0.1:{port}"));
        let err = svc.list_medications("p").unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }
}
