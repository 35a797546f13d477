//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use imaging_cache::fetch::{
    RawResponse, RetryPolicy, StaticTokenProvider, StudyFetcher, TransportError,
};
use imaging_cache::models::ImagingStudy;
use imaging_cache::{ImagingCacheService, PartialCacheConfig};

pub fn study(id: &str) -> ImagingStudy {
    study_with_related(id, &[])
}

pub fn study_with_related(id: &str, related: &[&str]) -> ImagingStudy {
    ImagingStudy::new(id, "patient-001")
        .with_attribute("studyDate", "2024-03-02")
        .with_attribute("modality", "CT")
        .with_attribute("description", "CT abdomen and pelvis with contrast")
        .with_attribute("seriesCount", 3)
        .with_attribute("instanceCount", 250)
        .with_attribute("status", "completed")
        .with_attribute("sensitivity", "normal")
        .with_attribute("viewerUrl", format!("https://viewer.example/studies/{}", id))
        .with_attribute("relatedStudyIds", related.to_vec())
}

pub fn status(code: u16, reason: &str) -> Result<RawResponse, TransportError> {
    Ok(RawResponse {
        status: code,
        status_text: reason.to_string(),
        body: String::new(),
    })
}

pub fn body(text: &str) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::ok(text))
}

pub fn transport(reason: &str) -> Result<RawResponse, TransportError> {
    Err(TransportError(reason.to_string()))
}

/// Replays scripted replies first, then serves known studies (404 otherwise).
#[derive(Default)]
pub struct ScriptedFetcher {
    studies: HashMap<String, ImagingStudy>,
    script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    attempts: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn serving(studies: &[ImagingStudy]) -> Arc<Self> {
        Self::scripted(studies, Vec::new())
    }

    pub fn scripted(
        studies: &[ImagingStudy],
        script: Vec<Result<RawResponse, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            studies: studies.iter().map(|s| (s.id.clone(), s.clone())).collect(),
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudyFetcher for ScriptedFetcher {
    async fn fetch_study(
        &self,
        study_id: &str,
        _patient_id: &str,
        _bearer_token: &str,
    ) -> Result<RawResponse, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(study_id.to_string());

        if let Some(reply) = self.script.lock().unwrap().pop_front() {
            return reply;
        }

        match self.studies.get(study_id) {
            Some(study) => Ok(RawResponse::ok(serde_json::to_string(study).unwrap())),
            None => status(404, "Not Found"),
        }
    }
}

pub fn service_with(
    fetcher: Arc<ScriptedFetcher>,
    config: PartialCacheConfig,
) -> ImagingCacheService {
    ImagingCacheService::with_retry_policy(
        config,
        fetcher,
        Arc::new(StaticTokenProvider::new("test-token")),
        RetryPolicy::immediate(),
    )
}

pub fn no_prefetch() -> PartialCacheConfig {
    PartialCacheConfig {
        prefetch_enabled: Some(false),
        ..Default::default()
    }
}
