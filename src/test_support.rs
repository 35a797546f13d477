//! Shared fixtures for unit tests.

use crate::models::ImagingStudy;

pub fn sample_study(id: &str) -> ImagingStudy {
    sample_study_for(id, "patient-001", &[])
}

pub fn sample_study_for(id: &str, patient_id: &str, related: &[&str]) -> ImagingStudy {
    ImagingStudy::new(id, patient_id)
        .with_attribute("studyDate", "2024-01-15")
        .with_attribute("modality", "MR")
        .with_attribute(
            "description",
            "Brain MRI without contrast, axial and sagittal series",
        )
        .with_attribute("seriesCount", 6)
        .with_attribute("instanceCount", 420)
        .with_attribute("status", "completed")
        .with_attribute("sensitivity", "normal")
        .with_attribute("viewerUrl", format!("https://viewer.example/studies/{}", id))
        .with_attribute("relatedStudyIds", related.to_vec())
}
