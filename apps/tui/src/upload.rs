//! Photo selection, validation and the sequential submit flow.

use crate::domain::NewReport;
use crate::location::{LocationError, LocationProvider};
use crate::store::photo::{
    content_type_for, is_image_content_type, object_path_for, MAX_PHOTO_BYTES,
};
use crate::store::{ReportStore, StoreError};
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an image file")]
    NotAnImage,
    #[error("File size must be less than 5MB")]
    TooLarge,
    #[error("Could not read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Any failure of the submit flow; the message is what the form shows.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPhoto {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: &'static str,
}

/// Checks type (by extension) and size of a candidate photo.
pub fn validate_photo(path: &Path) -> Result<SelectedPhoto, ValidationError> {
    let content_type = content_type_for(path);
    if !is_image_content_type(content_type) {
        return Err(ValidationError::NotAnImage);
    }

    let metadata = std::fs::metadata(path).map_err(|e| ValidationError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    if !metadata.is_file() {
        return Err(ValidationError::Unreadable {
            path: path.display().to_string(),
            reason: "not a regular file".to_string(),
        });
    }
    if metadata.len() > MAX_PHOTO_BYTES {
        return Err(ValidationError::TooLarge);
    }

    Ok(SelectedPhoto {
        path: path.to_path_buf(),
        size: metadata.len(),
        content_type,
    })
}

/// State of the upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub path_input: String,
    selected: Option<SelectedPhoto>,
    error: Option<String>,
    is_uploading: bool,
}

impl UploadForm {
    pub const fn selected(&self) -> Option<&SelectedPhoto> {
        self.selected.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub const fn is_uploading(&self) -> bool {
        self.is_uploading
    }

    /// Submit is available with a valid selection and no upload in flight.
    pub const fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.is_uploading
    }

    /// Validates the typed path. A rejected file leaves the previous
    /// selection in place.
    pub fn select_typed_path(&mut self) {
        let raw = self.path_input.trim().to_string();
        if raw.is_empty() {
            return;
        }
        self.select(Path::new(&raw));
    }

    pub fn select(&mut self, path: &Path) {
        match validate_photo(path) {
            Ok(photo) => {
                info!(path = %photo.path.display(), size = photo.size, "photo selected");
                self.selected = Some(photo);
                self.error = None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "photo rejected");
                self.error = Some(err.to_string());
            }
        }
    }

    /// Marks the form busy and hands out the photo to submit.
    pub fn begin_submit(&mut self) -> Option<SelectedPhoto> {
        if !self.can_submit() {
            return None;
        }
        self.is_uploading = true;
        self.error = None;
        self.selected.clone()
    }

    pub fn finish(&mut self, result: &Result<(), UploadError>) {
        self.is_uploading = false;
        match result {
            Ok(()) => {
                self.selected = None;
                self.path_input.clear();
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }
}

/// Location, then bytes, then blob, then public reference, then row.
///
/// Stops at the first failing step. Nothing is rolled back: a photo stored
/// before a failed insert stays in the bucket.
pub async fn submit_report(
    store: &dyn ReportStore,
    location: &LocationProvider,
    photo: &SelectedPhoto,
) -> Result<(), UploadError> {
    let coords = location.current_location().await?;
    info!(
        latitude = coords.latitude,
        longitude = coords.longitude,
        "location acquired for report"
    );

    let bytes = tokio::fs::read(&photo.path).await.map_err(StoreError::from)?;
    if bytes.len() as u64 > MAX_PHOTO_BYTES {
        return Err(ValidationError::TooLarge.into());
    }

    let object_path = object_path_for(&photo.path, Utc::now(), &mut rand::thread_rng());
    let stored = store
        .upload_photo(&object_path, bytes, photo.content_type)
        .await?;
    let photo_url = store.public_url(&stored);
    info!(%photo_url, "photo stored");

    store
        .create_report(&NewReport {
            latitude: coords.latitude,
            longitude: coords.longitude,
            photo_url,
        })
        .await?;
    info!("report submitted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;
    use crate::location::{FixedPosition, PositionOptions, PositionSource};
    use crate::store::testing::FakeStore;
    use std::sync::Arc;

    fn provider(granted: bool) -> LocationProvider {
        let source: Arc<dyn PositionSource> =
            Arc::new(FixedPosition(Coordinates::new(16.29, 80.46)));
        let provider = LocationProvider::new(Some(source), PositionOptions::default());
        provider.set_permission(granted);
        provider
    }

    fn write_photo(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0xFF; len]).unwrap();
        path
    }

    #[test]
    fn text_file_is_rejected_and_nothing_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        let notes = write_photo(dir.path(), "notes.txt", 10);
        let mut form = UploadForm::default();

        form.select(&notes);

        assert_eq!(form.error(), Some("Please select an image file"));
        assert!(form.selected().is_none());
        assert!(!form.can_submit());
        assert!(form.begin_submit().is_none());
    }

    #[test]
    fn oversized_photo_is_rejected_but_earlier_choice_survives() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_photo(dir.path(), "pile.jpg", 1024);
        let big = dir.path().join("huge.png");
        std::fs::File::create(&big)
            .unwrap()
            .set_len(MAX_PHOTO_BYTES + 1)
            .unwrap();
        let mut form = UploadForm::default();

        form.select(&good);
        form.select(&big);

        assert_eq!(form.error(), Some("File size must be less than 5MB"));
        assert_eq!(form.selected().unwrap().path, good);
    }

    #[test]
    fn exactly_five_megabytes_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let edge = dir.path().join("edge.jpg");
        std::fs::File::create(&edge)
            .unwrap()
            .set_len(MAX_PHOTO_BYTES)
            .unwrap();
        let photo = validate_photo(&edge).unwrap();
        assert_eq!(photo.content_type, "image/jpeg");
        assert_eq!(photo.size, MAX_PHOTO_BYTES);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = validate_photo(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, ValidationError::Unreadable { .. }));
    }

    #[test]
    fn submit_is_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm::default();
        form.select(&write_photo(dir.path(), "a.jpg", 4));

        assert!(form.begin_submit().is_some());
        assert!(form.is_uploading());
        assert!(form.begin_submit().is_none());

        form.finish(&Ok(()));
        assert!(!form.is_uploading());
        assert!(form.selected().is_none());
    }

    #[tokio::test]
    async fn successful_submit_runs_every_step_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let photo = validate_photo(&write_photo(dir.path(), "pile.jpg", 16)).unwrap();
        let store = FakeStore::default();

        submit_report(&store, &provider(true), &photo).await.unwrap();

        assert_eq!(store.calls(), vec!["upload", "insert"]);
        let rows = store.rows.lock().unwrap();
        let blob = store.blobs.lock().unwrap()[0].clone();
        assert!(blob.ends_with(".jpg"));
        assert_eq!(rows[0].photo_url, format!("https://cdn.test/{blob}"));
        assert!((rows[0].latitude - 16.29).abs() < 1e-9);
        assert!((rows[0].longitude - 80.46).abs() < 1e-9);
    }

    #[tokio::test]
    async fn denied_location_aborts_before_any_store_call() {
        let dir = tempfile::tempdir().unwrap();
        let photo = validate_photo(&write_photo(dir.path(), "pile.jpg", 16)).unwrap();
        let store = FakeStore::default();

        let err = submit_report(&store, &provider(false), &photo)
            .await
            .unwrap_err();

        assert_eq!(err, UploadError::Location(LocationError::PermissionDenied));
        assert!(err.to_string().contains("permission denied"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_leaves_the_photo_stored() {
        let dir = tempfile::tempdir().unwrap();
        let photo = validate_photo(&write_photo(dir.path(), "pile.jpg", 16)).unwrap();
        let store = FakeStore {
            fail_insert: true,
            ..FakeStore::default()
        };
        let mut form = UploadForm::default();
        form.select(&photo.path);
        let photo = form.begin_submit().unwrap();

        let result = submit_report(&store, &provider(true), &photo).await;
        form.finish(&result);

        assert_eq!(form.error(), Some("Database error: insert rejected"));
        assert_eq!(store.blobs.lock().unwrap().len(), 1);
        assert!(store.rows.lock().unwrap().is_empty());
        // The selection stays so the user can try again.
        assert!(form.can_submit());
    }
}
