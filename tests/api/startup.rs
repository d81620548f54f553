use secrecy::Secret;
use visual_search_service::{
    configuration::{ImageBackend, ObjectStorageSettings, Settings},
    startup::{Application, ApplicationBuildError},
};

use crate::helpers::test_configuration;

async fn build_error(configuration: Settings) -> ApplicationBuildError {
    match Application::build(configuration, Some(1)).await {
        Ok(_) => panic!("The application was built with unusable images settings"),
        Err(error) => error,
    }
}

#[tokio::test]
async fn object_storage_backend_without_object_storage_settings_fails_to_build() {
    let mut configuration = test_configuration();
    configuration.images.backend = ImageBackend::ObjectStorage;
    configuration.images.object_folder = Some("photograph".into());

    let error = build_error(configuration).await;

    assert!(
        matches!(
            error,
            ApplicationBuildError::MissingImagesSetting("object_storage")
        ),
        "Unexpected error: {:?}",
        error
    );
}

#[tokio::test]
async fn url_backend_without_url_prefix_fails_to_build() {
    let mut configuration = test_configuration();
    configuration.images.backend = ImageBackend::Url;
    configuration.images.url_prefix = None;

    let error = build_error(configuration).await;

    assert!(
        matches!(
            error,
            ApplicationBuildError::MissingImagesSetting("images.url_prefix")
        ),
        "Unexpected error: {:?}",
        error
    );
}

#[tokio::test]
async fn object_storage_backend_builds_with_object_storage_settings() {
    let mut configuration = test_configuration();
    configuration.images.backend = ImageBackend::ObjectStorage;
    configuration.images.object_folder = Some("photograph".into());
    // Nothing listens there: building only creates the bucket handle
    configuration.object_storage = Some(ObjectStorageSettings {
        username: "minioadmin".into(),
        password: Secret::new("minioadmin".into()),
        port: 9,
        host: "127.0.0.1".into(),
        region: "us-east-1".into(),
        bucket_name: "images".into(),
    });

    assert!(Application::build(configuration, Some(1)).await.is_ok());
}
