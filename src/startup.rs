use crate::{
    configuration::{ImageBackend, ImagesSettings, ObjectStorageSettings, Settings},
    domain::services::hydrator::{
        ImageLocator, LocalDirectoryLocator, ObjectStorageLocator, UrlPrefixLocator,
    },
    helper::error_chain_fmt,
    ports::vector_index_port::VectorIndexPort,
    repositories::{
        embedding_dashscope_repository::DashScopeEmbeddingRepository,
        image_repository::ImageRepository,
        vector_index_oss_repository::OssVectorIndexRepository,
    },
    routes::{
        health_check::health_check, image_detail::image_detail, search_images::search_images,
    },
    use_cases::search_images::SearchImages,
};
use actix_web::{
    dev::Server,
    web::{self, Data},
    App, HttpServer,
};
use s3::{creds::Credentials, Bucket, Region};
use secrecy::ExposeSecret;
use std::{net::TcpListener, sync::Arc};
use tokio::sync::Semaphore;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// Holds the newly built server, and some useful properties
pub struct Application {
    server: Server,
    port: u16,
}

#[derive(thiserror::Error)]
pub enum ApplicationBuildError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("HTTP client could not be built: {0}")]
    HttpClientError(#[from] reqwest::Error),
    #[error("S3 credentials error: {0}")]
    S3CredentialsError(#[from] s3::creds::error::CredentialsError),
    #[error(transparent)]
    S3Error(#[from] s3::error::S3Error),
    #[error("Missing setting `{0}` for the configured images backend")]
    MissingImagesSetting(&'static str),
}

impl std::fmt::Debug for ApplicationBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl Application {
    /// # Parameters
    /// - nb_workers: number of actix-web workers
    ///   if `None`, the number of available physical CPUs is used as the worker count.
    #[tracing::instrument(name = "Building application", skip(settings))]
    pub async fn build(
        settings: Settings,
        nb_workers: Option<usize>,
    ) -> Result<Self, ApplicationBuildError> {
        // Checks the images settings first: nothing is bound or created with an unusable backend
        let image_locator = get_image_locator(&settings.images)?;
        let bucket = get_image_bucket(&settings)?;

        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        // HTTP clients keep a connection pool: they are built once and shared by every search
        let embedding_repository = DashScopeEmbeddingRepository::try_new(&settings.embedding)?;
        let vector_index_repository = OssVectorIndexRepository::try_new(&settings.vector_index)?;
        info!(
            bucket = %settings.vector_index.bucket,
            index = %settings.vector_index.index,
            dimension = vector_index_repository.dimension(),
            "Using vector index"
        );

        let image_repository = ImageRepository::try_new(settings.images.timeout(), bucket)?;

        let search_images = SearchImages::new(
            Arc::new(embedding_repository),
            Arc::new(vector_index_repository),
            image_locator,
            Arc::new(image_repository),
        );

        let server = run(
            listener,
            nb_workers,
            search_images,
            settings.application.max_concurrent_searches,
        )?;

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// This function only returns when the application is stopped
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        info!("Running server ...");
        self.server.await
    }
}

/// listener: the consumer binds their own port
///
/// TracingLogger middleware: helps collecting telemetry data.
/// It generates a unique identifier for each incoming request: `request_id`,
/// attached to every span and log of that request.
///
/// # Parameters
/// - nb_workers: number of actix-web workers
///   if `None`, the number of available physical CPUs is used as the worker count.
/// - max_concurrent_searches: number of search pipelines running at the same time,
///   across all workers. At least 1.
pub fn run(
    listener: TcpListener,
    nb_workers: Option<usize>,
    search_images_use_case: SearchImages,
    max_concurrent_searches: usize,
) -> Result<Server, std::io::Error> {
    // Wraps the use case in a `actix_web::Data` (`Arc`) to register it and access it from handlers.
    // Its repositories are shared among all workers.
    let search_images_use_case = Data::new(search_images_use_case);
    // One semaphore for all workers
    let search_slots = Data::new(Semaphore::new(max_concurrent_searches.max(1)));

    // `move` to capture variables from the surrounding environment.
    // The closure is called once per worker, each worker gets its own `App`.
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/search", web::post().to(search_images))
            .route("/detail", web::post().to(image_detail))
            .app_data(search_images_use_case.clone())
            .app_data(search_slots.clone())
    })
    .listen(listener)?;

    // If no workers were set, use the actix-web settings (number of workers = number of physical CPUs)
    if let Some(nb_workers) = nb_workers {
        return Ok(server.workers(nb_workers).run());
    }

    // No await
    Ok(server.run())
}

/// Picks where the images of the vector keys are read from
pub fn get_image_locator(
    settings: &ImagesSettings,
) -> Result<Arc<dyn ImageLocator>, ApplicationBuildError> {
    let locator: Arc<dyn ImageLocator> = match settings.backend {
        ImageBackend::Local => {
            let directory = settings
                .directory
                .as_ref()
                .ok_or(ApplicationBuildError::MissingImagesSetting("images.directory"))?;
            Arc::new(LocalDirectoryLocator::new(directory))
        }
        ImageBackend::Url => {
            let url_prefix = settings
                .url_prefix
                .as_ref()
                .ok_or(ApplicationBuildError::MissingImagesSetting("images.url_prefix"))?;
            Arc::new(UrlPrefixLocator::new(url_prefix))
        }
        ImageBackend::ObjectStorage => {
            let folder = settings.object_folder.as_deref().unwrap_or_default();
            Arc::new(ObjectStorageLocator::new(folder))
        }
    };

    Ok(locator)
}

/// Instantiates the bucket of the `object_storage` images backend.
///
/// # Returns
/// `None` for the other backends, which read images without any bucket
pub fn get_image_bucket(settings: &Settings) -> Result<Option<Bucket>, ApplicationBuildError> {
    if settings.images.backend != ImageBackend::ObjectStorage {
        return Ok(None);
    }

    let object_storage = settings
        .object_storage
        .as_ref()
        .ok_or(ApplicationBuildError::MissingImagesSetting("object_storage"))?;

    Ok(Some(set_up_s3(object_storage)?))
}

/// Instantiates the bucket the images are read from.
///
/// The bucket is only read: it is expected to exist and to be filled by the ingestion process.
#[tracing::instrument(name = "Setting up S3 object store", skip(settings))]
pub fn set_up_s3(settings: &ObjectStorageSettings) -> Result<Bucket, ApplicationBuildError> {
    let region = Region::Custom {
        region: settings.region.to_owned(),
        endpoint: settings.endpoint(),
    };

    let credentials = Credentials::new(
        Some(&settings.username),
        Some(settings.password.expose_secret()),
        None,
        None,
        None,
    )?;

    // Only gets the bucket handle, no request is sent
    let bucket = Bucket::new(&settings.bucket_name, region, credentials)?.with_path_style();

    info!(
        "Bucket {} has been correctly instantiated",
        settings.bucket_name
    );
    Ok(bucket)
}
