use super::{media::FfmpegProber, storage::FsStorage};
use crate::{
    config::StartArgs,
    core::{
        path::PathResolver,
        provider::ProviderState,
        service::{
            bin::BinService,
            file::FileService,
            folder::{DeletePolicy, FolderService},
            quota::QuotaService,
        },
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct GlobalState {
    pub app_state: AppState,
    pub service_state: ServiceState,
}

impl GlobalState {
    pub async fn new(args: &StartArgs) -> Self {
        let app_state = AppState::new(args).await;
        let service_state = ServiceState::from_app_state(&app_state);

        Self {
            app_state,
            service_state,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sqlite: SqlitePool,

    pub providers: ProviderState,

    pub delete_policy: DeletePolicy,
}

impl AppState {
    /// Load the application state using the provided configuration.
    pub async fn new(args: &StartArgs) -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from(args.log()))
            .init();

        let upload_path = args.upload_path();
        std::fs::create_dir_all(&upload_path).expect("unable to create upload directory");

        let sqlite = crate::app::repo::sqlite::init(&args.db_url()).await;

        let delete_policy = args
            .delete_policy()
            .parse::<DeletePolicy>()
            .expect("invalid delete policy");

        let providers = ProviderState {
            storage: Arc::new(FsStorage),
            media: Arc::new(FfmpegProber::default()),
            paths: PathResolver::new(&upload_path),
        };

        Self {
            sqlite,
            providers,
            delete_policy,
        }
    }
}

#[derive(Clone)]
pub struct ServiceState {
    pub quota: QuotaService<SqlitePool>,
    pub folder: FolderService<SqlitePool>,
    pub file: FileService<SqlitePool>,
    pub bin: BinService<SqlitePool>,
}

impl ServiceState {
    pub fn from_app_state(state: &AppState) -> Self {
        Self::new(
            state.sqlite.clone(),
            state.providers.clone(),
            state.delete_policy,
        )
    }

    pub(crate) fn new(
        repository: SqlitePool,
        providers: ProviderState,
        policy: DeletePolicy,
    ) -> Self {
        let quota = QuotaService::new(repository.clone());
        let folder = FolderService::new(repository.clone(), providers.clone(), policy);
        let file = FileService::new(repository.clone(), providers.clone());
        let bin = BinService::new(repository, providers, policy);

        Self {
            quota,
            folder,
            file,
            bin,
        }
    }
}
