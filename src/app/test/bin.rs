#[suitest::suite(bin_integration_tests)]
#[suitest::suite_cfg(sequential = true)]
mod bin_integration_tests {
    use crate::{
        app::{
            state::ServiceState,
            test::{setup_user, upload_of, TestState, TestStateConfig},
        },
        core::{
            model::{file::MediaType, SortOrder},
            repo::file::FileRepo,
            service::folder::DeletePolicy,
        },
        error::CumulusErr,
    };
    use suitest::{after_all, before_all, cleanup};

    const TEST_UPLOAD_PATH: &str = "__bin_test_upload__";

    #[before_all]
    async fn setup() -> (TestState, ServiceState) {
        tokio::fs::create_dir(TEST_UPLOAD_PATH).await.unwrap();

        let test_state = TestState::init(TestStateConfig {
            upload_path: TEST_UPLOAD_PATH.to_string(),
            delete_policy: DeletePolicy::BestEffort,
        })
        .await;

        let services = test_state.services.clone();

        (test_state, services)
    }

    #[cleanup]
    async fn cleanup() {
        let _ = tokio::fs::remove_dir_all(TEST_UPLOAD_PATH).await;
    }

    #[after_all]
    async fn teardown() {
        let _ = tokio::fs::remove_dir_all(TEST_UPLOAD_PATH).await;
    }

    #[test]
    async fn bin_round_trip_keeps_attachments(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let file = services
            .file
            .upload(&user_id, None, upload_of("keep.bin", "application/octet-stream", 1))
            .await
            .unwrap();

        state.sqlite.set_favourite(&user_id, file.id).await.unwrap();
        state.sqlite.tag_file(file.id, "important").await.unwrap();

        services.bin.move_to_bin(&user_id, file.id).await.unwrap();

        // Binned files leave live listings but keep their quota charge.
        let recent = services.file.list_recent(&user_id).await.unwrap();
        assert!(recent.files.is_empty());
        assert_eq!(services.quota.get_quota(&user_id).await.unwrap().used_kb, 1);

        let binned = services
            .bin
            .list_deleted(&user_id, None, SortOrder::Desc, 1)
            .await
            .unwrap();
        assert_eq!(binned.files.len(), 1);
        assert_eq!(binned.files[0].name, "keep.bin");

        let again = services.bin.move_to_bin(&user_id, file.id).await;
        assert!(matches!(
            again.unwrap_err().error,
            CumulusErr::InvalidInput(_)
        ));

        services.bin.restore(&user_id, file.id).await.unwrap();

        let recent = services.file.list_recent(&user_id).await.unwrap();
        assert_eq!(recent.files.len(), 1);
        assert!(recent.files[0].is_favourite);

        let detail = services.file.file_detail(&user_id, file.id).await.unwrap();
        assert!(detail.is_favourite);
        assert_eq!(detail.tags, vec!["important".to_string()]);
    }

    #[test]
    async fn restore_requires_a_marker(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let file = services
            .file
            .upload(&user_id, None, upload_of("live.bin", "application/octet-stream", 1))
            .await
            .unwrap();

        let result = services.bin.restore(&user_id, file.id).await;
        assert!(matches!(
            result.unwrap_err().error,
            CumulusErr::InvalidInput(_)
        ));
    }

    #[test]
    async fn permanent_delete_releases_everything(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let file = services
            .file
            .upload(&user_id, None, upload_of("gone.bin", "application/octet-stream", 2))
            .await
            .unwrap();
        let path = state
            .providers
            .paths
            .user_root(&user_id)
            .join(&file.unique_name);
        assert!(path.is_file());

        // Purging does not require a bin marker.
        services.bin.delete_permanently(&user_id, file.id).await.unwrap();

        assert!(!path.exists());
        assert_eq!(services.quota.get_quota(&user_id).await.unwrap().used_kb, 0);

        let second = services.bin.delete_permanently(&user_id, file.id).await;
        assert!(matches!(
            second.unwrap_err().error,
            CumulusErr::DoesNotExist(_)
        ));
    }

    #[test]
    async fn clean_bin_purges_everything_binned(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let a = services
            .file
            .upload(&user_id, None, upload_of("a.bin", "application/octet-stream", 1))
            .await
            .unwrap();
        let b = services
            .file
            .upload(&user_id, None, upload_of("b.bin", "application/octet-stream", 2))
            .await
            .unwrap();
        services
            .file
            .upload(&user_id, None, upload_of("stays.bin", "application/octet-stream", 1))
            .await
            .unwrap();

        services.bin.move_to_bin(&user_id, a.id).await.unwrap();
        services.bin.move_to_bin(&user_id, b.id).await.unwrap();

        let report = services.bin.clean_bin(&user_id).await.unwrap();
        assert_eq!(report.purged, 2);
        assert_eq!(report.freed_kb, 3);
        assert!(report.failures.is_empty());

        let binned = services
            .bin
            .list_deleted(&user_id, None, SortOrder::Desc, 1)
            .await
            .unwrap();
        assert!(binned.files.is_empty());

        // The live file is untouched.
        assert_eq!(services.quota.get_quota(&user_id).await.unwrap().used_kb, 1);
        assert_eq!(services.file.list_recent(&user_id).await.unwrap().files.len(), 1);
    }

    #[test]
    async fn bin_listing_filters_by_type(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let image = services
            .file
            .upload(&user_id, None, upload_of("pic.png", "image/png", 1))
            .await
            .unwrap();
        let text = services
            .file
            .upload(&user_id, None, upload_of("note.txt", "text/plain", 1))
            .await
            .unwrap();

        services.bin.move_to_bin(&user_id, image.id).await.unwrap();
        services.bin.move_to_bin(&user_id, text.id).await.unwrap();

        let images = services
            .bin
            .list_deleted(&user_id, Some(MediaType::Image), SortOrder::Desc, 1)
            .await
            .unwrap();
        assert_eq!(images.files.len(), 1);
        assert_eq!(images.files[0].name, "pic.png");

        let all = services
            .bin
            .list_deleted(&user_id, None, SortOrder::Asc, 1)
            .await
            .unwrap();
        assert_eq!(all.files.len(), 2);
        assert!(all.files[0].deleted_at <= all.files[1].deleted_at);
    }
}
