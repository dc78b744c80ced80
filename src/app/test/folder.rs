#[suitest::suite(folder_integration_tests)]
#[suitest::suite_cfg(sequential = true)]
mod folder_integration_tests {
    use crate::{
        app::{
            state::ServiceState,
            test::{setup_user, upload_of, TestState, TestStateConfig},
        },
        core::service::folder::DeletePolicy,
        error::CumulusErr,
        ROOT_FOLDER_NAME,
    };
    use std::path::PathBuf;
    use suitest::{after_all, before_all, cleanup};

    const TEST_UPLOAD_PATH: &str = "__folder_test_upload__";

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

    fn user_root(state: &TestState, user_id: &str) -> PathBuf {
        state.providers.paths.user_root(user_id)
    }

    #[test]
    async fn root_folder_is_idempotent(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let root = services.folder.ensure_root(&user_id).await.unwrap();
        let again = services.folder.ensure_root(&user_id).await.unwrap();

        assert_eq!(root.id, again.id);
        assert_eq!(root.name, ROOT_FOLDER_NAME);
        assert!(root.is_root());
        assert!(user_root(&state, &user_id).is_dir());
    }

    #[test]
    async fn folders_materialize_on_disk(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let docs = services
            .folder
            .create_folder(&user_id, None, "docs")
            .await
            .unwrap();
        let sub = services
            .folder
            .create_folder(&user_id, Some(docs.id), "sub")
            .await
            .unwrap();

        assert_eq!(sub.parent_id, Some(docs.id));
        assert!(user_root(&state, &user_id).join("docs/sub").is_dir());

        let conflict = services.folder.create_folder(&user_id, None, "docs").await;
        assert!(matches!(
            conflict.unwrap_err().error,
            CumulusErr::AlreadyExists(_)
        ));
    }

    #[test]
    async fn rename_moves_the_directory(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let root = services.folder.ensure_root(&user_id).await.unwrap();
        let folder = services
            .folder
            .create_folder(&user_id, None, "old")
            .await
            .unwrap();

        services
            .folder
            .rename_folder(&user_id, folder.id, "new")
            .await
            .unwrap();

        assert!(!user_root(&state, &user_id).join("old").exists());
        assert!(user_root(&state, &user_id).join("new").is_dir());

        let on_root = services
            .folder
            .rename_folder(&user_id, root.id, "other")
            .await;
        assert!(matches!(
            on_root.unwrap_err().error,
            CumulusErr::InvalidInput(_)
        ));
    }

    #[test]
    async fn folders_are_owner_scoped(services: ServiceState) {
        let owner = setup_user(&services, 100).await;
        let intruder = setup_user(&services, 100).await;

        let folder = services
            .folder
            .create_folder(&owner, None, "private")
            .await
            .unwrap();

        let result = services.folder.get_folder(&intruder, folder.id).await;
        assert!(matches!(
            result.unwrap_err().error,
            CumulusErr::Forbidden(_)
        ));
    }

    #[test]
    async fn recursive_delete_frees_quota_and_disk(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 1000).await;

        let docs = services
            .folder
            .create_folder(&user_id, None, "docs")
            .await
            .unwrap();
        let sub = services
            .folder
            .create_folder(&user_id, Some(docs.id), "sub")
            .await
            .unwrap();

        services
            .file
            .upload(
                &user_id,
                Some(docs.id),
                upload_of("a.bin", "application/octet-stream", 10),
            )
            .await
            .unwrap();
        services
            .file
            .upload(
                &user_id,
                Some(sub.id),
                upload_of("b.bin", "application/octet-stream", 5),
            )
            .await
            .unwrap();

        assert_eq!(
            services.quota.get_quota(&user_id).await.unwrap().used_kb,
            15
        );

        let report = services.folder.delete_folder(&user_id, docs.id).await.unwrap();

        assert_eq!(report.removed_files, 2);
        assert_eq!(report.freed_kb, 15);
        assert!(report.failures.is_empty());

        assert_eq!(services.quota.get_quota(&user_id).await.unwrap().used_kb, 0);
        assert!(!user_root(&state, &user_id).join("docs").exists());

        let gone = services.folder.get_folder(&user_id, sub.id).await;
        assert!(matches!(
            gone.unwrap_err().error,
            CumulusErr::DoesNotExist(_)
        ));
    }

    #[test]
    async fn root_folder_cannot_be_deleted(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;
        let root = services.folder.ensure_root(&user_id).await.unwrap();

        let result = services.folder.delete_folder(&user_id, root.id).await;
        assert!(matches!(
            result.unwrap_err().error,
            CumulusErr::InvalidInput(_)
        ));
    }

    #[test]
    async fn folder_content_pages_by_the_larger_count(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;
        let parent = services
            .folder
            .create_folder(&user_id, None, "many")
            .await
            .unwrap();

        for i in 0..12 {
            services
                .folder
                .create_folder(&user_id, Some(parent.id), &format!("child-{i}"))
                .await
                .unwrap();
        }

        let page1 = services
            .folder
            .folder_content(&user_id, parent.id, 1)
            .await
            .unwrap();
        assert_eq!(page1.folders.len(), 10);
        assert_eq!(page1.files.len(), 0);
        assert_eq!(page1.pages, 2);

        let page2 = services
            .folder
            .folder_content(&user_id, parent.id, 2)
            .await
            .unwrap();
        assert_eq!(page2.folders.len(), 2);
    }
}
