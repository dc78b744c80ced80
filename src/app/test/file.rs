#[suitest::suite(file_integration_tests)]
#[suitest::suite_cfg(sequential = true)]
mod file_integration_tests {
    use crate::{
        app::{
            state::ServiceState,
            test::{setup_user, upload_of, TestState, TestStateConfig, STUB_VIDEO_ATTRS},
        },
        core::{
            model::{file::MediaType, SortOrder},
            service::{file::dto::FileUpload, folder::DeletePolicy},
            storage::UploadContent,
        },
        error::CumulusErr,
    };
    use std::io::Cursor;
    use suitest::{after_all, before_all, cleanup};
    use tokio::io::AsyncReadExt;

    const TEST_UPLOAD_PATH: &str = "__file_test_upload__";

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
    async fn video_upload_happy(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 10_000).await;

        let file = services
            .file
            .upload(&user_id, None, upload_of("Movie.MP4", "video/mp4", 64))
            .await
            .unwrap();

        assert_eq!(file.name, "Movie.MP4");
        assert_eq!(file.extension, "mp4");
        assert_eq!(file.size_kb, 64);
        assert_eq!(file.media_type, MediaType::Video);
        assert!(file.unique_name.ends_with("Movie.MP4"));

        let root = state.providers.paths.user_root(&user_id);
        assert!(root.join(&file.unique_name).is_file());

        let detail = services.file.file_detail(&user_id, file.id).await.unwrap();
        assert!(std::path::Path::new(&detail.path).is_file());
        assert_eq!(detail.width, STUB_VIDEO_ATTRS.width.map(i64::from));
        assert_eq!(detail.height, STUB_VIDEO_ATTRS.height.map(i64::from));
        assert_eq!(detail.duration_secs, STUB_VIDEO_ATTRS.duration_secs);
        assert_eq!(detail.fps, STUB_VIDEO_ATTRS.fps);

        let thumb = detail.thumbnail.unwrap();
        assert!(state
            .providers
            .paths
            .thumbnail_dir(&user_id)
            .join(thumb)
            .is_file());
    }

    #[test]
    async fn text_upload_has_no_media_metadata(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let file = services
            .file
            .upload(&user_id, None, upload_of("notes.txt", "text/plain", 1))
            .await
            .unwrap();

        assert_eq!(file.media_type, MediaType::Other);

        let detail = services.file.file_detail(&user_id, file.id).await.unwrap();
        assert_eq!(detail.width, None);
        assert_eq!(detail.duration_secs, None);
        assert_eq!(detail.thumbnail, None);
    }

    #[test]
    async fn streamed_upload_and_download(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let bytes = b"streamed payload".to_vec();
        let upload = FileUpload {
            name: "stream.bin".to_string(),
            mime: "application/octet-stream".to_string(),
            size_bytes: bytes.len() as u64,
            content: UploadContent::Streamed(Box::new(Cursor::new(bytes.clone()))),
        };

        let file = services.file.upload(&user_id, None, upload).await.unwrap();

        // A short payload still occupies one ledger unit.
        assert_eq!(file.size_kb, 1);

        let mut download = services.file.download(&user_id, file.id).await.unwrap();
        assert_eq!(download.size_bytes, bytes.len() as u64);
        assert_eq!(download.name, "stream.bin");

        let mut read = Vec::new();
        download.stream.read_to_end(&mut read).await.unwrap();
        assert_eq!(read, bytes);
    }

    #[test]
    async fn uploads_land_in_their_folder(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let docs = services
            .folder
            .create_folder(&user_id, None, "docs")
            .await
            .unwrap();

        let file = services
            .file
            .upload(
                &user_id,
                Some(docs.id),
                upload_of("in-docs.bin", "application/octet-stream", 2),
            )
            .await
            .unwrap();

        let path = state
            .providers
            .paths
            .user_root(&user_id)
            .join("docs")
            .join(&file.unique_name);
        assert!(path.is_file());
    }

    #[test]
    async fn move_file_relocates_the_bytes(state: TestState, services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let a = services.folder.create_folder(&user_id, None, "a").await.unwrap();
        let b = services.folder.create_folder(&user_id, None, "b").await.unwrap();

        let file = services
            .file
            .upload(
                &user_id,
                Some(a.id),
                upload_of("moved.bin", "application/octet-stream", 1),
            )
            .await
            .unwrap();

        services.file.move_file(&user_id, file.id, b.id).await.unwrap();

        let root = state.providers.paths.user_root(&user_id);
        assert!(!root.join("a").join(&file.unique_name).exists());
        assert!(root.join("b").join(&file.unique_name).is_file());

        // The download resolves through the new association.
        let download = services.file.download(&user_id, file.id).await.unwrap();
        assert_eq!(download.size_bytes, 1024);
    }

    #[test]
    async fn listings_by_type_and_extension(services: ServiceState) {
        let user_id = setup_user(&services, 1000).await;

        services
            .file
            .upload(&user_id, None, upload_of("a.png", "image/png", 1))
            .await
            .unwrap();
        services
            .file
            .upload(&user_id, None, upload_of("b.jpg", "image/jpeg", 1))
            .await
            .unwrap();
        services
            .file
            .upload(&user_id, None, upload_of("c.txt", "text/plain", 1))
            .await
            .unwrap();

        let images = services
            .file
            .list_by_type(&user_id, MediaType::Image, SortOrder::Desc, None, 1)
            .await
            .unwrap();
        assert_eq!(images.files.len(), 2);
        assert_eq!(images.pages, 1);

        let pngs = services
            .file
            .list_by_type(&user_id, MediaType::Image, SortOrder::Desc, Some("PNG"), 1)
            .await
            .unwrap();
        assert_eq!(pngs.files.len(), 1);
        assert_eq!(pngs.files[0].name, "a.png");

        let recent = services.file.list_recent(&user_id).await.unwrap();
        assert_eq!(recent.files.len(), 3);
    }

    #[test]
    async fn upload_into_foreign_folder_is_forbidden(services: ServiceState) {
        let owner = setup_user(&services, 100).await;
        let intruder = setup_user(&services, 100).await;

        let folder = services
            .folder
            .create_folder(&owner, None, "private")
            .await
            .unwrap();

        let result = services
            .file
            .upload(
                &intruder,
                Some(folder.id),
                upload_of("x.bin", "application/octet-stream", 1),
            )
            .await;
        assert!(matches!(
            result.unwrap_err().error,
            CumulusErr::Forbidden(_)
        ));
    }

    #[test]
    async fn invalid_uploads_are_rejected(services: ServiceState) {
        let user_id = setup_user(&services, 100).await;

        let empty = services
            .file
            .upload(&user_id, None, FileUpload::buffered("empty.bin", "text/plain", vec![]))
            .await;
        assert!(matches!(
            empty.unwrap_err().error,
            CumulusErr::InvalidInput(_)
        ));

        let traversal = services
            .file
            .upload(&user_id, None, upload_of("../escape", "text/plain", 1))
            .await;
        assert!(matches!(
            traversal.unwrap_err().error,
            CumulusErr::InvalidInput(_)
        ));
    }
}
