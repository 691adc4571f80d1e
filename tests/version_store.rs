#[cfg(test)]
mod tests {
    use agent_updater::libs::version_store::{VersionStore, VERSION_FILE_NAME};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    struct VersionStoreTestContext {
        _temp_dir: TempDir,
        marker: PathBuf,
    }

    impl AsyncTestContext for VersionStoreTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let marker = temp_dir.path().join(VERSION_FILE_NAME);
            VersionStoreTestContext {
                _temp_dir: temp_dir,
                marker,
            }
        }
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_missing_marker_means_not_installed(ctx: &mut VersionStoreTestContext) {
        let store = VersionStore::new(&ctx.marker);
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_blank_marker_means_not_installed(ctx: &mut VersionStoreTestContext) {
        let store = VersionStore::new(&ctx.marker);

        fs::write(&ctx.marker, "").unwrap();
        assert_eq!(store.read().await.unwrap(), None);

        fs::write(&ctx.marker, " \r\n\t").unwrap();
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_read_trims_content(ctx: &mut VersionStoreTestContext) {
        fs::write(&ctx.marker, "  1.4.2\r\n").unwrap();
        let store = VersionStore::new(&ctx.marker);
        assert_eq!(store.read().await.unwrap().as_deref(), Some("1.4.2"));
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_write_stores_exact_version(ctx: &mut VersionStoreTestContext) {
        let store = VersionStore::new(&ctx.marker);

        store.write("2.0.0").await.unwrap();

        assert_eq!(fs::read_to_string(&ctx.marker).unwrap(), "2.0.0");
        assert_eq!(store.read().await.unwrap().as_deref(), Some("2.0.0"));
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_write_leaves_no_temporary_files(ctx: &mut VersionStoreTestContext) {
        let store = VersionStore::new(&ctx.marker);
        store.write("1.0.0").await.unwrap();
        store.write("1.0.1").await.unwrap();

        let dir = ctx.marker.parent().unwrap();
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![VERSION_FILE_NAME.to_string()]);
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_write_creates_parent_directory(ctx: &mut VersionStoreTestContext) {
        let nested = ctx.marker.parent().unwrap().join("agent").join(VERSION_FILE_NAME);
        let store = VersionStore::new(&nested);

        store.write("3.1.0").await.unwrap();

        assert_eq!(fs::read_to_string(&nested).unwrap(), "3.1.0");
    }

    #[test_context(VersionStoreTestContext)]
    #[tokio::test]
    async fn test_unreadable_marker_is_an_error(ctx: &mut VersionStoreTestContext) {
        fs::create_dir_all(&ctx.marker).unwrap();
        let store = VersionStore::new(&ctx.marker);
        assert!(store.read().await.is_err());
    }
}
