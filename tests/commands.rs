#[cfg(test)]
mod tests {
    use agent_updater::commands::check::{self, CheckArgs};
    use agent_updater::commands::{Cli, CONFIG_ERROR_EXIT_STATUS};
    use agent_updater::libs::config::{
        Config, ConfigSource, AGENT_DOWNLOAD_DIRECTORY, CONFIG_FILE_NAME, HC_PING_URL, HC_UUID_UPDATER, JFROG_TOKEN,
        JFROG_URL_ARTIFACT_FOLDER, TS_MERCHANT_KEY, URL_API_TO_CHECK_VERSION,
    };
    use agent_updater::libs::data_storage::DataStorage;
    use agent_updater::libs::error::UpdateError;
    use agent_updater::libs::lock::RunLock;
    use agent_updater::libs::update::UpdateOutcome;
    use clap::Parser;
    use reqwest::Client;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UPDATER_UUID: &str = "5f1c2d3e";

    struct CheckTestContext {
        temp_dir: TempDir,
        server: MockServer,
        config: Config,
    }

    impl AsyncTestContext for CheckTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let server = MockServer::start().await;

            let mut source = ConfigSource::new();
            source.set(TS_MERCHANT_KEY, "M1");
            source.set(URL_API_TO_CHECK_VERSION, format!("{}/catalog", server.uri()));
            source.set(JFROG_URL_ARTIFACT_FOLDER, format!("{}/files", server.uri()));
            source.set(JFROG_TOKEN, "jfrog-token");
            source.set(AGENT_DOWNLOAD_DIRECTORY, "build");
            source.set(HC_PING_URL, format!("{}/ping", server.uri()));
            source.set(HC_UUID_UPDATER, UPDATER_UUID);
            let config = Config::from_source(&source, &DataStorage::at(temp_dir.path())).unwrap();

            CheckTestContext { temp_dir, server, config }
        }
    }

    impl CheckTestContext {
        fn install(&self, version: &str) {
            fs::write(&self.config.version_file, version).unwrap();
        }

        async fn expect_ping(&self, suffix: &str, calls: u64) {
            Mock::given(method("POST"))
                .and(path(format!("/ping/{}{}", UPDATER_UUID, suffix)))
                .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
                .expect(calls)
                .mount(&self.server)
                .await;
        }
    }

    #[test_context(CheckTestContext)]
    #[tokio::test]
    async fn test_check_reports_outcome_once(ctx: &mut CheckTestContext) {
        ctx.install("1.0.0");
        Mock::given(method("GET"))
            .and(path("/catalog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"M1": "1.0.0"})))
            .mount(&ctx.server)
            .await;
        ctx.expect_ping("", 1).await;
        ctx.expect_ping("/fail", 0).await;

        let outcome = check::run_until(&CheckArgs::default(), Client::new(), &ctx.config, std::future::pending()).await;

        assert!(matches!(outcome, UpdateOutcome::UpToDate { .. }));
        assert_eq!(outcome.exit_status(), 0);
        assert!(ctx.config.download_dir.is_dir());
    }

    #[test_context(CheckTestContext)]
    #[tokio::test]
    async fn test_shutdown_cancels_check(ctx: &mut CheckTestContext) {
        ctx.install("1.0.0");
        Mock::given(method("POST"))
            .and(path(format!("/ping/{}/fail", UPDATER_UUID)))
            .and(body_string_contains("cancelled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&ctx.server)
            .await;
        ctx.expect_ping("", 0).await;

        let outcome = check::run_until(&CheckArgs::default(), Client::new(), &ctx.config, std::future::ready(())).await;

        assert!(matches!(outcome, UpdateOutcome::Failed(UpdateError::Cancelled)));
        assert_eq!(outcome.exit_status(), 1);
        assert_eq!(fs::read_to_string(&ctx.config.version_file).unwrap(), "1.0.0");
    }

    #[test_context(CheckTestContext)]
    #[tokio::test]
    async fn test_overlapping_check_logs_instead_of_failing(ctx: &mut CheckTestContext) {
        ctx.install("1.0.0");
        ctx.expect_ping("/log", 1).await;
        ctx.expect_ping("/fail", 0).await;

        let _held = RunLock::try_acquire(&ctx.config.lock_file).unwrap().unwrap();
        let outcome = check::run_until(&CheckArgs::default(), Client::new(), &ctx.config, std::future::pending()).await;

        assert!(matches!(outcome, UpdateOutcome::Failed(UpdateError::AlreadyRunning)));
    }

    #[test_context(CheckTestContext)]
    #[tokio::test]
    async fn test_missing_config_file_exits_with_config_status(ctx: &mut CheckTestContext) {
        let install_dir = ctx.temp_dir.path().to_str().unwrap();
        let missing = ctx.temp_dir.path().join("missing.txt");
        let cli = Cli::try_parse_from([
            "agent-updater",
            "--install-dir",
            install_dir,
            "--config",
            missing.to_str().unwrap(),
            "installed",
        ])
        .unwrap();

        assert_eq!(cli.run().await.unwrap(), CONFIG_ERROR_EXIT_STATUS);
    }

    #[test_context(CheckTestContext)]
    #[tokio::test]
    async fn test_incomplete_config_file_exits_with_config_status(ctx: &mut CheckTestContext) {
        let config_path = ctx.temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "URL_API_TO_CHECK_VERSION=ftp://catalog.example/versions\n").unwrap();
        let cli = Cli::try_parse_from(["agent-updater", "--config", config_path.to_str().unwrap(), "check"]).unwrap();

        assert_eq!(cli.run().await.unwrap(), CONFIG_ERROR_EXIT_STATUS);
    }
}
