use std::{fs, path::Path, time::Duration};

use civic::{
    application::{
        error::{CancelReason, ContentRole, GenerateError},
        generate::{GenerateRequest, Generator},
        template::PipelineWarning,
    },
    config::Settings,
    domain::{output::OutputKind, version::SemanticVersion},
};
use httpmock::MockServer;
use tempfile::TempDir;

const SAMPLE_PROFILE: &str = include_str!("../assets/sample-profile.yaml");
const SAMPLE_TEMPLATE: &str = include_str!("../assets/template.html");

/// Write the sample profile and template, pointing the profile at the template
/// by absolute path so the test does not depend on the working directory.
fn sample_workspace() -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = dir.path().join("template.html");
    fs::write(&template, SAMPLE_TEMPLATE).expect("template");

    let profile = SAMPLE_PROFILE.replace(
        "path: ./template.html",
        &format!("path: {}", template.display()),
    );
    let profile_path = dir.path().join("profile.yaml");
    fs::write(&profile_path, profile).expect("profile");
    (dir, profile_path.display().to_string())
}

fn request(profile: &str, output: &Path) -> GenerateRequest {
    GenerateRequest {
        profile: profile.to_string(),
        output: output.to_path_buf(),
    }
}

#[tokio::test]
async fn generates_html_from_local_documents() {
    let (dir, profile) = sample_workspace();
    let output = dir.path().join("out/cv.html");

    let report = Generator::new(&Settings::default())
        .expect("generator")
        .generate_until(&request(&profile, &output), std::future::pending())
        .await
        .expect("generated");

    assert_eq!(report.kind, OutputKind::Html);
    assert!(report.warnings.is_empty());
    let html = fs::read_to_string(&output).expect("artifact");
    assert_eq!(report.bytes, html.len());
    assert!(html.contains("<h1>Alex Morgan</h1>"));
    assert!(html.contains("class=\"social-github\""));
    assert!(html.contains("Rust, Go, Kafka, PostgreSQL"));
    assert!(html.contains("<h3>Volunteering</h3>"));
}

#[tokio::test]
async fn minor_version_drift_is_reported_but_succeeds() {
    let (dir, profile) = sample_workspace();
    let output = dir.path().join("cv.html");

    let report = Generator::new(&Settings::default())
        .expect("generator")
        .with_app_version(SemanticVersion::new(1, 5, 0))
        .generate_until(&request(&profile, &output), std::future::pending())
        .await
        .expect("generated");

    assert!(matches!(
        report.warnings.as_slice(),
        [PipelineWarning::VersionDrift(_)]
    ));
    assert!(output.is_file());
}

#[tokio::test]
async fn major_version_mismatch_fails_at_version_check() {
    let (dir, profile) = sample_workspace();
    let output = dir.path().join("cv.html");

    let err = Generator::new(&Settings::default())
        .expect("generator")
        .with_app_version(SemanticVersion::new(2, 0, 0))
        .generate_until(&request(&profile, &output), std::future::pending())
        .await
        .expect_err("incompatible template");

    assert_eq!(err.stage(), "version-check");
    assert!(!output.exists());
}

#[tokio::test]
async fn invalid_profiles_are_rejected_before_rendering() {
    let (dir, profile) = sample_workspace();
    let broken = fs::read_to_string(&profile)
        .expect("profile")
        .replace("alex@alexmorgan.dev", "not-an-email");
    fs::write(&profile, broken).expect("rewrite");
    let output = dir.path().join("cv.html");

    let err = Generator::new(&Settings::default())
        .expect("generator")
        .generate_until(&request(&profile, &output), std::future::pending())
        .await
        .expect_err("invalid profile");

    assert!(matches!(err, GenerateError::ProfileValidation(_)));
    assert!(err.to_string().contains("bio.contact.email"));
    assert!(!output.exists());
}

#[tokio::test]
async fn missing_template_names_the_template() {
    let (dir, profile) = sample_workspace();
    fs::remove_file(dir.path().join("template.html")).expect("remove template");

    let err = Generator::new(&Settings::default())
        .expect("generator")
        .generate_until(
            &request(&profile, &dir.path().join("cv.html")),
            std::future::pending(),
        )
        .await
        .expect_err("missing template");

    assert!(matches!(
        err,
        GenerateError::ContentLoad {
            role: ContentRole::Template,
            ..
        }
    ));
}

#[tokio::test]
async fn interrupt_leaves_no_artifact() {
    let (dir, profile) = sample_workspace();
    let output = dir.path().join("cv.html");

    let err = Generator::new(&Settings::default())
        .expect("generator")
        .generate_until(&request(&profile, &output), async {})
        .await
        .expect_err("interrupted");

    assert!(matches!(
        err,
        GenerateError::Cancelled(CancelReason::Interrupted)
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn loads_profile_and_template_over_http() {
    let server = MockServer::start_async().await;
    let template_url = server.url("/templates/classic.html");
    let profile_body = SAMPLE_PROFILE.replace(
        "path: ./template.html",
        &format!("path: {template_url}"),
    );

    let profile_mock = server
        .mock_async(|when, then| {
            when.method("GET").path("/cv.yaml");
            then.status(200)
                .header("content-type", "application/yaml")
                .body(profile_body.as_str());
        })
        .await;
    let template_mock = server
        .mock_async(|when, then| {
            when.method("GET").path("/templates/classic.html");
            then.status(200)
                .header("content-type", "text/html")
                .body(SAMPLE_TEMPLATE);
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("cv.html");
    Generator::new(&Settings::default())
        .expect("generator")
        .generate_until(
            &request(&server.url("/cv.yaml"), &output),
            std::future::pending(),
        )
        .await
        .expect("generated");

    profile_mock.assert_hits_async(1).await;
    template_mock.assert_hits_async(1).await;
    assert!(fs::read_to_string(&output)
        .expect("artifact")
        .contains("Alex Morgan"));
}

#[tokio::test]
async fn slow_remote_profile_hits_the_generation_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/cv.yaml");
            then.status(200)
                .body(SAMPLE_PROFILE)
                .delay(Duration::from_secs(3));
        })
        .await;

    let mut settings = Settings::default();
    settings.generate.timeout = Duration::from_millis(200);
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("cv.html");

    let err = Generator::new(&settings)
        .expect("generator")
        .generate_until(
            &request(&server.url("/cv.yaml"), &output),
            std::future::pending(),
        )
        .await
        .expect_err("timed out");

    assert!(matches!(
        err,
        GenerateError::Cancelled(CancelReason::Timeout(_))
    ));
    assert!(!output.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn renders_pdf_through_the_configured_browser() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, profile) = sample_workspace();
    let browser = dir.path().join("fake-chrome");
    fs::write(
        &browser,
        r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) out="${arg#--print-to-pdf=}" ;;
  esac
done
printf '%%PDF-1.4 civic' > "$out"
"#,
    )
    .expect("write browser");
    let mut perms = fs::metadata(&browser).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&browser, perms).expect("set perms");

    let mut settings = Settings::default();
    settings.render.chrome_path = Some(browser);
    let output = dir.path().join("cv.pdf");

    let report = Generator::new(&settings)
        .expect("generator")
        .generate_until(&request(&profile, &output), std::future::pending())
        .await
        .expect("generated");

    assert_eq!(report.kind, OutputKind::Pdf);
    assert_eq!(fs::read(&output).expect("artifact"), b"%PDF-1.4 civic");
}
