//! End-to-end install pipeline tests against a mock download server

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use md5::{Digest, Md5};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use saildeck::{
    InstallCallback, InstallConfig, InstallEvent, InstallRequest, Installer, ModFile,
};

/// Surface pipeline debug logs under `--nocapture`; repeated calls are fine
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn zip_with_files(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn capture_callback() -> (Arc<Mutex<Vec<InstallEvent>>>, InstallCallback) {
    let events: Arc<Mutex<Vec<InstallEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let callback: InstallCallback = Arc::new(move |event| {
        sink.lock().unwrap().push(event);
    });
    (events, callback)
}

fn statuses(events: &[InstallEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Status { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

async fn serve(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

fn request_for(server: &MockServer, route: &str, filename: &str, md5: &str, root: &Path) -> InstallRequest {
    let file = ModFile {
        filename: filename.to_string(),
        download_url: format!("{}{}", server.uri(), route),
        md5: md5.to_string(),
        ..Default::default()
    };
    InstallRequest::new("Cool Mod", file, root)
}

#[tokio::test]
async fn installs_zip_archive_into_named_folder() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("inner/cool.otr", b"payload"), ("readme.txt", b"docs")]);
    let checksum = md5_hex(&body);
    serve(&server, "/dl/mod.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let (events, callback) = capture_callback();

    let request = request_for(&server, "/dl/mod.zip", "mod.zip", &checksum, library.path());
    let outcome = installer.install(&request, Some(callback)).await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.message, "Installed: Cool Mod/cool.otr");
    let installed = library.path().join("Cool Mod/cool.otr");
    assert_eq!(std::fs::read(&installed).unwrap(), b"payload");
    // non-payload archive members are not installed
    assert!(!library.path().join("Cool Mod/readme.txt").exists());

    let events = events.lock().unwrap();
    let statuses = statuses(&events);
    assert_eq!(
        statuses,
        vec![
            "Downloading...",
            "Verifying checksum...",
            "Extracting...",
            "Finding mod files...",
            "Installing...",
            "Installed: Cool Mod/cool.otr",
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, InstallEvent::Complete { success: true, .. })));
}

#[tokio::test]
async fn installs_multiple_payload_files_with_count_message() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("a.otr", b"a"), ("sub/b.o2r", b"b"), ("sub/deep/c.otr", b"c")]);
    serve(&server, "/dl/pack.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/pack.zip", "pack.zip", "", library.path());
    let outcome = installer.install(&request, None).await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Installed 3 files to Cool Mod/");
    // flattened into the mod folder
    assert!(library.path().join("Cool Mod/a.otr").exists());
    assert!(library.path().join("Cool Mod/b.o2r").exists());
    assert!(library.path().join("Cool Mod/c.otr").exists());
}

#[tokio::test]
async fn direct_payload_download_skips_extraction() {
    init_tracing();
    let server = MockServer::start().await;
    serve(&server, "/dl/cool.otr", b"raw payload".to_vec()).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let (events, callback) = capture_callback();

    let request = request_for(&server, "/dl/cool.otr", "cool.otr", "", library.path());
    let outcome = installer.install(&request, Some(callback)).await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Installed: Cool Mod/cool.otr");
    assert_eq!(
        std::fs::read(library.path().join("Cool Mod/cool.otr")).unwrap(),
        b"raw payload"
    );

    let events = events.lock().unwrap();
    let statuses = statuses(&events);
    assert!(!statuses.iter().any(|s| s == "Extracting..."));
    // empty md5 skips verification outright
    assert!(!statuses.iter().any(|s| s == "Verifying checksum..."));
}

#[tokio::test]
async fn checksum_mismatch_stops_before_extraction() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("cool.otr", b"payload")]);
    serve(&server, "/dl/mod.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let (events, callback) = capture_callback();

    let request = request_for(
        &server,
        "/dl/mod.zip",
        "mod.zip",
        "00000000000000000000000000000000",
        library.path(),
    );
    let outcome = installer.install(&request, Some(callback)).await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "Checksum verification failed - file may be corrupted"
    );
    assert!(outcome.folder.is_none());

    let events = events.lock().unwrap();
    let statuses = statuses(&events);
    assert!(statuses.iter().any(|s| s == "Verifying checksum..."));
    assert!(!statuses.iter().any(|s| s == "Extracting..."));
    assert!(events
        .iter()
        .any(|e| matches!(e, InstallEvent::Complete { success: false, .. })));
}

#[tokio::test]
async fn archive_without_payload_reports_and_leaves_library_untouched() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("readme.txt", b"nothing here"), ("art/shot.png", b"png")]);
    serve(&server, "/dl/empty.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/empty.zip", "empty.zip", "", library.path());
    let outcome = installer.install(&request, None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "No .otr/.o2r files found in archive");
    assert_eq!(std::fs::read_dir(library.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn second_install_of_same_mod_gets_distinct_folder() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("cool.otr", b"payload")]);
    serve(&server, "/dl/mod.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/mod.zip", "mod.zip", "", library.path());

    let first = installer.install(&request, None).await;
    let second = installer.install(&request, None).await;

    assert!(first.success && second.success);
    let first_folder = first.folder.unwrap();
    let second_folder = second.folder.unwrap();
    assert_ne!(first_folder, second_folder);
    assert_eq!(first_folder, library.path().join("Cool Mod"));
    assert!(second_folder
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Cool Mod_"));
    assert!(first_folder.join("cool.otr").exists());
    assert!(second_folder.join("cool.otr").exists());
}

#[tokio::test]
async fn missing_download_url_is_vetoed_before_any_request() {
    init_tracing();
    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let file = ModFile {
        filename: "mod.zip".to_string(),
        ..Default::default()
    };
    let request = InstallRequest::new("Cool Mod", file, library.path());
    let outcome = installer.install(&request, None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "No download URL");
}

#[tokio::test]
async fn flagged_file_is_vetoed_before_any_request() {
    init_tracing();
    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let file = ModFile {
        filename: "mod.zip".to_string(),
        download_url: "https://example.invalid/mod.zip".to_string(),
        analysis_result: "Suspicious content detected".to_string(),
        ..Default::default()
    };
    let request = InstallRequest::new("Cool Mod", file, library.path());
    let outcome = installer.install(&request, None).await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "File flagged as potentially unsafe: Suspicious content detected"
    );
}

#[tokio::test]
async fn download_failure_surfaces_as_download_failed() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dl/gone.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/gone.zip", "gone.zip", "", library.path());
    let outcome = installer.install(&request, None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Download failed");
}

#[tokio::test]
async fn rar_download_is_refused() {
    init_tracing();
    let server = MockServer::start().await;
    serve(&server, "/dl/mod.rar", b"Rar!\x1a\x07\x00garbage".to_vec()).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/mod.rar", "mod.rar", "", library.path());
    let outcome = installer.install(&request, None).await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.message,
        "RAR files not supported. Please extract manually."
    );
}

#[tokio::test]
async fn traversal_entry_aborts_install() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("../escape.otr", b"evil"), ("cool.otr", b"payload")]);
    serve(&server, "/dl/evil.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/evil.zip", "evil.zip", "", library.path());
    let outcome = installer.install(&request, None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Failed to extract archive");
    assert_eq!(std::fs::read_dir(library.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn duplicate_names_inside_archive_get_numbered() {
    init_tracing();
    let server = MockServer::start().await;
    let body = zip_with_files(&[("a/cool.otr", b"first"), ("b/cool.otr", b"second")]);
    serve(&server, "/dl/dupes.zip", body).await;

    let library = tempdir().unwrap();
    let installer = Installer::new(InstallConfig::default()).unwrap();
    let request = request_for(&server, "/dl/dupes.zip", "dupes.zip", "", library.path());
    let outcome = installer.install(&request, None).await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Installed 2 files to Cool Mod/");
    let folder = outcome.folder.unwrap();
    assert!(folder.join("cool.otr").exists());
    assert!(folder.join("cool_1.otr").exists());
}
