use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;
use punch_journal::compress::encode_data_uri;
use reqwest::Client;
use serde::Deserialize;
use std::io::Cursor;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileView {
    name: String,
    size: u64,
    #[serde(rename = "type")]
    mime: String,
    optimized: bool,
    original_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RecordView {
    id: String,
    title: String,
    files: Vec<FileView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompressView {
    data: String,
    size: u64,
    width: u32,
    height: u32,
    original_size: u64,
    attempts: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsView {
    records: usize,
    images: usize,
    optimized: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("punch_journal_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

fn noisy_png(width: u32, height: u32) -> String {
    let mut state = 0x9E37_79B9_u32;
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [a, b, c, _] = state.to_le_bytes();
        Rgb([a, b, c])
    }));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    encode_data_uri("image/png", &bytes)
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/stats")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_punch_journal"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("OPTIMIZE_INTERVAL_SECS", "3600")
        .env("OPTIMIZE_COOLDOWN_SECS", "0")
        .env("OPTIMIZE_TARGET_KB", "20")
        .env("OPTIMIZE_MIN_SIZE_KB", "1")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_new_record_images_get_optimized() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/records", server.base_url))
        .json(&serde_json::json!({
            "title": "Morning punch-in",
            "files": [{ "name": "desk.png", "data": noisy_png(320, 240) }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: RecordView = response.json().await.unwrap();
    assert_eq!(created.title, "Morning punch-in");
    assert!(!created.files[0].optimized);

    // Either the storage-change trigger or this manual run does the work.
    let outcome: serde_json::Value = client
        .post(format!("{}/api/optimize", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(outcome["status"] == "completed" || outcome["status"] == "skipped");

    let deadline = Instant::now() + Duration::from_secs(20);
    let file = loop {
        let records: Vec<RecordView> = client
            .get(format!("{}/api/records", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let record = records
            .into_iter()
            .find(|record| record.id == created.id)
            .expect("record missing");
        let file = record.files.into_iter().next().expect("file missing");
        if file.optimized {
            break file;
        }
        if Instant::now() > deadline {
            panic!("image was never optimized");
        }
        sleep(Duration::from_millis(200)).await;
    };

    assert_eq!(file.name, "desk.png");
    assert_eq!(file.mime, "image/jpeg");
    assert!(file.original_size.unwrap() > file.size);

    let stats: StatsView = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(stats.records >= 1);
    assert!(stats.images >= 1);
    assert!(stats.optimized >= 1);
}

#[tokio::test]
async fn http_compress_returns_smaller_jpeg() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/compress", server.base_url))
        .json(&serde_json::json!({
            "data": noisy_png(800, 600),
            "request": { "targetKb": 40 }
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let result: CompressView = response.json().await.unwrap();

    assert!(result.data.starts_with("data:image/jpeg;base64,"));
    assert!(result.width <= 500 && result.height <= 500);
    assert!(result.size < result.original_size);
    assert!(result.attempts >= 1 && result.attempts <= 6);
}

#[tokio::test]
async fn http_rejects_non_image_attachments() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/records", server.base_url))
        .json(&serde_json::json!({
            "title": "Notes",
            "files": [{ "name": "notes.txt", "data": "data:text/plain;base64,aGVsbG8=" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/compress", server.base_url))
        .json(&serde_json::json!({ "data": "data:image/png;base64,AAAA" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}
