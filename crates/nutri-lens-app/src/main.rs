#![warn(missing_docs)]
//! # nutri-lens-app binary
//!
//! Console entry point for nutri-lens.

/// CLI entry point.
fn main() {
    if let Err(error) = shell::run() {
        eprintln!("failed to run nutri-lens shell: {error}");
        std::process::exit(1);
    }
}

mod shell {
    //! Interactive console shell wiring the capture controller to a synthetic
    //! camera, a mock scan transport, the offline asset cache, the install
    //! prompt, and per-run file logging.

    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
    use std::sync::{Arc, Mutex, OnceLock};
    use std::thread::JoinHandle;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    use nutri_lens_analysis_contract::ScanVerdict;
    use nutri_lens_app::{
        AnalysisResolution, CAMERA_ACCESS_ERROR, CaptureController, app_version,
        camera_enabled_from_env, project_runtime_status, redact_image_data,
    };
    use nutri_lens_camera::{CameraBackend, SyntheticCameraBackend};
    use nutri_lens_core::CapturedPhoto;
    use nutri_lens_install::{
        InstallChoice, InstallError, InstallPromptHandler, PromptDriver, PromptToken,
    };
    use nutri_lens_offline::{
        AssetBody, AssetFetcher, OfflineAssetCache, OfflineError, PRECACHE_MANIFEST,
        STATIC_CACHE_NAME,
    };
    use nutri_lens_upload::{
        TransportReply, UploadClient, UploadError, UploadTransport, image_fingerprint,
    };
    use rand::rngs::StdRng;
    use rand::{Rng as _, SeedableRng as _};
    use time::OffsetDateTime;

    const UPLOAD_ENDPOINT: &str = "https://scan.nutri-lens.test/api/upload";
    const NARRATIVE_POLL_MS: u64 = 50;

    static RUN_LOGGER: OnceLock<RunLogger> = OnceLock::new();

    struct RunLogger {
        file: Mutex<File>,
        path: PathBuf,
    }

    impl RunLogger {
        fn new() -> Result<Self, String> {
            let executable =
                std::env::current_exe().map_err(|error| format!("current_exe failed: {error}"))?;
            let directory = executable
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let path = directory.join(format!("{}_log.txt", timestamp_compact_utc()));
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|error| format!("open log file failed: {error}"))?;
            Ok(Self {
                file: Mutex::new(file),
                path,
            })
        }

        fn write_line(&self, level: &str, stage: &str, action: &str, detail: &str) {
            let line = format!(
                "{} | {} | {} | {} | {}\n",
                timestamp_compact_utc(),
                level,
                stage,
                action,
                detail
            );
            if let Ok(mut file) = self.file.lock() {
                let _ = file.write_all(line.as_bytes());
                if level == "ERROR" {
                    let _ = file.flush();
                }
            }
        }
    }

    fn initialize_logger() -> Result<(), String> {
        if RUN_LOGGER.get().is_some() {
            return Ok(());
        }

        let logger = RunLogger::new()?;
        let path = logger.path.display().to_string();
        let _ = RUN_LOGGER.set(logger);
        log_info("logging", "file_created", &format!("log_file={path}"));
        Ok(())
    }

    fn log_info(stage: &str, action: &str, detail: &str) {
        if let Some(logger) = RUN_LOGGER.get() {
            logger.write_line("INFO", stage, action, detail);
        }
    }

    fn log_error(stage: &str, action: &str, detail: &str) {
        if let Some(logger) = RUN_LOGGER.get() {
            logger.write_line("ERROR", stage, action, detail);
        }
    }

    fn timestamp_compact_utc() -> String {
        let now = OffsetDateTime::now_utc();
        format!(
            "{:04}{:02}{:02}_{:02}{:02}{:02}",
            now.year(),
            now.month() as u8,
            now.day(),
            now.hour(),
            now.minute(),
            now.second()
        )
    }

    fn unix_timestamp_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis() as u64)
    }

    /// Scan backend stand-in. Answers like the production analysis service:
    /// a success body carries a `/results/{id}` redirect, a rejection carries
    /// a user-facing error message. `fail` and `drop` console commands arm
    /// one-shot failure modes.
    struct MockScanTransport {
        fail_next: AtomicBool,
        drop_next: AtomicBool,
        scan_ids: Mutex<StdRng>,
    }

    impl MockScanTransport {
        fn new() -> Self {
            Self {
                fail_next: AtomicBool::new(false),
                drop_next: AtomicBool::new(false),
                scan_ids: Mutex::new(StdRng::seed_from_u64(unix_timestamp_millis())),
            }
        }

        fn arm_rejection(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }

        fn arm_network_drop(&self) {
            self.drop_next.store(true, Ordering::SeqCst);
        }
    }

    impl UploadTransport for MockScanTransport {
        fn send(&self, _endpoint: &str, _body_json: &[u8]) -> Result<TransportReply, UploadError> {
            // Simulated round trip, long enough for a few narrative steps.
            std::thread::sleep(Duration::from_millis(2_200));
            if self.drop_next.swap(false, Ordering::SeqCst) {
                return Err(UploadError::Transport(
                    "simulated network drop".to_string(),
                ));
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                let body = serde_json::json!({
                    "success": false,
                    "error": "Could not identify product",
                });
                return Ok(TransportReply {
                    status: 422,
                    body: body.to_string(),
                });
            }
            let scan_id = self
                .scan_ids
                .lock()
                .map(|mut rng| rng.random_range(1..10_000))
                .unwrap_or(1);
            let body = serde_json::json!({
                "success": true,
                "redirect_url": format!("/results/{scan_id}"),
            });
            Ok(TransportReply {
                status: 200,
                body: body.to_string(),
            })
        }
    }

    /// Serves deterministic bodies for any path, so the offline cache can be
    /// installed and exercised without a web server.
    struct DemoAssetFetcher;

    impl AssetFetcher for DemoAssetFetcher {
        fn fetch(&self, path: &str) -> Result<AssetBody, OfflineError> {
            let content_type = if path.ends_with(".css") {
                "text/css"
            } else if path.ends_with(".js") {
                "text/javascript"
            } else if path.ends_with(".png") {
                "image/png"
            } else if path.ends_with(".svg") {
                "image/svg+xml"
            } else {
                "text/html"
            };
            Ok(AssetBody {
                content_type: content_type.to_string(),
                bytes: format!("demo body for {path}").into_bytes(),
            })
        }
    }

    /// Asks on stdin whether to install. Anything other than `y` dismisses.
    struct ConsolePromptDriver;

    impl PromptDriver for ConsolePromptDriver {
        fn present(&self, token: PromptToken) -> Result<InstallChoice, InstallError> {
            print!("install nutri-lens to the home screen? [y/N] ");
            std::io::stdout()
                .flush()
                .map_err(|error| InstallError::Driver(error.to_string()))?;
            let mut answer = String::new();
            std::io::stdin()
                .read_line(&mut answer)
                .map_err(|error| InstallError::Driver(error.to_string()))?;
            log_info("install", "prompt_presented", &format!("token={}", token.id()));
            if answer.trim().eq_ignore_ascii_case("y") {
                Ok(InstallChoice::Accepted)
            } else {
                Ok(InstallChoice::Dismissed)
            }
        }
    }

    enum WorkerCommand {
        SubmitPhoto { photo: CapturedPhoto },
        Shutdown,
    }

    enum WorkerEvent {
        UploadResolved {
            outcome: Result<ScanVerdict, UploadError>,
            upload_duration_ms: u128,
        },
    }

    struct UploadWorkerRuntime {
        command_tx: Sender<WorkerCommand>,
        event_rx: Receiver<WorkerEvent>,
        worker_join: JoinHandle<()>,
    }

    fn spawn_upload_worker(client: UploadClient) -> Result<UploadWorkerRuntime, String> {
        let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>();
        let worker_join = std::thread::Builder::new()
            .name("nutri-lens-upload-worker".to_string())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        WorkerCommand::SubmitPhoto { photo } => {
                            let started = Instant::now();
                            let outcome = client.submit_photo(&photo);
                            let event = WorkerEvent::UploadResolved {
                                outcome,
                                upload_duration_ms: started.elapsed().as_millis(),
                            };
                            if event_tx.send(event).is_err() {
                                break;
                            }
                        }
                        WorkerCommand::Shutdown => break,
                    }
                }
            })
            .map_err(|error| format!("spawn upload worker failed: {error}"))?;
        Ok(UploadWorkerRuntime {
            command_tx,
            event_rx,
            worker_join,
        })
    }

    fn demo_import_png() -> Result<Vec<u8>, String> {
        let pixels = image::RgbImage::from_fn(1_600, 1_200, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(pixels)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .map_err(|error| format!("demo png encode failed: {error}"))?;
        Ok(bytes)
    }

    fn start_camera_logged(controller: &mut CaptureController) {
        if !camera_enabled_from_env() {
            log_info("camera", "kill_switch", "camera disabled by NUTRI_LENS_CAMERA_ENABLED");
            println!("camera disabled by NUTRI_LENS_CAMERA_ENABLED");
            return;
        }
        match controller.start_camera() {
            Ok(report) => {
                log_info(
                    "camera",
                    "stream_started",
                    &format!(
                        "facing={} frame={}x{}",
                        report.facing, report.frame_width, report.frame_height
                    ),
                );
                if let Some(failure) = report.preview_failure {
                    log_info("camera", "preview_degraded", &failure);
                }
            }
            Err(error) => {
                log_error("camera", "stream_failed", &error.to_string());
                println!("{CAMERA_ACCESS_ERROR}");
            }
        }
    }

    fn render_view(controller: &CaptureController) {
        let status = project_runtime_status(controller.view(), controller.session());
        let mut line = format!(
            "[stage={} facing={} stream={}]",
            status.stage,
            status.camera_facing,
            if status.stream_active { "on" } else { "off" }
        );
        if let Some(fingerprint) = &status.photo_fingerprint {
            line.push_str(&format!(" photo={fingerprint}"));
        }
        if let Some(banner) = &status.error_banner {
            line.push_str(&format!(" banner=\"{banner}\""));
        }
        println!("{line}");
    }

    fn print_full_status(controller: &CaptureController) {
        let status = project_runtime_status(controller.view(), controller.session());
        println!("version:        {}", status.version);
        println!("stage:          {}", status.stage);
        println!("camera facing:  {}", status.camera_facing);
        println!("stream active:  {}", status.stream_active);
        println!("camera enabled: {}", status.camera_enabled);
        println!(
            "photo:          {}",
            status.photo_fingerprint.as_deref().unwrap_or("none")
        );
        println!(
            "banner:         {}",
            status.error_banner.as_deref().unwrap_or("none")
        );
    }

    /// Drives one upload end to end: stages the photo, hands it to the worker
    /// thread, and prints narrative lines while waiting for the verdict.
    fn run_analysis(
        controller: &mut CaptureController,
        worker: &UploadWorkerRuntime,
    ) -> Result<Option<AnalysisResolution>, String> {
        let photo = match controller.begin_analysis(unix_timestamp_millis()) {
            Ok(photo) => photo,
            Err(error) => {
                println!("cannot analyze: {error}");
                return Ok(None);
            }
        };
        log_info(
            "upload",
            "photo_staged",
            &redact_image_data(&format!(
                "source={:?} dims={}x{} data={}",
                photo.source, photo.width, photo.height, photo.data_url
            )),
        );
        worker
            .command_tx
            .send(WorkerCommand::SubmitPhoto { photo })
            .map_err(|_| "upload worker is gone".to_string())?;
        let mut last_line = String::new();
        loop {
            match worker.event_rx.try_recv() {
                Ok(WorkerEvent::UploadResolved {
                    outcome,
                    upload_duration_ms,
                }) => {
                    log_info(
                        "upload",
                        "resolved",
                        &format!("duration_ms={upload_duration_ms}"),
                    );
                    return Ok(Some(controller.finish_analysis(outcome)));
                }
                Err(TryRecvError::Empty) => {
                    let report = controller.tick(unix_timestamp_millis());
                    if let Some(line) = report.status_line
                        && line != last_line
                    {
                        println!("  {line}");
                        last_line = line;
                    }
                    std::thread::sleep(Duration::from_millis(NARRATIVE_POLL_MS));
                }
                Err(TryRecvError::Disconnected) => {
                    return Err("upload worker disconnected".to_string());
                }
            }
        }
    }

    fn print_help() {
        println!("commands:");
        println!("  status        show the full runtime status");
        println!("  capture       grab a still from the active stream");
        println!("  import        decode and downscale a bundled demo image");
        println!("  rotate        switch between front and back cameras");
        println!("  retake        drop the reviewed photo and resume live view");
        println!("  focus X Y     tap to focus at viewport coordinates");
        println!("  analyze       submit the reviewed photo for analysis");
        println!("  fail          make the next analysis come back rejected");
        println!("  drop          make the next analysis fail in transit");
        println!("  deny / allow  toggle synthetic camera permission");
        println!("  install       trigger the deferred install prompt");
        println!("  fetch PATH    serve a path through the offline cache");
        println!("  quit          stop the stream and exit");
    }

    pub fn run() -> Result<(), String> {
        initialize_logger()?;
        log_info("bootstrap", "starting", &format!("version {}", app_version()));
        println!("nutri-lens {}", app_version());

        let fetcher = DemoAssetFetcher;
        let mut asset_cache = OfflineAssetCache::new(STATIC_CACHE_NAME);
        match asset_cache.install(&fetcher, &PRECACHE_MANIFEST) {
            Ok(count) => log_info(
                "offline",
                "precache_committed",
                &format!("assets={count} cache={}", asset_cache.name()),
            ),
            Err(error) => log_error("offline", "precache_failed", &error.to_string()),
        }

        let mut install_handler = InstallPromptHandler::new();
        if let Some(query) = std::env::args().nth(1)
            && install_handler.reveal_for_debug_query(&query)
        {
            log_info("install", "debug_reveal", &format!("query={query}"));
        }
        install_handler.on_install_available(PromptToken::new(format!(
            "prompt-{}",
            timestamp_compact_utc()
        )));
        log_info("install", "prompt_deferred", "install button revealed");
        let prompt_driver = ConsolePromptDriver;

        let transport = Arc::new(MockScanTransport::new());
        let client = UploadClient::new(
            UPLOAD_ENDPOINT,
            Arc::clone(&transport) as Arc<dyn UploadTransport>,
        )
        .map_err(|error| format!("upload client rejected endpoint: {error}"))?;
        let worker = spawn_upload_worker(client)?;

        let camera_backend = Arc::new(SyntheticCameraBackend::new());
        let mut controller =
            CaptureController::new(Arc::clone(&camera_backend) as Arc<dyn CameraBackend>);
        start_camera_logged(&mut controller);
        render_view(&controller);
        print_help();

        let stdin = std::io::stdin();
        loop {
            print!("nutri-lens> ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            let read = stdin
                .read_line(&mut line)
                .map_err(|error| format!("stdin read failed: {error}"))?;
            if read == 0 {
                log_info("shutdown", "stdin_closed", "exiting on end of input");
                break;
            }
            let mut words = line.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            match command {
                "status" => print_full_status(&controller),
                "capture" => {
                    match controller.capture_photo() {
                        Ok(()) => {
                            if let Some(photo) = &controller.view().photo {
                                log_info(
                                    "photo",
                                    "still_captured",
                                    &format!(
                                        "fingerprint={} dims={}x{}",
                                        image_fingerprint(&photo.data_url.to_string()),
                                        photo.width,
                                        photo.height
                                    ),
                                );
                            }
                        }
                        Err(error) => {
                            log_error("photo", "capture_failed", &error.to_string());
                            println!("capture failed: {error}");
                        }
                    }
                    render_view(&controller);
                }
                "import" => {
                    let bytes = demo_import_png()?;
                    match controller.import_photo(&bytes) {
                        Ok(()) => {
                            if let Some(photo) = &controller.view().photo {
                                log_info(
                                    "photo",
                                    "import_prepared",
                                    &format!("dims={}x{}", photo.width, photo.height),
                                );
                            }
                        }
                        Err(error) => {
                            log_info("photo", "import_skipped", &error.to_string());
                        }
                    }
                    render_view(&controller);
                }
                "rotate" => {
                    match controller.rotate_camera() {
                        Ok(report) => log_info(
                            "camera",
                            "rotated",
                            &format!("facing={}", report.facing),
                        ),
                        Err(error) => {
                            log_error("camera", "rotate_failed", &error.to_string());
                            println!("{CAMERA_ACCESS_ERROR}");
                        }
                    }
                    render_view(&controller);
                }
                "retake" => {
                    match controller.retake() {
                        Ok(None) => log_info("camera", "retake", "stream still active"),
                        Ok(Some(report)) => log_info(
                            "camera",
                            "retake",
                            &format!("stream reacquired facing={}", report.facing),
                        ),
                        Err(error) => {
                            log_error("camera", "retake_failed", &error.to_string());
                            println!("{CAMERA_ACCESS_ERROR}");
                        }
                    }
                    render_view(&controller);
                }
                "focus" => {
                    let x = words.next().and_then(|word| word.parse().ok()).unwrap_or(50);
                    let y = words.next().and_then(|word| word.parse().ok()).unwrap_or(50);
                    match controller.tap_focus(x, y, unix_timestamp_millis()) {
                        Some(tap) => {
                            log_info(
                                "camera",
                                "tap_focus",
                                &format!("x={} y={} outcome={:?}", tap.x, tap.y, tap.outcome),
                            );
                            println!("focus ring at ({}, {})", tap.x, tap.y);
                        }
                        None => println!("no active stream to focus"),
                    }
                }
                "analyze" => match run_analysis(&mut controller, &worker)? {
                    Some(AnalysisResolution::Navigate { redirect_url, .. }) => {
                        log_info("upload", "navigate", &format!("redirect_url={redirect_url}"));
                        println!("opening results: {redirect_url}");
                        // Navigation replaces the scanner document. The demo
                        // models the return trip with a fresh controller.
                        controller.shutdown();
                        controller = CaptureController::new(
                            Arc::clone(&camera_backend) as Arc<dyn CameraBackend>,
                        );
                        start_camera_logged(&mut controller);
                        println!("returned to scanner");
                        render_view(&controller);
                    }
                    Some(AnalysisResolution::Failed { message, .. }) => {
                        log_info("upload", "analysis_rejected", &message);
                        println!("analysis failed: {message}");
                        render_view(&controller);
                    }
                    None => {}
                },
                "fail" => {
                    transport.arm_rejection();
                    println!("next analysis will be rejected");
                }
                "drop" => {
                    transport.arm_network_drop();
                    println!("next analysis will fail in transit");
                }
                "deny" => {
                    camera_backend.deny_access("permission denied by console toggle");
                    println!("camera permission denied for future starts");
                }
                "allow" => {
                    camera_backend.allow_access();
                    println!("camera permission restored");
                }
                "install" => match install_handler.activate(&prompt_driver) {
                    Ok(Some(InstallChoice::Accepted)) => {
                        install_handler.on_app_installed();
                        log_info("install", "accepted", "app installed, button cleared");
                        println!("installed");
                    }
                    Ok(Some(InstallChoice::Dismissed)) => {
                        log_info("install", "dismissed", "prompt dismissed by user");
                        println!("install dismissed");
                    }
                    Ok(None) => println!("no install prompt available"),
                    Err(error) => {
                        log_error("install", "prompt_failed", &error.to_string());
                        println!("install prompt failed: {error}");
                    }
                },
                "fetch" => {
                    let Some(path) = words.next() else {
                        println!("usage: fetch PATH");
                        continue;
                    };
                    match asset_cache.serve(&fetcher, path) {
                        Ok(served) => {
                            log_info(
                                "offline",
                                "served",
                                &format!(
                                    "path={path} from={:?} bytes={}",
                                    served.served_from,
                                    served.body.bytes.len()
                                ),
                            );
                            println!(
                                "{path}: {} bytes ({:?}, {})",
                                served.body.bytes.len(),
                                served.served_from,
                                served.body.content_type
                            );
                        }
                        Err(error) => {
                            log_error("offline", "serve_failed", &error.to_string());
                            println!("fetch failed: {error}");
                        }
                    }
                }
                "quit" | "exit" => {
                    log_info("shutdown", "requested", "quit command received");
                    break;
                }
                "help" => print_help(),
                other => {
                    println!("unknown command: {other}");
                    print_help();
                }
            }
            // Deferred focus reverts fire on the next command boundary.
            if let Some(outcome) = controller.tick(unix_timestamp_millis()).focus_revert {
                log_info("camera", "focus_reverted", &format!("{outcome:?}"));
            }
        }

        controller.shutdown();
        log_info("shutdown", "camera_stopped", "stream released");
        let _ = worker.command_tx.send(WorkerCommand::Shutdown);
        let _ = worker.worker_join.join();
        log_info("upload_worker", "shutdown", "worker thread joined");
        log_info("shutdown", "completed", "nutri-lens shell exiting");
        Ok(())
    }
}
