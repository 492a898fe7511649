use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_chromaplay")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "chromaplay.exe"
            } else {
                "chromaplay"
            });
            p
        })
}

#[test]
fn cli_frame_writes_filtered_png() {
    let dir = PathBuf::from("target").join("cli_smoke_frame");
    std::fs::create_dir_all(&dir).unwrap();

    let in_path = dir.join("in.png");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let img = image::RgbaImage::from_pixel(6, 4, image::Rgba([200, 100, 50, 255]));
    img.save(&in_path).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--filter", "red", "--in"])
        .arg(&in_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let out = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(out.dimensions(), (6, 4));
    assert_eq!(out.get_pixel(3, 2).0, [200, 0, 0, 255]);
}

#[test]
fn cli_simulate_prints_final_snapshot() {
    let dir = PathBuf::from("target").join("cli_smoke_simulate");
    std::fs::create_dir_all(&dir).unwrap();

    let cfg_path = dir.join("config.json");
    std::fs::write(
        &cfg_path,
        r#"{"surface_width":32,"surface_height":18,"fps":30,"media":{"default_duration_secs":1.0}}"#,
    )
    .unwrap();
    let script_path = dir.join("script.json");
    std::fs::write(
        &script_path,
        r#"[{"at":0.1,"intent":"play_pause"},{"at":0.2,"intent":"select_filter","index":4}]"#,
    )
    .unwrap();

    let out = std::process::Command::new(exe())
        .arg("simulate")
        .arg("--config")
        .arg(&cfg_path)
        .arg("--script")
        .arg(&script_path)
        .args(["--seconds", "1.5"])
        .output()
        .unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["snapshot"]["filter"], "grayscale");
    assert_eq!(report["snapshot"]["is_playing"], true);
    assert_eq!(report["snapshot"]["current_video_index"], 1);
    assert!(report["frame_loop"]["rendered"].as_u64().unwrap() > 0);
}

#[test]
fn cli_filters_lists_identity_first() {
    let out = std::process::Command::new(exe())
        .arg("filters")
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.lines().next().unwrap().ends_with("identity"));
    assert_eq!(text.lines().count(), 5);
}
