//! End-to-end tests for the dump tool.

use std::{fs, path::Path};

use bcas_dump::{Args, DumpConfig, DumpError, run};
use clap::Parser;
use hex_literal::hex;
use tempfile::TempDir;

const CAPTURE: [u8; 80] = hex!(
    "004024 90340000 1e 001e01fecca08795be5b1af4eab370b4d4e481b42e62c331389942e0b385 00 59"
    "004019 00150000 0800 afe2834f9c79c0d9104cb436e670a38f 019000 cc"
    "000007 90800000010000 16"
);

const ECM_BODY: &str = "001e01fecca08795be5b1af4eab370b4d4e481b42e62c331389942e0b385";

const CONFIG: &str = r#"
[card]
queue_capacity = 4
system_key = "36310466647843230a0c0b0f0d0e0f000102030405060708090a0b0c0d0e0f10"
init_cbc = "0102030405060708"
"#;

fn write(dir: &TempDir, name: &str, contents: &[u8]) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn dump(args: &[&str]) -> Result<String, DumpError> {
    let args =
        Args::try_parse_from(std::iter::once("bcas-dump").chain(args.iter().copied())).unwrap();
    let mut out = Vec::new();
    run(&args, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn frames_mode_prints_every_frame() {
    let dir = TempDir::new().unwrap();
    let capture = write(&dir, "capture.bcas", &CAPTURE);

    // The trailing status frame is shorter than the minimum read size and
    // stays buffered.
    let output = dump(&[&capture]).unwrap();
    insta::assert_snapshot!(output, @r"
    [0040]( 36) 90 34 00 00 1e 00 1e 01 fe cc a0 87 95 be 5b 1a f4 ea b3 70 b4 d4 e4 81 b4 2e 62 c3 31 38 99 42 e0 b3 85 00
    [0040]( 25) 00 15 00 00 08 00 af e2 83 4f 9c 79 c0 d9 10 4c b4 36 e6 70 a3 8f 01 90 00
    ");
}

#[test]
fn ecm_mode_prints_exchanges_and_lookups() {
    let dir = TempDir::new().unwrap();
    let capture = write(&dir, "capture.bcas", &CAPTURE);

    let output = dump(&[
        "--mode",
        "ecm",
        "--chunk-size",
        "7",
        &capture,
        "--lookup",
        ECM_BODY,
        "-l",
        "00",
    ])
    .unwrap();
    insta::assert_snapshot!(output, @r"
    ecm 001e01fecca08795be5b1af4eab370b4d4e481b42e62c331389942e0b385 flag=0x0800 key=afe2834f9c79c0d9 104cb436e670a38f
    lookup 001e01fecca08795be5b1af4eab370b4d4e481b42e62c331389942e0b385 flag=0x0800 key=afe2834f9c79c0d9 104cb436e670a38f
    lookup 00 no captured response for ECM body (1 bytes)
    ");
}

#[test]
fn init_status_round_trips_through_config() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "card.toml", CONFIG.as_bytes());

    let output = dump(&["--config", &config, "--mode", "quiet", "--dump-init-status"]).unwrap();
    insta::assert_snapshot!(output, @r#"
    [card]
    system_key = "36310466647843230a0c0b0f0d0e0f000102030405060708090a0b0c0d0e0f10"
    init_cbc = "0102030405060708"
    "#);

    let reloaded = write(&dir, "reloaded.toml", output.as_bytes());
    let parsed = DumpConfig::load(Path::new(&reloaded)).unwrap();
    assert_eq!(parsed.card.init_cbc.as_deref(), Some("0102030405060708"));
}

#[test]
fn cli_flags_override_config() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "card.toml", CONFIG.as_bytes());

    let args = Args::try_parse_from([
        "bcas-dump",
        "--config",
        &config,
        "--queue-size",
        "9",
        "--init-cbc",
        "ffffffffffffffff",
    ])
    .unwrap();
    let resolved = DumpConfig::resolve(&args).unwrap();

    assert_eq!(resolved.card.queue_capacity, 9);
    assert_eq!(resolved.card.init_cbc.as_deref(), Some("ffffffffffffffff"));
    assert!(resolved.card.system_key.is_some());
}

#[test]
fn missing_init_status_is_an_error() {
    let err = dump(&["--dump-init-status"]).unwrap_err();
    assert!(matches!(err, DumpError::Card(bcas_core::CardError::NotInitialized)));
}

#[test]
fn bad_config_is_reported_with_path() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "card.toml", b"[card]\nqueue_capacity = \"many\"\n");

    let err = dump(&["--config", &config]).unwrap_err();
    assert!(matches!(err, DumpError::Config { .. }));
    assert!(err.to_string().contains("card.toml"));
}

#[test]
fn bad_lookup_hex_is_rejected() {
    let err = dump(&["--lookup", "xyz"]).unwrap_err();
    assert!(matches!(err, DumpError::LookupHex { .. }));
}

#[test]
fn missing_capture_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.bcas");
    let err = dump(&[path.to_str().unwrap()]).unwrap_err();
    assert!(matches!(err, DumpError::Io { .. }));
}
