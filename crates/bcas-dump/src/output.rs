//! Text formats written to stdout.

use bcas_core::{CardError, EcmRecord, EcmResult, InitStatus};
use bcas_proto::{Frame, ScrambleKey};

/// Bytes as lowercase hex separated by spaces.
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| hex::encode([*byte])).collect::<Vec<_>>().join(" ")
}

/// `[MMMM](LLL) pp pp ...`
pub fn format_frame(frame: &Frame) -> String {
    let mut line = format!("[{:04x}]({:3})", frame.marker(), frame.declared_length());
    if !frame.payload().is_empty() {
        line.push(' ');
        line.push_str(&spaced_hex(frame.payload()));
    }
    line
}

fn format_key(key: &ScrambleKey) -> String {
    format!("{} {}", hex::encode(key.odd()), hex::encode(key.even()))
}

/// One captured ECM exchange.
pub fn format_record(record: &EcmRecord) -> String {
    format!(
        "ecm {} flag={:#06x} key={}",
        hex::encode(record.request_body()),
        record.flag(),
        format_key(record.key())
    )
}

/// Answer to a `--lookup`.
pub fn format_lookup(body: &[u8], result: &Result<EcmResult, CardError>) -> String {
    match result {
        Ok(found) => format!(
            "lookup {} flag={:#06x} key={}",
            hex::encode(body),
            found.return_code,
            format_key(&found.key)
        ),
        Err(error) => format!("lookup {} {error}", hex::encode(body)),
    }
}

/// Init status as a `[card]` table that loads back with `--config`.
pub fn format_init_status(status: &InitStatus) -> String {
    format!(
        "[card]\nsystem_key = \"{}\"\ninit_cbc = \"{}\"\n",
        hex::encode(status.system_key()),
        hex::encode(status.init_cbc())
    )
}
