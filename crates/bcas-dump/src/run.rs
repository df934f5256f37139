//! Replay driver.

use std::{
    fs::File,
    io::{self, Read, Write},
};

use bcas_core::{BcasCard, CardStatus, CorrelatorEvent, Environment, PseudoCard, SystemEnv};
use bcas_proto::CodecStats;
use tracing::{info, warn};

use crate::{
    cli::{Args, Mode},
    config::DumpConfig,
    error::DumpError,
    output::{format_frame, format_init_status, format_lookup, format_record},
};

/// Counters after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Codec counters for the capture
    pub codec: CodecStats,
    /// Card counters after all lookups
    pub card: CardStatus,
}

/// Execute one invocation, writing the dump to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<RunSummary, DumpError> {
    let config = DumpConfig::resolve(args)?;
    let mut card = PseudoCard::with_config(SystemEnv, config.card);
    card.init()?;

    if let Some(path) = &args.capture {
        let file = File::open(path)
            .map_err(|source| DumpError::Io { path: path.to_path_buf(), source })?;
        let chunk_size = usize::try_from(args.chunk_size).unwrap_or(usize::MAX);
        preload(&mut card, file, chunk_size, args.mode, out)?;
    }

    for input in &args.lookups {
        let body = hex::decode(input.trim())
            .map_err(|source| DumpError::LookupHex { input: input.clone(), source })?;
        let result = card.process_ecm(&body);
        writeln!(out, "{}", format_lookup(&body, &result))?;
    }

    if args.dump_init_status {
        let status = card.get_init_status()?;
        write!(out, "{}", format_init_status(&status))?;
    }

    let summary = RunSummary { codec: card.codec_stats(), card: card.get_status() };
    info!(
        frames = summary.codec.frames,
        malformed = summary.codec.malformed,
        syncs = summary.codec.syncs,
        discarded = summary.codec.discarded,
        ecm = summary.card.n_ecm_arrived,
        failed = summary.card.n_ecm_failed,
        "replay finished"
    );
    Ok(summary)
}

/// Load a whole capture into `card`, `chunk_size` bytes per push.
pub fn preload<E: Environment>(
    card: &mut PseudoCard<E>,
    mut capture: impl Read,
    chunk_size: usize,
    mode: Mode,
    out: &mut impl Write,
) -> Result<(), DumpError> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut lines = Vec::new();

    loop {
        let read = match capture.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(DumpError::Read(error)),
        };

        let events = card.push_with(&buf[..read], |decoded| {
            if mode == Mode::Frames {
                lines.push(format_frame(&decoded.frame));
            }
        });

        if mode == Mode::Ecm {
            lines.extend(events.iter().filter_map(|event| match event {
                CorrelatorEvent::Recorded { record, .. } => Some(format_record(record)),
                _ => None,
            }));
        }

        for line in lines.drain(..) {
            writeln!(out, "{line}")?;
        }
    }

    if card.codec_stats().frames == 0 {
        warn!("capture contained no decodable frames");
    }
    Ok(())
}
