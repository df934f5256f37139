#![no_main]

use std::time::Duration;

use bcas_core::{CardConfig, PseudoCard};
use bcas_harness::{ModelCard, Operation, SimEnv};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, Vec<Operation>)| {
    let capacity = usize::from(input.0 % 16);
    let env = SimEnv::new();
    let config = CardConfig { queue_capacity: capacity, ..CardConfig::default() };
    let mut card = PseudoCard::with_config(env.clone(), config);
    let mut model = ModelCard::new(capacity);

    for op in &input.1 {
        let expected = model.apply(op);
        let actual = match op {
            Operation::Lookup { body } => Some(
                card.process_ecm(body.as_bytes()).map(|r| (r.key, r.return_code)).map_err(|_| ()),
            ),
            Operation::SetCapacity { capacity } => {
                card.set_capacity(usize::from(*capacity));
                None
            },
            Operation::AdvanceTime { millis } => {
                env.advance(Duration::from_millis(u64::from(*millis)));
                None
            },
            _ => {
                if let Ok(bytes) = op.encode() {
                    card.push(&bytes);
                }
                None
            },
        };
        assert_eq!(actual, expected);
        assert_eq!(card.get_status().current_queue_len, model.len());
    }
});
