#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use pgdump_obfuscator::config::{ObfuscationRule, RowErrorPolicy};
use pgdump_obfuscator::registry::Registry;
use pgdump_obfuscator::salt::Salt;
use pgdump_obfuscator::strategy::Strategy;
use pgdump_obfuscator::stream::process;
use std::io::Cursor;

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let rules = [
        ObfuscationRule::new("auth_user", "email", Strategy::Email),
        ObfuscationRule::new("auth_user", "password", Strategy::BoundedBytes { max_len: 16 }),
        ObfuscationRule::new("accounts_profile", "phone", Strategy::Digits),
        ObfuscationRule::new("sessions", "ip", Strategy::Inet),
    ];
    Registry::new(&rules, Salt::from_bytes(b"fuzz".to_vec()).unwrap())
});

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic; only header errors may end the run.
    let mut output = Vec::new();
    match process(&REGISTRY, RowErrorPolicy::Skip, Cursor::new(data), &mut output) {
        Ok(stats) => assert!(stats.lines as usize <= data.len()),
        Err(e) => assert!(e.to_string().contains("parse error")),
    }
});
