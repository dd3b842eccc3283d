#![no_main]

use std::sync::{Arc, Mutex};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use passlock_core::{
    BiometricAuthenticator, BiometricCompletion, BiometricOutcome, LockConfig, LockOrchestrator,
    MemoryStore, Mode, Passcode, ResetPolicy, Sign,
};

#[derive(Debug, Arbitrary)]
enum Event {
    Digit(u8),
    Delete,
    Cancel,
    ConfirmReset,
    ChangeMode(u8),
    RequestBiometric,
    ResolveBiometric(u8),
    Suspend,
    Resume,
}

#[derive(Debug, Arbitrary)]
struct Session {
    length: u8,
    attempts: u8,
    explicit_reset: bool,
    stored: Option<Vec<u8>>,
    events: Vec<Event>,
}

#[derive(Clone, Default)]
struct ParkedAuthenticator {
    pending: Arc<Mutex<Vec<BiometricCompletion>>>,
}

impl BiometricAuthenticator for ParkedAuthenticator {
    fn is_available(&self) -> bool {
        true
    }

    fn request_authentication(&self, _reason: &str, completion: BiometricCompletion) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(completion);
        }
    }
}

fn mode_for(selector: u8) -> Mode {
    match selector % 5 {
        0 => Mode::enter(),
        1 => Mode::set(),
        2 => Mode::change(),
        3 => Mode::remove(),
        _ => Mode::reset(),
    }
}

fuzz_target!(|session: Session| {
    let length = (session.length % 8) as usize + 1;
    let config = LockConfig {
        passcode_length: length,
        maximum_incorrect_attempts: (session.attempts % 6) as u32 + 1,
        reset_policy: if session.explicit_reset {
            ResetPolicy::ExplicitConfirmation
        } else {
            ResetPolicy::AnyInput
        },
        ..Default::default()
    };

    let store = match session.stored {
        Some(digits) => {
            let passcode: Passcode = digits
                .into_iter()
                .map(|d| d % 10)
                .filter_map(Sign::new)
                .take(length)
                .collect();
            if passcode.len() == length {
                MemoryStore::with_passcode(passcode)
            } else {
                MemoryStore::new()
            }
        }
        None => MemoryStore::new(),
    };

    let auth = ParkedAuthenticator::default();
    let mut lock = match LockOrchestrator::new(config, store, Mode::enter()) {
        Ok(lock) => lock.with_authenticator(auth.clone()),
        Err(_) => return,
    };

    for event in session.events {
        match event {
            Event::Digit(d) => {
                if let Some(sign) = Sign::new(d % 10) {
                    let _ = lock.add_sign(sign);
                }
            }
            Event::Delete => lock.remove_sign(),
            Event::Cancel => {
                let _ = lock.cancel();
            }
            Event::ConfirmReset => {
                let _ = lock.confirm_reset();
            }
            Event::ChangeMode(selector) => lock.change_mode(mode_for(selector)),
            Event::RequestBiometric => {
                let _ = lock.request_biometric();
            }
            Event::ResolveBiometric(outcome) => {
                let completion = auth.pending.lock().ok().and_then(|mut p| {
                    if p.is_empty() {
                        None
                    } else {
                        Some(p.remove(0))
                    }
                });
                if let Some(completion) = completion {
                    completion.complete(match outcome % 3 {
                        0 => BiometricOutcome::Success,
                        1 => BiometricOutcome::Failure,
                        _ => BiometricOutcome::Unavailable,
                    });
                }
                lock.process_biometric_responses();
            }
            Event::Suspend => lock.suspend(),
            Event::Resume => {
                let _ = lock.resume();
            }
        }

        assert!(lock.entered_len() < length);
    }
});
