use gaudio_audio::{AudioError, FetchCallback, Fetcher};
use std::sync::{Arc, Mutex};

/// Fetcher holding every request until the test answers it.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    pending: Arc<Mutex<Vec<(String, FetchCallback)>>>,
}

impl FakeFetcher {
    /// Create a fetcher with no outstanding requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locators requested but not answered yet, oldest first.
    pub fn pending(&self) -> Vec<String> {
        self.pending
            .lock()
            .map(|pending| pending.iter().map(|(locator, _)| locator.clone()).collect())
            .unwrap_or_default()
    }

    /// Answer the oldest request for `locator`. Returns `false` if there is none.
    pub fn respond(&self, locator: &str, result: Result<Vec<u8>, AudioError>) -> bool {
        let done = {
            let Ok(mut pending) = self.pending.lock() else {
                return false;
            };
            match pending.iter().position(|(l, _)| l == locator) {
                Some(index) => pending.remove(index).1,
                None => return false,
            }
        };
        done(result);
        true
    }

    /// Fail the oldest request for `locator` the way a missing file would.
    pub fn fail(&self, locator: &str) -> bool {
        self.respond(locator, Err(AudioError::fetch(locator, "not found")))
    }

    /// Answer every outstanding request with `bytes`.
    pub fn respond_all(&self, bytes: &[u8]) -> usize {
        let drained: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return 0,
        };
        let count = drained.len();
        for (_, done) in drained {
            done(Ok(bytes.to_vec()));
        }
        count
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, locator: &str, done: FetchCallback) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push((locator.to_string(), done));
        }
    }
}
