//! Browser identity generation for fetch attempts.
//!
//! Every attempt gets a fresh identity: one profile from a fixed pool of real
//! browser fingerprints, client-hint headers derived from that same profile so
//! nothing contradicts, a returning-visitor cookie set, and a couple of
//! randomized optional headers so consecutive attempts do not share an
//! identical shape. The random source is injectable so identity rotation is
//! reproducible under test.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use wreq_util::Emulation;

/// One coherent browser fingerprint the pool can draw.
struct BrowserProfile {
    user_agent: &'static str,
    platform: &'static str,
    chrome_major: u32,
    mobile: bool,
}

/// Fixed fingerprint pool. The Chrome major in each user-agent must match
/// `chrome_major`, which drives both the client-hint headers and the TLS
/// emulation variant.
const PROFILES: &[BrowserProfile] = &[
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        platform: "Windows",
        chrome_major: 131,
        mobile: false,
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        platform: "macOS",
        chrome_major: 131,
        mobile: false,
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
        platform: "Linux",
        chrome_major: 130,
        mobile: false,
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
        platform: "Windows",
        chrome_major: 128,
        mobile: false,
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.85 Mobile Safari/537.36",
        platform: "Android",
        chrome_major: 131,
        mobile: true,
    },
];

/// Referer candidates; `None` models a direct visit.
const REFERERS: &[Option<&str>] = &[
    None,
    Some("https://www.google.com/"),
    Some("https://www.google.gr/"),
    Some("https://www.sklavenitis.gr/"),
];

const CACHE_CONTROLS: &[Option<&str>] = &[None, Some("no-cache"), Some("max-age=0")];

/// Cookies the storefront sets for a visitor who already clicked through the
/// consent banner and picked a store. Sending them skips the overlay entirely
/// on most page loads.
const SESSION_COOKIES: &[(&str, &str)] = &[
    ("OptanonAlertBoxClosed", "2025-06-03T09:24:17.511Z"),
    (
        "OptanonConsent",
        "isGpcEnabled=0&browserGpcFlag=0&isIABGlobal=false&landingPath=NotLandingPage&groups=C0001%3A1%2CC0002%3A1%2CC0003%3A1%2CC0004%3A1",
    ),
    ("sklv_store", "046"),
    ("sklv_zone", "attiki"),
];

/// Header names that would reveal the calling host's hosting platform.
/// Entries ending in `-` match as prefixes, the rest exactly.
const HOST_HEADER_DENYLIST: &[&str] =
    &["x-vercel-", "x-forwarded-", "x-now-", "x-amz-", "via", "forwarded", "x-real-ip"];

/// A coherent set of per-attempt request headers and cookies.
///
/// Read-only once created, never persisted, discarded with the attempt.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub cookies: String,
    chrome_major: u32,
}

impl Identity {
    /// TLS fingerprint matching the chosen user-agent.
    pub fn emulation(&self) -> Emulation {
        match self.chrome_major {
            128 => Emulation::Chrome128,
            130 => Emulation::Chrome130,
            _ => Emulation::Chrome131,
        }
    }
}

/// Draws identities from the profile pool with an injectable random source.
pub struct IdentityPool {
    rng: Mutex<StdRng>,
}

impl IdentityPool {
    /// Pool seeded from OS entropy.
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_os_rng()) }
    }

    /// Deterministic pool, for tests and for reproducing identity sequences.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Draws one fresh identity.
    pub fn generate(&self) -> Identity {
        let (profile, referer, cache_control) = {
            let mut rng = self.rng.lock().expect("identity rng poisoned");
            let profile = &PROFILES[rng.random_range(0..PROFILES.len())];
            let referer = REFERERS[rng.random_range(0..REFERERS.len())];
            let cache_control = CACHE_CONTROLS[rng.random_range(0..CACHE_CONTROLS.len())];
            (profile, referer, cache_control)
        };

        let mut headers = vec![
            ("Sec-Ch-Ua".to_string(), sec_ch_ua(profile.chrome_major)),
            ("Sec-Ch-Ua-Mobile".to_string(), if profile.mobile { "?1" } else { "?0" }.to_string()),
            ("Sec-Ch-Ua-Platform".to_string(), format!("\"{}\"", profile.platform)),
        ];

        if let Some(referer) = referer {
            headers.push(("Referer".to_string(), referer.to_string()));
        }
        if let Some(cache_control) = cache_control {
            headers.push(("Cache-Control".to_string(), cache_control.to_string()));
        }

        Identity {
            user_agent: profile.user_agent.to_string(),
            headers: strip_host_headers(headers),
            cookies: cookie_header(),
            chrome_major: profile.chrome_major,
        }
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes any header that would give away the hosting platform.
pub fn strip_host_headers(headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers
        .into_iter()
        .filter(|(name, _)| {
            let name = name.to_ascii_lowercase();
            !HOST_HEADER_DENYLIST.iter().any(|entry| {
                if entry.ends_with('-') {
                    name.starts_with(entry)
                } else {
                    name == *entry
                }
            })
        })
        .collect()
}

/// Client-hint brand list for a Chrome major version.
fn sec_ch_ua(major: u32) -> String {
    format!("\"Chromium\";v=\"{major}\", \"Not_A Brand\";v=\"24\"")
}

fn cookie_header() -> String {
    SESSION_COOKIES.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("; ")
}
