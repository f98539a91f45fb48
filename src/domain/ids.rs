// Identifier generation for dashboards and widgets
use rand::Rng;

const SUFFIX_LEN: usize = 7;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Builds `<prefix>_<millis>_<7 base36 chars>`.
pub fn generate_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, now_ms(), suffix)
}

pub fn dashboard_id() -> String {
    generate_id("dashboard")
}

pub fn widget_id() -> String {
    generate_id("widget")
}
