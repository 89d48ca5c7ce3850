// Recommended free-tier zone profile.

use serde_json::json;

use super::SettingDirective;

/// The recommended settings for a free-plan zone, in application order
pub fn recommended_profile() -> Vec<SettingDirective> {
    vec![
        SettingDirective::new("ssl", "full").with_label("SSL/TLS mode: Full"),
        SettingDirective::new("tls_1_3", "on").with_label("TLS 1.3"),
        SettingDirective::new("min_tls_version", "1.2").with_label("Minimum TLS version: 1.2"),
        SettingDirective::new("always_use_https", "on").with_label("Always Use HTTPS"),
        SettingDirective::new("automatic_https_rewrites", "on").with_label("Automatic HTTPS Rewrites"),
        SettingDirective::new(
            "minify",
            json!({ "html": "on", "css": "on", "javascript": "on" }),
        )
        .with_label("Auto Minify (HTML, CSS, JS)"),
        SettingDirective::new("brotli", "on").with_label("Brotli compression"),
        SettingDirective::new("http2", "on").with_label("HTTP/2"),
        SettingDirective::new("http3", "on").with_label("HTTP/3 (QUIC)"),
        SettingDirective::new("0rtt", "on").with_label("0-RTT connection resumption"),
        SettingDirective::new("opportunistic_encryption", "on").with_label("Opportunistic Encryption"),
        SettingDirective::new("security_level", "medium").with_label("Security level: Medium"),
        SettingDirective::new("challenge_passage", 1800).with_label("Challenge passage: 30 minutes"),
        SettingDirective::new("browser_check", "on").with_label("Browser Integrity Check"),
        SettingDirective::new("privacy_pass", "on").with_label("Privacy Pass"),
        SettingDirective::new("early_hints", "on").with_label("Early Hints"),
        SettingDirective::new("h2_prioritization", "on").with_label("HTTP/2 prioritization"),
        SettingDirective::new("certificate_transparency_monitoring", "on")
            .with_label("Certificate Transparency Monitoring"),
        SettingDirective::new("cache_level", "aggressive").with_label("Caching level: Aggressive"),
        SettingDirective::new("browser_cache_ttl", 14400).with_label("Browser cache TTL: 4 hours"),
        SettingDirective::new("development_mode", "off").with_label("Development mode: off"),
    ]
}
