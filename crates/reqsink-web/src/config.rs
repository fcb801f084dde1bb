//! Application configuration
//!
//! Behavior flags are passed in explicitly at startup (the binary maps CLI
//! flags and environment variables onto this struct). Every flag defaults
//! to "off": show everything, record everything, no auth required.

#[derive(Debug, Clone)]
pub struct Config {
    /// Omit query strings from the dashboard projection. The stored rows
    /// keep them either way.
    pub hide_query_params: bool,

    /// Ask the renderer to mask captured URLs in the listing.
    pub hide_urls: bool,

    /// Scope the dashboard to captures whose domain equals the Host header
    /// of the viewer's own request.
    pub only_show_current_domain: bool,

    /// Skip recording requests that carry a valid operator session, so
    /// browsing the dashboard does not pollute the capture log.
    pub ignore_from_self: bool,

    /// Gate the permalink and admin surfaces behind login.
    pub require_auth: bool,

    /// HMAC secret for session tokens.
    pub session_secret: String,

    /// Session lifetime in hours.
    pub session_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hide_query_params: false,
            hide_urls: false,
            only_show_current_domain: false,
            ignore_from_self: false,
            require_auth: false,
            session_secret: "insecure-dev-secret".to_string(),
            session_hours: 6,
        }
    }
}
