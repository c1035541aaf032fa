use std::time::Duration;

/// Shared http client. Every request made through it gives up after
/// `timeout`, surfacing as a request error.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(format!("Chapterbot/{}", env!("CARGO_PKG_VERSION")))
        .build()
}
