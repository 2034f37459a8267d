/// Per-request visitor context, derived solely from the incoming request's
/// query string and headers. Never persisted.
///
/// Every field is optional: the embed script sends what it knows, and a
/// missing piece of context never blocks a notification (see the predicate
/// library's fail-open policy).
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub path: Option<String>,
    pub device: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    /// `Referer` header, falling back to `Origin`.
    pub referrer: Option<String>,
}

impl RequestContext {
    /// Look up a UTM value by rule key ("utm_source", "utm_medium", ...).
    /// Unknown keys resolve to `None`.
    pub fn utm(&self, key: &str) -> Option<&str> {
        match key {
            "utm_source" => self.utm_source.as_deref(),
            "utm_medium" => self.utm_medium.as_deref(),
            "utm_campaign" => self.utm_campaign.as_deref(),
            "utm_term" => self.utm_term.as_deref(),
            "utm_content" => self.utm_content.as_deref(),
            _ => None,
        }
    }
}
