use std::time::Duration;

use reqwest::header::HeaderMap;

const KEEP_ALIVE_HEADER: &str = "keep-alive";
const TIMEOUT_PARAM: &str = "timeout";

/// Decides how long a connection may stay reusable after a response.
pub trait KeepAliveStrategy: Send + Sync {
    fn keep_alive_duration(&self, headers: &HeaderMap) -> Duration;
}

/// Honors `Keep-Alive: timeout=<seconds>` and falls back to a fixed default.
#[derive(Debug, Clone, Copy)]
pub struct HeaderKeepAliveStrategy {
    default: Duration,
}

impl HeaderKeepAliveStrategy {
    pub fn new(default: Duration) -> Self {
        Self { default }
    }
}

impl KeepAliveStrategy for HeaderKeepAliveStrategy {
    fn keep_alive_duration(&self, headers: &HeaderMap) -> Duration {
        headers
            .get_all(KEEP_ALIVE_HEADER)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .find_map(parse_timeout_element)
            .unwrap_or(self.default)
    }
}

fn parse_timeout_element(element: &str) -> Option<Duration> {
    // Parameters after `;` belong to the element, not to its value.
    let (element, _params) = element.split_once(';').unwrap_or((element, ""));
    let (name, value) = element.split_once('=')?;
    if !name.trim().eq_ignore_ascii_case(TIMEOUT_PARAM) {
        return None;
    }
    value
        .trim()
        .trim_matches('"')
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderValue};

    use super::{HeaderKeepAliveStrategy, KeepAliveStrategy};

    const DEFAULT: Duration = Duration::from_secs(20);

    fn duration_for(values: &[&'static str]) -> Duration {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append("keep-alive", HeaderValue::from_static(value));
        }
        HeaderKeepAliveStrategy::new(DEFAULT).keep_alive_duration(&headers)
    }

    #[test]
    fn uses_timeout_from_header() {
        assert_eq!(duration_for(&["timeout=5, max=100"]), Duration::from_secs(5));
    }

    #[test]
    fn matches_parameter_name_case_insensitively_and_strips_quotes() {
        assert_eq!(duration_for(&["max=3, Timeout=\"7\""]), Duration::from_secs(7));
    }

    #[test]
    fn falls_back_to_default_without_header() {
        assert_eq!(duration_for(&[]), DEFAULT);
    }

    #[test]
    fn skips_invalid_values_and_bare_elements() {
        assert_eq!(duration_for(&["timeout, timeout=soon, timeout=-1"]), DEFAULT);
        assert_eq!(duration_for(&["timeout=abc", "timeout=9"]), Duration::from_secs(9));
    }

    #[test]
    fn ignores_parameters_after_semicolon() {
        assert_eq!(duration_for(&["timeout=5; max=100"]), Duration::from_secs(5));
        assert_eq!(duration_for(&["max=100; timeout=5"]), DEFAULT);
    }

    #[test]
    fn zero_timeout_is_honored() {
        assert_eq!(duration_for(&["timeout=0"]), Duration::ZERO);
    }
}
