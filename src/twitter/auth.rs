use crate::config::TwitterCredentials;
use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::Rng;
use ring::hmac;

/// OAuth 1.0a (HMAC-SHA1) request signer for user-context Twitter calls.
pub struct OAuth1Signer {
    creds: TwitterCredentials,
}

impl OAuth1Signer {
    pub fn new(creds: TwitterCredentials) -> Self {
        Self { creds }
    }

    fn nonce() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    /// Build the `Authorization` header for a request.
    ///
    /// `params` are the query and form-encoded body parameters; multipart
    /// bodies are not signed, so pass none for those.
    pub fn authorization(&self, method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, params, &Self::nonce(), &timestamp)
    }

    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> String {
        let mut oauth: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.creds.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.creds.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut all = oauth.clone();
        all.extend_from_slice(params);
        let signature = self.signature(method, url, &all);
        oauth.push(("oauth_signature", signature.as_str()));
        oauth.sort();

        let fields: Vec<String> = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }

    fn signature(&self, method: &str, url: &str, params: &[(&str, &str)]) -> String {
        let base = signature_base(method, url, params);
        let key = format!(
            "{}&{}",
            percent_encode(&self.creds.consumer_secret),
            percent_encode(&self.creds.access_token_secret)
        );
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
        let tag = hmac::sign(&key, base.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
    }
}

/// `METHOD&url&params`, each part percent-encoded, params sorted after encoding.
fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    // Query string is carried in `params`, never in the base URL.
    let url_clean = url.split('?').next().unwrap_or(url);
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url_clean),
        percent_encode(&param_string)
    )
}

/// RFC 3986 percent-encoding: only `A-Z a-z 0-9 - . _ ~` pass through.
pub fn percent_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}
