//! Photo URL policy. Only http(s) URLs on a configured origin (the upload bucket)
//! may reach the print browser.

use anyhow::Context;
use reqwest::Url;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct PhotoPolicy {
    origins: Vec<String>,
}

impl PhotoPolicy {
    /// `origins` are base URLs such as `https://uploads.example.com`; only their
    /// scheme, host and port matter.
    pub fn new<S: AsRef<str>>(origins: &[S]) -> anyhow::Result<Self> {
        let origins = origins
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                let url = Url::parse(raw).with_context(|| format!("invalid photo origin '{raw}'"))?;
                if !is_web_scheme(&url) {
                    anyhow::bail!("photo origin '{raw}' must be http or https");
                }
                Ok(url.origin().ascii_serialization())
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { origins })
    }

    pub fn allows(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        is_web_scheme(&url)
            && url.username().is_empty()
            && url.password().is_none()
            && self
                .origins
                .iter()
                .any(|origin| *origin == url.origin().ascii_serialization())
    }

    pub fn check(&self, raw: &str) -> Result<(), AppError> {
        if self.allows(raw) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "cvSpecificPhotoUrl must be an http(s) URL on one of: {}",
                self.origins.join(", ")
            )))
        }
    }
}

fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
