//! Shared User-Agent string for page and image requests.
//!
//! Some origins refuse requests without a recognisable client header, so every
//! request names the tool and its version. A contact URL is appended when the
//! package declares a `repository`.

/// Default User-Agent for page and image requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    user_agent_for(env!("CARGO_PKG_VERSION"), env!("CARGO_PKG_REPOSITORY"))
}

fn user_agent_for(version: &str, repository: &str) -> String {
    if repository.is_empty() {
        format!("imgharvest/{version} (image-harvester)")
    } else {
        format!("imgharvest/{version} (image-harvester; +{repository})")
    }
}
