use semver::Version;

pub const APP_NAME: &str = "Shipping Fee Estimator";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Parses `v1.2.3`, `V1.2.3` or `1.2.3`.
pub fn parse_version_str(input: &str) -> Result<Version, semver::Error> {
    let trimmed = input
        .trim()
        .trim_start_matches(|ch| ch == 'v' || ch == 'V');
    Version::parse(trimmed)
}

pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}
