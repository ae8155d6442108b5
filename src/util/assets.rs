use std::borrow::Cow;

use rust_embed::RustEmbed;

/// Embed the bundled rate sheet and lookup tables into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

pub const DEFAULT_RATES: &str = "default_rates.json";
pub const PHONETIC_INITIALS: &str = "phonetic_initials.json";

/// Contents of the bundled rate sheet.
pub fn default_rates_json() -> Option<Cow<'static, str>> {
    load_text(DEFAULT_RATES)
}

/// Contents of the bundled pinyin initials table.
pub fn phonetic_initials_json() -> Option<Cow<'static, str>> {
    load_text(PHONETIC_INITIALS)
}

/// Names of every embedded file.
pub fn asset_names() -> impl Iterator<Item = Cow<'static, str>> {
    EmbeddedAssets::iter()
}

fn load_text(path: &str) -> Option<Cow<'static, str>> {
    let asset = EmbeddedAssets::get(&canonical_asset_path(path))?;
    match asset.data {
        Cow::Borrowed(bytes) => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
        Cow::Owned(bytes) => String::from_utf8(bytes).ok().map(Cow::Owned),
    }
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
