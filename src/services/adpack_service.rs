//! Picks which sponsor's card art the kiosk shows.
//!
//! Packs live in `/ad1` to `/ad7` and rotate with the weekday in Brisbane. Query
//! parameters override the rotation for previews.

use time::{OffsetDateTime, UtcOffset, Weekday, macros::offset};

use crate::dto::adpack::{AdPackQuery, AdPackResponse};

/// Australia/Brisbane does not observe daylight saving.
const BRISBANE: UtcOffset = offset!(+10);
/// Number of face images every pack ships.
const PACK_IMAGE_COUNT: u8 = 10;
/// The first pack predates the naming convention and ships image 8 as a JPEG.
const LEGACY_PACK: &str = "/ad1";
const LEGACY_IMAGE: u8 = 8;

/// Resolve the pack for the current Brisbane weekday.
pub fn current_pack(query: &AdPackQuery) -> AdPackResponse {
    let weekday = OffsetDateTime::now_utc().to_offset(BRISBANE).weekday();
    pack_assets(&choose_base(query, weekday))
}

/// Pick the pack folder: `?ad=N`, then `?pack=`, then the weekday (Monday is `/ad1`).
pub fn choose_base(query: &AdPackQuery, weekday: Weekday) -> String {
    if let Some(ad) = query.ad.as_deref().filter(|ad| is_pack_number(ad)) {
        return format!("/ad{ad}");
    }

    if let Some(pack) = query.pack.as_deref().filter(|pack| !pack.is_empty()) {
        let numbered = pack
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("ad"))
            && is_pack_number(&pack[2..]);
        if numbered {
            return format!("/{}", pack.to_ascii_lowercase());
        }
        return format!("/{}", pack.strip_prefix('/').unwrap_or(pack));
    }

    format!("/ad{}", weekday.number_from_monday())
}

/// Asset URLs inside `base`: `logo.png` plus faces `1..=10`.
pub fn pack_assets(base: &str) -> AdPackResponse {
    let images = (1..=PACK_IMAGE_COUNT)
        .map(|face| {
            let ext = if base == LEGACY_PACK && face == LEGACY_IMAGE {
                "jpg"
            } else {
                "png"
            };
            format!("{base}/{face}.{ext}")
        })
        .collect();

    AdPackResponse {
        base: base.to_string(),
        front: format!("{base}/logo.png"),
        images,
    }
}

fn is_pack_number(value: &str) -> bool {
    matches!(value.as_bytes(), [b'1'..=b'7'])
}
