//! Synthetic identifiers for records created on the server and on the
//! device. The formats are shared with existing stored data, so they
//! must not change.

use uuid::Uuid;

use crate::dates;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `visit-<unix ms>-<9 base-36 chars>`, used by the server-side store.
pub fn visit_record_id() -> String {
    format!("visit-{}-{}", unix_millis(), random_base36(9))
}

/// `fav_<unix ms>_<9 base-36 chars>`, used for favorites.
pub fn favorite_id() -> String {
    format!("fav_{}_{}", unix_millis(), random_base36(9))
}

/// `local_<base-36 unix ms>_<6 base-36 chars>`, used for visit records
/// kept on the device.
pub fn local_record_id() -> String {
    format!(
        "local_{}_{}",
        to_base36(unix_millis() as u128),
        random_base36(6)
    )
}

fn unix_millis() -> i128 {
    dates::now().unix_timestamp_nanos() / 1_000_000
}

fn random_base36(len: usize) -> String {
    let digits = to_base36(Uuid::new_v4().as_u128());

    // a v4 UUID always yields well over 9 digits
    digits.chars().rev().take(len).collect()
}

pub(crate) fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_owned();
    }

    let mut digits = Vec::new();

    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }

    digits.reverse();
    digits.into_iter().map(char::from).collect()
}
