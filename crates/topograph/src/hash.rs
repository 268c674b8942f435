/// 32-bit string hash over UTF-16 code units (`h = h * 31 + c`, wrapping).
///
/// Section cache keys and clone ids are built from it, so it must stay stable
/// across passes and releases.
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Hash of a set of member ids: sorted, joined with `,`.
pub fn hash_members<'a>(ids: impl IntoIterator<Item = &'a str>) -> i32 {
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_unstable();
    hash_code(&ids.join(","))
}
