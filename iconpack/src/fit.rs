/// Fits `width x height` into a `max_width x max_height` box keeping the
/// aspect ratio.
///
/// The width is fitted first and the height derived from it; if that height
/// overflows the box the height is fitted instead. Sources smaller than the
/// box are scaled up. Neither dimension is ever smaller than 1.
pub fn fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    debug_assert!(width > 0 && height > 0);
    let mut new_width = max_width;
    let mut new_height = scale(height, max_width, width);
    if new_height > max_height {
        new_width = scale(width, max_height, height);
        new_height = max_height;
    }
    (new_width, new_height)
}

/// `floor(value * num / den)`, at least 1.
fn scale(value: u32, num: u32, den: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(num) / u64::from(den.max(1));
    // saturates, an overflowing height is refitted by `fit`
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
