//! Small label formatters for the fixed-width status lines.

use core::str;

pub fn fraction_label(index: u16, total: u16, out: &mut [u8]) -> &str {
    let mut len = write_u16_ascii(index, out);
    if len + 1 >= out.len() {
        return str::from_utf8(&out[..len]).unwrap_or("");
    }
    out[len] = b'/';
    len += 1;
    len += write_u16_ascii(total, &mut out[len..]);
    str::from_utf8(&out[..len]).unwrap_or("")
}

/// `ID 007` style label; ids are always shown with three digits.
pub fn device_label(device_id: u16, out: &mut [u8; 8]) -> &str {
    out[..3].copy_from_slice(b"ID ");
    let mut digits = [b'0'; 5];
    let n = write_u16_ascii(device_id, &mut digits);
    let pad = 3usize.saturating_sub(n);
    for slot in out[3..3 + pad].iter_mut() {
        *slot = b'0';
    }
    let end = (3 + pad + n).min(out.len());
    out[3 + pad..end].copy_from_slice(&digits[..end - 3 - pad]);
    str::from_utf8(&out[..end]).unwrap_or("ID ?")
}

pub fn rssi_label(rssi: i16, out: &mut [u8; 12]) -> &str {
    let mut len = 0usize;
    if rssi < 0 {
        out[0] = b'-';
        len = 1;
    }
    len += write_u16_ascii(rssi.unsigned_abs(), &mut out[len..]);
    out[len..len + 4].copy_from_slice(b" dBm");
    len += 4;
    str::from_utf8(&out[..len]).unwrap_or("")
}

/// Coarse age such as `45s`, `12m` or `3h`.
pub fn age_label(elapsed_ms: u64, out: &mut [u8; 8]) -> &str {
    let secs = elapsed_ms / 1_000;
    let (value, unit) = if secs < 60 {
        (secs, b's')
    } else if secs < 3_600 {
        (secs / 60, b'm')
    } else {
        ((secs / 3_600).min(u16::MAX as u64), b'h')
    };
    let len = write_u16_ascii(value as u16, &mut out[..7]);
    out[len] = unit;
    str::from_utf8(&out[..len + 1]).unwrap_or("")
}

pub fn write_u16_ascii(mut value: u16, out: &mut [u8]) -> usize {
    if out.is_empty() {
        return 0;
    }

    if value == 0 {
        out[0] = b'0';
        return 1;
    }

    let mut tmp = [0u8; 5];
    let mut n = 0usize;
    while value > 0 && n < tmp.len() {
        tmp[n] = b'0' + (value % 10) as u8;
        value /= 10;
        n += 1;
    }

    let len = n.min(out.len());
    for i in 0..len {
        out[i] = tmp[n - 1 - i];
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_render_expected_text() {
        let mut frac = [0u8; 12];
        assert_eq!(fraction_label(3, 15, &mut frac), "3/15");

        let mut id = [0u8; 8];
        assert_eq!(device_label(7, &mut id), "ID 007");
        assert_eq!(device_label(999, &mut id), "ID 999");

        let mut rssi = [0u8; 12];
        assert_eq!(rssi_label(-71, &mut rssi), "-71 dBm");

        let mut age = [0u8; 8];
        assert_eq!(age_label(45_900, &mut age), "45s");
        assert_eq!(age_label(125_000, &mut age), "2m");
        assert_eq!(age_label(7_300_000, &mut age), "2h");
    }
}
