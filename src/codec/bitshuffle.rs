//! Byte and bit transposition filters.
//!
//! Bit shuffle regroups a block of `n` elements (n a multiple of 8) into
//! `8 * elem_size` bit planes of `n / 8` bytes each. Plane `8 * j + k` holds
//! bit `k` of byte `j` of every element, element `i` landing at bit `i % 8`
//! of plane byte `i / 8`.

/// Bit-transpose `src` into `dst`. `src.len() / elem_size` must be a multiple of 8.
pub fn bitshuffle(src: &[u8], dst: &mut [u8], elem_size: usize) {
    let n = src.len() / elem_size;
    debug_assert_eq!(n % 8, 0);
    let plane_len = n / 8;
    let dst = &mut dst[..src.len()];
    dst.fill(0);

    for i in 0..n {
        let (m, bit) = (i / 8, i % 8);
        for j in 0..elem_size {
            let byte = src[i * elem_size + j];
            for k in 0..8 {
                if (byte >> k) & 1 == 1 {
                    dst[(8 * j + k) * plane_len + m] |= 1 << bit;
                }
            }
        }
    }
}

/// Inverse of [`bitshuffle`].
pub fn bitunshuffle(src: &[u8], dst: &mut [u8], elem_size: usize) {
    let n = src.len() / elem_size;
    debug_assert_eq!(n % 8, 0);
    let plane_len = n / 8;
    let dst = &mut dst[..src.len()];
    dst.fill(0);

    for plane in 0..8 * elem_size {
        let (j, k) = (plane / 8, plane % 8);
        for m in 0..plane_len {
            let byte = src[plane * plane_len + m];
            if byte == 0 {
                continue;
            }
            for bit in 0..8 {
                if (byte >> bit) & 1 == 1 {
                    dst[(8 * m + bit) * elem_size + j] |= 1 << k;
                }
            }
        }
    }
}

/// Bit-transpose the largest multiple-of-8 prefix of elements; copy the rest.
pub fn bitshuffle_partial(src: &[u8], dst: &mut [u8], elem_size: usize) {
    let split = shuffled_prefix(src.len(), elem_size);
    bitshuffle(&src[..split], &mut dst[..split], elem_size);
    dst[split..src.len()].copy_from_slice(&src[split..]);
}

/// Inverse of [`bitshuffle_partial`].
pub fn bitunshuffle_partial(src: &[u8], dst: &mut [u8], elem_size: usize) {
    let split = shuffled_prefix(src.len(), elem_size);
    bitunshuffle(&src[..split], &mut dst[..split], elem_size);
    dst[split..src.len()].copy_from_slice(&src[split..]);
}

fn shuffled_prefix(len: usize, elem_size: usize) -> usize {
    let n = len / elem_size;
    (n - n % 8) * elem_size
}

/// Byte-transpose: byte `j` of every element is gathered into stream `j`.
///
/// Trailing bytes that do not form a whole element are copied unchanged.
pub fn byte_shuffle(src: &[u8], dst: &mut [u8], elem_size: usize) {
    let n = src.len() / elem_size;
    for i in 0..n {
        for j in 0..elem_size {
            dst[j * n + i] = src[i * elem_size + j];
        }
    }
    let tail = n * elem_size;
    dst[tail..src.len()].copy_from_slice(&src[tail..]);
}

/// Inverse of [`byte_shuffle`].
pub fn byte_unshuffle(src: &[u8], dst: &mut [u8], elem_size: usize) {
    let n = src.len() / elem_size;
    for i in 0..n {
        for j in 0..elem_size {
            dst[i * elem_size + j] = src[j * n + i];
        }
    }
    let tail = n * elem_size;
    dst[tail..src.len()].copy_from_slice(&src[tail..]);
}
